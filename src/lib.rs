//! family-vault
//!
//! The persistence core of a shared family photo and video vault.
//! A small roster of PIN-protected profiles uploads media to a shared
//! Drive folder; the catalog and roster live either in a Supabase
//! project or, when the cloud is unconfigured or unreachable, in a
//! local SQLite store. The reconciliation engine decides which at
//! startup and keeps every later mutation flowing to the right place.

pub mod cloud;
pub mod state;

pub use cloud::{upload_media, UploadError};
pub use state::config::{AppConfig, DatabaseProvider, DatabaseSettings, StorageSettings};
pub use state::data::{default_roster, MediaEntry, MediaKind, Profile, Role, ROOT_ADMIN_ID};
pub use state::engine::{BackendMode, Engine, Persist, TABLES_MISSING_WARNING};
pub use state::local::LocalStore;
pub use state::remote::{CatalogBackend, RemoteError, SupabaseClient};
pub use state::session::{Session, SessionError};
