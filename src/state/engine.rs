/// The reconciliation engine
///
/// Owns the in-memory roster, catalog and configuration, decides at
/// resolution time whether they live in the cloud or in the Local
/// Store, and routes every mutation to the right backend. Mutations
/// are applied to memory first and never rolled back; a failing
/// backend write only degrades durability.
///
/// Exactly one engine exists per running client and all mutations go
/// through it, so no locking is needed.

use super::config::AppConfig;
use super::data::{default_roster, MediaEntry, Profile, Role, MEDIA_KEY, ROOT_ADMIN_ID, USERS_KEY};
use super::local::LocalStore;
use super::remote::{CatalogBackend, RemoteError, SupabaseClient};

/// User-visible warning shown when the cloud tables have not been
/// provisioned yet
pub const TABLES_MISSING_WARNING: &str = "Supabase Tables Missing! Falling back to Local Storage.";

/// Which backend the engine is currently writing to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Local,
    Remote,
}

/// Outcome of one mutation.
///
/// The in-memory update always happens (except `Refused`); this only
/// reports what the durable backend did with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persist {
    /// The active backend accepted the write
    Written,
    /// Memory updated, but the backend write failed. The session keeps
    /// working; the write is lost.
    Degraded(String),
    /// The mutation was not applied at all (root admin removal)
    Refused,
}

pub struct Engine<R: CatalogBackend> {
    store: LocalStore,
    config: AppConfig,
    roster: Vec<Profile>,
    catalog: Vec<MediaEntry>,
    mode: BackendMode,
    remote: Option<R>,
    warning: Option<String>,
}

impl Engine<SupabaseClient> {
    /// Resolve the active backend for this configuration and load
    /// roster and catalog from it. Never fails: any trouble along the
    /// way degrades to local mode plus a one-line warning.
    pub async fn resolve(store: LocalStore, config: AppConfig) -> Self {
        let remote = SupabaseClient::connect(&config.database);
        Self::resolve_with(store, config, remote).await
    }

    /// Persist a new configuration and re-run the whole resolution
    /// protocol against it. This is the only way the mode changes.
    pub async fn apply_config(&mut self, config: AppConfig) {
        let remote = SupabaseClient::connect(&config.database);
        self.apply_config_with(config, remote).await;
    }
}

impl<R: CatalogBackend> Engine<R> {
    /// Resolution seam that takes an already-constructed remote handle
    /// (or none). `resolve` is the production entry point.
    pub async fn resolve_with(store: LocalStore, config: AppConfig, remote: Option<R>) -> Self {
        let mut engine = Engine {
            store,
            config,
            roster: Vec::new(),
            catalog: Vec::new(),
            mode: BackendMode::Local,
            remote: None,
            warning: None,
        };
        engine.run_resolution(remote).await;
        engine
    }

    /// Reconfiguration seam, see `apply_config`
    pub async fn apply_config_with(&mut self, config: AppConfig, remote: Option<R>) {
        self.config = config;
        self.roster.clear();
        self.catalog.clear();
        self.run_resolution(remote).await;
    }

    /// The startup protocol: adopt the cloud state when it is
    /// reachable, fall back to the Local Store when it is not, and
    /// seed built-in defaults wherever nothing exists yet.
    async fn run_resolution(&mut self, remote: Option<R>) {
        self.mode = BackendMode::Local;
        self.remote = None;
        self.warning = None;

        // Rewrite the configuration slot up front so a reconfiguration
        // survives an interrupted resolution
        self.persist_config();

        match remote {
            Some(client) => match client.list_profiles().await {
                Err(RemoteError::MissingCollections) => {
                    eprintln!("⚠️  {}", TABLES_MISSING_WARNING);
                    self.warning = Some(TABLES_MISSING_WARNING.to_string());
                    self.load_local();
                }
                Ok(profiles) if !profiles.is_empty() => {
                    println!("☁️  Adopted {} profiles from the cloud roster", profiles.len());
                    self.roster = profiles;
                    self.adopt_remote_catalog(&client).await;
                    self.mode = BackendMode::Remote;
                    self.remote = Some(client);
                }
                result => {
                    // An empty table and a failed read end the same way:
                    // the built-in roster, pushed back up best-effort
                    if let Err(e) = result {
                        eprintln!("⚠️  Could not read the cloud roster: {}", e);
                    }
                    self.roster = default_roster();
                    self.seed_remote_roster(&client).await;
                    self.adopt_remote_catalog(&client).await;
                    self.mode = BackendMode::Remote;
                    self.remote = Some(client);
                }
            },
            None => self.load_local(),
        }
    }

    /// Read the cloud catalog. A failure is non-fatal and leaves the
    /// catalog empty for this session.
    async fn adopt_remote_catalog(&mut self, client: &R) {
        match client.list_media().await {
            Ok(items) => {
                println!("☁️  Adopted {} media entries from the cloud catalog", items.len());
                self.catalog = items;
            }
            Err(e) => eprintln!("⚠️  Could not read the cloud catalog: {}", e),
        }
    }

    /// Push the default roster to an empty cloud table, one row at a
    /// time. The first failure stops the rest; the in-memory roster is
    /// authoritative for the session either way.
    async fn seed_remote_roster(&self, client: &R) {
        for profile in &self.roster {
            if let Err(e) = client.upsert_profile(profile).await {
                eprintln!("⚠️  Could not sync default profiles to the cloud: {}", e);
                break;
            }
        }
    }

    /// Load roster and catalog from the Local Store, seeding defaults
    /// on first run. Unreadable bytes degrade to defaults in memory.
    fn load_local(&mut self) {
        match self.store.get(USERS_KEY) {
            Some(raw) => {
                self.roster = serde_json::from_str(&raw).unwrap_or_else(|e| {
                    eprintln!("⚠️  Saved roster is unreadable ({}), using the defaults", e);
                    default_roster()
                });
            }
            None => {
                // First run on this device: seed and write back immediately
                self.roster = default_roster();
                self.save_roster();
            }
        }

        self.catalog = self
            .store
            .get(MEDIA_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(catalog) => Some(catalog),
                Err(e) => {
                    eprintln!("⚠️  Saved catalog is unreadable ({}), starting empty", e);
                    None
                }
            })
            .unwrap_or_default();

        println!(
            "💾 Local mode: {} profiles, {} media entries",
            self.roster.len(),
            self.catalog.len()
        );
    }

    /// Insert or replace a profile by id. An existing entry keeps its
    /// position in the roster; a new one is appended.
    pub async fn upsert_profile(&mut self, mut profile: Profile) -> Persist {
        // The root admin can be renamed but never demoted
        if profile.id == ROOT_ADMIN_ID {
            profile.role = Role::Admin;
        }

        match self.roster.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile.clone(),
            None => self.roster.push(profile.clone()),
        }

        if let Some(client) = self.active_remote() {
            return match client.upsert_profile(&profile).await {
                Ok(()) => Persist::Written,
                Err(e) => {
                    eprintln!("⚠️  Cloud profile write failed: {}", e);
                    Persist::Degraded(e.to_string())
                }
            };
        }
        self.save_roster()
    }

    /// Remove a profile. The root admin is permanent; removing it is
    /// refused before anything (memory or backend) is touched.
    pub async fn remove_profile(&mut self, id: &str) -> Persist {
        if id == ROOT_ADMIN_ID {
            println!("🚫 Refusing to remove the root admin");
            return Persist::Refused;
        }

        self.roster.retain(|p| p.id != id);

        if let Some(client) = self.active_remote() {
            return match client.delete_profile(id).await {
                Ok(()) => Persist::Written,
                Err(e) => {
                    eprintln!("⚠️  Cloud profile delete failed: {}", e);
                    Persist::Degraded(e.to_string())
                }
            };
        }
        self.save_roster()
    }

    /// Add a freshly uploaded entry to the front of the catalog
    /// (newest first)
    pub async fn append_media(&mut self, entry: MediaEntry) -> Persist {
        self.catalog.insert(0, entry.clone());

        if let Some(client) = self.active_remote() {
            return match client.insert_media(&entry).await {
                Ok(()) => Persist::Written,
                Err(e) => {
                    eprintln!("⚠️  Cloud media write failed: {}", e);
                    Persist::Degraded(e.to_string())
                }
            };
        }
        self.save_catalog()
    }

    /// Remove a catalog entry by id
    pub async fn remove_media(&mut self, id: &str) -> Persist {
        self.catalog.retain(|item| item.id != id);

        if let Some(client) = self.active_remote() {
            return match client.delete_media(id).await {
                Ok(()) => Persist::Written,
                Err(e) => {
                    eprintln!("⚠️  Cloud media delete failed: {}", e);
                    Persist::Degraded(e.to_string())
                }
            };
        }
        self.save_catalog()
    }

    /// The remote handle, but only while remote mode is healthy.
    /// A session that fell back after a warning stays local-only.
    fn active_remote(&self) -> Option<&R> {
        if self.mode == BackendMode::Remote && self.warning.is_none() {
            self.remote.as_ref()
        } else {
            None
        }
    }

    /// Whole-roster overwrite of the Local Store slot
    fn save_roster(&self) -> Persist {
        match serde_json::to_string(&self.roster) {
            Ok(json) => match self.store.set(USERS_KEY, &json) {
                Ok(()) => Persist::Written,
                Err(e) => {
                    eprintln!("⚠️  Failed to persist the roster locally: {}", e);
                    Persist::Degraded(e.to_string())
                }
            },
            Err(e) => Persist::Degraded(e.to_string()),
        }
    }

    /// Whole-catalog overwrite of the Local Store slot
    fn save_catalog(&self) -> Persist {
        match serde_json::to_string(&self.catalog) {
            Ok(json) => match self.store.set(MEDIA_KEY, &json) {
                Ok(()) => Persist::Written,
                Err(e) => {
                    eprintln!("⚠️  Failed to persist the catalog locally: {}", e);
                    Persist::Degraded(e.to_string())
                }
            },
            Err(e) => Persist::Degraded(e.to_string()),
        }
    }

    fn persist_config(&self) {
        if let Err(e) = self.config.save(&self.store) {
            eprintln!("⚠️  Failed to persist configuration: {}", e);
        }
    }

    pub fn roster(&self) -> &[Profile] {
        &self.roster
    }

    pub fn catalog(&self) -> &[MediaEntry] {
        &self.catalog
    }

    /// Entries owned by one profile (the "My Files" filter)
    pub fn media_for_user(&self, user_id: &str) -> Vec<&MediaEntry> {
        self.catalog
            .iter()
            .filter(|item| item.user_id == user_id)
            .collect()
    }

    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.roster.iter().find(|p| p.id == id)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    /// The recoverable warning from the last resolution, if any
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// The Local Store this engine persists through. The session layer
    /// borrows it for the active-profile slot.
    pub fn store(&self) -> &LocalStore {
        &self.store
    }
}
