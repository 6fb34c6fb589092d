/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the persistence layer, the reconciliation engine and the UI layer.
/// Serialized field names match the cloud table columns, so the same
/// shapes round-trip through both backends unchanged.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The one profile that can never be deleted and is always an administrator.
pub const ROOT_ADMIN_ID: &str = "root-admin-raju";

/// Local Store slot holding the serialized catalog
pub const MEDIA_KEY: &str = "shared_cloud_data_v2";
/// Local Store slot holding the serialized roster
pub const USERS_KEY: &str = "shared_cloud_users_v2";
/// Local Store slot holding the serialized configuration
pub const CONFIG_KEY: &str = "shared_cloud_config_v2";
/// Local Store slot holding the active profile snapshot (session layer)
pub const SESSION_KEY: &str = "active_session_user";

/// Role of a profile within the installation
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "user")]
    Standard,
}

/// A single profile in the roster
///
/// Profiles are PIN-protected; the PIN is a 4-digit numeric string
/// compared in plaintext (this is a family device, not a bank).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Profile {
    /// Stable, globally unique id. The root admin's id is fixed.
    pub id: String,
    pub name: String,
    /// Avatar image URI
    pub avatar: String,
    /// Display accent, stored as a CSS class name for the web UI
    pub color: String,
    pub role: Role,
    pub pin: String,
}

impl Profile {
    /// Create a new standard profile with a generated id.
    ///
    /// When no avatar is given, a deterministic placeholder is derived
    /// from the name so every profile has something to show.
    pub fn new(name: &str, pin: &str, avatar: Option<String>) -> Self {
        let avatar = avatar.unwrap_or_else(|| {
            format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", name)
        });

        Profile {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            avatar,
            color: "bg-slate-500".to_string(),
            role: Role::Standard,
            pin: pin.to_string(),
        }
    }

    /// Whether this profile may open the admin settings
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// The built-in roster used before any profile has been created:
/// exactly the root admin.
pub fn default_roster() -> Vec<Profile> {
    vec![Profile {
        id: ROOT_ADMIN_ID.to_string(),
        name: "Raju".to_string(),
        avatar: "https://api.dicebear.com/7.x/avataaars/svg?seed=Raju".to_string(),
        color: "bg-blue-600".to_string(),
        role: Role::Admin,
        pin: "1122".to_string(),
    }]
}

/// Kind of a media entry
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "video")]
    Video,
}

/// A single photo or video in the shared catalog
///
/// The id is the blob store's file id, assigned when the upload
/// completes. Nothing enters the catalog without a finished upload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
    pub id: String,
    /// Blob reference used to resolve preview/download URLs.
    /// Currently the same value as `id`.
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub file_name: String,
    /// Owning profile's id
    pub user_id: String,
    /// Owner display name, snapshotted at upload time (not re-synced on rename)
    pub user_name: String,
    /// Upload time, epoch milliseconds
    pub timestamp: i64,
    /// Size of the uploaded blob in bytes
    pub size: u64,
    #[serde(default)]
    pub ai_description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl MediaEntry {
    /// Caption to display for this entry, falling back to the file name
    pub fn caption(&self) -> &str {
        self.ai_description.as_deref().unwrap_or(&self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster_is_the_root_admin() {
        let roster = default_roster();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].id, ROOT_ADMIN_ID);
        assert_eq!(roster[0].role, Role::Admin);
        assert!(roster[0].is_admin());
    }

    #[test]
    fn test_new_profile_defaults() {
        let profile = Profile::new("Mina", "4321", None);
        assert_eq!(profile.role, Role::Standard);
        assert!(profile.avatar.contains("seed=Mina"));
        assert_eq!(profile.color, "bg-slate-500");
        assert_ne!(profile.id, ROOT_ADMIN_ID);

        let other = Profile::new("Mina", "4321", None);
        assert_ne!(profile.id, other.id, "ids must be unique");
    }

    #[test]
    fn test_profile_role_wire_names() {
        let admin = &default_roster()[0];
        let json = serde_json::to_string(admin).unwrap();
        assert!(json.contains("\"role\":\"admin\""));

        let standard = Profile::new("Mina", "4321", None);
        let json = serde_json::to_string(&standard).unwrap();
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn test_media_entry_wire_names_match_cloud_columns() {
        let entry = MediaEntry {
            id: "drive-file-1".to_string(),
            url: "drive-file-1".to_string(),
            kind: MediaKind::Image,
            file_name: "IMG_0001.jpg".to_string(),
            user_id: ROOT_ADMIN_ID.to_string(),
            user_name: "Raju".to_string(),
            timestamp: 1_700_000_000_000,
            size: 2048,
            ai_description: Some("A beach at sunset".to_string()),
            tags: Some(vec!["Beach".to_string(), "Sunset".to_string()]),
        };

        let json = serde_json::to_string(&entry).unwrap();
        for column in [
            "\"type\":\"image\"",
            "\"fileName\"",
            "\"userId\"",
            "\"userName\"",
            "\"aiDescription\"",
            "\"timestamp\"",
            "\"tags\"",
        ] {
            assert!(json.contains(column), "missing {} in {}", column, json);
        }

        let restored: MediaEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, entry);
    }

    #[test]
    fn test_caption_falls_back_to_file_name() {
        let mut entry = MediaEntry {
            id: "f".to_string(),
            url: "f".to_string(),
            kind: MediaKind::Video,
            file_name: "birthday.mp4".to_string(),
            user_id: "u".to_string(),
            user_name: "Mina".to_string(),
            timestamp: 0,
            size: 0,
            ai_description: None,
            tags: None,
        };
        assert_eq!(entry.caption(), "birthday.mp4");

        entry.ai_description = Some("Kids around a cake".to_string());
        assert_eq!(entry.caption(), "Kids around a cake");
    }

    #[test]
    fn test_media_entry_parses_without_optional_columns() {
        // Rows written before AI analysis existed have no description or tags
        let json = r#"{
            "id": "abc",
            "url": "abc",
            "type": "video",
            "fileName": "clip.mov",
            "userId": "u1",
            "userName": "Raju",
            "timestamp": 1700000000000,
            "size": 9000
        }"#;
        let entry: MediaEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.kind, MediaKind::Video);
        assert!(entry.ai_description.is_none());
        assert!(entry.tags.is_none());
    }
}
