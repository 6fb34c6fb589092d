/// Installation configuration
///
/// One configuration instance exists per installation. It is seeded
/// with built-in defaults on first run, loaded from the Local Store
/// when present, mutated only through the admin settings flow, and
/// persisted after every change.

use serde::{Deserialize, Serialize};

use super::data::CONFIG_KEY;
use super::local::LocalStore;

/// Which backend holds the roster and catalog
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseProvider {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "supabase")]
    Supabase,
}

/// Blob store settings (Google Drive)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageSettings {
    pub provider: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub folder_id: Option<String>,
}

/// Structured-data backend settings
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSettings {
    pub provider: DatabaseProvider,
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
}

/// All configuration for one installation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Name shown on the profile picker and header
    pub brand_name: String,
    pub storage: StorageSettings,
    pub database: DatabaseSettings,
    pub is_active: bool,
}

impl Default for AppConfig {
    /// First-run defaults: cloud database selected but unconfigured,
    /// so resolution lands in local mode until the admin fills the form.
    fn default() -> Self {
        AppConfig {
            brand_name: "FamilyVault".to_string(),
            storage: StorageSettings {
                provider: "google".to_string(),
                email: Some(String::new()),
                api_key: Some(String::new()),
                folder_id: Some(String::new()),
            },
            database: DatabaseSettings {
                provider: DatabaseProvider::Supabase,
                supabase_url: Some(String::new()),
                supabase_anon_key: Some(String::new()),
            },
            is_active: true,
        }
    }
}

impl AppConfig {
    /// Load the configuration from its Local Store slot.
    ///
    /// Absent or unreadable bytes degrade to the built-in defaults;
    /// this never fails.
    pub fn load(store: &LocalStore) -> Self {
        match store.get(CONFIG_KEY) {
            Some(raw) => Self::from_json(&raw).unwrap_or_else(|e| {
                eprintln!("⚠️  Saved configuration is unreadable ({}), using defaults", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Persist the configuration to its Local Store slot
    pub fn save(&self, store: &LocalStore) -> rusqlite::Result<()> {
        let json = self.to_json().expect("configuration serializes to JSON");
        store.set(CONFIG_KEY, &json)
    }

    /// Convert to JSON string for storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON string (from storage)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selects_cloud_but_unconfigured() {
        let config = AppConfig::default();
        assert_eq!(config.brand_name, "FamilyVault");
        assert_eq!(config.database.provider, DatabaseProvider::Supabase);
        assert_eq!(config.database.supabase_url.as_deref(), Some(""));
        assert!(config.is_active);
    }

    #[test]
    fn test_wire_shape_round_trip() {
        let config = AppConfig::default();
        let json = config.to_json().unwrap();
        // The stored shape uses the web client's field names
        assert!(json.contains("\"brandName\""));
        assert!(json.contains("\"isActive\""));
        assert!(json.contains("\"apiKey\""));
        assert!(json.contains("\"supabaseUrl\""));
        assert!(json.contains("\"provider\":\"supabase\""));

        let restored = AppConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_load_degrades_on_missing_and_corrupt_slots() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(AppConfig::load(&store), AppConfig::default());

        store.set(CONFIG_KEY, "{not json").unwrap();
        assert_eq!(AppConfig::load(&store), AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let store = LocalStore::open_in_memory().unwrap();
        let mut config = AppConfig::default();
        config.brand_name = "Chowdhury Family".to_string();
        config.database.provider = DatabaseProvider::Local;
        config.save(&store).unwrap();

        assert_eq!(AppConfig::load(&store), config);
    }
}
