/// Remote catalog client
///
/// Wraps the Supabase structured-data backend behind the
/// `CatalogBackend` capability trait. Two tables exist on the remote:
/// `users` (the roster) and `media_items` (the catalog, listed newest
/// first). A missing table is reported as its own error variant; it is
/// the one signal that sends the engine into local fallback.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::config::{DatabaseProvider, DatabaseSettings};
use super::data::{MediaEntry, Profile};

/// Failures reported by the remote backend
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The expected tables do not exist on the remote yet
    #[error("cloud tables are missing")]
    MissingCollections,
    /// Anything else: network, auth, quota, bad response
    #[error("cloud request failed: {0}")]
    Unavailable(String),
}

/// Capability surface of the structured-data backend.
///
/// `list_*` and the write methods report errors to the caller; the
/// engine decides which of them are fatal (none are) and which merely
/// degrade durability.
#[async_trait]
pub trait CatalogBackend {
    async fn list_profiles(&self) -> Result<Vec<Profile>, RemoteError>;

    /// Catalog rows ordered by timestamp descending
    async fn list_media(&self) -> Result<Vec<MediaEntry>, RemoteError>;

    /// Insert-or-replace a roster row by id
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), RemoteError>;

    async fn delete_profile(&self, id: &str) -> Result<(), RemoteError>;

    async fn insert_media(&self, entry: &MediaEntry) -> Result<(), RemoteError>;

    async fn delete_media(&self, id: &str) -> Result<(), RemoteError>;
}

const USERS_TABLE: &str = "users";
const MEDIA_TABLE: &str = "media_items";

/// PostgREST client for a Supabase project
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Build a client from the database settings.
    ///
    /// Returns `None` when the settings do not describe a usable remote:
    /// wrong provider, empty or non-URI endpoint, or a missing key.
    /// Malformed settings are "remote unavailable", never an error.
    pub fn connect(settings: &DatabaseSettings) -> Option<Self> {
        if settings.provider != DatabaseProvider::Supabase {
            return None;
        }

        let url = settings.supabase_url.as_deref().unwrap_or("").trim();
        let key = settings.supabase_anon_key.as_deref().unwrap_or("").trim();
        if url.is_empty() || !url.starts_with("http") || key.is_empty() {
            return None;
        }

        Some(SupabaseClient {
            http: reqwest::Client::new(),
            base_url: url.trim_end_matches('/').to_string(),
            anon_key: key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Vec<T>, RemoteError> {
        let url = format!("{}?{}", self.table_url(table), query);
        let response = self
            .auth(self.http.get(&url))
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))
    }

    async fn write_row<T: Serialize + Sync>(
        &self,
        table: &str,
        row: &T,
        upsert: bool,
    ) -> Result<(), RemoteError> {
        let mut request = self.auth(self.http.post(self.table_url(table))).json(row);
        if upsert {
            request = request.header("Prefer", "resolution=merge-duplicates");
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }
        Ok(())
    }

    async fn delete_row(&self, table: &str, id: &str) -> Result<(), RemoteError> {
        let url = format!("{}?id=eq.{}", self.table_url(table), id);
        let response = self
            .auth(self.http.delete(&url))
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogBackend for SupabaseClient {
    async fn list_profiles(&self) -> Result<Vec<Profile>, RemoteError> {
        self.fetch_rows(USERS_TABLE, "select=*").await
    }

    async fn list_media(&self) -> Result<Vec<MediaEntry>, RemoteError> {
        self.fetch_rows(MEDIA_TABLE, "select=*&order=timestamp.desc")
            .await
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), RemoteError> {
        self.write_row(USERS_TABLE, profile, true).await
    }

    async fn delete_profile(&self, id: &str) -> Result<(), RemoteError> {
        self.delete_row(USERS_TABLE, id).await
    }

    async fn insert_media(&self, entry: &MediaEntry) -> Result<(), RemoteError> {
        self.write_row(MEDIA_TABLE, entry, false).await
    }

    async fn delete_media(&self, id: &str) -> Result<(), RemoteError> {
        self.delete_row(MEDIA_TABLE, id).await
    }
}

/// Turn a failed PostgREST response into the right error variant
fn classify_failure(status: StatusCode, body: &str) -> RemoteError {
    let value: serde_json::Value = serde_json::from_str(body).unwrap_or(serde_json::Value::Null);
    let code = value["code"].as_str().unwrap_or("");
    let message = value["message"].as_str().unwrap_or(body);

    if missing_collection_signal(code, message) {
        RemoteError::MissingCollections
    } else {
        RemoteError::Unavailable(format!("{}: {}", status, message))
    }
}

/// PostgREST reports a missing relation as a PGRST code or a
/// schema-cache miss in the message text
fn missing_collection_signal(code: &str, message: &str) -> bool {
    if code == "PGRST116" {
        return true;
    }
    let message = message.to_lowercase();
    message.contains("cache") || message.contains("not find")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str, key: &str) -> DatabaseSettings {
        DatabaseSettings {
            provider: DatabaseProvider::Supabase,
            supabase_url: Some(url.to_string()),
            supabase_anon_key: Some(key.to_string()),
        }
    }

    #[test]
    fn test_connect_rejects_local_provider() {
        let mut s = settings("https://example.supabase.co", "anon-key");
        s.provider = DatabaseProvider::Local;
        assert!(SupabaseClient::connect(&s).is_none());
    }

    #[test]
    fn test_connect_rejects_malformed_settings() {
        assert!(SupabaseClient::connect(&settings("", "anon-key")).is_none());
        assert!(SupabaseClient::connect(&settings("ftp://example", "anon-key")).is_none());
        assert!(SupabaseClient::connect(&settings("https://example.supabase.co", "")).is_none());
        assert!(SupabaseClient::connect(&settings("   ", "anon-key")).is_none());
    }

    #[test]
    fn test_connect_accepts_valid_settings() {
        let client = SupabaseClient::connect(&settings("https://example.supabase.co/", "anon-key"))
            .expect("valid settings produce a client");
        assert_eq!(client.table_url("users"), "https://example.supabase.co/rest/v1/users");
    }

    #[test]
    fn test_missing_collection_signal() {
        assert!(missing_collection_signal("PGRST116", "whatever"));
        assert!(missing_collection_signal(
            "PGRST205",
            "Could not find the table 'public.users' in the schema cache"
        ));
        assert!(missing_collection_signal("", "relation missing from cache"));
        assert!(!missing_collection_signal("42501", "permission denied for table users"));
        assert!(!missing_collection_signal("", "JWT expired"));
    }

    #[test]
    fn test_classify_failure_variants() {
        let missing = classify_failure(
            StatusCode::NOT_FOUND,
            r#"{"code":"PGRST205","message":"Could not find the table 'public.users' in the schema cache"}"#,
        );
        assert!(matches!(missing, RemoteError::MissingCollections));

        let other = classify_failure(
            StatusCode::UNAUTHORIZED,
            r#"{"code":"401","message":"Invalid API key"}"#,
        );
        match other {
            RemoteError::Unavailable(reason) => assert!(reason.contains("Invalid API key")),
            _ => panic!("expected Unavailable"),
        }

        // A body that is not JSON still classifies
        let raw = classify_failure(StatusCode::BAD_GATEWAY, "upstream timed out");
        assert!(matches!(raw, RemoteError::Unavailable(_)));
    }
}
