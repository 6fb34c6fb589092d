/// Cloud clients module
///
/// This module talks to the services outside the catalog database:
/// - `blob.rs` - blob uploads to the shared Drive folder, URL resolution
/// - `caption.rs` - AI descriptions and tags for uploaded images
///
/// `upload_media` is the whole upload flow in one call: verify the
/// configuration, push the bytes, ask for a caption, and assemble the
/// catalog entry the engine will append.

pub mod blob;
pub mod caption;

use chrono::Utc;
use std::path::Path;
use thiserror::Error;

use crate::state::config::AppConfig;
use crate::state::data::{MediaEntry, MediaKind, Profile};
use caption::Caption;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Drive configuration missing (folder id or API key). Check the admin settings.")]
    ConfigMissing,
    #[error(
        "Access denied: Drive API keys can usually only read public data. For uploads, make sure \
         the key has the right permissions or the folder allows editing by anyone with the link."
    )]
    AccessDenied,
    #[error("upload failed: {0}")]
    Upload(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Upload a file and build its catalog entry.
///
/// The entry's id is the blob store's file id, so nothing can enter
/// the catalog unless the upload actually completed. The caller feeds
/// the returned entry to the engine.
pub async fn upload_media(
    path: &Path,
    owner: &Profile,
    config: &AppConfig,
) -> Result<MediaEntry, UploadError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| UploadError::Upload(format!("not a file path: {}", path.display())))?;

    let bytes = tokio::fs::read(path).await?;
    let file_id = blob::upload_bytes(&file_name, &bytes, &config.storage).await?;

    let kind = blob::media_kind_for(&file_name);
    let caption = match kind {
        MediaKind::Image => caption::describe(&bytes, blob::mime_for(&file_name)).await,
        // Videos are not analyzed; they get the file name and a stock tag
        MediaKind::Video => Caption {
            description: file_name.clone(),
            tags: vec!["Video".to_string()],
        },
    };

    Ok(MediaEntry {
        id: file_id.clone(),
        url: file_id,
        kind,
        file_name,
        user_id: owner.id.clone(),
        user_name: owner.name.clone(),
        timestamp: Utc::now().timestamp_millis(),
        size: bytes.len() as u64,
        ai_description: Some(caption.description),
        tags: Some(caption.tags),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::default_roster;

    #[tokio::test]
    async fn test_upload_fails_fast_without_configuration() {
        // Default settings have empty Drive credentials, so the flow
        // stops before touching the network
        let config = AppConfig::default();
        let owner = &default_roster()[0];

        let dir = std::env::temp_dir();
        let path = dir.join(format!("family-vault-upload-{}.jpg", std::process::id()));
        std::fs::write(&path, b"fake jpeg bytes").unwrap();

        let result = upload_media(&path, owner, &config).await;
        assert!(matches!(result, Err(UploadError::ConfigMissing)));

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_upload_rejects_directories() {
        let config = AppConfig::default();
        let owner = &default_roster()[0];
        let result = upload_media(Path::new("/"), owner, &config).await;
        assert!(result.is_err());
    }
}
