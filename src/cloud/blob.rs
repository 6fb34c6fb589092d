/// Blob store client (Google Drive)
///
/// Uploads media files to a shared Drive folder and resolves file ids
/// back into preview and download URLs. The upload uses the Drive v3
/// multipart endpoint with an API key, so the folder must be shared
/// for editing by anyone with the link.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::path::Path;

use super::UploadError;
use crate::state::config::StorageSettings;
use crate::state::data::MediaKind;

/// Video file extensions this client recognizes; everything else is
/// treated as an image, which matches how the gallery renders files
const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mov", "webm", "mkv", "avi", "m4v"];

/// Fixed multipart boundary for the Drive upload body
const BOUNDARY: &str = "-------314159265358979323846";

/// Upload a file to the configured Drive folder.
/// Returns the Drive file id on success.
pub async fn upload_to_drive(
    path: &Path,
    settings: &StorageSettings,
) -> Result<String, UploadError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| UploadError::Upload(format!("not a file path: {}", path.display())))?;

    let bytes = tokio::fs::read(path).await?;
    upload_bytes(&file_name, &bytes, settings).await
}

/// Upload already-loaded bytes to the configured Drive folder
pub async fn upload_bytes(
    file_name: &str,
    bytes: &[u8],
    settings: &StorageSettings,
) -> Result<String, UploadError> {
    let folder_id = required(&settings.folder_id).ok_or(UploadError::ConfigMissing)?;
    let api_key = required(&settings.api_key).ok_or(UploadError::ConfigMissing)?;

    let mime = mime_for(file_name);
    let metadata = serde_json::json!({
        "name": file_name,
        "parents": [folder_id],
        "mimeType": mime,
    });

    // Manual multipart/related body, strictly in the shape the Drive
    // v3 upload endpoint expects
    let delimiter = format!("\r\n--{}\r\n", BOUNDARY);
    let close_delimiter = format!("\r\n--{}--", BOUNDARY);
    let body = format!(
        "{delimiter}Content-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\
         {delimiter}Content-Type: {mime}\r\nContent-Transfer-Encoding: base64\r\n\r\n{data}\
         {close_delimiter}",
        delimiter = delimiter,
        close_delimiter = close_delimiter,
        metadata = metadata,
        mime = mime,
        data = BASE64.encode(bytes),
    );

    println!("⬆️  Uploading {} ({} bytes)", file_name, bytes.len());

    let url = format!(
        "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&key={}",
        api_key
    );
    let response = reqwest::Client::new()
        .post(&url)
        .header(
            "Content-Type",
            format!("multipart/related; boundary={}", BOUNDARY),
        )
        .body(body)
        .send()
        .await
        .map_err(|e| UploadError::Upload(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(UploadError::AccessDenied);
        }
        let detail: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
        let message = detail["error"]["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload failed ({})", status));
        return Err(UploadError::Upload(message));
    }

    let result: serde_json::Value = response
        .json()
        .await
        .map_err(|e| UploadError::Upload(e.to_string()))?;
    let file_id = result["id"]
        .as_str()
        .ok_or_else(|| UploadError::Upload("upload response had no file id".to_string()))?;

    println!("✅ Uploaded {} as {}", file_name, file_id);
    Ok(file_id.to_string())
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Preview URL for a stored blob (the thumbnail endpoint works best
/// for publicly shared files)
pub fn preview_url(file_id: &str) -> String {
    if file_id.is_empty() {
        return String::new();
    }
    format!("https://drive.google.com/thumbnail?id={}&sz=w1000", file_id)
}

/// Direct-download URL for a stored blob
pub fn download_url(file_id: &str) -> String {
    if file_id.is_empty() {
        return String::new();
    }
    format!("https://drive.google.com/uc?export=download&id={}", file_id)
}

/// MIME type for a file name, by extension
pub fn mime_for(file_name: &str) -> &'static str {
    match extension_of(file_name).as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// Classify a file name as image or video
pub fn media_kind_for(file_name: &str) -> MediaKind {
    let ext = extension_of(file_name);
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
