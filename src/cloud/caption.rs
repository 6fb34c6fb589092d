/// AI captioning client (Gemini)
///
/// Asks the vision model for a short description and three gallery
/// tags. This client never fails: anything that goes wrong (missing
/// key, unsupported format, transport error, unparseable answer)
/// degrades to a generic caption so the upload flow keeps moving.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

/// Formats the vision model accepts for direct image analysis.
/// Everything else is skipped up front to avoid guaranteed 400s.
const SUPPORTED_IMAGE_MIMES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/heic",
    "image/heif",
];

const MODEL: &str = "gemini-3-flash-preview";

const PROMPT: &str =
    "Describe this image briefly (max 15 words) and provide 3 relevant one-word tags for a photo gallery.";

/// Descriptive metadata for one media file
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Caption {
    pub description: String,
    pub tags: Vec<String>,
}

impl Caption {
    /// The caption used when analysis is skipped or fails
    fn fallback(tags: &[&str]) -> Self {
        Caption {
            description: "Shared media upload".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Describe an image. Degrades to a default caption instead of
/// returning an error.
pub async fn describe(bytes: &[u8], mime_type: &str) -> Caption {
    if !SUPPORTED_IMAGE_MIMES.contains(&mime_type) {
        println!("⚠️  Skipping AI analysis for unsupported type: {}", mime_type);
        return Caption::fallback(&["Gallery", "File"]);
    }

    match request_description(bytes, mime_type).await {
        Ok(caption) => {
            println!("🤖 AI caption: {}", caption.description);
            caption
        }
        Err(e) => {
            eprintln!("⚠️  AI analysis failed: {}", e);
            Caption::fallback(&["Gallery"])
        }
    }
}

async fn request_description(bytes: &[u8], mime_type: &str) -> Result<Caption, String> {
    let api_key =
        std::env::var("API_KEY").map_err(|_| "API_KEY is not set in the environment".to_string())?;

    let body = serde_json::json!({
        "contents": {
            "parts": [
                {
                    "inlineData": {
                        "data": BASE64.encode(bytes),
                        "mimeType": mime_type,
                    },
                },
                { "text": PROMPT },
            ],
        },
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "description": { "type": "STRING" },
                    "tags": { "type": "ARRAY", "items": { "type": "STRING" } },
                },
                "required": ["description", "tags"],
            },
        },
    });

    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
        MODEL, api_key
    );
    let response = reqwest::Client::new()
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("model endpoint returned {}", status));
    }

    let value: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
    let text = value["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or_else(|| "empty response from the model".to_string())?
        .trim();

    serde_json::from_str(text).map_err(|e| format!("unparseable model answer: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_mime_skips_analysis() {
        // No network involved: the type gate short-circuits first
        let caption = describe(b"GIF89a", "image/gif").await;
        assert_eq!(caption.description, "Shared media upload");
        assert_eq!(caption.tags, vec!["Gallery", "File"]);
    }

    #[test]
    fn test_model_answer_parses() {
        let answer = r#"{"description": "Two kids on a beach", "tags": ["Beach", "Kids", "Summer"]}"#;
        let caption: Caption = serde_json::from_str(answer).unwrap();
        assert_eq!(caption.description, "Two kids on a beach");
        assert_eq!(caption.tags.len(), 3);
    }

    #[test]
    fn test_fallback_shapes() {
        assert_eq!(
            Caption::fallback(&["Gallery", "File"]).tags,
            vec!["Gallery", "File"]
        );
        assert_eq!(Caption::fallback(&["Gallery"]).tags, vec!["Gallery"]);
    }
}
