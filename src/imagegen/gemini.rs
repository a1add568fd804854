use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ImageError;

const API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MODEL: &str = "gemini-2.0-flash-preview-image-generation";

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

// --- Response types ---

#[derive(Deserialize)]
struct Response {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
    #[serde(rename = "inlineData", alias = "inline_data")]
    inline_data: Option<ResponseData>,
}

#[derive(Deserialize)]
struct ResponseData {
    data: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    code: Option<u16>,
    message: String,
    status: Option<String>,
}

/// An input image sent along with the prompt.
pub struct InlineImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub struct Gemini {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

fn is_quota_error(code: Option<u16>, status: Option<&str>, message: &str) -> bool {
    code == Some(429) || status == Some("RESOURCE_EXHAUSTED") || message.contains("RESOURCE_EXHAUSTED")
}

/// Decoded bytes of the first image part.
fn extract_image(response: Response) -> Result<Vec<u8>, ImageError> {
    if let Some(err) = response.error {
        if is_quota_error(err.code, err.status.as_deref(), &err.message) {
            return Err(ImageError::QuotaExceeded);
        }
        return Err(ImageError::Api(err.message));
    }

    let parts = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| ImageError::Api("No candidates in response".to_string()))?
        .content
        .ok_or_else(|| ImageError::Api("No content in first candidate".to_string()))?
        .parts
        .ok_or_else(|| ImageError::Api("No parts in content".to_string()))?;

    for part in parts {
        if let Some(text) = part.text {
            debug!("gemini said: {text}");
        }
        if let Some(data) = part.inline_data.and_then(|d| d.data) {
            return Ok(base64::engine::general_purpose::STANDARD.decode(data)?);
        }
    }
    Err(ImageError::Api(
        "No image data found in response parts".to_string(),
    ))
}

impl Gemini {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self::with_base_url(http, api_key, API_URL)
    }

    pub fn with_base_url(http: reqwest::Client, api_key: String, base_url: &str) -> Self {
        Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Generates an image from `prompt` (and optionally an input image) and
    /// writes it to `path`.
    pub async fn generate_image(
        &self,
        prompt: &str,
        image: Option<InlineImage>,
        path: &Path,
    ) -> Result<(), ImageError> {
        info!("generating image to {}", path.display());

        let mut parts = vec![Part::Text {
            text: prompt.to_string(),
        }];
        if let Some(image) = image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type,
                    data: base64::engine::general_purpose::STANDARD.encode(image.bytes),
                },
            });
        }

        let request = Request {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_modalities: vec!["TEXT", "IMAGE"],
            },
        };

        let resp = self
            .http
            .post(format!("{}/{MODEL}:generateContent", self.base_url))
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ImageError::QuotaExceeded);
        }

        let response: Response = resp.json().await?;
        let bytes = extract_image(response)?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<u8>, ImageError> {
        extract_image(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_extract_image() {
        let bytes = parse(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"Here you go"},
                {"inlineData":{"mimeType":"image/png","data":"aGVsbG8="}}
            ]}}]}"#,
        )
        .unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_snake_case_inline_data() {
        let bytes = parse(
            r#"{"candidates":[{"content":{"parts":[{"inline_data":{"data":"aGk="}}]}}]}"#,
        )
        .unwrap();
        assert_eq!(bytes, b"hi");
    }

    #[test]
    fn test_text_only_response() {
        let err = parse(r#"{"candidates":[{"content":{"parts":[{"text":"no"}]}}]}"#).unwrap_err();
        assert_eq!(err.to_string(), "No image data found in response parts");
    }

    #[test]
    fn test_quota_exceeded() {
        let err = parse(
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "The daily quota has been exceeded :(");
    }

    #[test]
    fn test_request_shape() {
        let request = Request {
            contents: vec![Content {
                parts: vec![Part::Text { text: "a cat".into() }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["TEXT", "IMAGE"],
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["generationConfig"]["responseModalities"],
            serde_json::json!(["TEXT", "IMAGE"])
        );
        assert_eq!(json["contents"][0]["parts"][0]["text"], "a cat");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let gemini = Gemini::with_base_url(reqwest::Client::new(), "key".into(), "http://127.0.0.1:9");
        let result = gemini
            .generate_image("a cat", None, &dir.path().join("cat.png"))
            .await;
        assert!(matches!(result, Err(ImageError::Request(_))));
    }
}
