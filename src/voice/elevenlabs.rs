use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{TtsEngine, TtsError, Voice};

const API_URL: &str = "https://api.elevenlabs.io/v1";
const MODEL_ID: &str = "eleven_multilingual_v2";
const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// Starter tier: 40,000 characters a month for $5.
const COST_PER_CHARACTER: f64 = 5.0 / 40_000.0;

/// Shorter names for voices with unwieldy ones.
const NAMES: &[(&str, &str)] = &[("Sexy Female Villain Voice", "Sexy")];

const AVATARS: &[(&str, &str)] = &[
    ("Cooper", "https://i.imgur.com/3kXop0E.png"),
    ("Sexy", "https://i.imgur.com/xzeKYDH.png"),
];

pub fn display_name(name: &str) -> &str {
    NAMES
        .iter()
        .find(|(full, _)| *full == name)
        .map_or(name, |(_, short)| short)
}

pub fn avatar(name: &str) -> Option<String> {
    AVATARS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, url)| url.to_string())
}

pub fn cost(text: &str) -> String {
    let chars = text.chars().count();
    if chars == 0 {
        return "$0".to_string();
    }
    let cost = (chars as f64 * COST_PER_CHARACTER * 1e8).round() / 1e8;
    format!("${cost}")
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<ApiVoice>,
}

#[derive(Deserialize)]
struct ApiVoice {
    voice_id: String,
    name: Option<String>,
    category: Option<String>,
    description: Option<String>,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[derive(Clone)]
struct Api {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

pub struct ElevenLabsEngine {
    api: Api,
    voice_id: String,
}

#[async_trait]
impl TtsEngine for ElevenLabsEngine {
    async fn synthesize(&self, text: &str, path: &Path) -> Result<(), TtsError> {
        let url = format!("{}/text-to-speech/{}", self.api.base_url, self.voice_id);
        let response = self
            .api
            .http
            .post(url)
            .header("xi-api-key", &self.api.api_key)
            .query(&[("output_format", OUTPUT_FORMAT)])
            .json(&SpeechRequest {
                text,
                model_id: MODEL_ID,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Api {
                service: "ElevenLabs",
                message: format!("{status}: {body}"),
            });
        }

        let audio = response.bytes().await?;
        tokio::fs::write(path, &audio).await?;
        Ok(())
    }

    fn cost(&self, text: &str) -> String {
        cost(text)
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }
}

/// Lists the account's voices.
pub async fn load_voices(http: reqwest::Client, api_key: String) -> Result<Vec<Voice>, TtsError> {
    load_voices_from(http, api_key, API_URL).await
}

pub async fn load_voices_from(
    http: reqwest::Client,
    api_key: String,
    base_url: &str,
) -> Result<Vec<Voice>, TtsError> {
    let api = Api {
        http,
        api_key,
        base_url: base_url.trim_end_matches('/').to_string(),
    };

    let response = api
        .http
        .get(format!("{}/voices", api.base_url))
        .header("xi-api-key", &api.api_key)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(TtsError::Api {
            service: "ElevenLabs",
            message: response.status().to_string(),
        });
    }
    let body: VoicesResponse = response.json().await?;

    let voices = body
        .voices
        .into_iter()
        .filter_map(|v| {
            let name = display_name(v.name.as_deref()?).to_string();
            Some(Voice {
                avatar: avatar(&name),
                category: format!("ElevenLabs {}", v.category.as_deref().unwrap_or("voice")),
                description: v.description.unwrap_or_default(),
                engine: Arc::new(ElevenLabsEngine {
                    api: api.clone(),
                    voice_id: v.voice_id,
                }),
                name,
            })
        })
        .filter(|v| !v.name.is_empty())
        .collect();

    Ok(voices)
}
