use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use tracing::debug;

use super::{TtsEngine, TtsError, Voice};

const CATEGORY: &str = "Fish";

/// A cloned voice: `<models>/<name>/` holding `<name>.wav` (or `.mp3`),
/// the clip's transcript in `<name>.txt` and optionally `avatar.txt`.
#[derive(Debug, PartialEq)]
pub struct FishModel {
    pub name: String,
    pub reference_audio: PathBuf,
    pub transcript: PathBuf,
    pub avatar: Option<String>,
}

/// Finds usable model directories. Directories without a reference clip
/// or transcript are skipped.
pub fn discover(models_dir: &Path) -> Vec<FishModel> {
    let Ok(entries) = std::fs::read_dir(models_dir) else {
        return Vec::new();
    };

    let mut models: Vec<FishModel> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter_map(|dir| {
            let name = dir.file_name()?.to_str()?.to_string();
            let reference_audio = ["wav", "mp3"]
                .iter()
                .map(|ext| dir.join(format!("{name}.{ext}")))
                .find(|p| p.is_file());
            let Some(reference_audio) = reference_audio else {
                debug!("skipping {name}: no reference clip");
                return None;
            };
            let transcript = dir.join(format!("{name}.txt"));
            if !transcript.is_file() {
                debug!("skipping {name}: no transcript");
                return None;
            }
            let avatar = std::fs::read_to_string(dir.join("avatar.txt"))
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            Some(FishModel {
                name,
                reference_audio,
                transcript,
                avatar,
            })
        })
        .collect();

    models.sort_by(|a, b| a.name.cmp(&b.name));
    models
}

#[derive(Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    references: Vec<Reference>,
    format: &'a str,
    chunk_length: u32,
    top_p: f32,
    repetition_penalty: f32,
    temperature: f32,
}

#[derive(Serialize)]
struct Reference {
    audio: String,
    text: String,
}

/// Talks to a Fish Speech server.
pub struct FishEngine {
    http: reqwest::Client,
    api_url: String,
    model: FishModel,
}

#[async_trait]
impl TtsEngine for FishEngine {
    async fn synthesize(&self, text: &str, path: &Path) -> Result<(), TtsError> {
        let audio = tokio::fs::read(&self.model.reference_audio).await?;
        let transcript = tokio::fs::read_to_string(&self.model.transcript).await?;

        let request = TtsRequest {
            text,
            references: vec![Reference {
                audio: base64::engine::general_purpose::STANDARD.encode(audio),
                text: transcript.trim().to_string(),
            }],
            format: "mp3",
            chunk_length: 200,
            top_p: 0.7,
            repetition_penalty: 1.2,
            temperature: 0.7,
        };

        let response = self
            .http
            .post(format!("{}/v1/tts", self.api_url))
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Api {
                service: "Fish Speech",
                message: format!("{status}: {body}"),
            });
        }

        tokio::fs::write(path, response.bytes().await?).await?;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }
}

pub fn load_voices(http: &reqwest::Client, api_url: &str, models_dir: &Path) -> Vec<Voice> {
    discover(models_dir)
        .into_iter()
        .map(|model| Voice {
            name: model.name.clone(),
            category: CATEGORY.to_string(),
            description: String::new(),
            avatar: model.avatar.clone(),
            engine: Arc::new(FishEngine {
                http: http.clone(),
                api_url: api_url.trim_end_matches('/').to_string(),
                model,
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let glados = root.join("glados");
        std::fs::create_dir(&glados).unwrap();
        std::fs::write(glados.join("glados.mp3"), b"").unwrap();
        std::fs::write(glados.join("glados.txt"), "Hello and welcome").unwrap();
        std::fs::write(glados.join("avatar.txt"), "https://i.imgur.com/g.png\n").unwrap();

        let mute = root.join("mute");
        std::fs::create_dir(&mute).unwrap();
        std::fs::write(mute.join("mute.txt"), "no clip").unwrap();

        let untranscribed = root.join("bob");
        std::fs::create_dir(&untranscribed).unwrap();
        std::fs::write(untranscribed.join("bob.wav"), b"").unwrap();

        // Piper keeps its models next to these.
        std::fs::create_dir(root.join("piper")).unwrap();

        let models = discover(root);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name, "glados");
        assert_eq!(models[0].reference_audio, glados.join("glados.mp3"));
        assert_eq!(models[0].avatar.as_deref(), Some("https://i.imgur.com/g.png"));
    }

    #[test]
    fn test_missing_models_dir() {
        assert!(discover(Path::new("/definitely/not/here")).is_empty());
    }
}
