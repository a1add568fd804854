use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

use super::{TtsEngine, TtsError, Voice};

const MODELS_URL: &str = "https://huggingface.co/rhasspy/piper-voices/resolve/v1.0.0";
const CATEGORY: &str = "Piper TTS (local)";

pub struct PiperModel {
    pub name: &'static str,
    pub alias: Option<&'static str>,
    pub language: &'static str,
    pub quality: &'static str,
    pub description: &'static str,
    pub avatar: &'static str,
}

pub const MODELS: &[PiperModel] = &[
    PiperModel {
        name: "lessac",
        alias: Some("Piper"),
        language: "en_US",
        quality: "medium",
        description: "A clear, professional American English voice",
        avatar: "https://i.imgur.com/WSK1NDK.png",
    },
    PiperModel {
        name: "bryce",
        alias: None,
        language: "en_US",
        quality: "medium",
        description: "A clear, professional American English voice",
        avatar: "https://i.imgur.com/x1kEi7m.png",
    },
    PiperModel {
        name: "norman",
        alias: None,
        language: "en_US",
        quality: "medium",
        description: "A clear, professional American English voice",
        avatar: "https://i.imgur.com/Jb6bAIQ.png",
    },
];

impl PiperModel {
    /// `en_US-lessac-medium`
    pub fn file_stem(&self) -> String {
        format!("{}-{}-{}", self.language, self.name, self.quality)
    }

    /// Download URL without extension, e.g.
    /// `.../en/en_US/lessac/medium/en_US-lessac-medium`.
    pub fn model_url(&self) -> String {
        let family = self.language.split('_').next().unwrap_or(self.language);
        format!(
            "{MODELS_URL}/{family}/{}/{}/{}/{}",
            self.language,
            self.name,
            self.quality,
            self.file_stem()
        )
    }

    /// Name shown to users: the alias, or the capitalized model name.
    pub fn display_name(&self) -> String {
        if let Some(alias) = self.alias {
            return alias.to_string();
        }
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Runs the local `piper` executable.
pub struct PiperEngine {
    model: PathBuf,
}

#[async_trait]
impl TtsEngine for PiperEngine {
    async fn synthesize(&self, text: &str, path: &Path) -> Result<(), TtsError> {
        let mut child = Command::new("piper")
            .arg("--model")
            .arg(&self.model)
            .arg("--output_file")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TtsError::Piper(stderr.trim().to_string()));
        }
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "wav"
    }
}

async fn download(http: &reqwest::Client, url: &str, path: &Path) -> Result<(), TtsError> {
    let response = http.get(url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;
    tokio::fs::write(path, &bytes).await?;
    Ok(())
}

/// Piper voices, downloading missing models into `<models_dir>/piper`.
/// Voices whose model cannot be fetched are left out.
pub async fn load_voices(http: &reqwest::Client, models_dir: &Path) -> Vec<Voice> {
    let dir = models_dir.join("piper");
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        warn!("could not create {}: {e}", dir.display());
        return Vec::new();
    }

    let mut voices = Vec::new();
    for model in MODELS {
        let onnx = dir.join(format!("{}.onnx", model.file_stem()));
        let config = dir.join(format!("{}.onnx.json", model.file_stem()));

        for (path, suffix) in [(&onnx, ".onnx"), (&config, ".onnx.json")] {
            if path.exists() {
                continue;
            }
            let url = format!("{}{suffix}?download=true", model.model_url());
            info!("downloading piper model {}", path.display());
            if let Err(e) = download(http, &url, path).await {
                warn!("could not download {url}: {e}");
                let _ = tokio::fs::remove_file(path).await;
            }
        }

        if !onnx.exists() || !config.exists() {
            continue;
        }

        voices.push(Voice {
            name: model.display_name(),
            category: CATEGORY.to_string(),
            description: model.description.to_string(),
            avatar: Some(model.avatar.to_string()),
            engine: Arc::new(PiperEngine { model: onnx }),
        });
    }
    voices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_url() {
        assert_eq!(
            MODELS[0].model_url(),
            "https://huggingface.co/rhasspy/piper-voices/resolve/v1.0.0/en/en_US/lessac/medium/en_US-lessac-medium"
        );
    }

    #[test]
    fn test_display_names() {
        let names: Vec<String> = MODELS.iter().map(PiperModel::display_name).collect();
        assert_eq!(names, ["Piper", "Bryce", "Norman"]);
    }

    #[tokio::test]
    async fn test_existing_models_are_not_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let piper = dir.path().join("piper");
        std::fs::create_dir_all(&piper).unwrap();
        for model in MODELS {
            std::fs::write(piper.join(format!("{}.onnx", model.file_stem())), b"").unwrap();
            std::fs::write(piper.join(format!("{}.onnx.json", model.file_stem())), b"{}").unwrap();
        }

        // An unroutable client would fail any download attempt.
        let http = reqwest::Client::builder()
            .proxy(reqwest::Proxy::all("http://127.0.0.1:9").unwrap())
            .build()
            .unwrap();
        let voices = load_voices(&http, dir.path()).await;
        assert_eq!(voices.len(), 3);
        assert!(voices.iter().all(|v| v.engine.extension() == "wav"));
    }
}
