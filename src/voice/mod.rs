//! Text-to-speech voices and the `;` message cog that speaks with them.

pub mod elevenlabs;
pub mod fish;
pub mod handler;
pub mod piper;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::utils::messaging::{bold, code};

pub const PREFIX: &str = ";";
pub const MAX_TTS_LENGTH: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{service} error: {message}")]
    Api {
        service: &'static str,
        message: String,
    },
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("piper failed: {0}")]
    Piper(String),
}

/// A speech backend.
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// Writes the spoken `text` to `path`.
    async fn synthesize(&self, text: &str, path: &Path) -> Result<(), TtsError>;

    /// Price of speaking `text`, e.g. `$0.00125`.
    fn cost(&self, _text: &str) -> String {
        "$0".to_string()
    }

    /// File extension of the produced audio.
    fn extension(&self) -> &'static str;
}

#[derive(Clone)]
pub struct Voice {
    pub name: String,
    pub category: String,
    pub description: String,
    pub avatar: Option<String>,
    pub engine: Arc<dyn TtsEngine>,
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish()
    }
}

pub struct VoiceLibrary {
    voices: Vec<Voice>,
    cache_dir: PathBuf,
}

impl VoiceLibrary {
    /// Spoken messages are cached under `<audio_dir>/tts`.
    pub fn new(voices: Vec<Voice>, audio_dir: &Path) -> Self {
        Self {
            voices,
            cache_dir: audio_dir.join("tts"),
        }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// First voice whose name contains `word`, ignoring case.
    pub fn find(&self, word: &str) -> Option<&Voice> {
        if word.is_empty() {
            return None;
        }
        let word = word.to_lowercase();
        self.voices
            .iter()
            .find(|v| v.name.to_lowercase().contains(&word))
    }

    /// The same message always gets the same voice.
    pub fn pick(&self, message_id: u64) -> Option<&Voice> {
        let mut rng = StdRng::seed_from_u64(message_id);
        self.voices.choose(&mut rng)
    }

    /// Splits `;<voice> <text>` or `;<text>` into a voice and the text to
    /// speak.
    pub fn select(&self, content: &str, message_id: u64) -> Option<(&Voice, String)> {
        let text = message_text(content);
        let first_word = text.split(' ').next().unwrap_or_default();

        if let Some(voice) = self.find(first_word.trim_matches(|c| PREFIX.contains(c))) {
            if let Some((_, rest)) = text.split_once(' ') {
                let rest = rest.trim();
                if !rest.is_empty() {
                    return Some((voice, rest.to_string()));
                }
            }
        }

        self.pick(message_id).map(|v| (v, text.to_string()))
    }

    pub fn audio_path(&self, message_id: u64, voice: &Voice) -> PathBuf {
        self.cache_dir
            .join(format!("{message_id}.{}", voice.engine.extension()))
    }

    /// Voice list grouped by category, for `;help`.
    pub fn help_text(&self) -> String {
        let categories: BTreeSet<&str> = self.voices.iter().map(|v| v.category.as_str()).collect();
        let mut sorted: Vec<&Voice> = self.voices.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let sections: Vec<String> = categories
            .into_iter()
            .map(|category| {
                let names: String = sorted
                    .iter()
                    .filter(|v| v.category == category)
                    .map(|v| format!(" {}", code(&v.name)))
                    .collect();
                format!("{} voices:\n{names}\n", bold(category))
            })
            .collect();

        format!(
            "Usage: `{PREFIX}[text]` or `{PREFIX}[voice] [text]`\n\n{}",
            sections.join("-----------\n")
        )
    }
}

/// Everything after the prefix, voice name included.
pub fn message_text(content: &str) -> &str {
    content.strip_prefix(PREFIX).unwrap_or(content).trim()
}

/// Length limit check, counted in characters.
pub fn check_length(text: &str) -> Result<(), String> {
    if text.chars().count() > MAX_TTS_LENGTH {
        Err(format!(
            "Message too long, please keep it under {MAX_TTS_LENGTH} characters."
        ))
    } else {
        Ok(())
    }
}

/// Footer under a spoken message:
/// `- <voice> (by @<author>) [(🔄 by @<user>)] cost: <cost>`.
pub fn footer(voice: &str, author: &str, replayed_by: Option<&str>, cost: &str) -> String {
    let mut parts = vec![format!("- {voice}"), format!("(by @{author})")];
    if let Some(user) = replayed_by {
        parts.push(format!("(🔄 by @{user})"));
    }
    parts.push(format!("cost: {cost}"));
    parts.join(" ")
}
