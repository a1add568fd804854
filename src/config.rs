use std::path::PathBuf;

use crate::bot::Variant;

/// Token used when the variant's own variable is not set.
pub const FALLBACK_TOKEN_VAR: &str = "DISCORD_BOT_SECRET_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} (or {FALLBACK_TOKEN_VAR}) must be set")]
    MissingToken(&'static str),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub youtube_api_key: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub genius_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub fish_api_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub dotabase_path: PathBuf,
    /// Overrides the per-bot `database-<name>.sqlite`.
    pub db_path: Option<PathBuf>,
    pub audio_dir: PathBuf,
    pub image_dir: PathBuf,
    pub models_dir: PathBuf,
}

impl Config {
    pub fn from_env(variant: Variant) -> Result<Self, ConfigError> {
        Self::from_lookup(variant, |key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(variant: Variant, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let path_or = |key: &str, default: &str| PathBuf::from(get(key).unwrap_or_else(|| default.to_string()));

        let discord_token = get(variant.token_var())
            .or_else(|| get(FALLBACK_TOKEN_VAR))
            .ok_or(ConfigError::MissingToken(variant.token_var()))?;

        Ok(Self {
            discord_token,
            youtube_api_key: get("YOUTUBE_API_KEY"),
            spotify_client_id: get("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: get("SPOTIFY_CLIENT_SECRET"),
            genius_api_key: get("GENIUS_API_KEY"),
            elevenlabs_api_key: get("ELEVENLABS_API_KEY"),
            fish_api_url: get("FISH_API_URL"),
            gemini_api_key: get("GEMINI_API_KEY"),
            dotabase_path: path_or("DOTABASE_PATH", "dotabase.db"),
            db_path: get("COGBOTS_DB_PATH").map(PathBuf::from),
            audio_dir: path_or("COGBOTS_AUDIO_DIR", "audio"),
            image_dir: path_or("COGBOTS_IMAGE_DIR", "images"),
            models_dir: path_or("COGBOTS_MODELS_DIR", "models"),
        })
    }

    /// Settings database for `variant`, e.g. `database-Music_Bot.sqlite`.
    pub fn database_path(&self, variant: Variant) -> PathBuf {
        self.db_path.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "database-{}.sqlite",
                variant.name().replace(' ', "_")
            ))
        })
    }
}
