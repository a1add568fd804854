use std::collections::HashMap;
use std::path::PathBuf;

use cogbots::bot::Variant;
use cogbots::config::{Config, ConfigError};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_missing_token_is_an_error() {
    let result = Config::from_lookup(Variant::Music, lookup(&[]));
    assert!(matches!(
        result,
        Err(ConfigError::MissingToken("MUSICBOT_DISCORD_SECRET_TOKEN"))
    ));
}

#[test]
fn test_blank_token_counts_as_missing() {
    let result = Config::from_lookup(
        Variant::Dota,
        lookup(&[("DOTABOT_DISCORD_SECRET_TOKEN", "  ")]),
    );
    assert!(result.is_err());
}

#[test]
fn test_variant_token_wins_over_fallback() {
    let config = Config::from_lookup(
        Variant::Voice,
        lookup(&[
            ("VOICEBOT_DISCORD_SECRET_TOKEN", "voice"),
            ("DISCORD_BOT_SECRET_TOKEN", "shared"),
        ]),
    )
    .unwrap();
    assert_eq!(config.discord_token, "voice");

    let config = Config::from_lookup(
        Variant::Dota,
        lookup(&[("DISCORD_BOT_SECRET_TOKEN", "shared")]),
    )
    .unwrap();
    assert_eq!(config.discord_token, "shared");
}

#[test]
fn test_defaults() {
    let config = Config::from_lookup(
        Variant::Music,
        lookup(&[("MUSICBOT_DISCORD_SECRET_TOKEN", "t")]),
    )
    .unwrap();

    assert!(config.youtube_api_key.is_none());
    assert!(config.gemini_api_key.is_none());
    assert_eq!(config.dotabase_path, PathBuf::from("dotabase.db"));
    assert_eq!(config.audio_dir, PathBuf::from("audio"));
    assert_eq!(config.image_dir, PathBuf::from("images"));
    assert_eq!(config.models_dir, PathBuf::from("models"));
    assert_eq!(
        config.database_path(Variant::Music),
        PathBuf::from("database-Music_Bot.sqlite")
    );
}

#[test]
fn test_overrides() {
    let config = Config::from_lookup(
        Variant::Voice,
        lookup(&[
            ("VOICEBOT_DISCORD_SECRET_TOKEN", "t"),
            ("GEMINI_API_KEY", "g"),
            ("COGBOTS_DB_PATH", "/data/bot.sqlite"),
            ("COGBOTS_IMAGE_DIR", "/data/images"),
        ]),
    )
    .unwrap();

    assert_eq!(config.gemini_api_key.as_deref(), Some("g"));
    assert_eq!(config.image_dir, PathBuf::from("/data/images"));
    assert_eq!(
        config.database_path(Variant::Voice),
        PathBuf::from("/data/bot.sqlite")
    );
}
