pub mod audio;
pub mod bot;
pub mod commands;
pub mod config;
pub mod dota;
pub mod events;
pub mod imagegen;
pub mod music;
pub mod store;
pub mod utils;
pub mod voice;

use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// State shared by every command and event handler of one bot.
pub struct Data {
    pub variant: bot::Variant,
    pub config: config::Config,
    pub http_client: reqwest::Client,
    pub db: Arc<store::Database>,
    pub player: audio::player::Player,
    pub music: Option<music::MusicSources>,
    pub genius: Option<music::genius::Genius>,
    pub voices: Option<voice::VoiceLibrary>,
    pub gemini: Option<imagegen::Gemini>,
    pub dotabase: Option<dota::dotabase::Dotabase>,
    pub quiz_words: Vec<dota::quiz::Word>,
    pub quizzes: dota::quiz::ActiveQuizzes,
    pub leave_timers: events::voice_state::LeaveTimers,
}
