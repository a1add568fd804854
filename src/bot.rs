//! The shared bot base: startup, presence and framework error reporting.

use std::sync::Arc;

use poise::serenity_prelude as serenity;
use poise::CreateReply;
use serenity::gateway::ActivityData;
use songbird::SerenityInit;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::audio::{new_queue_manager, player::Player};
use crate::config::Config;
use crate::dota::{dotabase::Dotabase, quiz};
use crate::imagegen::Gemini;
use crate::music::{genius::Genius, spotify::Spotify, youtube::YouTube, MusicSources};
use crate::store::Database;
use crate::utils::embed;
use crate::voice::{elevenlabs, fish, piper, VoiceLibrary};
use crate::{commands, events, Data, Error};

/// Permissions requested by the invite link.
const INVITE_PERMISSIONS: u64 = 1110453312;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    Dota,
    Music,
    Voice,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Self::Dota, Self::Music, Self::Voice];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Dota => "Dota Bot",
            Self::Music => "Music Bot",
            Self::Voice => "Voice Bot",
        }
    }

    /// Environment variable holding this bot's Discord token.
    pub fn token_var(&self) -> &'static str {
        match self {
            Self::Dota => "DOTABOT_DISCORD_SECRET_TOKEN",
            Self::Music => "MUSICBOT_DISCORD_SECRET_TOKEN",
            Self::Voice => "VOICEBOT_DISCORD_SECRET_TOKEN",
        }
    }

    /// Status line shown under the bot's name.
    pub fn activity_text(&self, guilds: usize) -> String {
        match self {
            Self::Dota => format!("DotA 2 in {guilds} servers! 🎮"),
            Self::Music => format!("Playing in {guilds} servers 🎧"),
            Self::Voice => format!("Watching {guilds} servers ✨"),
        }
    }

    pub fn commands(&self) -> Vec<poise::Command<Data, Error>> {
        match self {
            Self::Dota => commands::dota(),
            Self::Music => commands::music(),
            Self::Voice => commands::voice(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ActivityKind {
    Playing,
    Listening,
    Watching,
}

/// Reads the activity type off the front of a status line:
/// `"Watching 3 servers"` is watching `"3 servers"`. Anything else is playing.
pub fn parse_activity(text: &str) -> (ActivityKind, String) {
    for (prefix, kind) in [
        ("Playing ", ActivityKind::Playing),
        ("Listening to ", ActivityKind::Listening),
        ("Watching ", ActivityKind::Watching),
    ] {
        if let Some(rest) = text.strip_prefix(prefix) {
            return (kind, rest.to_string());
        }
    }
    (ActivityKind::Playing, text.to_string())
}

pub fn activity(text: &str) -> ActivityData {
    match parse_activity(text) {
        (ActivityKind::Playing, name) => ActivityData::playing(name),
        (ActivityKind::Listening, name) => ActivityData::listening(name),
        (ActivityKind::Watching, name) => ActivityData::watching(name),
    }
}

pub fn invite_link(application_id: u64) -> String {
    format!(
        "https://discordapp.com/oauth2/authorize?client_id={application_id}&scope=bot&permissions={INVITE_PERMISSIONS}"
    )
}

pub fn server_line(owner: &str, name: &str, id: u64, members: u64) -> String {
    format!(" -  {owner}: {name} ({id}) {members} members")
}

/// Logs every server the bot is in and refreshes the presence.
pub fn on_cache_ready(ctx: &serenity::Context, variant: Variant) {
    let guild_ids = ctx.cache.guilds();
    info!("listing {} servers", guild_ids.len());

    let mut total = 0;
    for guild_id in &guild_ids {
        let Some((name, owner_id, members)) = ctx
            .cache
            .guild(*guild_id)
            .map(|g| (g.name.clone(), g.owner_id, g.member_count))
        else {
            continue;
        };
        let owner = ctx
            .cache
            .user(owner_id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| owner_id.to_string());
        info!("{}", server_line(&owner, &name, guild_id.get(), members));
        total += members;
    }
    info!("total members: {total}");

    ctx.set_activity(Some(activity(&variant.activity_text(guild_ids.len()))));
}

async fn load_voices(http: &reqwest::Client, config: &Config) -> VoiceLibrary {
    let mut voices = Vec::new();

    match &config.elevenlabs_api_key {
        Some(key) => match elevenlabs::load_voices(http.clone(), key.clone()).await {
            Ok(v) => {
                info!("loaded {} ElevenLabs voices", v.len());
                voices.extend(v);
            }
            Err(e) => warn!("could not load ElevenLabs voices: {e}"),
        },
        None => warn!("ELEVENLABS_API_KEY is not set, ElevenLabs voices are disabled"),
    }

    let piper_voices = piper::load_voices(http, &config.models_dir).await;
    info!("loaded {} Piper voices", piper_voices.len());
    voices.extend(piper_voices);

    if let Some(url) = &config.fish_api_url {
        let fish_voices = fish::load_voices(http, url, &config.models_dir);
        info!("loaded {} Fish voices", fish_voices.len());
        voices.extend(fish_voices);
    }

    VoiceLibrary::new(voices, &config.audio_dir)
}

async fn build_data(ctx: &serenity::Context, variant: Variant, config: Config, db: Arc<Database>) -> Data {
    let http_client = reqwest::Client::new();
    let player = Player::new(
        new_queue_manager(),
        http_client.clone(),
        ctx.http.clone(),
        db.clone(),
    );

    let mut data = Data {
        variant,
        config,
        http_client,
        db,
        player,
        music: None,
        genius: None,
        voices: None,
        gemini: None,
        dotabase: None,
        quiz_words: Vec::new(),
        quizzes: quiz::ActiveQuizzes::default(),
        leave_timers: Default::default(),
    };
    let config = &data.config;
    let http = &data.http_client;

    match variant {
        Variant::Music => {
            if config.youtube_api_key.is_none() {
                warn!("YOUTUBE_API_KEY is not set, searching with yt-dlp");
            }
            let youtube = YouTube::new(http.clone(), config.youtube_api_key.clone());
            let spotify = match (&config.spotify_client_id, &config.spotify_client_secret) {
                (Some(id), Some(secret)) => Some(Spotify::new(http.clone(), id.clone(), secret.clone())),
                _ => {
                    warn!("Spotify credentials are not set, Spotify links are disabled");
                    None
                }
            };
            data.music = Some(MusicSources::new(youtube, spotify, data.db.clone()));
            data.genius = match &config.genius_api_key {
                Some(key) => Some(Genius::new(http.clone(), key.clone())),
                None => {
                    warn!("GENIUS_API_KEY is not set, /lyrics is disabled");
                    None
                }
            };
        }
        Variant::Voice => {
            let voices = load_voices(http, config).await;
            if voices.is_empty() {
                warn!("no TTS voices are available");
            }
            if let Err(e) = tokio::fs::create_dir_all(&config.image_dir).await {
                warn!("could not create {}: {e}", config.image_dir.display());
            }
            data.gemini = match &config.gemini_api_key {
                Some(key) => Some(Gemini::new(http.clone(), key.clone())),
                None => {
                    warn!("GEMINI_API_KEY is not set, image generation is disabled");
                    None
                }
            };
            data.voices = Some(voices);
        }
        Variant::Dota => match Dotabase::open(&config.dotabase_path) {
            Ok(dotabase) => {
                data.quiz_words = quiz::load_words(&dotabase).unwrap_or_else(|e| {
                    warn!("could not load quiz words: {e}");
                    Vec::new()
                });
                data.dotabase = Some(dotabase);
            }
            Err(e) => warn!(
                "could not open dotabase at {}: {e}",
                config.dotabase_path.display()
            ),
        },
    }

    data
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("/{} failed: {error}", ctx.command().qualified_name);
            let reply = CreateReply::default()
                .embed(embed::error(&error.to_string()))
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                warn!("could not report command error: {e}");
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("error while handling error: {e}");
            }
        }
    }
}

/// Starts `variant` and runs until the gateway connection ends.
pub async fn run(variant: Variant) {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env(variant) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let db_path = config.database_path(variant);
    let db = match Database::open(&db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("could not open {}: {e}", db_path.display());
            std::process::exit(1);
        }
    };

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let token = config.discord_token.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: variant.commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                let commands = &framework.options().commands;
                info!("syncing {} commands to all servers:", commands.len());
                for command in commands {
                    info!(
                        "   /{} - {}",
                        command.name,
                        command.description.as_deref().unwrap_or_default()
                    );
                }
                poise::builtins::register_globally(ctx, commands).await?;

                info!("logged in as {}", ready.user.name);
                info!("invite the bot with {}", invite_link(ready.application.id.get()));

                Ok(build_data(ctx, variant, config, db).await)
            })
        })
        .build();

    info!("starting {}", variant.name());
    let client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .register_songbird()
        .await;

    let mut client = match client {
        Ok(client) => client,
        Err(e) => {
            error!("could not create client: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = client.start().await {
        error!("client error: {e}");
    }
}
