pub mod format;
pub mod player;
pub mod queue;

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use serenity::model::id::{ChannelId, GuildId};
use songbird::tracks::TrackHandle;
use tokio::sync::RwLock;

pub const DEFAULT_VOLUME: f32 = 0.5;

/// Where the audio of a track comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackSource {
    /// A video page that yt-dlp resolves to a stream when playback starts.
    YouTube(String),
    /// A search that yt-dlp runs when playback starts.
    Search(String),
    /// A direct HTTP link to an audio file.
    Stream(String),
    /// A file on local disk (TTS output).
    File(PathBuf),
}

#[derive(Clone, Debug)]
pub struct Track {
    pub title: String,
    pub source: TrackSource,
    pub url: Option<String>,
    pub duration: Option<u64>,
    pub thumbnail: Option<String>,
    /// Stable id used for play counts (YouTube video id).
    pub key: Option<String>,
    pub requester: String,
}

impl Track {
    pub fn new(title: impl Into<String>, source: TrackSource) -> Self {
        Self {
            title: title.into(),
            source,
            url: None,
            duration: None,
            thumbnail: None,
            key: None,
            requester: String::new(),
        }
    }

    /// Markdown link to the track page, or the bare title.
    pub fn link(&self) -> String {
        match &self.url {
            Some(url) => format!("[{}]({url})", format::strip_brackets(&self.title)),
            None => self.title.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum LoopMode {
    #[default]
    Off,
    Song,
    Queue,
}

impl std::fmt::Display for LoopMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Song => write!(f, "repeat one"),
            Self::Queue => write!(f, "repeat all"),
        }
    }
}

impl std::str::FromStr for LoopMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "song" | "one" | "track" => Ok(Self::Song),
            "queue" | "all" => Ok(Self::Queue),
            other => Err(format!("unknown repeat mode `{other}`")),
        }
    }
}

/// Playback state of one voice session.
pub struct GuildQueue {
    pub tracks: VecDeque<Track>,
    pub current: Option<Track>,
    pub loop_mode: LoopMode,
    pub volume: f32,
    /// Bumped every time the session moves to another track. End events
    /// carrying an older value belong to a superseded track.
    pub generation: u64,
    pub track_handle: Option<TrackHandle>,
    /// Text channel that receives "now playing" announcements.
    pub announce_channel: Option<ChannelId>,
}

impl Default for GuildQueue {
    fn default() -> Self {
        Self {
            tracks: VecDeque::new(),
            current: None,
            loop_mode: LoopMode::Off,
            volume: DEFAULT_VOLUME,
            generation: 0,
            track_handle: None,
            announce_channel: None,
        }
    }
}

pub type QueueManager = Arc<RwLock<HashMap<GuildId, GuildQueue>>>;

pub fn new_queue_manager() -> QueueManager {
    Arc::new(RwLock::new(HashMap::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_mode_display() {
        assert_eq!(LoopMode::Off.to_string(), "off");
        assert_eq!(LoopMode::Song.to_string(), "repeat one");
        assert_eq!(LoopMode::Queue.to_string(), "repeat all");
    }

    #[test]
    fn test_loop_mode_parse() {
        assert_eq!("ONE".parse::<LoopMode>(), Ok(LoopMode::Song));
        assert_eq!("queue".parse::<LoopMode>(), Ok(LoopMode::Queue));
        assert_eq!("off".parse::<LoopMode>(), Ok(LoopMode::Off));
        assert!("sometimes".parse::<LoopMode>().is_err());
    }

    #[test]
    fn test_guild_queue_default() {
        let q = GuildQueue::default();
        assert!(q.tracks.is_empty());
        assert!(q.current.is_none());
        assert_eq!(q.loop_mode, LoopMode::Off);
        assert!((q.volume - DEFAULT_VOLUME).abs() < f32::EPSILON);
        assert!(q.track_handle.is_none());
        assert_eq!(q.generation, 0);
    }

    #[test]
    fn test_track_link() {
        let mut track = Track::new("Song (Live) [HD]", TrackSource::Stream("x".into()));
        assert_eq!(track.link(), "Song (Live) [HD]");
        track.url = Some("https://youtu.be/abc".into());
        assert_eq!(track.link(), "[Song Live HD](https://youtu.be/abc)");
    }
}
