pub mod genius;
pub mod spotify;
pub mod youtube;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::audio::{Track, TrackSource};
use crate::store::{Database, StoredTrack};

pub use genius::Genius;
pub use spotify::Spotify;
pub use youtube::YouTube;

#[derive(Debug, thiserror::Error)]
pub enum MusicError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{service} error: {message}")]
    Api {
        service: &'static str,
        message: String,
    },
    #[error("could not find a track for `{0}`")]
    NotFound(String),
    #[error("yt-dlp failed: {0}")]
    YtDlp(String),
    #[error("could not run yt-dlp: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Spotify links need SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET")]
    SpotifyDisabled,
}

/// What a `/play` query points at.
#[derive(Debug, PartialEq)]
pub enum QueryKind {
    SpotifyTrack(String),
    SpotifyPlaylist(String),
    YouTubeVideo(String),
    YouTubePlaylist(String),
    Search(String),
}

pub fn classify(query: &str) -> QueryKind {
    let query = query.trim();
    if query.contains("spotify.com") {
        if let Some(id) = spotify::spotify_id(query, "track") {
            return QueryKind::SpotifyTrack(id);
        }
        if let Some(id) = spotify::spotify_id(query, "playlist") {
            return QueryKind::SpotifyPlaylist(id);
        }
    }
    if query.contains("youtube.com") || query.contains("youtu.be") {
        if let Some(id) = youtube::video_id(query) {
            return QueryKind::YouTubeVideo(id);
        }
        if youtube::playlist_id(query).is_some() {
            return QueryKind::YouTubePlaylist(query.to_string());
        }
    }
    QueryKind::Search(query.to_string())
}

/// Result of resolving a query.
pub enum Resolved {
    Track(Track),
    Playlist {
        name: String,
        url: Option<String>,
        tracks: Vec<Track>,
    },
}

/// YouTube and Spotify lookups behind one entry point.
pub struct MusicSources {
    pub youtube: YouTube,
    pub spotify: Option<Spotify>,
    db: Arc<Database>,
}

impl MusicSources {
    pub fn new(youtube: YouTube, spotify: Option<Spotify>, db: Arc<Database>) -> Self {
        Self {
            youtube,
            spotify,
            db,
        }
    }

    pub async fn resolve(&self, query: &str) -> Result<Resolved, MusicError> {
        match classify(query) {
            QueryKind::SpotifyTrack(id) => {
                let spotify = self.spotify.as_ref().ok_or(MusicError::SpotifyDisabled)?;
                let info = spotify.track(&id).await?;
                let mut track = self.search(&info.search_query()).await?;
                track.thumbnail = track.thumbnail.or(info.thumbnail);
                Ok(Resolved::Track(track))
            }
            QueryKind::SpotifyPlaylist(id) => {
                let spotify = self.spotify.as_ref().ok_or(MusicError::SpotifyDisabled)?;
                let playlist = spotify.playlist(&id).await?;
                let tracks = playlist.tracks.iter().map(|t| t.to_track()).collect();
                Ok(Resolved::Playlist {
                    name: playlist.name,
                    url: playlist.url,
                    tracks,
                })
            }
            QueryKind::YouTubeVideo(id) => Ok(Resolved::Track(self.youtube.video(&id, query).await?)),
            QueryKind::YouTubePlaylist(url) => {
                let (name, tracks) = self.youtube.playlist(&url).await?;
                Ok(Resolved::Playlist {
                    name,
                    url: Some(url),
                    tracks,
                })
            }
            QueryKind::Search(q) => Ok(Resolved::Track(self.search(&q).await?)),
        }
    }

    /// Free text search, answered from the track cache when possible.
    pub async fn search(&self, query: &str) -> Result<Track, MusicError> {
        match self.db.find_track_by_query(query) {
            Ok(Some(stored)) => {
                debug!("track cache hit for {query}");
                return Ok(from_stored(stored));
            }
            Ok(None) => {}
            Err(e) => warn!("track cache lookup failed: {e}"),
        }

        let track = self.youtube.search(query).await?;
        if let Some(key) = &track.key {
            let stored = StoredTrack {
                id: key.clone(),
                title: track.title.clone(),
                duration: track.duration.unwrap_or(0),
                query: Some(query.to_string()),
                youtube_url: track.url.clone(),
                thumbnail: track.thumbnail.clone(),
                ..Default::default()
            };
            if let Err(e) = self.db.save_track(&stored) {
                warn!("could not cache track {key}: {e}");
            }
        }
        Ok(track)
    }
}

fn from_stored(stored: StoredTrack) -> Track {
    let url = stored
        .youtube_url
        .unwrap_or_else(|| youtube::short_url(&stored.id));
    let mut track = Track::new(stored.title, TrackSource::YouTube(url.clone()));
    track.url = Some(url);
    track.duration = (stored.duration > 0).then_some(stored.duration);
    track.thumbnail = stored.thumbnail;
    track.key = Some(stored.id);
    track
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            classify("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=abc"),
            QueryKind::SpotifyTrack("4uLU6hMCjMI75M1A2tKUQC".into())
        );
        assert_eq!(
            classify("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M"),
            QueryKind::SpotifyPlaylist("37i9dQZF1DXcBWIGoYBM5M".into())
        );
        assert_eq!(
            classify("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123"),
            QueryKind::YouTubeVideo("dQw4w9WgXcQ".into())
        );
        assert_eq!(
            classify("https://youtube.com/playlist?list=PL123"),
            QueryKind::YouTubePlaylist("https://youtube.com/playlist?list=PL123".into())
        );
        assert_eq!(
            classify("  never gonna give you up "),
            QueryKind::Search("never gonna give you up".into())
        );
    }

    #[tokio::test]
    async fn test_search_uses_cache() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.save_track(&StoredTrack {
            id: "dQw4w9WgXcQ".into(),
            title: "Never Gonna Give You Up".into(),
            duration: 212,
            query: Some("rick".into()),
            ..Default::default()
        })
        .unwrap();

        // The base URL is unreachable: a cache miss would fail.
        let youtube = YouTube::with_base_url(
            reqwest::Client::new(),
            Some("key".into()),
            "http://127.0.0.1:9",
        );
        let sources = MusicSources::new(youtube, None, db);

        let track = sources.search("rick").await.unwrap();
        assert_eq!(track.key.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(track.duration, Some(212));
        assert!(sources.search("uncached").await.is_err());
    }

    #[tokio::test]
    async fn test_spotify_link_without_credentials() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let youtube = YouTube::new(reqwest::Client::new(), None);
        let sources = MusicSources::new(youtube, None, db);
        let result = sources
            .resolve("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC")
            .await;
        assert!(matches!(result, Err(MusicError::SpotifyDisabled)));
    }
}
