use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;

use super::youtube::MAX_PLAYLIST_TRACKS;
use super::MusicError;
use crate::audio::{Track, TrackSource};

const ACCOUNTS_URL: &str = "https://accounts.spotify.com/api/token";
const API_URL: &str = "https://api.spotify.com/v1";

/// Pulls the id out of `open.spotify.com/<kind>/<id>?si=...` links.
pub fn spotify_id(link: &str, kind: &str) -> Option<String> {
    let (_, rest) = link.split_once(&format!("{kind}/"))?;
    let id = rest.split(['?', '/', '#']).next()?;
    (!id.is_empty()).then(|| id.to_string())
}

#[derive(Clone, Debug, Deserialize)]
pub struct SpotifyTrack {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    pub album: Option<Album>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Image {
    pub url: String,
}

/// Track metadata in Spotify terms.
pub struct TrackInfo {
    pub title: String,
    pub duration: u64,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
}

impl TrackInfo {
    /// What to search on YouTube to find something playable.
    pub fn search_query(&self) -> String {
        self.title.clone()
    }

    /// A queue entry that is searched on YouTube when it starts playing.
    pub fn to_track(&self) -> Track {
        let mut track = Track::new(self.title.clone(), TrackSource::Search(self.search_query()));
        track.url = self.url.clone();
        track.duration = (self.duration > 0).then_some(self.duration);
        track.thumbnail = self.thumbnail.clone();
        track
    }
}

impl From<SpotifyTrack> for TrackInfo {
    fn from(track: SpotifyTrack) -> Self {
        let title = match track.artists.first() {
            Some(artist) => format!("{} - {}", artist.name, track.name),
            None => track.name,
        };
        Self {
            title,
            duration: track.duration_ms / 1000,
            url: track.external_urls.spotify,
            thumbnail: track
                .album
                .and_then(|a| a.images.into_iter().next())
                .map(|i| i.url),
        }
    }
}

pub struct PlaylistInfo {
    pub name: String,
    pub url: Option<String>,
    pub tracks: Vec<TrackInfo>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct PlaylistResponse {
    name: String,
    #[serde(default)]
    external_urls: ExternalUrls,
    tracks: PlaylistPage,
}

#[derive(Deserialize)]
struct PlaylistPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    track: Option<SpotifyTrack>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client credentials flow; the token is cached until shortly before it
/// expires.
pub struct Spotify {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    accounts_url: String,
    api_url: String,
    token: Mutex<Option<(String, Instant)>>,
}

impl Spotify {
    pub fn new(http: reqwest::Client, client_id: String, client_secret: String) -> Self {
        Self::with_base_urls(http, client_id, client_secret, ACCOUNTS_URL, API_URL)
    }

    pub fn with_base_urls(
        http: reqwest::Client,
        client_id: String,
        client_secret: String,
        accounts_url: &str,
        api_url: &str,
    ) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            accounts_url: accounts_url.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        }
    }

    async fn token(&self) -> Result<String, MusicError> {
        let mut cached = self.token.lock().await;
        if let Some((token, expires)) = cached.as_ref() {
            if Instant::now() < *expires {
                return Ok(token.clone());
            }
        }

        let response = self
            .http
            .post(&self.accounts_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(MusicError::Api {
                service: "Spotify",
                message: format!("token request failed with {}", response.status()),
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in.saturating_sub(60));
        info!("fetched Spotify token valid for {}s", lifetime.as_secs());
        *cached = Some((token.access_token.clone(), Instant::now() + lifetime));
        Ok(token.access_token)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, MusicError> {
        let token = self.token().await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(MusicError::Api {
                service: "Spotify",
                message,
            });
        }

        Ok(response.json().await?)
    }

    pub async fn track(&self, id: &str) -> Result<TrackInfo, MusicError> {
        let track: SpotifyTrack = self.get(&format!("{}/tracks/{id}", self.api_url)).await?;
        Ok(track.into())
    }

    pub async fn playlist(&self, id: &str) -> Result<PlaylistInfo, MusicError> {
        let playlist: PlaylistResponse =
            self.get(&format!("{}/playlists/{id}", self.api_url)).await?;

        let mut tracks: Vec<TrackInfo> = playlist
            .tracks
            .items
            .into_iter()
            .filter_map(|item| item.track)
            .map(TrackInfo::from)
            .collect();

        let mut next = playlist.tracks.next;
        while let Some(url) = next.take() {
            if tracks.len() >= MAX_PLAYLIST_TRACKS {
                break;
            }
            let page: PlaylistPage = self.get(&url).await?;
            tracks.extend(page.items.into_iter().filter_map(|i| i.track).map(TrackInfo::from));
            next = page.next;
        }
        tracks.truncate(MAX_PLAYLIST_TRACKS);

        Ok(PlaylistInfo {
            name: playlist.name,
            url: playlist.external_urls.spotify,
            tracks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spotify_id() {
        assert_eq!(
            spotify_id("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=1", "track")
                .as_deref(),
            Some("4uLU6hMCjMI75M1A2tKUQC")
        );
        assert_eq!(
            spotify_id("https://open.spotify.com/playlist/37i9dQZF1DX", "playlist").as_deref(),
            Some("37i9dQZF1DX")
        );
        assert_eq!(spotify_id("https://open.spotify.com/album/xyz", "track"), None);
        assert_eq!(spotify_id("https://open.spotify.com/track/", "track"), None);
    }

    #[test]
    fn test_track_info_from_api() {
        let json = r#"{
            "name": "Never Gonna Give You Up",
            "artists": [{"name": "Rick Astley"}, {"name": "Someone Else"}],
            "duration_ms": 213573,
            "external_urls": {"spotify": "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"},
            "album": {"images": [{"url": "https://i.scdn.co/image/big"}, {"url": "https://i.scdn.co/image/small"}]}
        }"#;
        let track: SpotifyTrack = serde_json::from_str(json).unwrap();
        let info = TrackInfo::from(track);
        assert_eq!(info.title, "Rick Astley - Never Gonna Give You Up");
        assert_eq!(info.duration, 213);
        assert_eq!(info.thumbnail.as_deref(), Some("https://i.scdn.co/image/big"));

        let queued = info.to_track();
        assert_eq!(
            queued.source,
            TrackSource::Search("Rick Astley - Never Gonna Give You Up".into())
        );
        assert!(queued.key.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_api_is_an_error() {
        let spotify = Spotify::with_base_urls(
            reqwest::Client::new(),
            "id".into(),
            "secret".into(),
            "http://127.0.0.1:9/token",
            "http://127.0.0.1:9",
        );
        assert!(matches!(spotify.track("abc").await, Err(MusicError::Request(_))));
    }
}
