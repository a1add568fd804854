use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;
use url::Url;

use super::MusicError;
use crate::audio::format::format_title;
use crate::audio::{Track, TrackSource};

const API_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Playlists longer than this are cut.
pub const MAX_PLAYLIST_TRACKS: usize = 100;

pub fn short_url(video_id: &str) -> String {
    format!("https://youtu.be/{video_id}")
}

/// Extracts the video id from `watch?v=`, `youtu.be/`, `shorts/` and
/// `embed/` links.
pub fn video_id(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let id = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "music.youtube.com" => {
            if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
                Some(v.into_owned())
            } else {
                let mut segments = url.path_segments()?;
                match segments.next() {
                    Some("shorts" | "embed" | "live") => segments.next().map(str::to_string),
                    _ => None,
                }
            }
        }
        _ => None,
    }?;

    (!id.is_empty()).then_some(id)
}

pub fn playlist_id(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "list")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// Parses ISO-8601 durations as returned by the Data API (`PT4M13S`,
/// `P1DT2H`, `PT45S`).
pub fn parse_iso8601_duration(s: &str) -> Option<u64> {
    let rest = s.strip_prefix('P')?;
    let (date, time) = match rest.split_once('T') {
        Some((d, t)) => (d, t),
        None => (rest, ""),
    };

    let mut total = 0u64;
    let mut parse_part = |part: &str, units: &[(char, u64)]| -> Option<()> {
        let mut number = String::new();
        for c in part.chars() {
            if c.is_ascii_digit() {
                number.push(c);
            } else {
                let (_, secs) = units.iter().find(|(u, _)| *u == c)?;
                total += number.parse::<u64>().ok()? * secs;
                number.clear();
            }
        }
        number.is_empty().then_some(())
    };

    parse_part(date, &[('W', 604_800), ('D', 86_400)])?;
    parse_part(time, &[('H', 3600), ('M', 60), ('S', 1)])?;
    Some(total)
}

// --- Data API types ---

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<Video>,
}

#[derive(Deserialize)]
struct Video {
    snippet: Snippet,
    #[serde(rename = "contentDetails")]
    content_details: Option<ContentDetails>,
}

#[derive(Deserialize)]
struct Snippet {
    title: String,
    thumbnails: Option<Thumbnails>,
}

#[derive(Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Deserialize)]
struct ContentDetails {
    duration: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// --- yt-dlp types ---

#[derive(Deserialize)]
struct YtDlpVideo {
    id: String,
    title: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
}

#[derive(Deserialize)]
struct YtDlpPlaylist {
    title: Option<String>,
    #[serde(default)]
    entries: Vec<YtDlpVideo>,
}

fn make_track(id: &str, title: &str, duration: Option<u64>, thumbnail: Option<String>) -> Track {
    let url = short_url(id);
    let mut track = Track::new(format_title(title), TrackSource::YouTube(url.clone()));
    track.url = Some(url);
    track.duration = duration;
    track.thumbnail = thumbnail;
    track.key = Some(id.to_string());
    track
}

pub struct YouTube {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl YouTube {
    /// Without an API key every lookup goes through yt-dlp.
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self::with_base_url(http, api_key, API_URL)
    }

    pub fn with_base_url(http: reqwest::Client, api_key: Option<String>, base_url: &str) -> Self {
        Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(&self, query: &str) -> Result<Track, MusicError> {
        let Some(key) = &self.api_key else {
            return self.yt_dlp_video(&format!("ytsearch1:{query}")).await;
        };

        let response: SearchResponse = self
            .get(
                "search",
                &[("part", "snippet"), ("type", "video"), ("maxResults", "1"), ("q", query), ("key", key)],
            )
            .await?;

        let video_id = response
            .items
            .into_iter()
            .find_map(|item| item.id.video_id)
            .ok_or_else(|| MusicError::NotFound(query.to_string()))?;

        self.video(&video_id, query).await
    }

    pub async fn video(&self, video_id: &str, query: &str) -> Result<Track, MusicError> {
        let Some(key) = &self.api_key else {
            return self.yt_dlp_video(&short_url(video_id)).await;
        };

        let response: VideosResponse = self
            .get(
                "videos",
                &[("part", "snippet,contentDetails"), ("id", video_id), ("key", key)],
            )
            .await?;

        let video = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| MusicError::NotFound(query.to_string()))?;

        let duration = video
            .content_details
            .and_then(|d| parse_iso8601_duration(&d.duration));
        let thumbnail = video
            .snippet
            .thumbnails
            .and_then(|t| t.high.or(t.default))
            .map(|t| t.url);

        Ok(make_track(video_id, &video.snippet.title, duration, thumbnail))
    }

    /// Flat playlist listing through yt-dlp. Returns the playlist title and
    /// its tracks.
    pub async fn playlist(&self, url: &str) -> Result<(String, Vec<Track>), MusicError> {
        let stdout = run_yt_dlp(&["--flat-playlist", "-J", "--no-warnings", url]).await?;
        let playlist: YtDlpPlaylist = serde_json::from_slice(&stdout)?;

        let tracks: Vec<Track> = playlist
            .entries
            .iter()
            .take(MAX_PLAYLIST_TRACKS)
            .map(|e| {
                make_track(
                    &e.id,
                    e.title.as_deref().unwrap_or(&e.id),
                    e.duration.map(|d| d as u64),
                    e.thumbnail.clone(),
                )
            })
            .collect();

        if tracks.is_empty() {
            return Err(MusicError::NotFound(url.to_string()));
        }
        Ok((playlist.title.unwrap_or_else(|| "playlist".to_string()), tracks))
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MusicError> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!("YouTube API request: {endpoint}");
        let response = self.http.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(MusicError::Api {
                service: "YouTube",
                message,
            });
        }

        Ok(response.json().await?)
    }

    async fn yt_dlp_video(&self, target: &str) -> Result<Track, MusicError> {
        let stdout = run_yt_dlp(&["-j", "--no-playlist", "--no-warnings", target]).await?;
        let line = stdout
            .split(|b| *b == b'\n')
            .find(|l| !l.is_empty())
            .ok_or_else(|| MusicError::NotFound(target.to_string()))?;
        let info: YtDlpVideo = serde_json::from_slice(line)?;

        Ok(make_track(
            &info.id,
            info.title.as_deref().unwrap_or(&info.id),
            info.duration.map(|d| d as u64),
            info.thumbnail,
        ))
    }
}

async fn run_yt_dlp(args: &[&str]) -> Result<Vec<u8>, MusicError> {
    let output = Command::new("yt-dlp").args(args).output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MusicError::YtDlp(stderr.trim().to_string()));
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            video_id("https://youtu.be/dQw4w9WgXcQ?t=42").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            video_id("https://youtube.com/shorts/abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            video_id("https://music.youtube.com/watch?v=xyz&feature=share").as_deref(),
            Some("xyz")
        );
        assert_eq!(video_id("https://youtube.com/playlist?list=PL1"), None);
        assert_eq!(video_id("https://example.com/watch?v=abc"), None);
        assert_eq!(video_id("not a url"), None);
    }

    #[test]
    fn test_playlist_id() {
        assert_eq!(
            playlist_id("https://youtube.com/playlist?list=PL123&si=x").as_deref(),
            Some("PL123")
        );
        assert_eq!(playlist_id("https://youtu.be/abc"), None);
    }

    #[test]
    fn test_parse_iso8601_duration() {
        assert_eq!(parse_iso8601_duration("PT4M13S"), Some(253));
        assert_eq!(parse_iso8601_duration("PT45S"), Some(45));
        assert_eq!(parse_iso8601_duration("PT1H"), Some(3600));
        assert_eq!(parse_iso8601_duration("P1DT2H"), Some(93_600));
        assert_eq!(parse_iso8601_duration("P0D"), Some(0));
        assert_eq!(parse_iso8601_duration("4M13S"), None);
        assert_eq!(parse_iso8601_duration("PT4X"), None);
        assert_eq!(parse_iso8601_duration("PT12"), None);
    }

    #[test]
    fn test_make_track_cleans_title() {
        let track = make_track("abc", "Song &amp; Dance (Official Video)", Some(10), None);
        assert_eq!(track.title, "Song & Dance");
        assert_eq!(track.url.as_deref(), Some("https://youtu.be/abc"));
        assert_eq!(track.key.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_network_failure_is_an_error() {
        let yt = YouTube::with_base_url(reqwest::Client::new(), Some("key".into()), "http://127.0.0.1:9");
        let err = yt.search("anything").await.unwrap_err();
        assert!(matches!(err, MusicError::Request(_)));
        assert!(err.to_string().starts_with("request failed"));
    }
}
