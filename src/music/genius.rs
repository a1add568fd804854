use serde::Deserialize;

use super::MusicError;

const API_URL: &str = "https://api.genius.com";

#[derive(Clone, Debug, Deserialize)]
pub struct Song {
    pub title: String,
    pub full_title: String,
    pub url: String,
    pub song_art_image_thumbnail_url: Option<String>,
    pub primary_artist: Option<PrimaryArtist>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PrimaryArtist {
    pub name: String,
}

impl Song {
    pub fn display_title(&self) -> String {
        match &self.primary_artist {
            Some(artist) => format!("{} - {}", artist.name, self.title),
            None => self.full_title.clone(),
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    response: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    result: Song,
}

/// Song search on Genius. Lyrics themselves live on the linked page.
pub struct Genius {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl Genius {
    pub fn new(http: reqwest::Client, token: String) -> Self {
        Self::with_base_url(http, token, API_URL)
    }

    pub fn with_base_url(http: reqwest::Client, token: String, base_url: &str) -> Self {
        Self {
            http,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(&self, song: &str, artist: &str) -> Result<Option<Song>, MusicError> {
        let query = search_query(song, artist);
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("q", query.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MusicError::Api {
                service: "Genius",
                message: response.status().to_string(),
            });
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.response.hits.into_iter().next().map(|h| h.result))
    }
}

pub fn search_query(song: &str, artist: &str) -> String {
    match (song.trim(), artist.trim()) {
        (song, "") => song.to_string(),
        ("", artist) => artist.to_string(),
        (song, artist) => format!("{song} {artist}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query() {
        assert_eq!(search_query("Hello", ""), "Hello");
        assert_eq!(search_query(" Hello ", "Adele"), "Hello Adele");
        assert_eq!(search_query("", "Adele"), "Adele");
    }

    #[test]
    fn test_parse_search_response() {
        let json = r#"{"meta":{"status":200},"response":{"hits":[{"result":{
            "title":"Hello","full_title":"Hello by Adele","url":"https://genius.com/Adele-hello-lyrics",
            "song_art_image_thumbnail_url":"https://images.genius.com/x.jpg",
            "primary_artist":{"name":"Adele"}}}]}}"#;
        let body: SearchResponse = serde_json::from_str(json).unwrap();
        let song = body.response.hits.into_iter().next().unwrap().result;
        assert_eq!(song.display_title(), "Adele - Hello");
        assert_eq!(song.url, "https://genius.com/Adele-hello-lyrics");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_an_error() {
        let genius = Genius::with_base_url(reqwest::Client::new(), "t".into(), "http://127.0.0.1:9");
        assert!(genius.search("Hello", "Adele").await.is_err());
    }
}
