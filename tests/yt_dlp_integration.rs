use cogbots::audio::TrackSource;
use cogbots::music::YouTube;

#[tokio::test]
#[ignore] // Requires yt-dlp installed and network access
async fn test_video_without_api_key() {
    let youtube = YouTube::new(reqwest::Client::new(), None);
    let track = youtube
        .video("dQw4w9WgXcQ", "https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        .await
        .expect("yt-dlp lookup failed");

    assert!(!track.title.is_empty());
    assert!(track.duration.is_some());
    assert!(matches!(track.source, TrackSource::YouTube(_)));
}

#[tokio::test]
#[ignore] // Requires yt-dlp installed and network access
async fn test_search_without_api_key() {
    let youtube = YouTube::new(reqwest::Client::new(), None);
    let track = youtube
        .search("never gonna give you up rick astley")
        .await
        .expect("yt-dlp search failed");

    assert!(!track.title.is_empty());
    assert!(track.key.is_some());
}

#[tokio::test]
async fn test_unreachable_api_is_an_error() {
    let youtube = YouTube::with_base_url(
        reqwest::Client::new(),
        Some("key".to_string()),
        "http://127.0.0.1:9",
    );
    assert!(youtube.search("anything").await.is_err());
}
