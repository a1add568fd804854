//! Gemini image generation and collages of past results.

pub mod collage;
pub mod gemini;

use std::path::{Path, PathBuf};

pub use gemini::{Gemini, InlineImage};

pub const CHAD_PROMPT: &str = "Generate a image in the same artstyle of this avatar as a gigachad. \
Personify the avatar with a more muscular body. Use details from the avatar to make the body match the avatar. \
The outfit and accessories should be similar to the avatar, but designed to show off the muscles. \
IMPORTANT: Maintain the exact same gender as shown in the avatar - if the avatar appears feminine, keep it feminine; \
if masculine, keep it masculine. Do not alter or change the gender presentation of the face in any way.";

pub const TROLL_PROMPT: &str = "This character as a stupid troll";

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("The daily quota has been exceeded :(")]
    QuotaExceeded,
    #[error("{0}")]
    Api(String),
    #[error("invalid image data: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Image(#[from] image::ImageError),
    #[error("No images found in the images directory!")]
    NoImages,
}

pub fn lowpoly_prompt(prompt: &str) -> String {
    format!("A simple low-poly digital illustration of {prompt} with a simple light colored background")
}

/// Where the image for an interaction is saved.
pub fn image_path(dir: &Path, interaction_id: u64) -> PathBuf {
    dir.join(format!("{interaction_id}.png"))
}

/// Downloads an avatar to send along with a prompt.
pub async fn fetch_avatar(http: &reqwest::Client, url: &str) -> Result<InlineImage, ImageError> {
    let response = http.get(url).send().await?.error_for_status()?;
    let mime_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("image/"))
        .unwrap_or("image/jpeg")
        .to_string();
    let bytes = response.bytes().await?.to_vec();
    Ok(InlineImage { mime_type, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowpoly_prompt() {
        assert_eq!(
            lowpoly_prompt("a fox"),
            "A simple low-poly digital illustration of a fox with a simple light colored background"
        );
    }

    #[test]
    fn test_image_path() {
        assert_eq!(image_path(Path::new("images"), 42), Path::new("images/42.png"));
    }
}
