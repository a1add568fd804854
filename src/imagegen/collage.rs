use std::path::{Path, PathBuf};
use std::time::SystemTime;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::warn;

use super::ImageError;

pub const COLLAGE_SIZE: u32 = 2000;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Columns and rows of the smallest square-ish grid that fits `count` tiles.
pub fn grid(count: usize) -> (u32, u32) {
    if count <= 1 {
        return (1, 1);
    }
    let cols = (count as f64).sqrt().ceil() as u32;
    let rows = (count as u32).div_ceil(cols);
    (cols, rows)
}

/// The `number` most recently modified images in `dir`, newest first.
pub fn recent_images(dir: &Path, number: usize) -> std::io::Result<Vec<PathBuf>> {
    let mut images: Vec<(SystemTime, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .filter_map(|p| {
            let modified = std::fs::metadata(&p).and_then(|m| m.modified()).ok()?;
            Some((modified, p))
        })
        .collect();

    images.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(images.into_iter().take(number).map(|(_, p)| p).collect())
}

/// Tiles `paths` onto a white 2000×2000 canvas and saves it as PNG.
/// Images that cannot be read leave their tile blank.
pub fn create_collage(paths: &[PathBuf], output: &Path) -> Result<(), ImageError> {
    if paths.is_empty() {
        return Err(ImageError::NoImages);
    }

    let (cols, rows) = grid(paths.len());
    let tile_width = COLLAGE_SIZE / cols;
    let tile_height = COLLAGE_SIZE / rows;

    let mut canvas = RgbImage::from_pixel(COLLAGE_SIZE, COLLAGE_SIZE, Rgb([255, 255, 255]));

    for (i, path) in paths.iter().enumerate() {
        let tile = match image::open(path) {
            Ok(img) => img
                .resize_exact(tile_width, tile_height, FilterType::Lanczos3)
                .to_rgb8(),
            Err(e) => {
                warn!("skipping {} in collage: {e}", path.display());
                continue;
            }
        };
        let col = i as u32 % cols;
        let row = i as u32 / cols;
        imageops::replace(
            &mut canvas,
            &tile,
            i64::from(col * tile_width),
            i64::from(row * tile_height),
        );
    }

    canvas.save(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid() {
        assert_eq!(grid(1), (1, 1));
        assert_eq!(grid(2), (2, 1));
        assert_eq!(grid(4), (2, 2));
        assert_eq!(grid(5), (3, 2));
        assert_eq!(grid(25), (5, 5));
        assert_eq!(grid(26), (6, 5));
    }

    #[test]
    fn test_recent_images_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"").unwrap();
        std::fs::write(dir.path().join("b.JPG"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let images = recent_images(dir.path(), 25).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(recent_images(dir.path(), 1).unwrap().len(), 1);
    }

    #[test]
    fn test_create_collage() {
        let dir = tempfile::tempdir().unwrap();
        let red = dir.path().join("red.png");
        RgbImage::from_pixel(10, 10, Rgb([255, 0, 0])).save(&red).unwrap();
        let broken = dir.path().join("broken.png");
        std::fs::write(&broken, b"not a png").unwrap();

        let output = dir.path().join("collage.png");
        create_collage(&[red, broken], &output).unwrap();

        let collage = image::open(&output).unwrap().to_rgb8();
        assert_eq!(collage.dimensions(), (COLLAGE_SIZE, COLLAGE_SIZE));
        assert_eq!(collage.get_pixel(10, 10), &Rgb([255, 0, 0]));
        // The unreadable second tile stays white.
        assert_eq!(collage.get_pixel(1500, 10), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_empty_collage() {
        let dir = tempfile::tempdir().unwrap();
        let result = create_collage(&[], &dir.path().join("c.png"));
        assert!(matches!(result, Err(ImageError::NoImages)));
    }
}
