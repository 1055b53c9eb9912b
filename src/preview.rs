//! Thumbnail extraction for uploads.
//!
//! Thumbnails are best effort: a file that cannot be decoded simply uploads
//! without one.
//!
//! # Supported Formats
//!
//! - **Images** (Native Rust): JPEG, PNG, GIF, BMP, TIFF, WebP, ICO.
//! - **Videos** (External Tool): MP4, MKV, AVI, MOV, WMV, FLV, WEBM, MPG, MPEG, M4V.
//!   - Requires `ffmpegthumbnailer` in the system PATH.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::{ImageFormat, ImageReader};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::debug;

use crate::error::{MegaError, Result};

/// Edge length of generated thumbnails.
pub const THUMBNAIL_SIZE: u32 = 120;

/// Supported image extensions for pure Rust thumbnail generation
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "ico",
];

/// Supported video extensions for ffmpegthumbnailer
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "mpg", "mpeg", "m4v",
];

/// Produces the JPEG thumbnail attached to an upload.
pub trait Thumbnailer: Send {
    /// Square JPEG thumbnail of `path` with the given edge length, or
    /// `None` when the file is unsupported or cannot be decoded.
    fn create_thumbnail(&self, path: &Path, size: u32) -> Option<Vec<u8>>;
}

/// Default thumbnailer: `image` for pictures, `ffmpegthumbnailer` for
/// videos when enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageThumbnailer {
    pub videos: bool,
}

impl Thumbnailer for ImageThumbnailer {
    fn create_thumbnail(&self, path: &Path, size: u32) -> Option<Vec<u8>> {
        let extension = path.extension()?.to_str()?.to_lowercase();

        let result = if is_image(&extension) {
            std::fs::read(path)
                .map_err(MegaError::from)
                .and_then(|data| generate_image_thumbnail(&data, size))
        } else if self.videos && is_video(&extension) {
            generate_video_thumbnail(path, size)
        } else {
            return None;
        };

        match result {
            Ok(data) => Some(data),
            Err(e) => {
                debug!("No thumbnail for {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Thumbnailer that never produces anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoThumbnails;

impl Thumbnailer for NoThumbnails {
    fn create_thumbnail(&self, _path: &Path, _size: u32) -> Option<Vec<u8>> {
        None
    }
}

/// Check if a file extension is a supported image format.
///
/// # Example
/// ```
/// use megafacade::preview::is_image;
///
/// assert!(is_image("jpg"));
/// assert!(is_image("PNG"));
/// assert!(!is_image("txt"));
/// ```
pub fn is_image(extension: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&extension.to_lowercase().as_str())
}

/// Check if a file extension is a supported video format.
pub fn is_video(extension: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&extension.to_lowercase().as_str())
}

/// Decode `data`, crop-resize it to `size`×`size` and re-encode as JPEG.
pub fn generate_image_thumbnail(data: &[u8], size: u32) -> Result<Vec<u8>> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| MegaError::Custom(format!("Failed to detect image format: {}", e)))?;

    let img = reader
        .decode()
        .map_err(|e| MegaError::Custom(format!("Failed to decode image: {}", e)))?;

    let thumbnail = img.resize_to_fill(size, size, image::imageops::FilterType::Lanczos3);

    // JPEG has no alpha channel
    let thumbnail = image::DynamicImage::ImageRgb8(thumbnail.to_rgb8());

    let mut output = Vec::new();
    thumbnail
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Jpeg)
        .map_err(|e| MegaError::Custom(format!("Failed to encode thumbnail: {}", e)))?;

    Ok(output)
}

/// Scratch file for one `ffmpegthumbnailer` run; unique per call.
fn video_thumb_path() -> PathBuf {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    std::env::temp_dir().join(format!(
        "megafacade_thumb_{}_{}.jpg",
        std::process::id(),
        suffix
    ))
}

/// Snapshot a video at 5% of its duration with `ffmpegthumbnailer`.
fn generate_video_thumbnail(path: &Path, size: u32) -> Result<Vec<u8>> {
    let thumb_path = video_thumb_path();

    let input = path
        .to_str()
        .ok_or_else(|| MegaError::Custom("Invalid path".to_string()))?;
    let output_path = thumb_path
        .to_str()
        .ok_or_else(|| MegaError::Custom("Invalid temp path".to_string()))?;

    let output = Command::new("ffmpegthumbnailer")
        .args([
            "-i",
            input,
            "-o",
            output_path,
            "-s",
            &size.to_string(),
            "-t",
            "5%",
            "-f",
        ])
        .output()?;

    if !output.status.success() {
        let _ = std::fs::remove_file(&thumb_path);
        return Err(MegaError::Custom(format!(
            "ffmpegthumbnailer failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let data = std::fs::read(&thumb_path)?;
    let _ = std::fs::remove_file(&thumb_path);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_thumb_paths_are_unique() {
        let first = video_thumb_path();
        let second = video_thumb_path();
        assert_ne!(first, second);
        assert!(first.starts_with(std::env::temp_dir()));
        assert_eq!(first.extension().and_then(|e| e.to_str()), Some("jpg"));
    }

    #[test]
    fn test_is_image() {
        assert!(is_image("jpg"));
        assert!(is_image("PNG"));
        assert!(is_image("jpeg"));
        assert!(!is_image("mp4"));
        assert!(!is_image("txt"));
    }

    #[test]
    fn test_is_video() {
        assert!(is_video("mp4"));
        assert!(is_video("MKV"));
        assert!(!is_video("jpg"));
    }

    #[test]
    fn test_generate_image_thumbnail_invalid_data() {
        let garbage = [0u8; 100];
        assert!(generate_image_thumbnail(&garbage, THUMBNAIL_SIZE).is_err());
    }

    #[test]
    fn test_unsupported_extension_has_no_thumbnail() {
        let thumbnailer = ImageThumbnailer::default();
        assert!(thumbnailer.create_thumbnail(Path::new("notes.txt"), THUMBNAIL_SIZE).is_none());
        assert!(thumbnailer.create_thumbnail(Path::new("noext"), THUMBNAIL_SIZE).is_none());
    }

    #[test]
    fn test_thumbnail_from_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        image::RgbImage::from_pixel(300, 200, image::Rgb([200, 10, 10]))
            .save(&path)
            .unwrap();

        let data = ImageThumbnailer::default()
            .create_thumbnail(&path, THUMBNAIL_SIZE)
            .unwrap();
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!(decoded.width(), THUMBNAIL_SIZE);
        assert_eq!(decoded.height(), THUMBNAIL_SIZE);
    }

    #[test]
    fn test_corrupt_image_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not a jpeg").unwrap();
        assert!(ImageThumbnailer::default().create_thumbnail(&path, THUMBNAIL_SIZE).is_none());
    }
}
