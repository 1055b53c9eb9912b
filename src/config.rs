//! Facade settings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings read once at construction.
///
/// Missing JSON fields take their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local folder prefixed to temporary download names.
    pub base_path: Option<String>,
    /// Retry budget recorded on new transfers.
    pub max_transfer_retries: u32,
    /// File attribute fetches failing more often than this are abandoned.
    pub file_attribute_retries: u32,
    /// Upload thumbnail edge length in pixels.
    pub thumbnail_size: u32,
    /// Generate video thumbnails through `ffmpegthumbnailer`.
    pub video_thumbnails: bool,
    /// Longest sleep between dispatch iterations, in milliseconds.
    pub max_wait_ms: u64,
    /// Upload speed cap applied at startup, bytes per second.
    pub upload_limit: Option<i32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: None,
            max_transfer_retries: 3,
            file_attribute_retries: 3,
            thumbnail_size: crate::preview::THUMBNAIL_SIZE,
            video_thumbnails: false,
            max_wait_ms: 1000,
            upload_limit: None,
        }
    }
}

impl Config {
    /// Load settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}
