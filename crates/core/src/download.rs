//! Local save-path policy for downloaded media.
//!
//! Image and voice downloads are named after the CDN file id with a fixed
//! extension; file downloads keep their original file name.

use std::path::{Path, PathBuf};

/// Save path for an inbound image: `<dir>/<file_id>.jpg`.
pub fn image_path(downloads_dir: &Path, file_id: &str) -> PathBuf {
    downloads_dir.join(format!("{file_id}.jpg"))
}

/// Save path for an inbound voice clip: `<dir>/<file_id>.silk`.
pub fn voice_path(downloads_dir: &Path, file_id: &str) -> PathBuf {
    downloads_dir.join(format!("{file_id}.silk"))
}

/// Save path for an inbound file: `<dir>/<file_name>`.
pub fn file_path(downloads_dir: &Path, file_name: &str) -> PathBuf {
    downloads_dir.join(file_name)
}
