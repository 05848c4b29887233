//! Path utility functions
//!
//! Location of the cache directory and of the per-device image tree.

use std::path::{Path, PathBuf};

/// Cache directory for the application, falling back to the temp dir
pub fn get_cache_dir(app_name: &str) -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(app_name)
}

/// Directory holding downloaded images for one device
pub fn device_images_dir(base_dir: &Path, device: &str) -> PathBuf {
    base_dir.join("images").join(device)
}

/// Extract the file name from a download URL, ignoring any query string
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let url_path = url.split('?').next().unwrap_or(url);
    url_path.split('/').next_back().filter(|s| !s.is_empty())
}
