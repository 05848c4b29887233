//! Download module
//!
//! The download collaborator fetches image files; this module defines its
//! contract and verifies the fetched files against their catalog checksums.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::catalog::ImageSpec;
use crate::error::InstallError;
use crate::events::{Event, EventBus};
use crate::utils::format_size;
use crate::{log_debug, log_error, log_info, log_warn};

const MODULE: &str = "download";

/// Fetches images into their local directories
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download every image to [`ImageSpec::local_file`].
    ///
    /// Progress goes out as `download:start`, `download:next` and
    /// `download:progress`; completion and failure are reported by the caller.
    async fn download(&self, images: &[ImageSpec], bus: &EventBus) -> Result<(), String>;
}

/// Calculate SHA256 of a file
fn calculate_file_sha256(path: &Path) -> Result<String, InstallError> {
    log_debug!(MODULE, "Calculating SHA256 of: {}", path.display());

    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let hash = hex::encode(hasher.finalize());
    log_debug!(MODULE, "Calculated SHA256: {}", hash);
    Ok(hash)
}

async fn verify_file(path: PathBuf, expected: &str) -> Result<(), InstallError> {
    let size = path.metadata().map(|m| m.len()).unwrap_or(0);
    log_info!(
        MODULE,
        "Verifying {} ({})",
        path.display(),
        format_size(size)
    );

    let hash_path = path.clone();
    let actual = tokio::task::spawn_blocking(move || calculate_file_sha256(&hash_path))
        .await
        .map_err(|e| InstallError::Download(format!("Checksum task failed: {}", e)))??;

    let expected = expected.trim().to_lowercase();
    if actual == expected {
        log_info!(MODULE, "SHA256 verification PASSED for {}", path.display());
        Ok(())
    } else {
        log_error!(
            MODULE,
            "SHA256 verification FAILED for {}! Expected: {}, Got: {}",
            path.display(),
            expected,
            actual
        );
        Err(InstallError::Integrity {
            file: path.display().to_string(),
            expected,
            actual,
        })
    }
}

/// Check every downloaded image that carries a checksum
pub async fn verify_images(images: &[ImageSpec], bus: &EventBus) -> Result<(), InstallError> {
    bus.emit(Event::DownloadStartCheck);

    for image in images {
        let path = image.local_file().ok_or_else(|| {
            InstallError::Download(format!("No local path for image {}", image.url))
        })?;

        match image.checksum.as_deref() {
            Some(expected) => {
                bus.emit(Event::DownloadChecking);
                verify_file(path, expected).await?;
            }
            None => {
                log_warn!(
                    MODULE,
                    "No checksum for {}, skipping verification",
                    image.url
                );
            }
        }
    }

    Ok(())
}
