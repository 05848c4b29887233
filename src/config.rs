//! Application configuration
//!
//! Compile-time defaults grouped by concern, plus the runtime
//! [`InstallerConfig`] that can override them from a JSON settings file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::InstallError;
use crate::utils::get_cache_dir;

pub mod app {
    /// Application name, used for cache and log directories
    pub const NAME: &str = "ubports";
    /// User agent sent to the catalog service
    pub const USER_AGENT: &str = concat!("touch-installer/", env!("CARGO_PKG_VERSION"));
}

pub mod urls {
    /// Base URL of the device catalog service
    pub const CATALOG_API: &str = "https://devices.ubports.com/";
}

pub mod timeouts {
    /// How long to wait for a device to show up on the automatic transport
    pub const AUTOMATIC_DETECTION_SECS: u64 = 10 * 60;
    /// How long to wait for a device to show up in bootloader mode
    pub const BOOTLOADER_DETECTION_SECS: u64 = 10 * 60;
    /// Timeout for a single catalog request
    pub const CATALOG_REQUEST_SECS: u64 = 30;
}

pub mod credentials {
    /// Wrong passwords accepted before the gate gives up
    pub const MAX_PASSWORD_ATTEMPTS: u32 = 5;
}

pub mod logging {
    /// Subdirectory of the cache directory holding log files
    pub const LOG_DIR: &str = "logs";
}

/// Runtime settings for an [`crate::Installer`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InstallerConfig {
    pub catalog_url: String,
    /// Root of the persisted download tree (`<base_dir>/images/<device>`)
    pub base_dir: PathBuf,
    pub automatic_detection_secs: u64,
    pub bootloader_detection_secs: u64,
    pub catalog_request_secs: u64,
    /// `None` retries wrong passwords forever
    pub max_password_attempts: Option<u32>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            catalog_url: urls::CATALOG_API.to_string(),
            base_dir: get_cache_dir(app::NAME),
            automatic_detection_secs: timeouts::AUTOMATIC_DETECTION_SECS,
            bootloader_detection_secs: timeouts::BOOTLOADER_DETECTION_SECS,
            catalog_request_secs: timeouts::CATALOG_REQUEST_SECS,
            max_password_attempts: Some(credentials::MAX_PASSWORD_ATTEMPTS),
        }
    }
}

impl InstallerConfig {
    /// Load settings from a JSON file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self, InstallError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| InstallError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn automatic_detection_timeout(&self) -> Duration {
        Duration::from_secs(self.automatic_detection_secs)
    }

    pub fn bootloader_detection_timeout(&self) -> Duration {
        Duration::from_secs(self.bootloader_detection_secs)
    }

    pub fn catalog_request_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_request_secs)
    }
}
