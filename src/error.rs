//! Error types
//!
//! [`InstallError`] is what a session fails with; its `Display` text is the
//! message carried by the terminal `error` event.

use thiserror::Error;

use crate::devices::DeviceState;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Password rejected {attempts} times")]
    CredentialInvalid { attempts: u32 },

    #[error("Privilege check failed: {0}")]
    PrivilegeCheck(String),

    #[error("Device not detected in {state} mode: {reason}")]
    TransportDetection { state: DeviceState, reason: String },

    #[error("Timed out waiting for device in {0} mode")]
    Timeout(DeviceState),

    #[error("Device discovery failed: {0}")]
    Discovery(String),

    #[error("Flashing failed: {0}")]
    FlashFailed(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    Integrity {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("System image installation failed: {0}")]
    SystemImage(String),

    #[error("An install is already running for device {0}")]
    AlreadyInstalling(String),

    #[error("Installation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    InvalidTransition(#[from] crate::install::InvalidTransition),

    #[error("Install task failed: {0}")]
    Task(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a device transport call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The transport rejected the privileged credential
    #[error("credential rejected: {0}")]
    Credential(String),

    #[error("{0}")]
    Failed(String),
}

/// Failure reported by the catalog service
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("{0}")]
    Other(String),
}

impl From<CatalogError> for InstallError {
    fn from(e: CatalogError) -> Self {
        InstallError::CatalogUnavailable(e.to_string())
    }
}
