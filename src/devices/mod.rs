//! Device states and the two transports used to talk to a device
//!
//! The transports are implemented outside this crate; the orchestration only
//! relies on the traits below.

pub mod discovery;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::ImageSpec;
use crate::error::TransportError;
use crate::events::Secret;

/// Mode a device must be in before an operation is valid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    Bootloader,
    Recovery,
}

impl DeviceState {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceState::Bootloader => "bootloader",
            DeviceState::Recovery => "recovery",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport for a device running its OS or recovery (adb)
#[async_trait]
pub trait AutomaticTransport: Send + Sync {
    /// Whether a device is currently reachable and accepts commands
    async fn has_access(&self) -> bool;

    async fn reboot(&self, state: DeviceState) -> Result<(), TransportError>;

    /// Resolves once a device is detected
    async fn wait_for_device(&self) -> Result<(), TransportError>;

    /// Codename reported by the connected device
    async fn device_name(&self) -> Result<String, TransportError>;
}

/// Transport for a device in bootloader mode (fastboot)
#[async_trait]
pub trait BootloaderTransport: Send + Sync {
    /// Resolves once a device is detected in bootloader mode
    async fn wait_for_device(&self, credential: &Secret) -> Result<(), TransportError>;

    /// Write the images to their partitions
    async fn flash(
        &self,
        images: &[ImageSpec],
        credential: Option<&Secret>,
    ) -> Result<(), TransportError>;

    /// Boot the images without writing them
    async fn boot(
        &self,
        images: &[ImageSpec],
        credential: Option<&Secret>,
    ) -> Result<(), TransportError>;
}
