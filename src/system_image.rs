//! System-image collaborator contract

use async_trait::async_trait;

use crate::events::EventBus;

/// Installs the OS update package through the automatic transport
#[async_trait]
pub trait SystemImage: Send + Sync {
    /// Push and apply the latest image of `channel`.
    ///
    /// Progress goes out as `adbpush:*` events.
    async fn install_latest(&self, device: &str, channel: &str, bus: &EventBus)
        -> Result<(), String>;

    /// Release channels published for `device`
    async fn device_channels(&self, device: &str) -> Result<Vec<String>, String>;
}
