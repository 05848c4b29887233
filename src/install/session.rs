//! State bound to one install invocation

use tokio_util::sync::CancellationToken;

use crate::catalog::InstallInstructions;
use crate::events::EventBus;

/// Per-install switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallOptions {
    /// Mirror collaborator events as `user:write:*` events and log lines
    pub user_events: bool,
    /// Run the system-image step; when off the step is announced but skipped
    pub system_image: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            user_events: true,
            system_image: true,
        }
    }
}

pub struct InstallSession {
    pub device: String,
    pub channel: String,
    pub bus: EventBus,
    pub instructions: InstallInstructions,
    pub cancel: CancellationToken,
    pub options: InstallOptions,
}

impl InstallSession {
    pub fn new(
        device: &str,
        channel: &str,
        bus: EventBus,
        instructions: InstallInstructions,
        cancel: CancellationToken,
        options: InstallOptions,
    ) -> Self {
        Self {
            device: device.to_string(),
            channel: channel.to_string(),
            bus,
            instructions,
            cancel,
            options,
        }
    }
}
