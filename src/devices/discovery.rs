//! Device discovery
//!
//! Waits until a device shows up on the automatic transport or the user picks
//! one by hand, then loads what is needed to offer its release channels.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::AutomaticTransport;
use crate::catalog::{channel_options, Catalog, ChannelOption, DeviceDetail};
use crate::error::{InstallError, TransportError};
use crate::events::{Event, EventBus};
use crate::system_image::SystemImage;
use crate::{log_error, log_info};

const MODULE: &str = "devices::discovery";

#[derive(Debug, Clone, Serialize)]
pub struct SelectedDevice {
    pub id: String,
    pub detail: DeviceDetail,
    pub channels: Vec<ChannelOption>,
    /// Picked through `device:select` rather than detected
    pub manual: bool,
}

async fn detect(adb: &dyn AutomaticTransport) -> Result<String, TransportError> {
    adb.wait_for_device().await?;
    adb.device_name().await
}

/// Resolve with the first device detected or selected on `bus`.
///
/// A `device:select{id}` event ends detection and publishes `stop`; a `stop`
/// from elsewhere aborts with [`InstallError::Cancelled`].
pub async fn wait_for_device(
    bus: &EventBus,
    adb: &dyn AutomaticTransport,
    catalog: &dyn Catalog,
    system_image: &dyn SystemImage,
    cancel: &CancellationToken,
) -> Result<SelectedDevice, InstallError> {
    let selected = bus.once("device:select");
    let stopped = bus.once("stop");
    log_info!(MODULE, "Waiting for a device");

    let (id, manual) = tokio::select! {
        _ = cancel.cancelled() => return Err(InstallError::Cancelled),
        _ = stopped => {
            log_info!(MODULE, "Device discovery stopped");
            return Err(InstallError::Cancelled);
        }
        event = selected => match event {
            Ok(Event::DeviceSelect { id }) => (id, true),
            _ => return Err(InstallError::Cancelled),
        },
        name = detect(adb) => match name {
            Ok(name) => (name, false),
            Err(e) => {
                log_error!(MODULE, "Device detection failed: {}", e);
                return Err(InstallError::Discovery(e.to_string()));
            }
        },
    };

    if manual {
        log_info!(MODULE, "Device {} selected manually", id);
        bus.emit(Event::Stop);
    } else {
        log_info!(MODULE, "Detected device {}", id);
    }

    let detail = catalog.device(&id).await?;
    let id = detail.device.device.clone();
    let instructions = catalog.install_instructions(&id).await?;
    let available = system_image
        .device_channels(&id)
        .await
        .map_err(InstallError::SystemImage)?;

    Ok(SelectedDevice {
        channels: channel_options(&available, &instructions),
        id,
        detail,
        manual,
    })
}
