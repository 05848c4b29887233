//! Channel and device selection lists
//!
//! Turns catalog data into the options a presentation layer offers.

use serde::{Deserialize, Serialize};

use super::models::{DeviceSummary, InstallInstructions};

/// Prefix stripped from channel ids for display
const CHANNEL_PREFIX: &str = "ubuntu-touch/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOption {
    pub id: String,
    pub name: String,
}

/// Channels available for a device, minus the blacklisted ones
pub fn channel_options(
    device_channels: &[String],
    instructions: &InstallInstructions,
) -> Vec<ChannelOption> {
    let server = &instructions.system_server;
    device_channels
        .iter()
        .filter(|channel| !server.blacklist.contains(channel))
        .map(|channel| ChannelOption {
            id: channel.clone(),
            label: channel
                .strip_prefix(CHANNEL_PREFIX)
                .unwrap_or(channel)
                .to_string(),
            selected: server.selected.as_deref() == Some(channel.as_str()),
        })
        .collect()
}

pub fn device_options(devices: &[DeviceSummary]) -> Vec<DeviceOption> {
    devices
        .iter()
        .map(|d| DeviceOption {
            id: d.device.clone(),
            name: d.name.clone(),
        })
        .collect()
}
