//! Catalog data models
//!
//! Types returned by the device catalog service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::devices::DeviceState;
use crate::utils::{device_images_dir, file_name_from_url};

/// Entry of the installer device list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub device: String,
    pub name: String,
}

/// Device detail record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDetail {
    pub device: DeviceSummary,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Per-device install instructions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallInstructions {
    #[serde(default)]
    pub images: Vec<ImageSpec>,
    #[serde(default)]
    pub install_settings: InstallSettings,
    /// Button combination a user presses to reach each state
    #[serde(default)]
    pub buttons: BTreeMap<DeviceState, String>,
    #[serde(default)]
    pub system_server: SystemServer,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSettings {
    /// Images must be flashed in bootloader mode before the OS install
    #[serde(default)]
    pub bootstrap: bool,
    /// Boot the bootstrap images instead of flashing them
    #[serde(default)]
    pub fastbootboot: bool,
}

/// Release channel metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemServer {
    #[serde(default)]
    pub selected: Option<String>,
    #[serde(default)]
    pub blacklist: Vec<String>,
}

/// One image to download and hand to the bootloader transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub url: String,
    /// SHA-256 of the file, hex encoded
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Local directory, set by [`InstallInstructions::images_for`]
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl ImageSpec {
    pub fn file_name(&self) -> Option<&str> {
        file_name_from_url(&self.url)
    }

    /// Full path of the downloaded file, once the image has a local directory
    pub fn local_file(&self) -> Option<PathBuf> {
        Some(self.path.as_ref()?.join(self.file_name()?))
    }
}

impl InstallInstructions {
    /// Images decorated with their local download directory
    pub fn images_for(&self, base_dir: &Path, device: &str) -> Vec<ImageSpec> {
        let dir = device_images_dir(base_dir, device);
        self.images
            .iter()
            .cloned()
            .map(|mut image| {
                image.path = Some(dir.clone());
                image
            })
            .collect()
    }

    pub fn button_for(&self, state: DeviceState) -> Option<&str> {
        self.buttons.get(&state).map(String::as_str)
    }
}

/// Body of the success report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessReport {
    pub device: String,
    pub channel: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTRUCTIONS: &str = r#"{
        "images": [
            {"type": "file", "url": "https://cdimage.ubports.com/bacon/recovery.img",
             "checksum": "abc123", "partition": "recovery"}
        ],
        "install_settings": {"bootstrap": true},
        "buttons": {"bootloader": "Power + Volume up", "recovery": "Power + Volume down"},
        "system_server": {"selected": "ubuntu-touch/stable", "blacklist": ["ubuntu-touch/legacy"]}
    }"#;

    #[test]
    fn test_parse_instructions() {
        let instructions: InstallInstructions = serde_json::from_str(INSTRUCTIONS).unwrap();
        assert!(instructions.install_settings.bootstrap);
        assert!(!instructions.install_settings.fastbootboot);
        assert_eq!(
            instructions.button_for(DeviceState::Bootloader),
            Some("Power + Volume up")
        );
        assert_eq!(instructions.images[0].kind.as_deref(), Some("file"));
        assert_eq!(instructions.images[0].path, None);
        assert_eq!(
            instructions.system_server.selected.as_deref(),
            Some("ubuntu-touch/stable")
        );
    }

    #[test]
    fn test_missing_sections_default() {
        let instructions: InstallInstructions = serde_json::from_str("{}").unwrap();
        assert!(instructions.images.is_empty());
        assert_eq!(instructions.install_settings, InstallSettings::default());
        assert_eq!(instructions.button_for(DeviceState::Recovery), None);
    }

    #[test]
    fn test_images_for_sets_device_directory() {
        let instructions: InstallInstructions = serde_json::from_str(INSTRUCTIONS).unwrap();
        let images = instructions.images_for(Path::new("/cache/ubports"), "bacon");

        assert_eq!(
            images[0].local_file(),
            Some(PathBuf::from("/cache/ubports/images/bacon/recovery.img"))
        );
        // The catalog copy stays undecorated.
        assert_eq!(instructions.images[0].path, None);
    }

    #[test]
    fn test_device_detail_keeps_extra_fields() {
        let detail: DeviceDetail = serde_json::from_str(
            r#"{"device": {"device": "bacon", "name": "OnePlus One"}, "whatsWorking": "{}"}"#,
        )
        .unwrap();
        assert_eq!(detail.device.name, "OnePlus One");
        assert!(detail.extra.contains_key("whatsWorking"));
    }
}
