//! Device catalog
//!
//! Client for the catalog service that lists devices, serves per-device
//! install instructions and receives success reports.

mod channels;
mod models;
mod support;

pub use channels::{channel_options, device_options, ChannelOption, DeviceOption};
pub use models::{
    DeviceDetail, DeviceSummary, ImageSpec, InstallInstructions, InstallSettings, SuccessReport,
    SystemServer,
};
pub use support::{format_not_working, formatted_not_working, parse_not_working};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::{self, InstallerConfig};
use crate::error::CatalogError;
use crate::{log_debug, log_error, log_info};

const MODULE: &str = "catalog";

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn devices(&self) -> Result<Vec<DeviceSummary>, CatalogError>;

    async fn device(&self, id: &str) -> Result<DeviceDetail, CatalogError>;

    async fn install_instructions(&self, id: &str) -> Result<InstallInstructions, CatalogError>;

    async fn report_success(&self, report: &SuccessReport) -> Result<(), CatalogError>;
}

/// Catalog service reached over HTTP+JSON
pub struct HttpCatalog {
    client: Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(config::app::USER_AGENT)
            .timeout(timeout)
            .build()?;

        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        Ok(Self { client, base_url })
    }

    /// Client for the catalog URL and request timeout in `config`
    pub fn from_config(config: &InstallerConfig) -> Result<Self, CatalogError> {
        Self::new(&config.catalog_url, config.catalog_request_timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}api/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let url = self.url(path);
        log_debug!(MODULE, "GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            log_error!(MODULE, "Failed to fetch {}: {}", url, e);
            CatalogError::Request(e)
        })?;

        if !response.status().is_success() {
            log_error!(MODULE, "{} returned status {}", url, response.status());
            return Err(CatalogError::Status(response.status()));
        }

        response.json().await.map_err(|e| {
            log_error!(MODULE, "Failed to parse response from {}: {}", url, e);
            CatalogError::Request(e)
        })
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn devices(&self) -> Result<Vec<DeviceSummary>, CatalogError> {
        let devices: Vec<DeviceSummary> = self.get_json("installer/devices").await?;
        log_info!(MODULE, "Loaded {} devices", devices.len());
        Ok(devices)
    }

    async fn device(&self, id: &str) -> Result<DeviceDetail, CatalogError> {
        self.get_json(&format!("device/{}", id)).await
    }

    async fn install_instructions(&self, id: &str) -> Result<InstallInstructions, CatalogError> {
        let instructions: InstallInstructions =
            self.get_json(&format!("installer/{}", id)).await?;
        log_info!(
            MODULE,
            "Install instructions for {}: {} images, bootstrap={}",
            id,
            instructions.images.len(),
            instructions.install_settings.bootstrap
        );
        Ok(instructions)
    }

    async fn report_success(&self, report: &SuccessReport) -> Result<(), CatalogError> {
        let url = self.url("installer/success");
        let response = self.client.post(&url).json(report).send().await?;

        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status()));
        }

        log_info!(
            MODULE,
            "Reported successful install of {} ({})",
            report.device,
            report.channel
        );
        Ok(())
    }
}
