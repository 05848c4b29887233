//! In-memory collaborators for tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::bootstrap::PrivilegePolicy;
use crate::catalog::{
    Catalog, DeviceDetail, DeviceSummary, ImageSpec, InstallInstructions, SuccessReport,
};
use crate::credentials::PrivilegeValidator;
use crate::devices::{AutomaticTransport, BootloaderTransport, DeviceState};
use crate::download::Downloader;
use crate::error::{CatalogError, TransportError};
use crate::events::{Event, EventBus, Secret};
use crate::system_image::SystemImage;

/// Record the name of every event emitted on `bus`
pub fn record(bus: &EventBus) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    bus.on_any(move |_, event| sink.lock().unwrap().push(event.name().to_string()));
    seen
}

/// Answer each `user:password` prompt with the next password from `answers`
pub fn answer_passwords(bus: &EventBus, answers: &[&str]) {
    let queue: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(
        answers.iter().map(|s| s.to_string()).collect(),
    ));
    bus.on("user:password", move |bus, _| {
        let next = queue.lock().unwrap().pop_front();
        if let Some(password) = next {
            bus.emit(Event::Password(Secret::new(password)));
        }
    });
}

pub struct PasswordValidator {
    correct: String,
    checks: AtomicUsize,
}

impl PasswordValidator {
    pub fn new(correct: &str) -> Self {
        Self {
            correct: correct.to_string(),
            checks: AtomicUsize::new(0),
        }
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrivilegeValidator for PasswordValidator {
    async fn validate(&self, secret: &Secret) -> Result<bool, String> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(secret.expose() == self.correct)
    }
}

pub struct FixedPolicy(pub bool);

impl PrivilegePolicy for FixedPolicy {
    fn needs_elevation(&self) -> bool {
        self.0
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Found,
    Fails,
    Never,
}

async fn detect(mode: Detection) -> Result<(), TransportError> {
    match mode {
        Detection::Found => Ok(()),
        Detection::Fails => Err(TransportError::Failed("no device".into())),
        Detection::Never => std::future::pending().await,
    }
}

pub struct FakeAdb {
    pub access: bool,
    pub detection: Detection,
    pub name: String,
    pub reboot_fails: bool,
    pub reboots: Mutex<Vec<DeviceState>>,
}

impl FakeAdb {
    pub fn new(access: bool) -> Self {
        Self {
            access,
            detection: Detection::Found,
            name: "bacon".into(),
            reboot_fails: false,
            reboots: Mutex::new(Vec::new()),
        }
    }

    pub fn with_detection(mut self, detection: Detection) -> Self {
        self.detection = detection;
        self
    }

    pub fn with_failing_reboot(mut self) -> Self {
        self.reboot_fails = true;
        self
    }

    pub fn reboots(&self) -> Vec<DeviceState> {
        self.reboots.lock().unwrap().clone()
    }
}

#[async_trait]
impl AutomaticTransport for FakeAdb {
    async fn has_access(&self) -> bool {
        self.access
    }

    async fn reboot(&self, state: DeviceState) -> Result<(), TransportError> {
        self.reboots.lock().unwrap().push(state);
        if self.reboot_fails {
            return Err(TransportError::Failed("reboot refused".into()));
        }
        Ok(())
    }

    async fn wait_for_device(&self) -> Result<(), TransportError> {
        detect(self.detection).await
    }

    async fn device_name(&self) -> Result<String, TransportError> {
        Ok(self.name.clone())
    }
}

pub struct FakeFastboot {
    pub detection: Detection,
    /// Results handed out by successive flash/boot calls; `Ok` once exhausted
    pub results: Mutex<VecDeque<Result<(), TransportError>>>,
    pub flashes: AtomicUsize,
    pub boots: AtomicUsize,
    pub credentials: Mutex<Vec<Option<String>>>,
}

impl FakeFastboot {
    pub fn new() -> Self {
        Self {
            detection: Detection::Found,
            results: Mutex::new(VecDeque::new()),
            flashes: AtomicUsize::new(0),
            boots: AtomicUsize::new(0),
            credentials: Mutex::new(Vec::new()),
        }
    }

    pub fn with_detection(mut self, detection: Detection) -> Self {
        self.detection = detection;
        self
    }

    pub fn with_results(self, results: Vec<Result<(), TransportError>>) -> Self {
        *self.results.lock().unwrap() = results.into();
        self
    }

    pub fn flashes(&self) -> usize {
        self.flashes.load(Ordering::SeqCst)
    }

    pub fn boots(&self) -> usize {
        self.boots.load(Ordering::SeqCst)
    }

    fn next_result(&self, credential: Option<&Secret>) -> Result<(), TransportError> {
        self.credentials
            .lock()
            .unwrap()
            .push(credential.map(|s| s.expose().to_string()));
        self.results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

#[async_trait]
impl BootloaderTransport for FakeFastboot {
    async fn wait_for_device(&self, _credential: &Secret) -> Result<(), TransportError> {
        detect(self.detection).await
    }

    async fn flash(
        &self,
        _images: &[ImageSpec],
        credential: Option<&Secret>,
    ) -> Result<(), TransportError> {
        self.flashes.fetch_add(1, Ordering::SeqCst);
        self.next_result(credential)
    }

    async fn boot(
        &self,
        _images: &[ImageSpec],
        credential: Option<&Secret>,
    ) -> Result<(), TransportError> {
        self.boots.fetch_add(1, Ordering::SeqCst);
        self.next_result(credential)
    }
}

pub struct FakeCatalog {
    /// `None` makes every instructions request fail
    pub instructions: Option<InstallInstructions>,
    pub reports: Mutex<Vec<SuccessReport>>,
}

impl FakeCatalog {
    pub fn new(instructions: Option<InstallInstructions>) -> Self {
        Self {
            instructions,
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn reports(&self) -> Vec<SuccessReport> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn devices(&self) -> Result<Vec<DeviceSummary>, CatalogError> {
        Ok(vec![DeviceSummary {
            device: "bacon".into(),
            name: "OnePlus One".into(),
        }])
    }

    async fn device(&self, id: &str) -> Result<DeviceDetail, CatalogError> {
        Ok(DeviceDetail {
            device: DeviceSummary {
                device: id.to_string(),
                name: format!("Device {}", id),
            },
            extra: serde_json::Map::new(),
        })
    }

    async fn install_instructions(&self, _id: &str) -> Result<InstallInstructions, CatalogError> {
        self.instructions
            .clone()
            .ok_or_else(|| CatalogError::Other("service unavailable".into()))
    }

    async fn report_success(&self, report: &SuccessReport) -> Result<(), CatalogError> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

pub struct FakeDownloader {
    pub failure: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self {
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, images: &[ImageSpec], bus: &EventBus) -> Result<(), String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        bus.emit(Event::DownloadStart {
            count: images.len(),
            total: images.len(),
        });
        match &self.failure {
            Some(reason) => Err(reason.clone()),
            None => {
                bus.emit(Event::DownloadProgress { percent: 1.0 });
                Ok(())
            }
        }
    }
}

pub struct FakeSystemImage {
    pub failure: Option<String>,
    pub installs: Mutex<Vec<(String, String)>>,
    pub channels: Vec<String>,
}

impl FakeSystemImage {
    pub fn new() -> Self {
        Self {
            failure: None,
            installs: Mutex::new(Vec::new()),
            channels: vec![
                "ubuntu-touch/stable".into(),
                "ubuntu-touch/devel".into(),
            ],
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::new()
        }
    }

    pub fn installs(&self) -> Vec<(String, String)> {
        self.installs.lock().unwrap().clone()
    }
}

#[async_trait]
impl SystemImage for FakeSystemImage {
    async fn install_latest(
        &self,
        device: &str,
        channel: &str,
        bus: &EventBus,
    ) -> Result<(), String> {
        self.installs
            .lock()
            .unwrap()
            .push((device.to_string(), channel.to_string()));
        if let Some(reason) = &self.failure {
            bus.emit(Event::AdbPushError(reason.clone()));
            return Err(reason.clone());
        }
        bus.emit(Event::AdbPushStart { count: 1 });
        bus.emit(Event::AdbPushProgress { percent: 100 });
        bus.emit(Event::AdbPushDone);
        Ok(())
    }

    async fn device_channels(&self, _device: &str) -> Result<Vec<String>, String> {
        Ok(self.channels.clone())
    }
}
