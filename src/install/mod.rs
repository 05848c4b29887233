//! Install orchestrator
//!
//! Drives one install session from the catalog lookup to the final reboot:
//! reboots the device into the modes each step needs, downloads and flashes
//! the bootstrap images when the device requires them, and installs the OS
//! image. Every milestone is published on the session's [`EventBus`].

mod machine;
mod progress;
mod session;

pub use machine::{next, InvalidTransition, Outcome, Phase};
pub use progress::attach as attach_progress;
pub use session::{InstallOptions, InstallSession};

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bootstrap::{BootstrapFlasher, PrivilegePolicy};
use crate::catalog::{Catalog, ImageSpec, SuccessReport};
use crate::config::InstallerConfig;
use crate::credentials::{CredentialGate, PrivilegeValidator};
use crate::devices::discovery::{self, SelectedDevice};
use crate::devices::{AutomaticTransport, BootloaderTransport, DeviceState};
use crate::download::{verify_images, Downloader};
use crate::error::InstallError;
use crate::events::{Event, EventBus};
use crate::reboot::RebootCoordinator;
use crate::system_image::SystemImage;
use crate::{log_debug, log_error, log_info, log_warn};

const MODULE: &str = "install";

/// External services an [`Installer`] drives
pub struct Collaborators {
    pub catalog: Arc<dyn Catalog>,
    pub adb: Arc<dyn AutomaticTransport>,
    pub fastboot: Arc<dyn BootloaderTransport>,
    pub downloader: Arc<dyn Downloader>,
    pub system_image: Arc<dyn SystemImage>,
    pub validator: Arc<dyn PrivilegeValidator>,
    pub policy: Arc<dyn PrivilegePolicy>,
}

struct Shared {
    config: InstallerConfig,
    catalog: Arc<dyn Catalog>,
    adb: Arc<dyn AutomaticTransport>,
    downloader: Arc<dyn Downloader>,
    system_image: Arc<dyn SystemImage>,
    reboot: RebootCoordinator,
    flasher: BootstrapFlasher,
    /// Devices with a session in flight
    active: Mutex<HashSet<String>>,
}

impl Shared {
    fn active_devices(&self) -> MutexGuard<'_, HashSet<String>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Entry point for install sessions
///
/// One credential gate is shared by every session started from the same
/// installer.
#[derive(Clone)]
pub struct Installer {
    shared: Arc<Shared>,
}

impl Installer {
    pub fn new(config: InstallerConfig, collaborators: Collaborators) -> Self {
        let gate = Arc::new(CredentialGate::new(
            collaborators.validator,
            config.max_password_attempts,
        ));
        let reboot = RebootCoordinator::new(
            Arc::clone(&collaborators.adb),
            Arc::clone(&collaborators.fastboot),
            Arc::clone(&gate),
            config.automatic_detection_timeout(),
            config.bootloader_detection_timeout(),
        );
        let flasher = BootstrapFlasher::new(collaborators.fastboot, gate, collaborators.policy);

        Self {
            shared: Arc::new(Shared {
                config,
                catalog: collaborators.catalog,
                adb: collaborators.adb,
                downloader: collaborators.downloader,
                system_image: collaborators.system_image,
                reboot,
                flasher,
                active: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Reserve `device` for a new session without starting it yet.
    ///
    /// Listeners attached to [`PendingInstall::bus`] before
    /// [`PendingInstall::start`] see every event of the session.
    pub fn prepare(
        &self,
        device: &str,
        channel: &str,
        options: InstallOptions,
    ) -> Result<PendingInstall, InstallError> {
        if !self.shared.active_devices().insert(device.to_string()) {
            log_warn!(MODULE, "Install already running for {}", device);
            return Err(InstallError::AlreadyInstalling(device.to_string()));
        }

        Ok(PendingInstall {
            guard: ActiveGuard {
                shared: Arc::clone(&self.shared),
                device: device.to_string(),
            },
            channel: channel.to_string(),
            options,
            bus: EventBus::new(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn install(
        &self,
        device: &str,
        channel: &str,
        options: InstallOptions,
    ) -> Result<InstallHandle, InstallError> {
        Ok(self.prepare(device, channel, options)?.start())
    }

    /// Wait for a device to be connected or picked on `bus`
    pub async fn select_device(
        &self,
        bus: &EventBus,
        cancel: &CancellationToken,
    ) -> Result<SelectedDevice, InstallError> {
        discovery::wait_for_device(
            bus,
            self.shared.adb.as_ref(),
            self.shared.catalog.as_ref(),
            self.shared.system_image.as_ref(),
            cancel,
        )
        .await
    }
}

/// Releases the device reservation when the session ends
struct ActiveGuard {
    shared: Arc<Shared>,
    device: String,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.shared.active_devices().remove(&self.device);
        log_debug!(MODULE, "Released {}", self.device);
    }
}

/// Session reserved by [`Installer::prepare`]
pub struct PendingInstall {
    guard: ActiveGuard,
    channel: String,
    options: InstallOptions,
    bus: EventBus,
    cancel: CancellationToken,
}

impl PendingInstall {
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the session on a spawned task
    pub fn start(self) -> InstallHandle {
        let (phase_tx, phase_rx) = watch::channel(None);
        let bus = self.bus.clone();
        let cancel = self.cancel.clone();

        let task = tokio::spawn(async move {
            let guard = self.guard;
            let run = Run {
                shared: Arc::clone(&guard.shared),
                phase: phase_tx,
            };
            run.execute(
                &guard.device,
                &self.channel,
                self.options,
                self.bus,
                self.cancel,
            )
            .await
        });

        InstallHandle {
            bus,
            cancel,
            phase: phase_rx,
            task,
        }
    }
}

/// Handle to a running session
pub struct InstallHandle {
    bus: EventBus,
    cancel: CancellationToken,
    phase: watch::Receiver<Option<Phase>>,
    task: JoinHandle<Result<(), InstallError>>,
}

impl InstallHandle {
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Abort the session at its next suspension point
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Current phase; `None` until the install instructions are fetched
    pub fn phase(&self) -> Option<Phase> {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<Option<Phase>> {
        self.phase.clone()
    }

    /// Wait for the session to finish
    pub async fn wait(self) -> Result<(), InstallError> {
        self.task
            .await
            .map_err(|e| InstallError::Task(e.to_string()))?
    }
}

struct Run {
    shared: Arc<Shared>,
    phase: watch::Sender<Option<Phase>>,
}

impl Run {
    async fn execute(
        &self,
        device: &str,
        channel: &str,
        options: InstallOptions,
        bus: EventBus,
        cancel: CancellationToken,
    ) -> Result<(), InstallError> {
        if options.user_events {
            progress::attach(&bus);
        }
        log_info!(MODULE, "Installing {} on {}", channel, device);

        let result = self.drive(device, channel, options, &bus, cancel).await;
        if let Err(e) = &result {
            log_error!(MODULE, "Install on {} failed: {}", device, e);
            let current = *self.phase.borrow();
            let failed = match current {
                Some(phase) => next(phase, Outcome::Failed).unwrap_or(Phase::Failed),
                None => Phase::Failed,
            };
            self.phase.send_replace(Some(failed));
            bus.emit(Event::Error(e.to_string()));
        }
        result
    }

    async fn drive(
        &self,
        device: &str,
        channel: &str,
        options: InstallOptions,
        bus: &EventBus,
        cancel: CancellationToken,
    ) -> Result<(), InstallError> {
        let catalog = &self.shared.catalog;
        let instructions = tokio::select! {
            _ = cancel.cancelled() => return Err(InstallError::Cancelled),
            result = catalog.install_instructions(device) => result?,
        };

        let settings = instructions.install_settings;
        let images = instructions.images_for(&self.shared.config.base_dir, device);
        log_info!(
            MODULE,
            "{}: bootstrap={}, fastbootboot={}, {} images",
            device,
            settings.bootstrap,
            settings.fastbootboot,
            images.len()
        );

        let session =
            InstallSession::new(device, channel, bus.clone(), instructions, cancel, options);
        let mut phase = Phase::initial(&settings);

        loop {
            log_debug!(MODULE, "{}: entering {:?}", device, phase);
            self.phase.send_replace(Some(phase));

            let outcome = match phase {
                Phase::AwaitInitialState(state) => {
                    self.shared.reboot.require_state(&session, state).await?;
                    Outcome::StateReached
                }
                Phase::Downloading => {
                    self.download(&session, &images).await?;
                    Outcome::Downloaded
                }
                Phase::Bootstrapping => {
                    self.shared
                        .flasher
                        .flash(&session, settings.fastbootboot, &images)
                        .await?;
                    Outcome::Flashed
                }
                Phase::InstallingImage => {
                    self.install_image(&session).await?;
                    Outcome::ImageInstalled
                }
                Phase::AwaitFinalState => {
                    self.shared
                        .reboot
                        .require_state(&session, DeviceState::Recovery)
                        .await?;
                    Outcome::StateReached
                }
                Phase::Done | Phase::Failed => break,
            };
            phase = next(phase, outcome)?;
        }

        log_info!(MODULE, "Install on {} finished", device);
        bus.emit(Event::InstallDone);
        self.report_success(&session).await;
        Ok(())
    }

    async fn download(
        &self,
        session: &InstallSession,
        images: &[ImageSpec],
    ) -> Result<(), InstallError> {
        let bus = &session.bus;
        bus.emit(Event::ImagesStartDownload);

        let fetched = tokio::select! {
            _ = session.cancel.cancelled() => return Err(InstallError::Cancelled),
            result = self.shared.downloader.download(images, bus) => result,
        };
        let result = match fetched {
            Ok(()) => verify_images(images, bus).await,
            Err(reason) => Err(InstallError::Download(reason)),
        };

        match result {
            Ok(()) => {
                bus.emit(Event::DownloadDone);
                Ok(())
            }
            Err(e) => {
                bus.emit(Event::DownloadError(e.to_string()));
                Err(e)
            }
        }
    }

    async fn install_image(&self, session: &InstallSession) -> Result<(), InstallError> {
        let bus = &session.bus;
        bus.emit(Event::SystemImageStart);

        if session.options.system_image {
            tokio::select! {
                _ = session.cancel.cancelled() => return Err(InstallError::Cancelled),
                result = self.shared.system_image.install_latest(
                    &session.device,
                    &session.channel,
                    bus,
                ) => result.map_err(InstallError::SystemImage)?,
            }
        } else {
            log_info!(MODULE, "System image step disabled, skipping");
        }

        bus.emit(Event::SystemImageDone);
        Ok(())
    }

    async fn report_success(&self, session: &InstallSession) {
        let report = SuccessReport {
            device: session.device.clone(),
            channel: session.channel.clone(),
        };
        if let Err(e) = self.shared.catalog.report_success(&report).await {
            log_warn!(MODULE, "Could not report successful install: {}", e);
        }
    }
}
