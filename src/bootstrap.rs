//! Bootstrap flasher
//!
//! Writes (or transiently boots) the bootstrap images through the bootloader
//! transport on devices whose recovery cannot install the OS on its own.

use std::sync::Arc;

use crate::catalog::ImageSpec;
use crate::credentials::CredentialGate;
use crate::devices::BootloaderTransport;
use crate::error::{InstallError, TransportError};
use crate::events::{Event, Secret};
use crate::install::InstallSession;
use crate::{log_error, log_info, log_warn};

const MODULE: &str = "bootstrap";

/// Decides whether the bootloader transport needs elevated privileges
pub trait PrivilegePolicy: Send + Sync {
    fn needs_elevation(&self) -> bool;
}

/// Elevation is needed unless the process already runs as root
pub struct EffectiveUidPolicy;

impl PrivilegePolicy for EffectiveUidPolicy {
    #[cfg(unix)]
    fn needs_elevation(&self) -> bool {
        // SAFETY: geteuid has no preconditions and cannot fail
        let euid = unsafe { libc::geteuid() };
        euid != 0
    }

    #[cfg(not(unix))]
    fn needs_elevation(&self) -> bool {
        false
    }
}

pub struct BootstrapFlasher {
    fastboot: Arc<dyn BootloaderTransport>,
    gate: Arc<CredentialGate>,
    policy: Arc<dyn PrivilegePolicy>,
}

impl BootstrapFlasher {
    pub fn new(
        fastboot: Arc<dyn BootloaderTransport>,
        gate: Arc<CredentialGate>,
        policy: Arc<dyn PrivilegePolicy>,
    ) -> Self {
        Self {
            fastboot,
            gate,
            policy,
        }
    }

    pub async fn flash(
        &self,
        session: &InstallSession,
        fastbootboot: bool,
        images: &[ImageSpec],
    ) -> Result<(), InstallError> {
        if fastbootboot {
            self.boot(session, images).await?;
        } else {
            self.write(session, images).await?;
        }

        log_info!(MODULE, "{}: bootstrap done", session.device);
        session.bus.emit(Event::BootstrapDone);
        Ok(())
    }

    /// Transient boot, nothing is written and no credential is requested
    async fn boot(
        &self,
        session: &InstallSession,
        images: &[ImageSpec],
    ) -> Result<(), InstallError> {
        log_info!(MODULE, "Booting {} images without flashing", images.len());
        session
            .bus
            .emit(Event::status("Booting into recovery image..."));

        self.fastboot.boot(images, None).await.map_err(|e| {
            log_error!(MODULE, "Boot failed: {}", e);
            InstallError::FlashFailed(e.to_string())
        })
    }

    async fn write(
        &self,
        session: &InstallSession,
        images: &[ImageSpec],
    ) -> Result<(), InstallError> {
        let bus = &session.bus;
        bus.emit(Event::BootstrapFlashing);
        bus.emit(Event::status("Flashing images"));

        let mut credential: Option<Secret> = if self.policy.needs_elevation() {
            Some(self.gate.obtain(bus, &session.cancel).await?)
        } else {
            log_info!(MODULE, "Running with sufficient privileges, no password needed");
            None
        };

        let mut rejected = 0u32;
        loop {
            log_info!(MODULE, "Flashing {} images", images.len());
            match self.fastboot.flash(images, credential.as_ref()).await {
                Ok(()) => return Ok(()),
                Err(TransportError::Credential(reason)) => {
                    rejected += 1;
                    log_warn!(MODULE, "Flash rejected the password: {}", reason);
                    self.gate.invalidate().await;
                    bus.emit(Event::UserPasswordWrong);

                    if self.gate.max_attempts().is_some_and(|max| rejected >= max) {
                        return Err(InstallError::CredentialInvalid { attempts: rejected });
                    }
                    credential = Some(self.gate.obtain(bus, &session.cancel).await?);
                }
                Err(TransportError::Failed(reason)) => {
                    log_error!(MODULE, "Flash failed: {}", reason);
                    return Err(InstallError::FlashFailed(reason));
                }
            }
        }
    }
}
