//! Reboot coordinator
//!
//! Brings the device into the mode the next step needs, either by asking the
//! automatic transport to reboot it or by telling the user which buttons to
//! press, and waits until the device shows up in that mode.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::credentials::CredentialGate;
use crate::devices::{AutomaticTransport, BootloaderTransport, DeviceState};
use crate::error::{InstallError, TransportError};
use crate::events::Event;
use crate::install::InstallSession;
use crate::{log_error, log_info, log_warn};

const MODULE: &str = "reboot";

pub struct RebootCoordinator {
    adb: Arc<dyn AutomaticTransport>,
    fastboot: Arc<dyn BootloaderTransport>,
    gate: Arc<CredentialGate>,
    automatic_timeout: Duration,
    bootloader_timeout: Duration,
}

impl RebootCoordinator {
    pub fn new(
        adb: Arc<dyn AutomaticTransport>,
        fastboot: Arc<dyn BootloaderTransport>,
        gate: Arc<CredentialGate>,
        automatic_timeout: Duration,
        bootloader_timeout: Duration,
    ) -> Self {
        Self {
            adb,
            fastboot,
            gate,
            automatic_timeout,
            bootloader_timeout,
        }
    }

    /// Resolve once the device is confirmed in `target` mode.
    ///
    /// Callers must not overlap calls for the same session.
    pub async fn require_state(
        &self,
        session: &InstallSession,
        target: DeviceState,
    ) -> Result<(), InstallError> {
        let bus = &session.bus;
        log_info!(MODULE, "{}: requiring {} mode", session.device, target);

        let rebooted = if self.adb.has_access().await {
            log_info!(MODULE, "Device reachable, rebooting to {}", target);
            match self.adb.reboot(target).await {
                Ok(()) => {
                    bus.emit(Event::AdbRebooted);
                    true
                }
                Err(e) => {
                    log_warn!(MODULE, "Reboot to {} failed: {}", target, e);
                    false
                }
            }
        } else {
            log_info!(MODULE, "Device not reachable");
            false
        };

        if !rebooted {
            let button = session.instructions.button_for(target).map(str::to_string);
            log_info!(
                MODULE,
                "Asking user to reboot to {} ({})",
                target,
                button.as_deref().unwrap_or("no button hint")
            );
            bus.emit(Event::UserReboot {
                button,
                state: target,
            });
        }

        match target {
            DeviceState::Bootloader => {
                let credential = self.gate.obtain(bus, &session.cancel).await?;
                detect(
                    session,
                    target,
                    self.bootloader_timeout,
                    self.fastboot.wait_for_device(&credential),
                )
                .await?;
            }
            DeviceState::Recovery => {
                detect(
                    session,
                    target,
                    self.automatic_timeout,
                    self.adb.wait_for_device(),
                )
                .await?;
            }
        }

        log_info!(MODULE, "{}: device is in {} mode", session.device, target);
        bus.emit(Event::RebootDone);
        bus.emit(Event::state(target));
        Ok(())
    }
}

async fn detect<F>(
    session: &InstallSession,
    target: DeviceState,
    timeout: Duration,
    wait: F,
) -> Result<(), InstallError>
where
    F: Future<Output = Result<(), TransportError>>,
{
    tokio::select! {
        _ = session.cancel.cancelled() => Err(InstallError::Cancelled),
        result = tokio::time::timeout(timeout, wait) => match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                log_error!(MODULE, "Detection in {} mode failed: {}", target, e);
                Err(InstallError::TransportDetection {
                    state: target,
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                log_error!(
                    MODULE,
                    "No device in {} mode after {}s",
                    target,
                    timeout.as_secs()
                );
                Err(InstallError::Timeout(target))
            }
        },
    }
}
