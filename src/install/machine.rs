//! Install workflow state machine
//!
//! [`next`] is a pure transition table; the orchestrator performs the work a
//! phase stands for and feeds the outcome back in.

use serde::Serialize;
use thiserror::Error;

use crate::catalog::InstallSettings;
use crate::devices::DeviceState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "state", rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the device to reach the mode the first step needs
    AwaitInitialState(DeviceState),
    Downloading,
    Bootstrapping,
    InstallingImage,
    /// Final reboot into recovery after the OS image was pushed
    AwaitFinalState,
    Done,
    Failed,
}

/// Result of the work done in a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    StateReached,
    Downloaded,
    Flashed,
    ImageInstalled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("No transition from {phase:?} on {outcome:?}")]
pub struct InvalidTransition {
    pub phase: Phase,
    pub outcome: Outcome,
}

impl Phase {
    pub fn initial(settings: &InstallSettings) -> Self {
        if settings.bootstrap {
            Phase::AwaitInitialState(DeviceState::Bootloader)
        } else {
            Phase::AwaitInitialState(DeviceState::Recovery)
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }
}

pub fn next(phase: Phase, outcome: Outcome) -> Result<Phase, InvalidTransition> {
    use DeviceState::{Bootloader, Recovery};

    let next = match (phase, outcome) {
        (p, Outcome::Failed) if !p.is_terminal() => Phase::Failed,
        (Phase::AwaitInitialState(Bootloader), Outcome::StateReached) => Phase::Downloading,
        (Phase::AwaitInitialState(Recovery), Outcome::StateReached) => Phase::InstallingImage,
        (Phase::Downloading, Outcome::Downloaded) => Phase::Bootstrapping,
        (Phase::Bootstrapping, Outcome::Flashed) => Phase::AwaitInitialState(Recovery),
        (Phase::InstallingImage, Outcome::ImageInstalled) => Phase::AwaitFinalState,
        (Phase::AwaitFinalState, Outcome::StateReached) => Phase::Done,
        _ => return Err(InvalidTransition { phase, outcome }),
    };
    Ok(next)
}
