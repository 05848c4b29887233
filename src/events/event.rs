//! Event vocabulary
//!
//! The names are the contract with presentation layers and must not change.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::devices::DeviceState;

/// Privileged secret supplied by the user. Never printed or serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("***")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", content = "payload")]
pub enum Event {
    #[serde(rename = "user:password")]
    UserPassword,
    #[serde(rename = "password")]
    Password(Secret),
    #[serde(rename = "user:password:wrong")]
    UserPasswordWrong,
    #[serde(rename = "user:reboot")]
    UserReboot {
        button: Option<String>,
        state: DeviceState,
    },
    #[serde(rename = "adb:rebooted")]
    AdbRebooted,
    #[serde(rename = "reboot:done")]
    RebootDone,
    #[serde(rename = "state:bootloader")]
    StateBootloader,
    #[serde(rename = "state:recovery")]
    StateRecovery,

    #[serde(rename = "images:startDownload")]
    ImagesStartDownload,
    #[serde(rename = "download:start")]
    DownloadStart { count: usize, total: usize },
    #[serde(rename = "download:next")]
    DownloadNext { remaining: usize, total: usize },
    /// `percent` is a fraction in `0.0..=1.0`
    #[serde(rename = "download:progress")]
    DownloadProgress { percent: f64 },
    #[serde(rename = "download:done")]
    DownloadDone,
    #[serde(rename = "download:error")]
    DownloadError(String),
    #[serde(rename = "download:checking")]
    DownloadChecking,
    #[serde(rename = "download:startCheck")]
    DownloadStartCheck,

    #[serde(rename = "adbpush:start")]
    AdbPushStart { count: usize },
    #[serde(rename = "adbpush:next")]
    AdbPushNext { remaining: usize },
    #[serde(rename = "adbpush:progress")]
    AdbPushProgress { percent: u8 },
    #[serde(rename = "adbpush:done")]
    AdbPushDone,
    #[serde(rename = "adbpush:error")]
    AdbPushError(String),

    #[serde(rename = "system-image:start")]
    SystemImageStart,
    #[serde(rename = "system-image:done")]
    SystemImageDone,
    #[serde(rename = "bootstrap:flashing")]
    BootstrapFlashing,
    #[serde(rename = "bootstrap:done")]
    BootstrapDone,

    #[serde(rename = "user:write:status")]
    UserWriteStatus { text: String },
    #[serde(rename = "user:write:next")]
    UserWriteNext {
        label: String,
        remaining: usize,
        total: Option<usize>,
    },
    #[serde(rename = "user:write:progress")]
    UserWriteProgress { percent: u8 },
    #[serde(rename = "user:write:start")]
    UserWriteStart { label: String, count: usize },
    #[serde(rename = "user:write:done")]
    UserWriteDone,

    #[serde(rename = "install:done")]
    InstallDone,
    #[serde(rename = "error")]
    Error(String),

    #[serde(rename = "device:select")]
    DeviceSelect { id: String },
    #[serde(rename = "stop")]
    Stop,
}

impl Event {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserPassword => "user:password",
            Event::Password(_) => "password",
            Event::UserPasswordWrong => "user:password:wrong",
            Event::UserReboot { .. } => "user:reboot",
            Event::AdbRebooted => "adb:rebooted",
            Event::RebootDone => "reboot:done",
            Event::StateBootloader => "state:bootloader",
            Event::StateRecovery => "state:recovery",
            Event::ImagesStartDownload => "images:startDownload",
            Event::DownloadStart { .. } => "download:start",
            Event::DownloadNext { .. } => "download:next",
            Event::DownloadProgress { .. } => "download:progress",
            Event::DownloadDone => "download:done",
            Event::DownloadError(_) => "download:error",
            Event::DownloadChecking => "download:checking",
            Event::DownloadStartCheck => "download:startCheck",
            Event::AdbPushStart { .. } => "adbpush:start",
            Event::AdbPushNext { .. } => "adbpush:next",
            Event::AdbPushProgress { .. } => "adbpush:progress",
            Event::AdbPushDone => "adbpush:done",
            Event::AdbPushError(_) => "adbpush:error",
            Event::SystemImageStart => "system-image:start",
            Event::SystemImageDone => "system-image:done",
            Event::BootstrapFlashing => "bootstrap:flashing",
            Event::BootstrapDone => "bootstrap:done",
            Event::UserWriteStatus { .. } => "user:write:status",
            Event::UserWriteNext { .. } => "user:write:next",
            Event::UserWriteProgress { .. } => "user:write:progress",
            Event::UserWriteStart { .. } => "user:write:start",
            Event::UserWriteDone => "user:write:done",
            Event::InstallDone => "install:done",
            Event::Error(_) => "error",
            Event::DeviceSelect { .. } => "device:select",
            Event::Stop => "stop",
        }
    }

    /// `state:<target>` event announcing a confirmed device state
    pub fn state(state: DeviceState) -> Self {
        match state {
            DeviceState::Bootloader => Event::StateBootloader,
            DeviceState::Recovery => Event::StateRecovery,
        }
    }

    pub fn status(text: impl Into<String>) -> Self {
        Event::UserWriteStatus { text: text.into() }
    }
}
