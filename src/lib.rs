//! Touch Installer - install Ubuntu Touch on supported phones and tablets
//!
//! The crate orchestrates an install session: it fetches the device's install
//! instructions from the catalog service, brings the device into the required
//! modes, flashes bootstrap images when the device needs them and installs the
//! OS image. Device transports, downloads and the OS-image push are external
//! collaborators behind the traits in [`devices`], [`download`] and
//! [`system_image`].
//!
//! Progress and user interaction go through a per-session [`EventBus`]. A
//! presentation layer listens for events such as `user:password` and answers
//! with `password`.

pub mod logging;

pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod devices;
pub mod download;
pub mod error;
pub mod events;
pub mod install;
pub mod reboot;
pub mod system_image;
pub mod utils;

#[cfg(test)]
mod fakes;

pub use config::InstallerConfig;
pub use devices::DeviceState;
pub use error::InstallError;
pub use events::{Event, EventBus, Secret};
pub use install::{Collaborators, InstallHandle, InstallOptions, Installer, PendingInstall, Phase};
