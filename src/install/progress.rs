//! Progress mirroring
//!
//! Translates collaborator progress events into the `user:write:*` events a
//! presentation layer renders, and logs them.

use crate::events::{Event, EventBus, SubscriptionId};
use crate::utils::fraction_to_percent;
use crate::{log_debug, log_error, log_info};

const MODULE: &str = "install::progress";

/// Subscribe the mirroring listeners to `bus`
pub fn attach(bus: &EventBus) -> SubscriptionId {
    bus.on_any(mirror)
}

fn mirror(bus: &EventBus, event: &Event) {
    match event {
        Event::DownloadStart { count, total } => {
            log_info!(MODULE, "Downloading {} of {} images", count, total);
            bus.emit(Event::status("Downloading Ubuntu touch"));
            bus.emit(Event::UserWriteNext {
                label: "Downloading".into(),
                remaining: *count,
                total: Some(*total),
            });
        }
        Event::DownloadNext { remaining, total } => {
            log_info!(MODULE, "Downloading next image ({} of {})", remaining, total);
            bus.emit(Event::UserWriteNext {
                label: "Downloading".into(),
                remaining: *remaining,
                total: Some(*total),
            });
        }
        Event::DownloadProgress { percent } => {
            let percent = fraction_to_percent(*percent);
            log_debug!(MODULE, "Download progress: {}%", percent);
            bus.emit(Event::UserWriteProgress { percent });
        }
        Event::DownloadStartCheck => {
            log_info!(MODULE, "Checking downloaded files");
            bus.emit(Event::status("Checking Ubuntu touch files"));
        }
        Event::DownloadChecking => log_info!(MODULE, "Checking file"),
        Event::DownloadDone => log_info!(MODULE, "Downloads done"),
        Event::DownloadError(reason) => log_error!(MODULE, "Download error: {}", reason),
        Event::AdbPushStart { count } => {
            log_info!(MODULE, "Pushing {} files", count);
            bus.emit(Event::status("Pushing files to device"));
            bus.emit(Event::UserWriteStart {
                label: "Pushing".into(),
                count: *count,
            });
        }
        Event::AdbPushNext { remaining } => {
            log_info!(MODULE, "Pushing next file ({} left)", remaining);
            bus.emit(Event::UserWriteNext {
                label: "Pushing".into(),
                remaining: *remaining,
                total: None,
            });
        }
        Event::AdbPushProgress { percent } => {
            log_debug!(MODULE, "Push progress: {}%", percent);
            bus.emit(Event::UserWriteProgress { percent: *percent });
        }
        Event::AdbPushDone => {
            log_info!(MODULE, "Files pushed");
            bus.emit(Event::status(
                "Rebooting to recovery to start the flashing process",
            ));
            bus.emit(Event::UserWriteDone);
        }
        Event::AdbPushError(reason) => log_error!(MODULE, "Push error: {}", reason),
        Event::Error(reason) => log_error!(MODULE, "{}", reason),
        _ => {}
    }
}
