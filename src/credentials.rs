//! Credential gate
//!
//! Obtains the privileged secret from the user through the event bus,
//! validates it and keeps it for later callers until invalidated.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::InstallError;
use crate::events::{Event, EventBus, Secret};
use crate::{log_debug, log_info, log_warn};

const MODULE: &str = "credentials";

/// Checks whether a candidate secret grants the required privileges
#[async_trait]
pub trait PrivilegeValidator: Send + Sync {
    async fn validate(&self, secret: &Secret) -> Result<bool, String>;
}

/// Validates a password against `sudo`
///
/// Runs `sudo -S -k true` with the password on stdin; `-k` discards any cached
/// timestamp so the password is always checked.
pub struct SudoValidator;

#[async_trait]
impl PrivilegeValidator for SudoValidator {
    async fn validate(&self, secret: &Secret) -> Result<bool, String> {
        log_debug!(MODULE, "Checking password with sudo");

        let mut child = Command::new("sudo")
            .args(["-S", "-k", "-p", "", "true"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("Failed to start sudo: {}", e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(format!("{}\n", secret.expose()).as_bytes())
                .await
                .map_err(|e| format!("Failed to pass password to sudo: {}", e))?;
        }

        let status = child
            .wait()
            .await
            .map_err(|e| format!("Failed to wait for sudo: {}", e))?;
        Ok(status.success())
    }
}

/// Holder for the validated secret
///
/// One prompt is outstanding at a time: concurrent callers queue on the gate
/// and reuse the secret the first caller validated.
pub struct CredentialGate {
    secret: Mutex<Option<Secret>>,
    validator: Arc<dyn PrivilegeValidator>,
    max_attempts: Option<u32>,
}

impl CredentialGate {
    pub fn new(validator: Arc<dyn PrivilegeValidator>, max_attempts: Option<u32>) -> Self {
        Self {
            secret: Mutex::new(None),
            validator,
            max_attempts,
        }
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// The validated secret, prompting through `bus` if none is cached yet
    pub async fn obtain(
        &self,
        bus: &EventBus,
        cancel: &CancellationToken,
    ) -> Result<Secret, InstallError> {
        let mut cached = tokio::select! {
            _ = cancel.cancelled() => return Err(InstallError::Cancelled),
            guard = self.secret.lock() => guard,
        };
        if let Some(secret) = cached.as_ref() {
            log_debug!(MODULE, "Using cached credential");
            return Ok(secret.clone());
        }

        let mut rejected = 0u32;
        loop {
            let reply = bus.once("password");
            bus.emit(Event::UserPassword);

            let candidate = tokio::select! {
                _ = cancel.cancelled() => {
                    log_info!(MODULE, "Password request cancelled");
                    return Err(InstallError::Cancelled);
                }
                reply = reply => match reply {
                    Ok(Event::Password(secret)) => secret,
                    _ => return Err(InstallError::Cancelled),
                },
            };

            let valid = tokio::select! {
                _ = cancel.cancelled() => return Err(InstallError::Cancelled),
                valid = self.validator.validate(&candidate) => {
                    valid.map_err(InstallError::PrivilegeCheck)?
                }
            };

            if valid {
                log_info!(MODULE, "Password accepted");
                *cached = Some(candidate.clone());
                return Ok(candidate);
            }

            rejected += 1;
            log_warn!(MODULE, "Wrong password ({} so far)", rejected);
            bus.emit(Event::UserPasswordWrong);

            if self.max_attempts.is_some_and(|max| rejected >= max) {
                return Err(InstallError::CredentialInvalid { attempts: rejected });
            }
        }
    }

    /// Forget the cached secret so the next [`obtain`](Self::obtain) prompts again
    pub async fn invalidate(&self) {
        if self.secret.lock().await.take().is_some() {
            log_info!(MODULE, "Cached credential invalidated");
        }
    }

    pub async fn is_validated(&self) -> bool {
        self.secret.lock().await.is_some()
    }
}
