//! Fake backend provisioning.
//!
//! Every run gets its own backend instance. The provisioner hands out a
//! [`FakeBackend`] handle which is seeded with credentials and started; the
//! resulting [`BackendLease`] owns that handle for the rest of the run and
//! shuts it down on [`BackendLease::release`] (or, as a fallback, when the
//! handle itself is dropped).

use async_trait::async_trait;

use crate::core_types::BackendInstance;
use crate::errors::BackendError;

/// Credentials produced by seeding a fresh backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedCredentials {
    pub api_key: String,
}

/// Address at which a started backend is reachable from inside the sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub base_url: String,
}

/// One disposable backend instance.
#[async_trait]
pub trait FakeBackend: Send {
    async fn seed(&mut self) -> Result<SeedCredentials, BackendError>;

    async fn start_server(&mut self) -> Result<ServerEndpoint, BackendError>;

    /// Stops the server. Must be safe to call on an instance that was never
    /// started.
    async fn shutdown(&mut self) -> Result<(), BackendError>;
}

#[async_trait]
pub trait BackendProvisioner: Send + Sync {
    async fn create_instance(&self) -> Result<Box<dyn FakeBackend>, BackendError>;
}

/// A provisioned backend, scoped to a single run.
pub struct BackendLease {
    instance: BackendInstance,
    handle: Option<Box<dyn FakeBackend>>,
}

impl BackendLease {
    pub fn instance(&self) -> &BackendInstance {
        &self.instance
    }

    /// Tears the backend down. Failures are logged and swallowed: by the time
    /// a lease is released the run result is already known.
    pub async fn release(mut self) {
        if let Some(mut handle) = self.handle.take() {
            match handle.shutdown().await {
                Ok(()) => log::debug!("Backend at {} shut down", self.instance.base_url),
                Err(e) => log::warn!(
                    "Failed to shut down backend at {}: {}",
                    self.instance.base_url,
                    e
                ),
            }
        }
    }
}

impl Drop for BackendLease {
    fn drop(&mut self) {
        if self.handle.is_some() {
            log::debug!(
                "Backend lease for {} dropped without explicit release",
                self.instance.base_url
            );
        }
    }
}

/// Creates, seeds and starts a backend. Any failure is fatal for the run and
/// is not retried.
pub async fn provision(
    provisioner: &dyn BackendProvisioner,
) -> Result<BackendLease, BackendError> {
    let mut handle = provisioner.create_instance().await?;

    let credentials = match handle.seed().await {
        Ok(credentials) => credentials,
        Err(e) => {
            let _ = handle.shutdown().await;
            return Err(e);
        }
    };
    let endpoint = match handle.start_server().await {
        Ok(endpoint) => endpoint,
        Err(e) => {
            let _ = handle.shutdown().await;
            return Err(e);
        }
    };

    log::debug!("Provisioned fake backend at {}", endpoint.base_url);

    Ok(BackendLease {
        instance: BackendInstance {
            base_url: endpoint.base_url,
            api_key: credentials.api_key,
        },
        handle: Some(handle),
    })
}
