//! `BackendProvisioner` backed by one in-process fake API server per run.

use async_trait::async_trait;
use snippet_core::backend::{BackendProvisioner, FakeBackend, SeedCredentials, ServerEndpoint};
use snippet_core::BackendError;
use uuid::Uuid;

use crate::fixtures::ApiFixture;
use crate::server::{FakeApiServer, RunningServer};

pub const DEFAULT_ADVERTISED_HOST: &str = "host.docker.internal";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:0";

#[derive(Debug, Clone)]
pub struct FakeApiProvisioner {
    fixture: ApiFixture,
    bind_addr: String,
    advertised_host: String,
}

impl FakeApiProvisioner {
    pub fn new() -> Self {
        Self {
            fixture: ApiFixture::create_test_fixture(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            advertised_host: DEFAULT_ADVERTISED_HOST.to_string(),
        }
    }

    pub fn with_fixture(mut self, fixture: ApiFixture) -> Self {
        self.fixture = fixture;
        self
    }

    pub fn with_bind_addr(mut self, bind_addr: impl Into<String>) -> Self {
        self.bind_addr = bind_addr.into();
        self
    }

    pub fn with_advertised_host(mut self, advertised_host: impl Into<String>) -> Self {
        self.advertised_host = advertised_host.into();
        self
    }
}

impl Default for FakeApiProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendProvisioner for FakeApiProvisioner {
    async fn create_instance(&self) -> Result<Box<dyn FakeBackend>, BackendError> {
        Ok(Box::new(FakeApiInstance {
            fixture: self.fixture.clone(),
            bind_addr: self.bind_addr.clone(),
            advertised_host: self.advertised_host.clone(),
            api_key: None,
            server: None,
        }))
    }
}

pub struct FakeApiInstance {
    fixture: ApiFixture,
    bind_addr: String,
    advertised_host: String,
    api_key: Option<String>,
    server: Option<RunningServer>,
}

#[async_trait]
impl FakeBackend for FakeApiInstance {
    async fn seed(&mut self) -> Result<SeedCredentials, BackendError> {
        let api_key = format!("seam_apikey_{}", Uuid::new_v4().simple());
        self.api_key = Some(api_key.clone());
        Ok(SeedCredentials { api_key })
    }

    async fn start_server(&mut self) -> Result<ServerEndpoint, BackendError> {
        if let Some(server) = &self.server {
            return Ok(ServerEndpoint {
                base_url: server.base_url().to_string(),
            });
        }

        let api_key = self.api_key.clone().ok_or_else(|| {
            BackendError::StartFailed("backend must be seeded before it is started".to_string())
        })?;

        let server = FakeApiServer::new(self.fixture.clone(), api_key)
            .start(&self.bind_addr, &self.advertised_host)
            .await
            .map_err(|e| BackendError::StartFailed(e.to_string()))?;

        let base_url = server.base_url().to_string();
        self.server = Some(server);
        Ok(ServerEndpoint { base_url })
    }

    async fn shutdown(&mut self) -> Result<(), BackendError> {
        match self.server.take() {
            Some(server) => server
                .shutdown()
                .await
                .map_err(|e| BackendError::ShutdownFailed(e.to_string())),
            None => Ok(()),
        }
    }
}
