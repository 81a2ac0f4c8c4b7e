//! In-memory collaborators for pipeline tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::backend::{BackendProvisioner, FakeBackend, SeedCredentials, ServerEndpoint};
use crate::errors::{BackendError, SandboxError};
use crate::executors::{SandboxExecutor, SandboxRequest, SandboxResult};
use crate::runner::{RunEvent, RunObserver};

#[derive(Debug, Clone, Default)]
pub struct MockBackendState {
    created: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
    fail_shutdown: Arc<AtomicBool>,
}

impl MockBackendState {
    pub fn instances_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn fail_shutdown(&self) {
        self.fail_shutdown.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailAt {
    Create,
    Seed,
    Start,
}

pub struct MockProvisioner {
    base_url: String,
    api_key: String,
    fail_at: Option<FailAt>,
    state: MockBackendState,
}

impl MockProvisioner {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_state(base_url, api_key, MockBackendState::default())
    }

    pub fn with_state(base_url: &str, api_key: &str, state: MockBackendState) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            fail_at: None,
            state,
        }
    }

    pub fn failing_create() -> Self {
        Self::failing(FailAt::Create)
    }

    pub fn failing_seed() -> Self {
        Self::failing(FailAt::Seed)
    }

    pub fn failing_start() -> Self {
        Self::failing(FailAt::Start)
    }

    fn failing(fail_at: FailAt) -> Self {
        let mut provisioner = Self::new("http://unused", "unused");
        provisioner.fail_at = Some(fail_at);
        provisioner
    }

    pub fn state(&self) -> MockBackendState {
        self.state.clone()
    }
}

#[async_trait]
impl BackendProvisioner for MockProvisioner {
    async fn create_instance(&self) -> Result<Box<dyn FakeBackend>, BackendError> {
        if self.fail_at == Some(FailAt::Create) {
            return Err(BackendError::CreateFailed("mock create failure".to_string()));
        }
        self.state.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockBackend {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            fail_at: self.fail_at,
            state: self.state.clone(),
        }))
    }
}

struct MockBackend {
    base_url: String,
    api_key: String,
    fail_at: Option<FailAt>,
    state: MockBackendState,
}

#[async_trait]
impl FakeBackend for MockBackend {
    async fn seed(&mut self) -> Result<SeedCredentials, BackendError> {
        if self.fail_at == Some(FailAt::Seed) {
            return Err(BackendError::SeedFailed("mock seed failure".to_string()));
        }
        Ok(SeedCredentials {
            api_key: self.api_key.clone(),
        })
    }

    async fn start_server(&mut self) -> Result<ServerEndpoint, BackendError> {
        if self.fail_at == Some(FailAt::Start) {
            return Err(BackendError::StartFailed("mock start failure".to_string()));
        }
        Ok(ServerEndpoint {
            base_url: self.base_url.clone(),
        })
    }

    async fn shutdown(&mut self) -> Result<(), BackendError> {
        self.state.shutdowns.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_shutdown.load(Ordering::SeqCst) {
            return Err(BackendError::ShutdownFailed("mock shutdown failure".to_string()));
        }
        Ok(())
    }
}

pub struct MockExecutor {
    response: Result<SandboxResult, fn() -> SandboxError>,
    requests: Mutex<Vec<SandboxRequest>>,
}

impl MockExecutor {
    pub fn returning(stdout: &str, stderr: &str) -> Self {
        Self::with_result(SandboxResult {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(if stderr.is_empty() { 0 } else { 1 }),
        })
    }

    pub fn with_result(result: SandboxResult) -> Self {
        Self {
            response: Ok(result),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: fn() -> SandboxError) -> Self {
        Self {
            response: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> Option<SandboxRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SandboxExecutor for MockExecutor {
    async fn execute(&self, request: SandboxRequest) -> Result<SandboxResult, SandboxError> {
        self.requests.lock().unwrap().push(request);
        match &self.response {
            Ok(result) => Ok(result.clone()),
            Err(make_error) => Err(make_error()),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl RunObserver for RecordingObserver {
    fn on_event(&self, event: &RunEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
