//! Error types for the snippet execution pipeline
//!
//! Only infrastructure failures are represented here. A snippet that crashes,
//! throws or writes to stderr is a normal run and ends up in an
//! [`ExecutionOutcome`](crate::ExecutionOutcome), never in one of these enums.

use thiserror::Error;

/// Fatal failure of a single run. Callers can tell "the pipeline is broken"
/// (this type) apart from "the snippet is broken" (a null execution result).
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Backend provisioning failed: {0}")]
    Backend(#[from] BackendError),
    #[error("Sandbox execution failed: {0}")]
    Sandbox(#[from] SandboxError),
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to create backend instance: {0}")]
    CreateFailed(String),
    #[error("Failed to seed backend credentials: {0}")]
    SeedFailed(String),
    #[error("Failed to start backend server: {0}")]
    StartFailed(String),
    #[error("Failed to shut down backend: {0}")]
    ShutdownFailed(String),
}

// Specific error for sandbox executors
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Bollard (Docker client) error: {0}")]
    BollardError(#[from] bollard::errors::Error),
    #[error("Container did not report an exit status: {0}")]
    ContainerFailed(String),
    #[error("I/O error during sandbox operation: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Could not stage virtual file '{path}': {reason}")]
    StagingError { path: String, reason: String },
    #[error("Could not create temporary file/directory: {0}")]
    TempFileError(String),
    #[error("Sandbox execution timed out after {0} seconds")]
    Timeout(u64),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid value '{value}' for environment variable {name}")]
    InvalidEnv { name: String, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
