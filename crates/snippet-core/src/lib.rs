//! Sandboxed execution pipeline for documentation code snippets.
//!
//! This crate takes an untrusted snippet written in one of the supported
//! languages, points it at a freshly provisioned fake API backend, runs it in
//! an isolated container and turns the raw process output into a stable
//! [`ExecutionOutcome`].
//!
//! # Architecture Overview
//!
//! - **Backend provisioning**: a per-run fake API instance behind the
//!   [`BackendProvisioner`] seam, held as a scoped [`backend::BackendLease`]
//! - **Snippet preparation**: per-language [`SnippetPreparer`] implementations
//!   (placeholder substitution or preamble injection)
//! - **Sandbox execution**: the [`SandboxExecutor`] seam with a Docker
//!   implementation in [`executors::docker`]
//! - **Output normalization**: ANSI stripping, line-ending canonicization and
//!   result shaping in [`normalize`]
//! - **Runners**: one [`SnippetRunner`] per language gluing the above together
//! - **Configuration**: YAML configuration with environment overrides

pub mod backend;
pub mod config;
pub mod core_types;
pub mod errors;
pub mod executors;
pub mod normalize;
pub mod prepare;
pub mod runner;

pub use backend::{BackendProvisioner, FakeBackend};
pub use config::{ConfigLoader, RunnerConfig};
pub use core_types::{BackendInstance, ExecutionOutcome, Language, PreparedSource};
pub use errors::{BackendError, ConfigError, RunError, SandboxError};
pub use executors::{SandboxExecutor, SandboxRequest, SandboxResult};
pub use prepare::SnippetPreparer;
pub use runner::{LogObserver, RunEvent, RunObserver, SnippetRunner};

#[cfg(test)]
pub mod test_utils;
