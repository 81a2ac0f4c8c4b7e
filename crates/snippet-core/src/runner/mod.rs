//! Per-language snippet runners.
//!
//! A run is strictly linear: provision a backend, prepare the snippet, stage
//! and execute it, normalize the output. Provisioning and sandbox
//! infrastructure failures abort the run with a [`RunError`]; a snippet that
//! writes to stderr produces an ordinary [`ExecutionOutcome`] and a
//! [`RunEvent::SnippetFailed`] notification.

use std::sync::Arc;

use crate::backend::{self, BackendProvisioner};
use crate::config::RunnerConfig;
use crate::core_types::{ExecutionOutcome, Language};
use crate::errors::RunError;
use crate::executors::SandboxExecutor;
use crate::normalize::normalize_output;

pub mod languages;

pub use languages::LanguageProfile;

/// Operator-facing diagnostics emitted while a run progresses. These are not
/// part of the returned outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    PreparationWarning { language: Language, message: String },
    SnippetFailed { language: Language, stderr: String },
}

pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: &RunEvent);
}

/// Forwards run events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::PreparationWarning { language, message } => {
                log::warn!("Preparing {} snippet: {}", language, message)
            }
            RunEvent::SnippetFailed { language, stderr } => {
                log::error!("Error during {} code execution: {}", language, stderr)
            }
        }
    }
}

pub struct SnippetRunner {
    profile: LanguageProfile,
    root_dir: String,
    provisioner: Arc<dyn BackendProvisioner>,
    executor: Arc<dyn SandboxExecutor>,
    observer: Arc<dyn RunObserver>,
}

impl SnippetRunner {
    pub fn new(
        profile: LanguageProfile,
        provisioner: Arc<dyn BackendProvisioner>,
        executor: Arc<dyn SandboxExecutor>,
    ) -> Self {
        Self {
            profile,
            root_dir: crate::config::DEFAULT_SANDBOX_ROOT.to_string(),
            provisioner,
            executor,
            observer: Arc::new(LogObserver),
        }
    }

    /// Runner for `language` with profile overrides and sandbox root taken
    /// from `config`.
    pub fn from_config(
        language: Language,
        config: &RunnerConfig,
        provisioner: Arc<dyn BackendProvisioner>,
        executor: Arc<dyn SandboxExecutor>,
    ) -> Self {
        Self::new(
            LanguageProfile::from_config(language, config),
            provisioner,
            executor,
        )
        .with_root_dir(config.sandbox.root.clone())
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_root_dir(mut self, root_dir: impl Into<String>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    pub fn language(&self) -> Language {
        self.profile.language
    }

    pub fn profile(&self) -> &LanguageProfile {
        &self.profile
    }

    pub async fn run_sample(&self, source: &str) -> Result<ExecutionOutcome, RunError> {
        let language = self.profile.language;
        log::info!("Running {} snippet ({} bytes)", language, source.len());

        let lease = backend::provision(self.provisioner.as_ref()).await?;

        let prepared = self.profile.preparer.prepare(source, lease.instance());
        for message in &prepared.warnings {
            self.observer.on_event(&RunEvent::PreparationWarning {
                language,
                message: message.clone(),
            });
        }

        let request = self.profile.sandbox_request(prepared, &self.root_dir);
        let executed = self.executor.execute(request).await;
        lease.release().await;
        let result = executed?;

        let outcome = normalize_output(&result, self.profile.output_policy);

        if outcome.execution_result.is_none() {
            self.observer.on_event(&RunEvent::SnippetFailed {
                language,
                stderr: result.stderr.clone(),
            });
        } else if matches!(result.exit_code, Some(code) if code != 0) {
            log::warn!(
                "{} snippet exited with code {:?} but wrote nothing to stderr",
                language,
                result.exit_code
            );
        }

        log::debug!(
            "{} snippet finished: success={}",
            language,
            outcome.is_success()
        );
        Ok(outcome)
    }
}
