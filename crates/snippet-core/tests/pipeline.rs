//! End-to-end pipeline behaviour through the public API, with in-memory
//! backend and sandbox collaborators.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use snippet_core::backend::{SeedCredentials, ServerEndpoint};
use snippet_core::{
    BackendError, BackendProvisioner, ExecutionOutcome, FakeBackend, Language, RunEvent,
    RunObserver, SandboxError, SandboxExecutor, SandboxRequest, SandboxResult, SnippetRunner,
    RunnerConfig,
};

struct StaticBackend;

#[async_trait]
impl FakeBackend for StaticBackend {
    async fn seed(&mut self) -> Result<SeedCredentials, BackendError> {
        Ok(SeedCredentials {
            api_key: "seam_apikey_test".to_string(),
        })
    }

    async fn start_server(&mut self) -> Result<ServerEndpoint, BackendError> {
        Ok(ServerEndpoint {
            base_url: "http://host.docker.internal:4010".to_string(),
        })
    }

    async fn shutdown(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

struct StaticProvisioner;

#[async_trait]
impl BackendProvisioner for StaticProvisioner {
    async fn create_instance(&self) -> Result<Box<dyn FakeBackend>, BackendError> {
        Ok(Box::new(StaticBackend))
    }
}

/// Answers with canned output keyed by the entry file contents.
#[derive(Default)]
struct ScriptedSandbox {
    outputs: HashMap<String, (String, String)>,
    seen: Mutex<Vec<SandboxRequest>>,
}

impl ScriptedSandbox {
    fn on(mut self, entry_contains: &str, stdout: &str, stderr: &str) -> Self {
        self.outputs.insert(
            entry_contains.to_string(),
            (stdout.to_string(), stderr.to_string()),
        );
        self
    }
}

#[async_trait]
impl SandboxExecutor for ScriptedSandbox {
    async fn execute(&self, request: SandboxRequest) -> Result<SandboxResult, SandboxError> {
        let entry = request
            .virtual_files
            .iter()
            .find(|(path, _)| **path != request.entry_command)
            .map(|(_, content)| content.clone())
            .unwrap_or_default();
        self.seen.lock().unwrap().push(request);

        let (stdout, stderr) = self
            .outputs
            .iter()
            .find(|(marker, _)| entry.contains(marker.as_str()))
            .map(|(_, output)| output.clone())
            .ok_or_else(|| SandboxError::ContainerFailed("no scripted output".to_string()))?;

        Ok(SandboxResult {
            exit_code: Some(if stderr.is_empty() { 0 } else { 1 }),
            stdout,
            stderr,
        })
    }
}

#[derive(Default)]
struct Events(Mutex<Vec<RunEvent>>);

impl RunObserver for Events {
    fn on_event(&self, event: &RunEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

fn runner(language: Language, sandbox: Arc<ScriptedSandbox>, events: Arc<Events>) -> SnippetRunner {
    SnippetRunner::from_config(
        language,
        &RunnerConfig::default(),
        Arc::new(StaticProvisioner),
        sandbox,
    )
    .with_observer(events)
}

#[tokio::test]
async fn csharp_hello_scenario() {
    let sandbox = Arc::new(ScriptedSandbox::default().on("hello", "hello\n", ""));
    let events = Arc::new(Events::default());
    let runner = runner(Language::CSharp, sandbox.clone(), events.clone());

    let outcome = runner
        .run_sample(
            "var seam = new Seam(endpoint: \"YourServerUrl\", apiKey: \"YourApiKey\");\nConsole.WriteLine(\"hello\");",
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ExecutionOutcome {
            execution_result: Some("hello".to_string()),
            logged_content: vec!["hello".to_string()],
        }
    );
    assert!(events.0.lock().unwrap().is_empty());

    let seen = sandbox.seen.lock().unwrap();
    let program = &seen[0].virtual_files["/root/Program.cs"];
    assert!(program.contains("http://host.docker.internal:4010"));
    assert!(program.contains("seam_apikey_test"));
    assert!(!program.contains("YourServerUrl"));
}

#[tokio::test]
async fn ruby_exception_scenario() {
    let sandbox = Arc::new(ScriptedSandbox::default().on(
        "boom",
        "\x1b[33mstarting\x1b[0m\r\nhalfway\r\n",
        "NullReferenceException",
    ));
    let events = Arc::new(Events::default());
    let runner = runner(Language::Ruby, sandbox, events.clone());

    let outcome = runner.run_sample("puts 'starting'\nboom").await.unwrap();

    assert_eq!(outcome.execution_result, None);
    assert_eq!(
        outcome.logged_content,
        vec!["starting", "halfway", "Error: NullReferenceException"]
    );
    assert!(outcome
        .logged_content
        .last()
        .unwrap()
        .starts_with("Error: "));
    assert_eq!(events.0.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn successful_outputs_reconstruct_stdout() {
    let cases = [
        (Language::CSharp, "\x1b[32mOK\x1b[0m"),
        (Language::Ruby, "first\r\nsecond\r\n"),
        (Language::Ruby, "  single  "),
    ];

    for (language, stdout) in cases {
        let sandbox = Arc::new(ScriptedSandbox::default().on("", stdout, ""));
        let runner = runner(language, sandbox, Arc::new(Events::default()));

        let outcome = runner.run_sample("anything").await.unwrap();
        let result = outcome.execution_result.clone().unwrap();

        assert_eq!(outcome.logged_content.join("\n"), result);
        assert!(!result.contains('\x1b'));
        assert_eq!(result, result.trim());
    }
}

#[tokio::test]
async fn sandbox_failure_propagates() {
    let sandbox = Arc::new(ScriptedSandbox::default());
    let runner = runner(Language::CSharp, sandbox, Arc::new(Events::default()));

    let result = runner.run_sample("no scripted output matches").await;
    assert!(matches!(
        result,
        Err(snippet_core::RunError::Sandbox(SandboxError::ContainerFailed(_)))
    ));
}
