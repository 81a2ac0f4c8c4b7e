//! Runs documentation snippets against a throwaway fake API inside Docker
//!
//! Each file is executed by the runner for the selected language and its
//! outcome is printed as one JSON object per line. Snippet failures are part
//! of the output; only pipeline failures (backend or Docker trouble) make the
//! command exit with an error.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fake_api::FakeApiProvisioner;
use futures_util::future::join_all;
use log::LevelFilter;
use serde_json::json;
use snippet_core::executors::docker::DockerSandboxExecutor;
use snippet_core::{ConfigLoader, Language, RunnerConfig, SnippetRunner};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Snippet Runner - execute documentation snippets in a sandbox")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, help = "Runner configuration file (YAML)")]
    config: Option<PathBuf>,

    #[clap(long, short, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one or more snippet files
    Run {
        #[clap(long, short = 'L', help = "Snippet language: csharp or ruby")]
        language: Language,

        #[clap(required = true)]
        files: Vec<PathBuf>,

        #[clap(
            long,
            default_value = fake_api::provisioner::DEFAULT_ADVERTISED_HOST,
            help = "Host name under which containers reach the fake API"
        )]
        advertised_host: String,

        #[clap(long, help = "Never pull runner images before executing")]
        no_refresh: bool,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let mut config = ConfigLoader::load(cli.config.as_deref())
        .await
        .context("Failed to load runner configuration")?;

    match cli.command {
        Commands::Run {
            language,
            files,
            advertised_host,
            no_refresh,
        } => {
            if no_refresh {
                config.set_refresh_images(false);
            }
            run_files(&config, language, files, advertised_host).await
        }
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}

async fn run_files(
    config: &RunnerConfig,
    language: Language,
    files: Vec<PathBuf>,
    advertised_host: String,
) -> Result<()> {
    let provisioner = Arc::new(FakeApiProvisioner::new().with_advertised_host(advertised_host));
    let executor = Arc::new(
        DockerSandboxExecutor::from_config(&config.sandbox)
            .context("Failed to connect to Docker")?,
    );
    let runner = SnippetRunner::from_config(language, config, provisioner, executor);

    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let source = tokio::fs::read_to_string(&file)
            .await
            .with_context(|| format!("Failed to read snippet {}", file.display()))?;
        sources.push((file, source));
    }

    log::info!("Running {} {} snippet(s)", sources.len(), language);

    // Runs share nothing, so they can all be in flight at once.
    let results = join_all(
        sources
            .iter()
            .map(|(_, source)| runner.run_sample(source)),
    )
    .await;

    let mut failures = 0;
    for ((file, _), result) in sources.iter().zip(results) {
        let line = match result {
            Ok(outcome) => json!({
                "file": file.display().to_string(),
                "language": language,
                "execution_result": outcome.execution_result,
                "logged_content": outcome.logged_content,
            }),
            Err(e) => {
                failures += 1;
                log::error!("Pipeline failure for {}: {}", file.display(), e);
                json!({
                    "file": file.display().to_string(),
                    "language": language,
                    "error": e.to_string(),
                })
            }
        };
        println!("{}", line);
    }

    if failures > 0 {
        anyhow::bail!("{} snippet run(s) failed before producing a result", failures);
    }
    Ok(())
}
