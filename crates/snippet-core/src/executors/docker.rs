// src/executors/docker.rs
use async_trait::async_trait;
use bollard::container::LogOutput;
use bollard::models::{ContainerCreateBody, HostConfig};
use bollard::query_parameters::{
    CreateContainerOptions as BollardCreateContainerOptionsQuery,
    CreateImageOptions as BollardCreateImageOptionsQuery,
    LogsOptions as BollardLogsOptionsQuery,
    RemoveContainerOptions as BollardRemoveContainerOptionsQuery,
    StartContainerOptions as BollardStartContainerOptionsQuery,
    StopContainerOptions as BollardStopContainerOptionsQuery,
    WaitContainerOptions as BollardWaitContainerOptionsQuery,
};
use bollard::Docker;
use futures_util::stream::StreamExt;
use std::default::Default;
use std::path::Path;
use tempfile::Builder;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{relative_to_root, SandboxExecutor, SandboxRequest, SandboxResult};
use crate::config::SandboxConfig;
use crate::errors::SandboxError;

const HOST_GATEWAY_ALIAS: &str = "host.docker.internal:host-gateway";

pub struct DockerSandboxExecutor {
    docker: Docker,
    timeout_seconds: Option<u64>,
}

impl DockerSandboxExecutor {
    pub fn new(timeout_seconds: Option<u64>) -> Result<Self, SandboxError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self {
            docker,
            timeout_seconds,
        })
    }

    pub fn from_config(config: &SandboxConfig) -> Result<Self, SandboxError> {
        Self::new(config.timeout_seconds)
    }

    async fn pull_image(&self, image_name: &str) -> Result<(), SandboxError> {
        let (from_image, tag) = split_image_reference(image_name);
        log::info!("Pulling image {}:{}", from_image, tag);

        let options = Some(BollardCreateImageOptionsQuery {
            from_image: Some(from_image.to_string()),
            tag: Some(tag.to_string()),
            ..Default::default()
        });
        let mut pull_stream = self.docker.create_image(options, None, None);
        while let Some(progress) = pull_stream.next().await {
            let info = progress?;
            if let Some(status) = info.status {
                log::debug!("{}: {}", image_name, status);
            }
        }
        Ok(())
    }

    async fn run_container(&self, container_id: &str) -> Result<SandboxResult, SandboxError> {
        self.docker
            .start_container(container_id, None::<BollardStartContainerOptionsQuery>)
            .await?;

        // wait_container returns a stream. We need to await the next item for the result.
        let mut wait_stream = self
            .docker
            .wait_container(container_id, None::<BollardWaitContainerOptionsQuery>);

        let wait_outcome = match self.timeout_seconds {
            Some(seconds) => {
                match tokio::time::timeout(
                    tokio::time::Duration::from_secs(seconds),
                    wait_stream.next(),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        log::warn!("Execution timed out for container {}", container_id);
                        let _ = self
                            .docker
                            .stop_container(container_id, None::<BollardStopContainerOptionsQuery>)
                            .await;
                        return Err(SandboxError::Timeout(seconds));
                    }
                }
            }
            None => wait_stream.next().await,
        };

        // bollard reports a non-zero exit as an error item; for us it is a regular result.
        let exit_code = match wait_outcome {
            Some(Ok(response)) => response.status_code,
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => code,
            Some(Err(e)) => return Err(SandboxError::BollardError(e)),
            None => {
                return Err(SandboxError::ContainerFailed(
                    "container wait stream ended unexpectedly".to_string(),
                ))
            }
        };

        let mut output_stream = self.docker.logs(
            container_id,
            Some(BollardLogsOptionsQuery {
                stdout: true,
                stderr: true,
                ..Default::default()
            }),
        );

        // Frames can split multi-byte characters, so decode only once at the end.
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        while let Some(log_result) = output_stream.next().await {
            match log_result? {
                LogOutput::StdOut { message } | LogOutput::Console { message } => {
                    stdout.extend_from_slice(&message)
                }
                LogOutput::StdErr { message } => stderr.extend_from_slice(&message),
                _ => {}
            }
        }

        Ok(SandboxResult {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code: Some(exit_code),
        })
    }

    async fn remove_container(&self, container_id: &str) {
        let options = Some(BollardRemoveContainerOptionsQuery {
            force: true,
            ..Default::default()
        });
        if let Err(e) = self.docker.remove_container(container_id, options).await {
            log::warn!("Failed to remove container {}: {}", container_id, e);
        }
    }
}

#[async_trait]
impl SandboxExecutor for DockerSandboxExecutor {
    async fn execute(&self, request: SandboxRequest) -> Result<SandboxResult, SandboxError> {
        let temp_dir = Builder::new().prefix("snippet-sandbox-").tempdir()?;
        stage_virtual_files(temp_dir.path(), &request).await?;

        if request.refresh_image {
            self.pull_image(&request.image_name).await?;
        } else {
            log::debug!("Skipping image refresh for {}", request.image_name);
        }

        let options = Some(BollardCreateContainerOptionsQuery {
            name: Some(format!("snippet-run-{}", Uuid::new_v4())),
            ..Default::default()
        });
        let config = container_config(&request, temp_dir.path())?;

        let container = self.docker.create_container(options, config).await?;
        log::debug!(
            "Created container {} from image {}",
            container.id,
            request.image_name
        );

        let result = self.run_container(&container.id).await;
        self.remove_container(&container.id).await;

        let result = result?;
        log::debug!(
            "Container {} exited with code {:?}",
            container.id,
            result.exit_code
        );
        Ok(result)
    }
}

/// Container definition for a request whose files are staged in `host_dir`.
///
/// Each virtual file is bind-mounted on its own so that whatever the image
/// already ships in the sandbox root (project files, package caches) stays
/// visible next to the staged files.
pub fn container_config(
    request: &SandboxRequest,
    host_dir: &Path,
) -> Result<ContainerCreateBody, SandboxError> {
    let mut binds = Vec::with_capacity(request.virtual_files.len());
    for path in request.virtual_files.keys() {
        let relative = relative_to_root(&request.root_dir, path)?;
        let host_path = host_dir.join(relative);
        let host_path = host_path
            .to_str()
            .ok_or_else(|| SandboxError::TempFileError("Invalid temp path".to_string()))?;
        binds.push(format!("{}:{}", host_path, path));
    }

    Ok(ContainerCreateBody {
        image: Some(request.image_name.clone()),
        cmd: Some(vec!["sh".to_string(), request.entry_command.clone()]),
        working_dir: Some(request.root_dir.clone()),
        host_config: Some(HostConfig {
            binds: Some(binds),
            extra_hosts: Some(vec![HOST_GATEWAY_ALIAS.to_string()]),
            ..Default::default()
        }),
        attach_stdout: Some(true),
        attach_stderr: Some(true),
        ..Default::default()
    })
}

/// Writes every virtual file of the request below `host_dir`, mirroring its
/// layout under the sandbox root. The entry command is made executable.
pub async fn stage_virtual_files(
    host_dir: &Path,
    request: &SandboxRequest,
) -> Result<(), SandboxError> {
    for (path, content) in &request.virtual_files {
        let relative = relative_to_root(&request.root_dir, path)?;
        let host_path = host_dir.join(relative);

        if let Some(parent) = host_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&host_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?; // Ensure data is written

        #[cfg(unix)]
        {
            if *path == request.entry_command {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&host_path, std::fs::Permissions::from_mode(0o755)).await?;
            }
        }
    }
    Ok(())
}

/// Splits `name[:tag]` into name and tag, defaulting to `latest`. A colon that
/// belongs to a registry port is not a tag separator.
fn split_image_reference(image_name: &str) -> (&str, &str) {
    match image_name.rsplit_once(':') {
        Some((name, tag)) if !tag.contains('/') => (name, tag),
        _ => (image_name, "latest"),
    }
}
