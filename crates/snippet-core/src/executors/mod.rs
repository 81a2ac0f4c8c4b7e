//! Sandbox execution environments for untrusted snippets.
//!
//! A [`SandboxExecutor`] receives a fully prepared [`SandboxRequest`] (image,
//! launcher command and the virtual files to stage) and returns the raw,
//! unnormalized output streams. Executors only fail for infrastructure
//! reasons; a snippet exiting with an error is still an `Ok` result.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::errors::SandboxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxRequest {
    /// Command run inside the container, usually the staged launcher script.
    pub entry_command: String,
    pub image_name: String,
    /// Directory inside the sandbox that holds every virtual file.
    pub root_dir: String,
    /// Absolute in-sandbox path to file contents.
    pub virtual_files: BTreeMap<String, String>,
    /// Pull the image before running. Disabled to speed up repeated local runs.
    pub refresh_image: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SandboxResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i64>,
}

#[async_trait]
pub trait SandboxExecutor: Send + Sync {
    async fn execute(&self, request: SandboxRequest) -> Result<SandboxResult, SandboxError>;
}

/// Resolves a virtual file path to its location relative to the sandbox root.
///
/// Rejects paths outside the root and any `..` component.
pub fn relative_to_root<'a>(root_dir: &str, path: &'a str) -> Result<&'a str, SandboxError> {
    let root = root_dir.trim_end_matches('/');
    let relative = path
        .strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| SandboxError::StagingError {
            path: path.to_string(),
            reason: format!("path is not inside sandbox root {}", root_dir),
        })?;

    if relative.split('/').any(|part| part == ".." || part.is_empty()) {
        return Err(SandboxError::StagingError {
            path: path.to_string(),
            reason: "path must not contain empty or '..' components".to_string(),
        });
    }

    Ok(relative)
}

pub mod docker;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_to_root() {
        assert_eq!(relative_to_root("/root", "/root/app.rb").unwrap(), "app.rb");
        assert_eq!(relative_to_root("/root/", "/root/src/a.cs").unwrap(), "src/a.cs");
    }

    #[test]
    fn test_relative_to_root_rejects_escapes() {
        assert!(relative_to_root("/root", "/etc/passwd").is_err());
        assert!(relative_to_root("/root", "/rootkit/app.rb").is_err());
        assert!(relative_to_root("/root", "/root/../etc/passwd").is_err());
        assert!(relative_to_root("/root", "/root/").is_err());
    }
}
