//! Shared data model for the snippet pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target languages with a dedicated runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[serde(alias = "c#", alias = "cs")]
    CSharp,
    #[serde(alias = "rb")]
    Ruby,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::CSharp, Language::Ruby];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csharp" | "c#" | "cs" => Ok(Language::CSharp),
            "ruby" | "rb" => Ok(Language::Ruby),
            other => Err(format!("Unsupported language: {}", other)),
        }
    }
}

/// Live endpoint and credentials of one fake backend. Owned by a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInstance {
    pub base_url: String,
    pub api_key: String,
}

/// How often a placeholder token was replaced while preparing a snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionCount {
    pub token: &'static str,
    pub occurrences: usize,
}

/// The text that is actually executed for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSource {
    pub text: String,
    pub substitutions: Vec<SubstitutionCount>,
    pub warnings: Vec<String>,
}

impl PreparedSource {
    pub fn new(text: String) -> Self {
        Self {
            text,
            substitutions: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Externally visible result of a run.
///
/// `execution_result` is `None` exactly when the snippet wrote to stderr; in
/// that case the last entry of `logged_content` is `Error: <stderr>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub execution_result: Option<String>,
    pub logged_content: Vec<String>,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        self.execution_result.is_some()
    }
}
