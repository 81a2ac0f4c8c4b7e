//! Runner configuration
//!
//! Everything is optional: an empty YAML document (or no file at all) yields
//! the built-in language profiles with no sandbox timeout.
//!
//! ```yaml
//! sandbox:
//!   root: /root
//!   timeout_seconds: 120
//! languages:
//!   ruby:
//!     image: seamapi/ruby-sample-runner
//!     refresh_image: false
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core_types::Language;

pub mod loader;

pub use loader::ConfigLoader;

pub const DEFAULT_SANDBOX_ROOT: &str = "/root";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub sandbox: SandboxConfig,
    pub languages: HashMap<Language, LanguageOverrides>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Directory inside the container holding the staged files.
    pub root: String,
    /// Wall-clock limit for one container run. `None` leaves limits to the
    /// container runtime.
    pub timeout_seconds: Option<u64>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_SANDBOX_ROOT.to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageOverrides {
    pub image: Option<String>,
    pub refresh_image: Option<bool>,
}

impl RunnerConfig {
    /// Forces image refresh on or off for every language.
    pub fn set_refresh_images(&mut self, refresh: bool) {
        for language in Language::ALL {
            self.languages.entry(language).or_default().refresh_image = Some(refresh);
        }
    }
}
