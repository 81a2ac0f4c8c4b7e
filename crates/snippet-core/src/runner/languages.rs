//! Per-language execution profiles.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::RunnerConfig;
use crate::core_types::{Language, PreparedSource};
use crate::executors::SandboxRequest;
use crate::normalize::OutputPolicy;
use crate::prepare::{PlaceholderSubstitution, PreambleInjection, SnippetPreparer};

pub const LAUNCHER_FILE: &str = "run.sh";

/// Everything that differs between two language runners.
#[derive(Clone)]
pub struct LanguageProfile {
    pub language: Language,
    /// Entry file name, relative to the sandbox root.
    pub entry_file: &'static str,
    /// Command that runs the entry file once the shell is in the sandbox root.
    pub run_command: &'static str,
    pub image_name: String,
    pub refresh_image: bool,
    pub output_policy: OutputPolicy,
    pub preparer: Arc<dyn SnippetPreparer>,
}

impl LanguageProfile {
    pub fn csharp() -> Self {
        Self {
            language: Language::CSharp,
            entry_file: "Program.cs",
            run_command: "dotnet run",
            image_name: "seamapi/csharp-sample-runner".to_string(),
            refresh_image: true,
            output_policy: OutputPolicy::SINGLE_BLOB,
            preparer: Arc::new(PlaceholderSubstitution::csharp()),
        }
    }

    pub fn ruby() -> Self {
        Self {
            language: Language::Ruby,
            entry_file: "app.rb",
            run_command: "ruby app.rb",
            image_name: "seamapi/ruby-sample-runner".to_string(),
            // Skipped to keep repeated local runs fast.
            refresh_image: false,
            output_policy: OutputPolicy::LINES,
            preparer: Arc::new(PreambleInjection::ruby()),
        }
    }

    pub fn builtin(language: Language) -> Self {
        match language {
            Language::CSharp => Self::csharp(),
            Language::Ruby => Self::ruby(),
        }
    }

    /// Built-in profile with image and refresh overrides from `config` applied.
    pub fn from_config(language: Language, config: &RunnerConfig) -> Self {
        let mut profile = Self::builtin(language);
        if let Some(overrides) = config.languages.get(&language) {
            if let Some(image) = &overrides.image {
                profile.image_name = image.clone();
            }
            if let Some(refresh) = overrides.refresh_image {
                profile.refresh_image = refresh;
            }
        }
        profile
    }

    pub fn launcher_script(&self, root_dir: &str) -> String {
        format!("cd {}\n{}", root_dir, self.run_command)
    }

    /// Stages exactly two files under `root_dir`: the prepared entry file and
    /// the launcher script, which is also the entry command.
    pub fn sandbox_request(&self, prepared: PreparedSource, root_dir: &str) -> SandboxRequest {
        let root = root_dir.trim_end_matches('/');
        let entry_command = format!("{}/{}", root, LAUNCHER_FILE);

        let mut virtual_files = BTreeMap::new();
        virtual_files.insert(format!("{}/{}", root, self.entry_file), prepared.text);
        virtual_files.insert(entry_command.clone(), self.launcher_script(root));

        SandboxRequest {
            entry_command,
            image_name: self.image_name.clone(),
            root_dir: root.to_string(),
            virtual_files,
            refresh_image: self.refresh_image,
        }
    }
}
