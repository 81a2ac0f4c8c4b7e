//! Output normalization.
//!
//! Raw container output is full of terminal noise: colour codes, cursor
//! movement, carriage returns from Windows-flavoured runtimes. This module
//! turns a [`SandboxResult`] into an [`ExecutionOutcome`] whose
//! `execution_result` can be compared across runs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

use crate::core_types::ExecutionOutcome;
use crate::executors::SandboxResult;

// CSI and OSC sequences, introduced by ESC or the single-byte CSI (U+009B).
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[\x1b\x{9b}][\[\]()#;?]*(?:(?:(?:(?:;[-a-zA-Z\d/#&.:=?%@~_]+)*|[a-zA-Z\d]+(?:;[-a-zA-Z\d/#&.:=?%@~_]*)*)?\x07)|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PR-TZcf-nq-uy=><~]))",
    )
    .expect("valid regex")
});

/// How a language runner wants its stdout presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPolicy {
    /// Replace `\r\n` with `\n`.
    pub canonicalize_line_endings: bool,
    /// One `logged_content` entry per stdout line instead of a single blob.
    pub split_lines: bool,
}

impl OutputPolicy {
    pub const SINGLE_BLOB: OutputPolicy = OutputPolicy {
        canonicalize_line_endings: false,
        split_lines: false,
    };

    pub const LINES: OutputPolicy = OutputPolicy {
        canonicalize_line_endings: true,
        split_lines: true,
    };
}

/// Removes ANSI escape sequences. Stripping is repeated until nothing matches
/// so that sequences nested inside each other cannot survive a single pass.
pub fn strip_ansi(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = match ANSI_ESCAPE.replace_all(&current, "") {
            Cow::Borrowed(_) => return current,
            Cow::Owned(next) => next,
        };
        current = next;
    }
}

pub fn canonicalize_line_endings(text: &str) -> String {
    let mut current = text.to_string();
    while current.contains("\r\n") {
        current = current.replace("\r\n", "\n");
    }
    current
}

/// Strips escapes, optionally canonicizes line endings and trims. Idempotent.
pub fn normalize_stdout(stdout: &str, policy: OutputPolicy) -> String {
    let stripped = strip_ansi(stdout);
    let text = if policy.canonicalize_line_endings {
        canonicalize_line_endings(&stripped)
    } else {
        stripped
    };
    text.trim().to_string()
}

pub fn normalize_output(result: &SandboxResult, policy: OutputPolicy) -> ExecutionOutcome {
    let stdout = normalize_stdout(&result.stdout, policy);

    let mut logged_content = if policy.split_lines {
        stdout.split('\n').map(str::to_string).collect::<Vec<_>>()
    } else {
        vec![stdout.clone()]
    };

    // Any raw stderr output counts as a failure, even if it is only escapes.
    let execution_result = if result.stderr.is_empty() {
        Some(stdout)
    } else {
        logged_content.push(format!("Error: {}", strip_ansi(&result.stderr)));
        None
    };

    ExecutionOutcome {
        execution_result,
        logged_content,
    }
}
