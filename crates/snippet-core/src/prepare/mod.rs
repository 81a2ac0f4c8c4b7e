//! Per-language snippet preparation.
//!
//! Client libraries disagree on how a client gets constructed, so each
//! language picks one of two strategies:
//!
//! - [`PlaceholderSubstitution`]: the snippet already builds its own client
//!   and uses fixed placeholder tokens for the server URL and API key. Every
//!   occurrence is replaced with the live value.
//! - [`PreambleInjection`]: the snippet is a bare body that expects a `client`
//!   in scope. A bootstrap block is prepended and the body is left untouched.
//!
//! Neither strategy rejects a snippet. Suspicious input (a placeholder that
//! never occurs, a body that rebuilds the client) is reported as a warning on
//! the [`PreparedSource`].

use crate::core_types::{BackendInstance, PreparedSource};

pub mod preamble;
pub mod substitution;

pub use preamble::PreambleInjection;
pub use substitution::PlaceholderSubstitution;

pub trait SnippetPreparer: Send + Sync {
    fn prepare(&self, source: &str, backend: &BackendInstance) -> PreparedSource;
}
