use once_cell::sync::Lazy;
use regex::Regex;

use crate::core_types::{BackendInstance, PreparedSource};
use crate::prepare::SnippetPreparer;

static RUBY_CLIENT_ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*client[ \t]*=[^=~]").expect("valid regex"));

type PreambleRenderer = fn(&BackendInstance) -> String;

/// Prepends a client bootstrap block to a bare snippet body.
#[derive(Clone)]
pub struct PreambleInjection {
    render: PreambleRenderer,
    redefinition: Option<&'static Lazy<Regex>>,
}

impl PreambleInjection {
    pub fn new(render: PreambleRenderer) -> Self {
        Self {
            render,
            redefinition: None,
        }
    }

    pub fn ruby() -> Self {
        Self {
            render: render_ruby_preamble,
            redefinition: Some(&RUBY_CLIENT_ASSIGNMENT),
        }
    }
}

impl SnippetPreparer for PreambleInjection {
    fn prepare(&self, source: &str, backend: &BackendInstance) -> PreparedSource {
        let mut prepared = PreparedSource::new(format!("{}{}", (self.render)(backend), source));

        if let Some(pattern) = self.redefinition {
            if pattern.is_match(source) {
                prepared.warnings.push(
                    "snippet assigns `client` itself; the injected client will be shadowed"
                        .to_string(),
                );
            }
        }

        prepared
    }
}

fn render_ruby_preamble(backend: &BackendInstance) -> String {
    format!(
        "require 'seamapi'\n\nclient = Seam::Client.new(base_uri: {}, api_key: {})\n\n",
        ruby_single_quoted(&backend.base_url),
        ruby_single_quoted(&backend.api_key)
    )
}

fn ruby_single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
