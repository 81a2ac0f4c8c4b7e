use crate::core_types::{BackendInstance, PreparedSource, SubstitutionCount};
use crate::prepare::SnippetPreparer;

/// Placeholder tokens agreed on with documentation authors. Changing them
/// breaks every published C# sample.
pub const CSHARP_SERVER_URL_TOKEN: &str = "YourServerUrl";
pub const CSHARP_API_KEY_TOKEN: &str = "YourApiKey";

#[derive(Debug, Clone)]
pub struct PlaceholderSubstitution {
    server_url_token: &'static str,
    api_key_token: &'static str,
}

impl PlaceholderSubstitution {
    pub fn new(server_url_token: &'static str, api_key_token: &'static str) -> Self {
        Self {
            server_url_token,
            api_key_token,
        }
    }

    pub fn csharp() -> Self {
        Self::new(CSHARP_SERVER_URL_TOKEN, CSHARP_API_KEY_TOKEN)
    }
}

impl SnippetPreparer for PlaceholderSubstitution {
    fn prepare(&self, source: &str, backend: &BackendInstance) -> PreparedSource {
        let mut text = source.to_string();
        let mut substitutions = Vec::with_capacity(2);
        let mut warnings = Vec::new();

        for (token, value) in [
            (self.server_url_token, backend.base_url.as_str()),
            (self.api_key_token, backend.api_key.as_str()),
        ] {
            let occurrences = text.matches(token).count();
            if occurrences == 0 {
                warnings.push(format!(
                    "placeholder '{}' does not occur in the snippet",
                    token
                ));
            } else {
                text = text.replace(token, value);
            }
            substitutions.push(SubstitutionCount { token, occurrences });
        }

        PreparedSource {
            text,
            substitutions,
            warnings,
        }
    }
}
