//! Application configuration
//!
//! Compile-time constants (validation boundaries, placeholders, timeouts)
//! plus `ServerConfig`, which is built from defaults and `NOTEKEEPER_*`
//! environment overrides.

use std::path::PathBuf;

// ===== Field Limits =====

/// Maximum username length in characters
pub const MAX_USERNAME_LENGTH: usize = 80;

/// Maximum note title length in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum tag name length in characters
pub const MAX_TAG_LENGTH: usize = 80;

/// Maximum stored summary title length in characters.
/// Longer note titles are truncated when copied onto a summary.
pub const MAX_SUMMARY_TITLE_LENGTH: usize = 150;

// ===== Placeholders =====

/// Title given to a note created with a blank title
pub const UNTITLED_NOTE_TITLE: &str = "(no title)";

/// Title given to a summary whose note has a blank title
pub const UNTITLED_SUMMARY_TITLE: &str = "No Title";

// ===== Sessions =====

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "notekeeper_session";

/// Sliding session lifetime in hours (7 days)
pub const SESSION_TTL_HOURS: i64 = 24 * 7;

// ===== External Calls =====

/// Default timeout for the summarization service in seconds
pub const DEFAULT_SUMMARIZER_TIMEOUT_SECS: u64 = 30;

/// Default timeout for PDF rendering in seconds
pub const DEFAULT_PDF_TIMEOUT_SECS: u64 = 30;

/// Default whole-request timeout in seconds.
/// Must stay above the external call timeouts so those fail first with a readable message.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Environment variable prefix
const ENV_PREFIX: &str = "NOTEKEEPER";

/// Runtime server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// API key for the summarization service. Summaries fail inline when unset.
    pub summarizer_api_key: Option<String>,

    pub summarizer_model: String,
    pub summarizer_base_url: String,
    pub summarizer_timeout_secs: u64,

    /// HTML-to-PDF converter executable (reads HTML on stdin, writes PDF on stdout)
    pub pdf_command: String,
    pub pdf_timeout_secs: u64,

    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            database_path: PathBuf::from("notekeeper.db"),
            summarizer_api_key: None,
            summarizer_model: "gemini-2.5-flash".to_string(),
            summarizer_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            summarizer_timeout_secs: DEFAULT_SUMMARIZER_TIMEOUT_SECS,
            pdf_command: "wkhtmltopdf".to_string(),
            pdf_timeout_secs: DEFAULT_PDF_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup (useful for testing)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(lookup);
        config
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{}_{}", ENV_PREFIX, name)).filter(|v| !v.trim().is_empty())
        };

        if let Some(addr) = var("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(path) = var("DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(key) = var("SUMMARIZER_API_KEY").or_else(|| lookup("GEMINI_API_KEY")) {
            if !key.trim().is_empty() {
                self.summarizer_api_key = Some(key);
            }
        }
        if let Some(model) = var("SUMMARIZER_MODEL") {
            self.summarizer_model = model;
        }
        if let Some(url) = var("SUMMARIZER_BASE_URL") {
            self.summarizer_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(cmd) = var("PDF_COMMAND") {
            self.pdf_command = cmd;
        }

        parse_secs(var("SUMMARIZER_TIMEOUT_SECS"), &mut self.summarizer_timeout_secs);
        parse_secs(var("PDF_TIMEOUT_SECS"), &mut self.pdf_timeout_secs);
        parse_secs(var("REQUEST_TIMEOUT_SECS"), &mut self.request_timeout_secs);
    }
}

fn parse_secs(raw: Option<String>, target: &mut u64) {
    let Some(raw) = raw else { return };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => *target = secs,
        _ => tracing::warn!("Ignoring invalid timeout override: {:?}", raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None);

        assert_eq!(config.bind_addr, "127.0.0.1:5000");
        assert_eq!(config.database_path, PathBuf::from("notekeeper.db"));
        assert!(config.summarizer_api_key.is_none());
        assert_eq!(config.pdf_command, "wkhtmltopdf");
        assert_eq!(config.summarizer_timeout_secs, DEFAULT_SUMMARIZER_TIMEOUT_SECS);
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("NOTEKEEPER_BIND_ADDR", "0.0.0.0:8080"),
            ("NOTEKEEPER_DATABASE_PATH", "/tmp/notes.db"),
            ("NOTEKEEPER_SUMMARIZER_BASE_URL", "http://localhost:9000/"),
            ("NOTEKEEPER_PDF_TIMEOUT_SECS", "5"),
        ]));

        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.database_path, PathBuf::from("/tmp/notes.db"));
        assert_eq!(config.summarizer_base_url, "http://localhost:9000");
        assert_eq!(config.pdf_timeout_secs, 5);
    }

    #[test]
    fn test_gemini_key_fallback() {
        let config = ServerConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "abc")]));
        assert_eq!(config.summarizer_api_key.as_deref(), Some("abc"));

        let config = ServerConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "abc"),
            ("NOTEKEEPER_SUMMARIZER_API_KEY", "preferred"),
        ]));
        assert_eq!(config.summarizer_api_key.as_deref(), Some("preferred"));
    }

    #[test]
    fn test_invalid_timeout_ignored() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("NOTEKEEPER_REQUEST_TIMEOUT_SECS", "soon"),
            ("NOTEKEEPER_PDF_TIMEOUT_SECS", "0"),
        ]));

        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.pdf_timeout_secs, DEFAULT_PDF_TIMEOUT_SECS);
    }

    #[test]
    fn test_default_matches_empty_environment() {
        let from_default = ServerConfig::default();
        let from_env = ServerConfig::from_lookup(|_| None);

        assert_eq!(from_default.summarizer_model, from_env.summarizer_model);
        assert_eq!(from_default.summarizer_base_url, from_env.summarizer_base_url);
        assert_eq!(from_default.pdf_timeout_secs, from_env.pdf_timeout_secs);
        assert_eq!(from_default.request_timeout_secs, from_env.request_timeout_secs);
        assert!(from_default.request_timeout_secs > from_default.summarizer_timeout_secs);
    }
}
