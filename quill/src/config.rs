use quill_core::{Error, Result, SessionConfig};
use serde::Deserialize;

const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

const SUPPORTED_SCHEMES: &[&str] = &[
    "mysql://",
    "mariadb://",
    "postgres://",
    "postgresql://",
    "sqlite:",
];

/// Connection URL plus the session toggles
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuillConfig {
    pub database_url: String,
    #[serde(flatten)]
    pub session: SessionConfig,
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            session: SessionConfig::default(),
        }
    }
}

impl QuillConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SessionConfig::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|raw| parse_flag(&raw))
                .unwrap_or(default)
        };

        Self {
            database_url: lookup("QUILL_DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            session: SessionConfig {
                safe_mode: flag("QUILL_SAFE_MODE", defaults.safe_mode),
                cache: flag("QUILL_CACHE", defaults.cache),
                debug: flag("QUILL_DEBUG", defaults.debug),
                log_queries: flag("QUILL_LOG_QUERIES", defaults.log_queries),
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(Error::config("QUILL_DATABASE_URL cannot be empty"));
        }

        if !SUPPORTED_SCHEMES
            .iter()
            .any(|scheme| self.database_url.starts_with(scheme))
        {
            return Err(Error::config(format!(
                "QUILL_DATABASE_URL must start with one of {}",
                SUPPORTED_SCHEMES.join(", ")
            )));
        }

        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
