//! Runtime configuration, read from the environment.

use std::env;
use std::time::Duration;

use crate::text_generation::gemini::DEFAULT_GEMINI_MODEL;

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

/// Default database path if not specified via environment variable.
pub const DEFAULT_DB_PATH: &str = "sqlite:airwatch.db?mode=rwc";

/// Default bound on a single text-generation call.
pub const DEFAULT_GUIDANCE_TIMEOUT_SECS: u64 = 10;

/// Default city the guidance prompt is written for.
pub const DEFAULT_CITY: &str = "Delhi, India";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP port.
    pub port: u16,

    /// SQLite connection string for the complaint ledger.
    pub database_url: String,

    /// Gemini API key. Its presence selects delegated guidance.
    pub gemini_api_key: Option<String>,

    /// Gemini model name.
    pub gemini_model: String,

    /// Upper bound on a single text-generation call.
    pub guidance_timeout: Duration,

    /// City named in the guidance prompt.
    pub city: String,

    /// Whether the mock backend simulates network latency.
    pub mock_latency: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DB_PATH.to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            guidance_timeout: Duration::from_secs(DEFAULT_GUIDANCE_TIMEOUT_SECS),
            city: DEFAULT_CITY.to_string(),
            mock_latency: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// | Variable                          | Default                       |
    /// |-----------------------------------|-------------------------------|
    /// | `AIRWATCH_PORT`                   | 3000                          |
    /// | `AIRWATCH_DATABASE_URL`           | `sqlite:airwatch.db?mode=rwc` |
    /// | `GEMINI_API_KEY` (or `API_KEY`)   | unset                         |
    /// | `GEMINI_MODEL`                    | `gemini-2.5-flash`            |
    /// | `AIRWATCH_GUIDANCE_TIMEOUT_SECS`  | 10                            |
    /// | `AIRWATCH_CITY`                   | `Delhi, India`                |
    /// | `AIRWATCH_MOCK_LATENCY`           | true                          |
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("AIRWATCH_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let database_url = lookup("AIRWATCH_DATABASE_URL").unwrap_or(defaults.database_url);

        let gemini_api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|k| !k.trim().is_empty());

        let gemini_model = lookup("GEMINI_MODEL").unwrap_or(defaults.gemini_model);

        let guidance_timeout = lookup("AIRWATCH_GUIDANCE_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.guidance_timeout);

        let city = lookup("AIRWATCH_CITY").unwrap_or(defaults.city);

        let mock_latency = lookup("AIRWATCH_MOCK_LATENCY")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "off" | "no"))
            .unwrap_or(defaults.mock_latency);

        Self {
            port,
            database_url,
            gemini_api_key,
            gemini_model,
            guidance_timeout,
            city,
            mock_latency,
        }
    }
}
