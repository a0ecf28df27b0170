//! Application configuration constants and runtime settings.
//!
//! Fixed values live here as constants. Deployment-specific values are
//! resolved by [`Config::load`] with priority: config.toml > .env > default.

use serde::Deserialize;
use std::path::Path;

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Default server port
pub const SERVER_PORT: u16 = 3000;

/// Cookie holding the browser's practise session id
pub const SESSION_COOKIE_NAME: &str = "da_session";

// ==================== Session Configuration ====================

/// Session expiration time in hours
pub const SESSION_EXPIRY_HOURS: i64 = 12;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

// ==================== Remote API Configuration ====================

/// Cookie name the remote vocabulary API uses for its own session
pub const DEFAULT_API_SESSION_COOKIE: &str = "session";

/// Request timeout for remote API calls
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

// ==================== Practise Configuration ====================

/// Minimum options a flashcard question needs to be usable
pub const MIN_FLASHCARD_OPTIONS: usize = 4;

/// Number of distractors the demo backend draws for a flashcard
pub const DISTRACTOR_COUNT: usize = 3;

/// How long "incorrect"/"almost" feedback stays visible
pub const DEFAULT_FEEDBACK_CLEAR_MS: u64 = 600;

/// Upper bound for the feedback delay; it must stay under one second
pub const MAX_FEEDBACK_CLEAR_MS: u64 = 999;

/// Blank marker used in cloze prompts
pub const CLOZE_BLANK: &str = "_____";

/// Examples kept per entry when cloze practise appends new ones
pub const MAX_EXAMPLES_PER_ENTRY: usize = 5;

// ==================== Answer Evaluation ====================

/// Shortest normalized input that can count as a near match
pub const NEAR_MATCH_MIN_LEN: usize = 2;

/// Largest length difference allowed for a near match
pub const NEAR_MATCH_MAX_LEN_DIFF: usize = 2;

/// Largest edit distance allowed for a near match
pub const NEAR_MATCH_MAX_DISTANCE: usize = 2;

// ==================== Progress ====================

/// Default progress window in days
pub const DEFAULT_PROGRESS_DAYS: u32 = 7;

/// Largest progress window in days
pub const MAX_PROGRESS_DAYS: u32 = 90;

/// Clamp a requested progress window, falling back to the default
pub fn progress_window(days: Option<&str>) -> u32 {
    days.and_then(|d| d.trim().parse::<i64>().ok())
        .map(|d| d.clamp(1, MAX_PROGRESS_DAYS as i64) as u32)
        .unwrap_or(DEFAULT_PROGRESS_DAYS)
}

// ==================== Runtime Configuration ====================

/// Resolved runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    /// Base URL of the remote vocabulary API; `None` runs the demo backend
    pub api_base_url: Option<String>,
    pub api_session_cookie: String,
    pub api_timeout_secs: u64,
    pub feedback_clear_ms: u64,
    /// Whether giving up on a cloze counts as a completed exercise
    pub log_give_up: bool,
    pub session_expiry_hours: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: SERVER_PORT,
            api_base_url: None,
            api_session_cookie: DEFAULT_API_SESSION_COOKIE.to_string(),
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            feedback_clear_ms: DEFAULT_FEEDBACK_CLEAR_MS,
            log_give_up: true,
            session_expiry_hours: SESSION_EXPIRY_HOURS,
        }
    }
}

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    server: Option<ServerSection>,
    api: Option<ApiSection>,
    practise: Option<PractiseSection>,
    session: Option<SessionSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiSection {
    base_url: Option<String>,
    session_cookie: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PractiseSection {
    feedback_clear_ms: Option<u64>,
    log_give_up: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionSection {
    expiry_hours: Option<i64>,
}

impl Config {
    /// Load configuration from `config.toml` in the working directory and
    /// the environment (including a `.env` file if present).
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();
        Self::load_from(Path::new("config.toml"), |key| std::env::var(key).ok())
    }

    /// Resolve configuration from an explicit file and variable lookup.
    pub fn load_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Self {
        let file = match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
                Ok(parsed) => {
                    tracing::info!("Using configuration from {}", path.display());
                    parsed
                }
                Err(e) => {
                    tracing::warn!("Ignoring invalid {}: {}", path.display(), e);
                    FileConfig::default()
                }
            },
            Err(_) => FileConfig::default(),
        };

        let mut config = Config::default();
        let server = file.server.unwrap_or_default();
        let api = file.api.unwrap_or_default();
        let practise = file.practise.unwrap_or_default();
        let session = file.session.unwrap_or_default();

        // Priority 1: config.toml, priority 2: environment, then defaults
        if let Some(port) = server.port.or_else(|| parse_env(&env, "DA_SERVER_PORT")) {
            config.port = port;
        }

        config.api_base_url = api
            .base_url
            .or_else(|| env("DA_API_BASE_URL"))
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        if let Some(cookie) = api
            .session_cookie
            .or_else(|| env("DA_API_SESSION_COOKIE"))
            .filter(|c| !c.trim().is_empty())
        {
            config.api_session_cookie = cookie.trim().to_string();
        }

        if let Some(secs) = api
            .timeout_secs
            .or_else(|| parse_env(&env, "DA_API_TIMEOUT_SECS"))
        {
            config.api_timeout_secs = secs.max(1);
        }

        if let Some(ms) = practise
            .feedback_clear_ms
            .or_else(|| parse_env(&env, "DA_FEEDBACK_CLEAR_MS"))
        {
            config.feedback_clear_ms = ms.min(MAX_FEEDBACK_CLEAR_MS);
        }

        if let Some(flag) = practise
            .log_give_up
            .or_else(|| parse_env(&env, "DA_LOG_GIVE_UP"))
        {
            config.log_give_up = flag;
        }

        if let Some(hours) = session.expiry_hours {
            config.session_expiry_hours = hours.max(1);
        }

        config
    }

    /// Get the full server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", SERVER_ADDR, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={}", key, raw);
            None
        }
    }
}
