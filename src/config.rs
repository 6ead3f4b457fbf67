//! Service configuration.
//!
//! Read once at startup by [`ServiceConfig::from_env`] and then passed
//! explicitly into the API context. Nothing below the binary entry point
//! reads process environment, so handlers and the generation client can be
//! tested with any configuration without touching global state.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "CycleCare";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_BIND: &str = "CYCLECARE_BIND";
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_API_BASE: &str = "GEMINI_API_BASE";
pub const ENV_MODELS: &str = "GEMINI_MODELS";
pub const ENV_ATTEMPT_TIMEOUT: &str = "CYCLECARE_ATTEMPT_TIMEOUT_SECS";

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 30;

/// Model candidates in priority order. Each is tried once per request.
pub const DEFAULT_MODEL_CANDIDATES: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
];

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "cyclecare=debug,cyclecare_lib=debug,tower_http=debug"
    } else {
        "cyclecare=info,cyclecare_lib=info,tower_http=info"
    }
}

// ═══════════════════════════════════════════════════════════
// API key
// ═══════════════════════════════════════════════════════════

/// Sanitised upstream credential. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Strip surrounding whitespace and quote characters.
    ///
    /// Returns `None` when nothing usable remains, which the rest of the
    /// service treats as "AI not configured".
    pub fn sanitize(raw: &str) -> Option<Self> {
        let cleaned = raw
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace());
        if cleaned.is_empty() {
            None
        } else {
            Some(Self(cleaned.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

// ═══════════════════════════════════════════════════════════
// Service configuration
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub api_key: Option<ApiKey>,
    pub api_base_url: String,
    pub model_candidates: Vec<String>,
    pub attempt_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            api_key: None,
            api_base_url: DEFAULT_API_BASE.to_string(),
            model_candidates: DEFAULT_MODEL_CANDIDATES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            attempt_timeout: Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Malformed values fall back to defaults with a warning; configuration
    /// is never a startup failure.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_BIND) {
            match raw.trim().parse::<SocketAddr>() {
                Ok(addr) => config.bind_addr = addr,
                Err(e) => tracing::warn!(
                    variable = ENV_BIND,
                    error = %e,
                    "Invalid bind address, using {DEFAULT_BIND}"
                ),
            }
        }

        config.api_key = lookup(ENV_API_KEY).and_then(|raw| ApiKey::sanitize(&raw));

        if let Some(base) = lookup(ENV_API_BASE) {
            let base = base.trim().trim_end_matches('/');
            if !base.is_empty() {
                config.api_base_url = base.to_string();
            }
        }

        if let Some(models) = lookup(ENV_MODELS) {
            let parsed = parse_model_list(&models);
            if parsed.is_empty() {
                tracing::warn!(variable = ENV_MODELS, "Empty model list, using defaults");
            } else {
                config.model_candidates = parsed;
            }
        }

        if let Some(raw) = lookup(ENV_ATTEMPT_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.attempt_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    variable = ENV_ATTEMPT_TIMEOUT,
                    "Invalid attempt timeout, using {DEFAULT_ATTEMPT_TIMEOUT_SECS}s"
                ),
            }
        }

        config
    }

    pub fn ai_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
