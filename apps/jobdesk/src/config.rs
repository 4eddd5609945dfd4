use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Client configuration loaded from environment variables.
/// Resolved once at startup and passed down; no call site reads the
/// environment on its own.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub request_timeout: Duration,
    pub user_id: Option<String>,
    pub user_email: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let timeout_secs = match optional_env("JOBDESK_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("JOBDESK_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Config {
            api_url: normalize_base_url(
                &optional_env("JOBDESK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            ),
            request_timeout: Duration::from_secs(timeout_secs),
            user_id: optional_env("JOBDESK_USER_ID"),
            user_email: optional_env("JOBDESK_USER_EMAIL").unwrap_or_default(),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Applies command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        user_id: Option<String>,
        email: Option<String>,
    ) -> Self {
        if let Some(url) = api_url {
            self.api_url = normalize_base_url(&url);
        }
        if let Some(id) = user_id.filter(|id| !id.trim().is_empty()) {
            self.user_id = Some(id.trim().to_string());
        }
        if let Some(email) = email {
            self.user_email = email;
        }
        self
    }
}

/// Empty values count as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Strips trailing slashes so endpoint paths can be appended verbatim.
fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
