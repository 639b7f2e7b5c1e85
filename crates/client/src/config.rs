//! Connection settings for the receivables backend.

use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Sent as `Authorization: Bearer <token>`.
    pub api_token: Option<String>,
    /// Sent as the `appToken` header.
    pub app_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            api_token: None,
            app_token: None,
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_app_token(mut self, token: impl Into<String>) -> Self {
        self.app_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read settings from `RECEIVABLES_API_URL`, `RECEIVABLES_API_TIMEOUT_MS`,
    /// `RECEIVABLES_API_TOKEN` and `RECEIVABLES_APP_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("RECEIVABLES_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout = match lookup("RECEIVABLES_API_TIMEOUT_MS") {
            Some(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("RECEIVABLES_API_TIMEOUT_MS is not a number: {raw:?}"))?;
                anyhow::ensure!(ms > 0, "RECEIVABLES_API_TIMEOUT_MS must be positive, got {raw:?}");
                Duration::from_millis(ms)
            }
            None => DEFAULT_TIMEOUT,
        };

        let api_token = non_blank(lookup("RECEIVABLES_API_TOKEN"));
        if api_token.is_none() {
            tracing::warn!("RECEIVABLES_API_TOKEN not set; requests will be unauthenticated");
        }
        let app_token = non_blank(lookup("RECEIVABLES_APP_TOKEN"));
        if app_token.is_none() {
            tracing::warn!("RECEIVABLES_APP_TOKEN not set; appToken header will be omitted");
        }

        Ok(Self {
            base_url,
            timeout,
            api_token,
            app_token,
        })
    }

    /// Join a path onto the base URL with exactly one slash between them.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
