//! Client configuration.

use std::env;

pub const DEFAULT_BASE_URL: &str = "https://api.todoist.com/sync/v9";

/// Where to send requests and how to authenticate them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Read `TODOIST_API_URL` and `TODOIST_TOKEN`.
    ///
    /// A missing URL falls back to the public API; a missing or blank token
    /// leaves requests unauthenticated.
    pub fn from_env() -> Self {
        let base_url = env::var("TODOIST_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token = env::var("TODOIST_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        Self { base_url, token }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
