use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::contract::{redact_url, HookMethod, HookRequest};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BACKOFF_MS: u64 = 500;

/// Which HTTP method the hook is called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodSelection {
    /// GET when no content is configured, POST the content otherwise.
    #[default]
    Auto,
    Get,
    /// Always POST; an absent content is sent as an empty body.
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per delivery, including the first one.
    pub max_attempts: u32,
    /// Wait before attempt `n + 1` is `backoff_ms * n`.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: DEFAULT_BACKOFF_MS,
        }
    }
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn backoff_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

/// The build hook to call whenever content changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildHookConfig {
    pub enabled: bool,
    pub url: String,
    /// Sent verbatim as the `Authorization` header.
    pub authorization: Option<String>,
    /// Literal request body.
    pub content: Option<String>,
    pub method: MethodSelection,
    /// Per-attempt deadline; `0` means the default.
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for BuildHookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            authorization: None,
            content: None,
            method: MethodSelection::Auto,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
        }
    }
}

/// Why a delivery did not produce a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Disabled,
    MissingUrl,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Disabled => f.write_str("build hook disabled"),
            SkipReason::MissingUrl => f.write_str("build hook url is empty"),
        }
    }
}

impl BuildHookConfig {
    /// A hook enabled for `url`, everything else left at defaults.
    pub fn enabled(url: impl Into<String>) -> Self {
        Self {
            enabled: true,
            url: url.into(),
            ..Self::default()
        }
    }

    /// The single-URL shape: always POST with an empty body.
    pub fn front_end_build_hook(url: impl Into<String>) -> Self {
        Self {
            method: MethodSelection::Post,
            ..Self::enabled(url)
        }
    }

    /// Per-attempt deadline. `0` means unset and falls back to the default.
    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Works out the request one delivery should make, or why it should make none.
    pub fn resolve(&self) -> Result<HookRequest, SkipReason> {
        if !self.enabled {
            return Err(SkipReason::Disabled);
        }
        if self.url.trim().is_empty() {
            return Err(SkipReason::MissingUrl);
        }

        let content = self.content.as_deref().filter(|c| !c.is_empty());
        let (method, body) = match (self.method, content) {
            (MethodSelection::Auto, None) | (MethodSelection::Get, _) => (HookMethod::Get, None),
            (MethodSelection::Auto, Some(body)) => (HookMethod::Post, Some(body.to_string())),
            (MethodSelection::Post, body) => {
                (HookMethod::Post, Some(body.unwrap_or_default().to_string()))
            }
        };
        if self.method == MethodSelection::Get && content.is_some() {
            debug!("content is ignored because the hook method is GET");
        }

        Ok(HookRequest {
            method,
            url: self.url.clone(),
            authorization: self
                .authorization
                .as_deref()
                .filter(|a| !a.is_empty())
                .map(str::to_string),
            body,
            timeout: self.timeout(),
        })
    }

    pub fn trace_loaded(&self) {
        info!(
            enabled = self.enabled,
            url = %redact_url(&self.url),
            authorization_set = self.authorization.as_deref().is_some_and(|a| !a.is_empty()),
            content_len = self.content.as_deref().map_or(0, str::len),
            method = ?self.method,
            timeout_secs = self.timeout().as_secs(),
            max_attempts = self.retry.attempts(),
            "Loaded build hook config"
        );
    }
}
