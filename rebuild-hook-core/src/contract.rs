#![allow(unused)]

//! # contract: requests, outcomes and the seams between them
//!
//! Plain data describing one build-hook delivery, plus the two traits the
//! rest of the crate is wired through:
//!
//! - [`HookTransport`] performs the HTTP call. The reqwest implementation
//!   lives in [`crate::transport`]; tests use the generated `MockHookTransport`.
//! - [`NotificationHandler`] reacts to a content event. The
//!   [`crate::rebuilder::WebsiteRebuilder`] is the only production implementor;
//!   the [`crate::dispatch::EventBus`] routes events to handlers.
//!
//! Both traits are annotated for `mockall` (behind the `test-export-mocks`
//! feature, enabled by default) so dependents can mock them too.

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::config::SkipReason;
use crate::event::ContentNotification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HookMethod {
    Get,
    Post,
}

impl fmt::Display for HookMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookMethod::Get => f.write_str("GET"),
            HookMethod::Post => f.write_str("POST"),
        }
    }
}

/// A fully resolved outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookRequest {
    pub method: HookMethod,
    pub url: String,
    /// Value of the `Authorization` header, sent as-is.
    pub authorization: Option<String>,
    /// Literal body. Always `Some` for POST, `None` for GET.
    pub body: Option<String>,
    /// Per-attempt deadline.
    #[serde(skip)]
    pub timeout: Duration,
}

impl HookRequest {
    /// Copy safe to print: the authorization value and the URL's path and
    /// query are masked.
    pub fn redacted(&self) -> HookRequest {
        HookRequest {
            url: redact_url(&self.url),
            authorization: self.authorization.as_ref().map(|_| "<redacted>".to_string()),
            ..self.clone()
        }
    }
}

/// Build-hook URLs carry their secret in the path or query, so only the
/// scheme, host and port are ever shown.
pub fn redact_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let parsed = match reqwest::Url::parse(trimmed) {
        Ok(parsed) => parsed,
        Err(_) => return "<redacted>".to_string(),
    };
    let Some(host) = parsed.host_str() else {
        return "<redacted>".to_string();
    };

    let mut shown = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        shown.push_str(&format!(":{port}"));
    }
    if parsed.path() != "/" || parsed.query().is_some() || parsed.fragment().is_some() {
        shown.push_str("/<redacted>");
    }
    shown
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookResponse {
    pub status: u16,
    pub body: String,
}

/// Everything that can go wrong while calling the hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerError {
    /// The request could not be built (malformed url, illegal header value...).
    InvalidRequest { message: String },
    Timeout,
    /// Connection refused, DNS failure, reset...
    Transport { message: String },
    /// The endpoint answered with a non-2xx status.
    Status { status: u16, body: String },
}

impl TriggerError {
    /// Whether another attempt could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            TriggerError::InvalidRequest { .. } => false,
            TriggerError::Timeout | TriggerError::Transport { .. } => true,
            TriggerError::Status { status, .. } => *status >= 500 || *status == 429,
        }
    }
}

impl fmt::Display for TriggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerError::InvalidRequest { message } => write!(f, "invalid request: {message}"),
            TriggerError::Timeout => f.write_str("request timed out"),
            TriggerError::Transport { message } => write!(f, "transport error: {message}"),
            TriggerError::Status { status, body } => {
                write!(f, "endpoint returned status {status}: {body}")
            }
        }
    }
}

impl std::error::Error for TriggerError {}

impl From<reqwest::Error> for TriggerError {
    fn from(e: reqwest::Error) -> Self {
        // The message would otherwise embed the hook URL.
        let e = e.without_url();
        if e.is_builder() {
            TriggerError::InvalidRequest {
                message: e.to_string(),
            }
        } else if e.is_timeout() {
            TriggerError::Timeout
        } else {
            TriggerError::Transport {
                message: e.to_string(),
            }
        }
    }
}

/// What one delivery ended up doing. Informational only: failures have
/// already been logged by the time this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TriggerOutcome {
    Skipped {
        reason: SkipReason,
    },
    Triggered {
        method: HookMethod,
        status: u16,
        body: String,
        attempts: u32,
    },
    Failed {
        error: TriggerError,
        attempts: u32,
    },
}

impl TriggerOutcome {
    pub fn is_triggered(&self) -> bool {
        matches!(self, TriggerOutcome::Triggered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            TriggerOutcome::Skipped { .. } => 0,
            TriggerOutcome::Triggered { attempts, .. } | TriggerOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Performs the HTTP call for a resolved request.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HookTransport: Send + Sync {
    /// Sends the request once. Non-2xx responses are returned as
    /// [`TriggerError::Status`].
    async fn send(&self, request: &HookRequest) -> Result<HookResponse, TriggerError>;
}

/// Reacts to content events routed through the event bus.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    /// Never fails: handlers log their own errors and report what happened.
    async fn handle(&self, notification: &ContentNotification) -> TriggerOutcome;
}
