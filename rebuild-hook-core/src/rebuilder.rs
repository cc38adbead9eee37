//! Turns content events into build-hook calls.
//!
//! A delivery is fire-and-forget from the caller's point of view: whatever
//! happens on the wire is logged here and summarised in a [`TriggerOutcome`],
//! and the content operation that raised the event is never failed because of
//! it.

use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::BuildHookConfig;
use crate::contract::{
    redact_url, HookTransport, NotificationHandler, TriggerError, TriggerOutcome,
};
use crate::event::ContentNotification;
use crate::transport::ReqwestTransport;

pub struct WebsiteRebuilder<T = ReqwestTransport> {
    transport: T,
    config: RwLock<Arc<BuildHookConfig>>,
}

impl WebsiteRebuilder<ReqwestTransport> {
    /// Rebuilder talking HTTP through reqwest.
    pub fn from_config(config: BuildHookConfig) -> Result<Self, TriggerError> {
        Ok(Self::new(config, ReqwestTransport::new()?))
    }
}

impl<T> WebsiteRebuilder<T>
where
    T: HookTransport,
{
    pub fn new(config: BuildHookConfig, transport: T) -> Self {
        config.trace_loaded();
        Self {
            transport,
            config: RwLock::new(Arc::new(config)),
        }
    }

    /// The configuration the next delivery will use.
    pub fn config(&self) -> Arc<BuildHookConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swaps in a reloaded configuration. Deliveries already running keep
    /// the snapshot they started with.
    pub fn update_config(&self, config: BuildHookConfig) {
        config.trace_loaded();
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
    }

    /// Calls the build hook for one content event.
    pub async fn rebuild(&self, notification: &ContentNotification) -> TriggerOutcome {
        let delivery_id = Uuid::new_v4();
        let span = info_span!(
            "rebuild_website",
            %delivery_id,
            event = %notification.event,
            subject = notification.subject.as_deref().unwrap_or(""),
        );
        self.deliver().instrument(span).await
    }

    async fn deliver(&self) -> TriggerOutcome {
        let config = self.config();
        let request = match config.resolve() {
            Ok(request) => request,
            Err(reason) => {
                debug!(%reason, "Website rebuild skipped");
                return TriggerOutcome::Skipped { reason };
            }
        };

        let max_attempts = config.retry.attempts();
        let mut attempt = 0;
        let outcome = loop {
            attempt += 1;
            match self.transport.send(&request).await {
                Ok(response) => {
                    info!(
                        method = %request.method,
                        status = response.status,
                        attempt,
                        "Rebuild website triggered by {} with a result of {}",
                        request.method,
                        response.body
                    );
                    break TriggerOutcome::Triggered {
                        method: request.method,
                        status: response.status,
                        body: response.body,
                        attempts: attempt,
                    };
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let wait = config.retry.backoff_after(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        max_attempts,
                        wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                        "Build hook attempt failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    error!(
                        error = %e,
                        attempt,
                        url = %redact_url(&request.url),
                        "Could not rebuild the website"
                    );
                    break TriggerOutcome::Failed {
                        error: e,
                        attempts: attempt,
                    };
                }
            }
        };

        match serde_json::to_string(&outcome) {
            Ok(json) => debug!(outcome = %json, "Delivery finished"),
            Err(e) => debug!(error = ?e, "Failed to serialize delivery outcome"),
        }
        outcome
    }
}

#[async_trait]
impl<T> NotificationHandler for WebsiteRebuilder<T>
where
    T: HookTransport,
{
    async fn handle(&self, notification: &ContentNotification) -> TriggerOutcome {
        self.rebuild(notification).await
    }
}
