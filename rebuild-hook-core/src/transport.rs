//! reqwest-backed [`HookTransport`].

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, error};

use crate::contract::{
    redact_url, HookMethod, HookRequest, HookResponse, HookTransport, TriggerError,
};

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a client. Deadlines are taken from each [`HookRequest`], so one
    /// transport survives configuration reloads.
    pub fn new() -> Result<Self, TriggerError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rebuild-hook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                error!(error = ?e, "Failed to construct HTTP client");
                TriggerError::from(e)
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing client, e.g. one shared with the rest of the host.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HookTransport for ReqwestTransport {
    async fn send(&self, request: &HookRequest) -> Result<HookResponse, TriggerError> {
        let mut builder = match request.method {
            HookMethod::Get => self.client.get(&request.url),
            HookMethod::Post => self
                .client
                .post(&request.url)
                .body(request.body.clone().unwrap_or_default()),
        };
        builder = builder.timeout(request.timeout);
        if let Some(authorization) = &request.authorization {
            builder = builder.header(AUTHORIZATION, authorization.as_str());
        }

        debug!(
            method = %request.method,
            url = %redact_url(&request.url),
            "Sending build hook request"
        );
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TriggerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(HookResponse {
            status: status.as_u16(),
            body,
        })
    }
}
