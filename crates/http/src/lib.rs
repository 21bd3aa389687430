pub mod response;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use plumbline_core::config::EndpointConfig;
use plumbline_core::submission::{
    LeadPayload, SubmissionAdapter, SubmissionError, SubmissionReceipt,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::response::{message_from_body, reference_from_body};

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to build lead endpoint client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Posts finished leads as JSON to the configured endpoint. One request per
/// call, no retries; a timeout counts as the endpoint being unreachable.
#[derive(Clone, Debug)]
pub struct HttpSubmissionAdapter {
    client: Client,
    url: String,
    api_key: Option<SecretString>,
}

impl HttpSubmissionAdapter {
    pub fn new(config: &EndpointConfig) -> Result<Self, AdapterError> {
        Self::from_parts(
            config.url.clone(),
            Duration::from_secs(config.timeout_secs),
            config.api_key.clone(),
        )
    }

    pub fn from_parts(
        url: impl Into<String>,
        timeout: Duration,
        api_key: Option<SecretString>,
    ) -> Result<Self, AdapterError> {
        let client = Client::builder().timeout(timeout).build().map_err(AdapterError::Client)?;
        Ok(Self { client, url: url.into(), api_key })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SubmissionAdapter for HttpSubmissionAdapter {
    async fn submit(&self, payload: &LeadPayload) -> Result<SubmissionReceipt, SubmissionError> {
        let mut request = self.client.post(&self.url).json(payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| {
            warn!(
                event_name = "lead_endpoint.unreachable",
                url = %self.url,
                timeout = error.is_timeout(),
                error = %error,
                "lead endpoint request failed before a response arrived"
            );
            SubmissionError::Network(error.to_string())
        })?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(error) => {
                debug!(error = %error, "lead endpoint response body could not be read");
                String::new()
            }
        };

        if status.is_success() {
            let receipt = SubmissionReceipt::resolve(reference_from_body(&body), Utc::now());
            info!(
                event_name = "lead_endpoint.accepted",
                status = status.as_u16(),
                reference = %receipt.reference,
                server_assigned = receipt.server_assigned,
                "lead endpoint accepted submission"
            );
            return Ok(receipt);
        }

        let message = message_from_body(&body);
        warn!(
            event_name = "lead_endpoint.rejected",
            status = status.as_u16(),
            message = message.as_deref().unwrap_or("<none>"),
            "lead endpoint rejected submission"
        );
        Err(SubmissionError::Server { status: status.as_u16(), message })
    }
}
