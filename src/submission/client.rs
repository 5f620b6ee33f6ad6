//! HTTP delivery of leads to the intake API and the campaign webhook.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::payload::{LeadApiEnvelope, LeadSubmission, WebhookPayload};
use super::policy::Endpoint;
use crate::error::SubmissionError;

/// A destination a lead can be delivered to.
#[async_trait]
pub trait LeadSink: Send + Sync {
    fn endpoint(&self) -> Endpoint;

    async fn deliver(&self, lead: &LeadSubmission) -> Result<(), SubmissionError>;
}

/// Lead-intake API client. Posts the `{"parameters": {...}}` envelope.
pub struct LeadApiClient {
    client: reqwest::Client,
    url: String,
}

impl LeadApiClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl LeadSink for LeadApiClient {
    fn endpoint(&self) -> Endpoint {
        Endpoint::LeadApi
    }

    async fn deliver(&self, lead: &LeadSubmission) -> Result<(), SubmissionError> {
        post_json(&self.client, &self.url, Endpoint::LeadApi, &LeadApiEnvelope::from(lead)).await
    }
}

/// Campaign webhook client. Posts the flat body.
pub struct WebhookClient {
    client: reqwest::Client,
    url: String,
}

impl WebhookClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl LeadSink for WebhookClient {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Webhook
    }

    async fn deliver(&self, lead: &LeadSubmission) -> Result<(), SubmissionError> {
        post_json(&self.client, &self.url, Endpoint::Webhook, &WebhookPayload::from(lead)).await
    }
}

/// POST `body` as JSON. Any non-2xx status counts as a failure; the
/// response body is never consumed.
async fn post_json<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    endpoint: Endpoint,
    body: &T,
) -> Result<(), SubmissionError> {
    let resp = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| SubmissionError::RequestFailed {
            endpoint: endpoint.name().into(),
            reason: e.to_string(),
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(SubmissionError::Rejected {
            endpoint: endpoint.name().into(),
            status: status.as_u16(),
        });
    }

    debug!(%endpoint, status = status.as_u16(), "Lead delivered");
    Ok(())
}
