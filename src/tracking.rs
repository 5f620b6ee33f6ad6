//! Conversion tracking for submitted leads.
//!
//! Tracking is best-effort: implementations swallow and log their own
//! failures, and callers never await them on the submission path.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::submission::LeadSubmission;

/// Event name reported for a captured lead.
pub const LEAD_EVENT: &str = "Lead";

/// Parameters of a `Lead` conversion event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadEvent {
    pub event: &'static str,
    pub content_name: &'static str,
    pub content_category: &'static str,
    pub value: f64,
    pub currency: &'static str,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub zipcode: String,
}

impl From<&LeadSubmission> for LeadEvent {
    fn from(lead: &LeadSubmission) -> Self {
        Self {
            event: LEAD_EVENT,
            content_name: "Insurance Form Submission",
            content_category: "Lead Generation",
            value: 0.0,
            currency: "USD",
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            email: lead.email.clone(),
            zipcode: lead.postal_code.clone(),
        }
    }
}

#[async_trait]
pub trait ConversionTracker: Send + Sync {
    async fn track(&self, event: &LeadEvent);
}

/// Writes conversions to the log stream.
pub struct LogTracker;

#[async_trait]
impl ConversionTracker for LogTracker {
    async fn track(&self, event: &LeadEvent) {
        info!(
            event = event.event,
            category = event.content_category,
            zipcode = %event.zipcode,
            "Conversion tracked"
        );
    }
}

/// Forwards conversions to an HTTP collector.
pub struct HttpTracker {
    client: reqwest::Client,
    url: String,
}

impl HttpTracker {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ConversionTracker for HttpTracker {
    async fn track(&self, event: &LeadEvent) {
        match self.client.post(&self.url).json(event).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "Conversion collector rejected event");
            }
            Err(e) => {
                warn!(error = %e, "Conversion tracking failed");
            }
        }
    }
}
