//! Submission sequence that delivers a validated lead to the remote endpoints.
//!
//! Required endpoints are awaited in order and the first failure aborts the
//! sequence. Best-effort endpoints and conversion tracking are spawned only
//! once every required endpoint has succeeded; their failures are logged
//! and never reach the user.

pub mod client;
pub mod payload;
pub mod policy;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use client::{LeadApiClient, LeadSink, WebhookClient};
pub use payload::{LeadApiEnvelope, LeadParameters, LeadSubmission, WebhookPayload};
pub use policy::{Endpoint, EndpointRule, Requirement, SubmissionPolicy};

use crate::error::SubmissionError;
use crate::tracking::{ConversionTracker, LeadEvent};

/// Outcome of a successful submission.
#[derive(Debug)]
pub struct Dispatched {
    pub submission_id: Uuid,
    /// Endpoints that were awaited and succeeded.
    pub confirmed_by: Vec<Endpoint>,
    /// Best-effort deliveries and tracking still in flight. Dropping these
    /// detaches the tasks; it does not cancel them.
    pub background: Vec<JoinHandle<()>>,
}

/// Delivers leads according to a [`SubmissionPolicy`].
#[derive(Clone, Default)]
pub struct LeadSubmitter {
    lead_api: Option<Arc<dyn LeadSink>>,
    webhook: Option<Arc<dyn LeadSink>>,
    tracker: Option<Arc<dyn ConversionTracker>>,
    default_referral_code: Option<String>,
}

impl LeadSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lead_api(mut self, sink: Arc<dyn LeadSink>) -> Self {
        self.lead_api = Some(sink);
        self
    }

    pub fn with_webhook(mut self, sink: Arc<dyn LeadSink>) -> Self {
        self.webhook = Some(sink);
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn ConversionTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Referral code attributed to leads whose entry point carried none.
    pub fn with_default_referral_code(mut self, code: impl Into<String>) -> Self {
        self.default_referral_code = Some(code.into());
        self
    }

    fn sink(&self, endpoint: Endpoint) -> Option<&Arc<dyn LeadSink>> {
        match endpoint {
            Endpoint::LeadApi => self.lead_api.as_ref(),
            Endpoint::Webhook => self.webhook.as_ref(),
        }
    }

    /// Run the submission sequence for `lead`.
    pub async fn dispatch(
        &self,
        lead: &LeadSubmission,
        policy: &SubmissionPolicy,
    ) -> Result<Dispatched, SubmissionError> {
        let mut lead = lead.clone();
        if lead.referral_code.is_none() {
            lead.referral_code = self.default_referral_code.clone();
        }
        let lead = Arc::new(lead);

        let mut confirmed_by = Vec::new();
        let mut best_effort = Vec::new();

        for endpoint in Endpoint::ORDER {
            let requirement = policy.requirement(endpoint, lead.locale);
            match (requirement, self.sink(endpoint)) {
                (Requirement::Skipped, _) => {
                    debug!(%endpoint, locale = %lead.locale, "Endpoint skipped by policy");
                }
                (Requirement::Required, None) => {
                    warn!(%endpoint, "Required endpoint is not configured");
                    return Err(SubmissionError::NotConfigured {
                        endpoint: endpoint.name().into(),
                    });
                }
                (Requirement::BestEffort, None) => {
                    debug!(%endpoint, "Best-effort endpoint not configured");
                }
                (Requirement::Required, Some(sink)) => {
                    if let Err(e) = sink.deliver(&lead).await {
                        warn!(
                            submission_id = %lead.id,
                            %endpoint,
                            error = %e,
                            "Required lead delivery failed"
                        );
                        return Err(e);
                    }
                    confirmed_by.push(endpoint);
                }
                (Requirement::BestEffort, Some(sink)) => best_effort.push(Arc::clone(sink)),
            }
        }

        let mut background: Vec<JoinHandle<()>> = best_effort
            .into_iter()
            .map(|sink| {
                let lead = Arc::clone(&lead);
                tokio::spawn(async move {
                    if let Err(e) = sink.deliver(&lead).await {
                        warn!(
                            submission_id = %lead.id,
                            endpoint = %sink.endpoint(),
                            error = %e,
                            "Best-effort lead delivery failed (non-critical)"
                        );
                    }
                })
            })
            .collect();

        if let Some(tracker) = &self.tracker {
            let tracker = Arc::clone(tracker);
            let event = LeadEvent::from(&*lead);
            background.push(tokio::spawn(async move {
                tracker.track(&event).await;
            }));
        }

        info!(
            submission_id = %lead.id,
            locale = %lead.locale,
            confirmed_by = ?confirmed_by,
            background = background.len(),
            "Lead submitted"
        );

        Ok(Dispatched {
            submission_id: lead.id,
            confirmed_by,
            background,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingSink, RecordingTracker};
    use super::*;
    use crate::locale::Locale;
    use crate::submission::payload::sample_lead;

    async fn drain(dispatched: Dispatched) {
        for handle in dispatched.background {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn standard_policy_awaits_lead_api_then_fires_webhook() {
        let api = RecordingSink::ok(Endpoint::LeadApi);
        let hook = RecordingSink::ok(Endpoint::Webhook);
        let tracker = Arc::new(RecordingTracker::default());
        let submitter = LeadSubmitter::new()
            .with_lead_api(api.clone())
            .with_webhook(hook.clone())
            .with_tracker(tracker.clone());

        let dispatched = submitter
            .dispatch(&sample_lead(), &SubmissionPolicy::standard())
            .await
            .unwrap();
        assert_eq!(dispatched.confirmed_by, vec![Endpoint::LeadApi]);
        assert_eq!(dispatched.background.len(), 2);
        drain(dispatched).await;

        assert_eq!(api.count().await, 1);
        assert_eq!(hook.count().await, 1);
        assert_eq!(tracker.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn required_failure_aborts_before_best_effort() {
        let api = RecordingSink::failing(Endpoint::LeadApi, 500);
        let hook = RecordingSink::ok(Endpoint::Webhook);
        let tracker = Arc::new(RecordingTracker::default());
        let submitter = LeadSubmitter::new()
            .with_lead_api(api.clone())
            .with_webhook(hook.clone())
            .with_tracker(tracker.clone());

        let err = submitter
            .dispatch(&sample_lead(), &SubmissionPolicy::standard())
            .await
            .unwrap_err();
        assert_eq!(err.endpoint(), "lead_api");

        tokio::task::yield_now().await;
        assert_eq!(hook.count().await, 0);
        assert!(tracker.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn best_effort_failure_does_not_fail_submission() {
        let api = RecordingSink::ok(Endpoint::LeadApi);
        let hook = RecordingSink::failing(Endpoint::Webhook, 503);
        let submitter = LeadSubmitter::new()
            .with_lead_api(api.clone())
            .with_webhook(hook.clone());

        let dispatched = submitter
            .dispatch(&sample_lead(), &SubmissionPolicy::standard())
            .await
            .unwrap();
        drain(dispatched).await;
        assert_eq!(hook.count().await, 1);
    }

    #[tokio::test]
    async fn localized_intake_skips_lead_api_for_default_locale() {
        let api = RecordingSink::ok(Endpoint::LeadApi);
        let hook = RecordingSink::ok(Endpoint::Webhook);
        let submitter = LeadSubmitter::new()
            .with_lead_api(api.clone())
            .with_webhook(hook.clone());

        let lead = LeadSubmission {
            locale: Locale::En,
            ..sample_lead()
        };
        let dispatched = submitter
            .dispatch(&lead, &SubmissionPolicy::localized_intake())
            .await
            .unwrap();
        assert!(dispatched.confirmed_by.is_empty());
        drain(dispatched).await;
        assert_eq!(api.count().await, 0);
        assert_eq!(hook.count().await, 1);
    }

    #[tokio::test]
    async fn localized_intake_requires_lead_api_for_other_locales() {
        let api = RecordingSink::failing(Endpoint::LeadApi, 502);
        let hook = RecordingSink::ok(Endpoint::Webhook);
        let submitter = LeadSubmitter::new()
            .with_lead_api(api.clone())
            .with_webhook(hook.clone());

        let lead = LeadSubmission {
            locale: Locale::Es,
            ..sample_lead()
        };
        let result = submitter
            .dispatch(&lead, &SubmissionPolicy::localized_intake())
            .await;
        assert!(result.is_err());
        assert_eq!(hook.count().await, 0);
    }

    #[tokio::test]
    async fn required_but_unconfigured_endpoint_fails() {
        let submitter = LeadSubmitter::new();
        let err = submitter
            .dispatch(&sample_lead(), &SubmissionPolicy::standard())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn webhook_can_be_made_required() {
        let api = RecordingSink::ok(Endpoint::LeadApi);
        let hook = RecordingSink::failing(Endpoint::Webhook, 500);
        let submitter = LeadSubmitter::new()
            .with_lead_api(api.clone())
            .with_webhook(hook.clone());
        let policy = SubmissionPolicy {
            lead_api: EndpointRule::always(Requirement::BestEffort),
            webhook: EndpointRule::always(Requirement::Required),
        };

        let err = submitter.dispatch(&sample_lead(), &policy).await.unwrap_err();
        assert_eq!(err.endpoint(), "webhook");
        // The best-effort lead API call is never fired after a required failure.
        assert_eq!(api.count().await, 0);
    }

    #[tokio::test]
    async fn default_referral_code_fills_missing_code() {
        let api = RecordingSink::ok(Endpoint::LeadApi);
        let submitter = LeadSubmitter::new()
            .with_lead_api(api.clone())
            .with_default_referral_code("house");

        submitter
            .dispatch(&sample_lead(), &SubmissionPolicy::lead_api_only())
            .await
            .unwrap();
        let with_code = LeadSubmission {
            referral_code: Some("agent-7".into()),
            ..sample_lead()
        };
        submitter
            .dispatch(&with_code, &SubmissionPolicy::lead_api_only())
            .await
            .unwrap();

        let delivered = api.delivered.lock().await;
        assert_eq!(delivered[0].referral_code.as_deref(), Some("house"));
        assert_eq!(delivered[1].referral_code.as_deref(), Some("agent-7"));
    }
}
