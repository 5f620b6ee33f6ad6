//! Which endpoints must succeed before a lead counts as submitted.

use serde::{Deserialize, Serialize};

use crate::locale::Locale;

/// The remote endpoints a lead can be delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    LeadApi,
    Webhook,
}

impl Endpoint {
    /// Delivery order for required endpoints.
    pub const ORDER: [Endpoint; 2] = [Endpoint::LeadApi, Endpoint::Webhook];

    pub fn name(&self) -> &'static str {
        match self {
            Self::LeadApi => "lead_api",
            Self::Webhook => "webhook",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How a delivery failure affects the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Awaited; a failure aborts the submission.
    Required,
    /// Fired after required endpoints succeed; failures are only logged.
    BestEffort,
    /// Not called.
    Skipped,
}

/// Requirement of one endpoint, split by whether the lead's locale is the
/// default one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRule {
    pub default_locale: Requirement,
    pub other_locales: Requirement,
}

impl EndpointRule {
    pub const fn always(requirement: Requirement) -> Self {
        Self {
            default_locale: requirement,
            other_locales: requirement,
        }
    }

    pub fn for_locale(&self, locale: Locale) -> Requirement {
        if locale == Locale::default() {
            self.default_locale
        } else {
            self.other_locales
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPolicy {
    pub lead_api: EndpointRule,
    pub webhook: EndpointRule,
}

impl SubmissionPolicy {
    /// Lead API required, webhook best-effort.
    pub const fn standard() -> Self {
        Self {
            lead_api: EndpointRule::always(Requirement::Required),
            webhook: EndpointRule::always(Requirement::BestEffort),
        }
    }

    /// Lead API only.
    pub const fn lead_api_only() -> Self {
        Self {
            lead_api: EndpointRule::always(Requirement::Required),
            webhook: EndpointRule::always(Requirement::Skipped),
        }
    }

    /// Lead API required for non-default locales and skipped for the
    /// default one; the webhook is always fired best-effort.
    pub const fn localized_intake() -> Self {
        Self {
            lead_api: EndpointRule {
                default_locale: Requirement::Skipped,
                other_locales: Requirement::Required,
            },
            webhook: EndpointRule::always(Requirement::BestEffort),
        }
    }

    pub fn requirement(&self, endpoint: Endpoint, locale: Locale) -> Requirement {
        match endpoint {
            Endpoint::LeadApi => self.lead_api.for_locale(locale),
            Endpoint::Webhook => self.webhook.for_locale(locale),
        }
    }
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
