//! Declarative wizard configurations for the landing-page variants.

use serde::{Deserialize, Serialize};

use super::steps::{Check, StepDescriptor, StepKind};
use crate::catalog::InsuranceProduct;
use crate::locale::Locale;
use crate::submission::SubmissionPolicy;

/// Locales whose visitors must opt in to messages before submitting.
pub const DEFAULT_CONSENT_LOCALES: [Locale; 2] = [Locale::Br, Locale::Es];

/// The landing-page variants the funnel ships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Postal code, then one combined contact screen with a product picker.
    Classic,
    /// One question per screen with a survey before the email step.
    Conversational,
    /// One question per screen, consent as its own final screen.
    #[default]
    Standard,
}

impl Variant {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(Self::Classic),
            "conversational" => Some(Self::Conversational),
            "standard" => Some(Self::Standard),
            _ => None,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classic => write!(f, "classic"),
            Self::Conversational => write!(f, "conversational"),
            Self::Standard => write!(f, "standard"),
        }
    }
}

/// Everything that differs between wizard variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardConfig {
    pub variant: Variant,
    /// Ordered input steps. Confirmation follows the last one implicitly.
    pub steps: Vec<StepDescriptor>,
    pub consent_locales: Vec<Locale>,
    pub default_insurance: Option<InsuranceProduct>,
    pub policy: SubmissionPolicy,
}

impl WizardConfig {
    pub fn for_variant(variant: Variant) -> Self {
        let postal = StepDescriptor::new(StepKind::PostalCode, [Check::PostalCode]);
        let name = StepDescriptor::new(StepKind::Name, [Check::FirstName, Check::LastName]);
        let phone = StepDescriptor::new(StepKind::Phone, [Check::Phone]);

        match variant {
            Variant::Classic => Self {
                variant,
                steps: vec![
                    postal,
                    StepDescriptor::new(
                        StepKind::Contact,
                        [
                            Check::FirstName,
                            Check::LastName,
                            Check::Phone,
                            Check::Email,
                            Check::Insurance,
                            Check::Consent,
                        ],
                    ),
                ],
                consent_locales: DEFAULT_CONSENT_LOCALES.to_vec(),
                default_insurance: None,
                policy: SubmissionPolicy::lead_api_only(),
            },
            Variant::Conversational => Self {
                variant,
                steps: vec![
                    postal,
                    name,
                    phone,
                    StepDescriptor::new(StepKind::Survey, Vec::<Check>::new()),
                    StepDescriptor::new(StepKind::Email, [Check::Email, Check::Consent]),
                ],
                consent_locales: DEFAULT_CONSENT_LOCALES.to_vec(),
                default_insurance: Some(InsuranceProduct::Health),
                policy: SubmissionPolicy::localized_intake(),
            },
            Variant::Standard => Self {
                variant,
                steps: vec![
                    postal,
                    name,
                    phone,
                    StepDescriptor::new(StepKind::Email, [Check::Email]),
                    StepDescriptor::new(StepKind::Consent, [Check::Consent])
                        .only_for(DEFAULT_CONSENT_LOCALES),
                ],
                consent_locales: DEFAULT_CONSENT_LOCALES.to_vec(),
                default_insurance: Some(InsuranceProduct::Health),
                policy: SubmissionPolicy::standard(),
            },
        }
    }

    /// Override which locales must give consent.
    ///
    /// Locale-filtered consent steps follow the same set.
    pub fn with_consent_locales(mut self, locales: Vec<Locale>) -> Self {
        for step in &mut self.steps {
            if step.kind == StepKind::Consent && step.locales.is_some() {
                step.locales = Some(locales.clone());
            }
        }
        self.consent_locales = locales;
        self
    }

    pub fn with_policy(mut self, policy: SubmissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Indices into `steps` of the steps shown for `locale`.
    pub fn active_indices(&self, locale: Locale) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.applies_to(locale))
            .map(|(i, _)| i)
            .collect()
    }

    /// Steps shown for `locale`, in order.
    pub fn active_steps(&self, locale: Locale) -> Vec<&StepDescriptor> {
        self.steps.iter().filter(|s| s.applies_to(locale)).collect()
    }

    /// Active index of the first step after postal code collection, used
    /// when the landing gate has already captured the code.
    pub fn contact_entry_index(&self, locale: Locale) -> usize {
        self.active_steps(locale)
            .iter()
            .position(|s| s.kind != StepKind::PostalCode)
            .unwrap_or(0)
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self::for_variant(Variant::default())
    }
}
