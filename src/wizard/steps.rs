//! Step descriptors and the pure per-field validators behind them.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::state::{Field, FieldErrors, WizardFields};
use crate::gate::matches_postal_code;
use crate::locale::Locale;
use crate::messages::Message;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.%+-]+@[A-Za-z0-9_.-]+\.[A-Za-z]{2,}$").expect("email pattern is valid")
});

/// What a step collects. Determines how the front-end renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    PostalCode,
    Name,
    Phone,
    Survey,
    Email,
    /// Name, phone, email and product on one screen.
    Contact,
    Consent,
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PostalCode => "postal_code",
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Survey => "survey",
            Self::Email => "email",
            Self::Contact => "contact",
            Self::Consent => "consent",
        };
        write!(f, "{s}")
    }
}

/// A single field predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    PostalCode,
    FirstName,
    LastName,
    Phone,
    Email,
    Insurance,
    /// Enforced only for locales that require consent.
    Consent,
}

impl Check {
    pub fn field(&self) -> Field {
        match self {
            Self::PostalCode => Field::PostalCode,
            Self::FirstName => Field::FirstName,
            Self::LastName => Field::LastName,
            Self::Phone => Field::Phone,
            Self::Email => Field::Email,
            Self::Insurance => Field::Insurance,
            Self::Consent => Field::Consent,
        }
    }

    /// The check guarding `field`, if any.
    pub fn for_field(field: Field) -> Option<Self> {
        match field {
            Field::PostalCode => Some(Self::PostalCode),
            Field::FirstName => Some(Self::FirstName),
            Field::LastName => Some(Self::LastName),
            Field::Phone | Field::CallingCode => Some(Self::Phone),
            Field::Email => Some(Self::Email),
            Field::Insurance => Some(Self::Insurance),
            Field::Consent => Some(Self::Consent),
            Field::Survey => None,
        }
    }
}

/// One screen of the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDescriptor {
    pub kind: StepKind,
    pub checks: Vec<Check>,
    /// Locales the step is shown for. `None` means every locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locales: Option<Vec<Locale>>,
}

impl StepDescriptor {
    pub fn new(kind: StepKind, checks: impl Into<Vec<Check>>) -> Self {
        Self {
            kind,
            checks: checks.into(),
            locales: None,
        }
    }

    /// Restrict the step to the given locales.
    pub fn only_for(mut self, locales: impl Into<Vec<Locale>>) -> Self {
        self.locales = Some(locales.into());
        self
    }

    pub fn applies_to(&self, locale: Locale) -> bool {
        self.locales.as_ref().is_none_or(|l| l.contains(&locale))
    }
}

/// Inputs validators depend on besides the fields themselves.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub locale: Locale,
    pub consent_locales: &'a [Locale],
}

impl ValidationContext<'_> {
    pub fn consent_required(&self) -> bool {
        self.consent_locales.contains(&self.locale)
    }
}

/// Run one check. Returns the localized error, or `None` when it passes.
pub fn check_field(check: Check, fields: &WizardFields, ctx: &ValidationContext<'_>) -> Option<String> {
    let msg = match check {
        Check::PostalCode => {
            let code = fields.postal_code.trim();
            if code.is_empty() {
                Some(Message::ZipRequired)
            } else if !matches_postal_code(code) {
                Some(Message::ZipInvalid)
            } else {
                None
            }
        }
        Check::FirstName => fields
            .first_name
            .trim()
            .is_empty()
            .then_some(Message::FirstNameRequired),
        Check::LastName => fields
            .last_name
            .trim()
            .is_empty()
            .then_some(Message::LastNameRequired),
        Check::Phone => {
            let rule = fields.calling_code.rule();
            let digits = fields.phone_digits();
            if digits.is_empty() {
                Some(Message::PhoneRequired)
            } else if !rule.accepts(&digits) {
                Some(Message::PhoneLength {
                    min: rule.min_digits,
                    max: rule.max_digits,
                })
            } else {
                None
            }
        }
        Check::Email => {
            let email = fields.email.trim();
            if email.is_empty() {
                Some(Message::EmailRequired)
            } else if !EMAIL_RE.is_match(email) {
                Some(Message::EmailInvalid)
            } else {
                None
            }
        }
        Check::Insurance => fields.insurance.is_none().then_some(Message::InsuranceRequired),
        Check::Consent => {
            (ctx.consent_required() && !fields.consent).then_some(Message::ConsentRequired)
        }
    };
    msg.map(|m| m.text(ctx.locale))
}

/// Validate every check of `step`. Empty when the step may be left.
pub fn validate_step(
    step: &StepDescriptor,
    fields: &WizardFields,
    ctx: &ValidationContext<'_>,
) -> FieldErrors {
    step.checks
        .iter()
        .filter_map(|check| check_field(*check, fields, ctx).map(|msg| (check.field(), msg)))
        .collect()
}
