//! Wizard state: field values, inline errors and submission status.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{InsuranceProduct, SurveyAnswer};
use crate::phone::{CallingCode, digits_only};

/// Fields the wizard collects, used as error keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    PostalCode,
    FirstName,
    LastName,
    CallingCode,
    Phone,
    Email,
    Insurance,
    Consent,
    Survey,
}

/// Localized inline errors keyed by field.
pub type FieldErrors = BTreeMap<Field, String>;

/// Values entered so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardFields {
    pub postal_code: String,
    pub first_name: String,
    pub last_name: String,
    pub calling_code: CallingCode,
    /// Phone as displayed, already grouped for `calling_code`.
    pub phone: String,
    pub email: String,
    pub insurance: Option<InsuranceProduct>,
    pub consent: bool,
    pub survey: Option<SurveyAnswer>,
}

impl WizardFields {
    /// Pristine fields with the variant's preselected product.
    pub fn pristine(default_insurance: Option<InsuranceProduct>) -> Self {
        Self {
            insurance: default_insurance,
            ..Self::default()
        }
    }

    pub fn phone_digits(&self) -> String {
        digits_only(&self.phone)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// Where the wizard currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "at", content = "index")]
pub enum Position {
    /// Index into the steps active for the current locale.
    Step(usize),
    /// Terminal thank-you screen.
    Confirmation,
}

/// Mutable wizard record, owned by exactly one wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    pub position: Position,
    pub fields: WizardFields,
    pub errors: FieldErrors,
    pub status: SubmissionStatus,
    /// Lead id of the submission in flight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_submission: Option<Uuid>,
    /// General, non-field error shown after a failed submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
}

impl WizardState {
    pub fn new(step: usize, fields: WizardFields) -> Self {
        Self {
            position: Position::Step(step),
            fields,
            errors: FieldErrors::new(),
            status: SubmissionStatus::default(),
            pending_submission: None,
            error_message: None,
            success_message: None,
        }
    }

    /// Move to `position`, dropping inline errors.
    pub fn go_to(&mut self, position: Position) {
        self.position = position;
        self.errors.clear();
    }

    pub fn reset_messages(&mut self) {
        self.error_message = None;
        self.success_message = None;
    }
}
