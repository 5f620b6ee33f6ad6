//! The step sequencer.
//!
//! A [`Wizard`] walks the active steps of its [`WizardConfig`] for the
//! current locale. `next` only advances when the step's checks pass, and
//! `submit` runs in two phases so callers holding a lock can release it
//! while the lead is in flight.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::{Field, FieldErrors, Position, SubmissionStatus, WizardFields, WizardState};
use super::steps::{Check, StepDescriptor, StepKind, ValidationContext, check_field, validate_step};
use super::variant::{Variant, WizardConfig};
use crate::catalog::{InsuranceProduct, SurveyAnswer};
use crate::error::{SubmissionError, WizardError};
use crate::gate::sanitize_postal_code;
use crate::locale::Locale;
use crate::messages::Message;
use crate::phone::{CallingCode, digits_only};
use crate::submission::{Dispatched, LeadSubmission, LeadSubmitter, SubmissionPolicy};

/// How the wizard was entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Active step index the wizard opens on.
    pub step_index: usize,
    /// Back on the entry step hands control to the landing gate.
    pub returns_to_landing: bool,
    pub postal_code: Option<String>,
    pub referral_code: Option<String>,
    pub vendor_code: Option<String>,
}

impl EntryPoint {
    /// Start at the first step with nothing seeded.
    pub fn fresh() -> Self {
        Self::default()
    }

    /// Continue from the landing gate with an already validated code.
    pub fn landing(step_index: usize, postal_code: impl Into<String>) -> Self {
        Self {
            step_index,
            returns_to_landing: true,
            postal_code: Some(postal_code.into()),
            ..Self::default()
        }
    }

    pub fn with_referral(mut self, referral_code: Option<String>, vendor_code: Option<String>) -> Self {
        self.referral_code = referral_code;
        self.vendor_code = vendor_code;
        self
    }
}

/// A single field edit from the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldEdit {
    PostalCode(String),
    FirstName(String),
    LastName(String),
    Phone(String),
    Email(String),
    CallingCode(CallingCode),
    /// Select a product, or clear it when it is already selected.
    Insurance(InsuranceProduct),
    Consent(bool),
    /// Picking an answer also advances past the survey step.
    Survey(SurveyAnswer),
}

/// Result of a Back action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackOutcome {
    Moved,
    /// The caller should show the landing gate again.
    ReturnToLanding,
    /// Already at the first step.
    Stayed,
}

/// Result of a full submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    Delivered(Dispatched),
    /// Delivery failed; the wizard kept its fields and shows a generic error.
    Failed(SubmissionError),
}

/// Serializable snapshot rendered by the front-end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardView {
    pub variant: Variant,
    pub locale: Locale,
    pub steps: Vec<StepKind>,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<StepKind>,
    /// The current step is submitted rather than advanced.
    pub is_submit_step: bool,
    pub fields: WizardFields,
    pub errors: FieldErrors,
    pub status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
    pub phone_placeholder: &'static str,
    pub consent_required: bool,
}

pub struct Wizard {
    config: Arc<WizardConfig>,
    locale: Locale,
    entry: EntryPoint,
    /// Index into `config.steps` of the entry step.
    entry_descriptor: usize,
    state: WizardState,
}

impl Wizard {
    pub fn new(config: Arc<WizardConfig>, locale: Locale, entry: EntryPoint) -> Self {
        let active = config.active_indices(locale);
        let step = entry.step_index.min(active.len().saturating_sub(1));
        let entry_descriptor = active.get(step).copied().unwrap_or(0);

        let mut fields = WizardFields::pristine(config.default_insurance);
        if let Some(code) = &entry.postal_code {
            fields.postal_code = sanitize_postal_code(code);
        }

        debug!(
            variant = %config.variant,
            %locale,
            step,
            returns_to_landing = entry.returns_to_landing,
            "Wizard created"
        );

        Self {
            config,
            locale,
            entry,
            entry_descriptor,
            state: WizardState::new(step, fields),
        }
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn entry(&self) -> &EntryPoint {
        &self.entry
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn policy(&self) -> SubmissionPolicy {
        self.config.policy
    }

    fn active_steps(&self) -> Vec<&StepDescriptor> {
        self.config.active_steps(self.locale)
    }

    pub fn current_step(&self) -> Option<&StepDescriptor> {
        match self.state.position {
            Position::Step(i) => self.active_steps().get(i).copied(),
            Position::Confirmation => None,
        }
    }

    fn is_last_step(&self, index: usize) -> bool {
        index + 1 >= self.active_steps().len()
    }

    fn ensure_not_pending(&self) -> Result<(), WizardError> {
        if self.state.status == SubmissionStatus::Pending {
            return Err(WizardError::SubmissionPending);
        }
        Ok(())
    }

    fn current_index(&self) -> Result<usize, WizardError> {
        match self.state.position {
            Position::Step(i) => Ok(i),
            Position::Confirmation => Err(WizardError::Finished),
        }
    }

    // ── Field edits ──────────────────────────────────────────────────

    /// Apply a field edit.
    ///
    /// Edits never advance the wizard, except a survey answer which is
    /// selection and Next in one.
    pub fn edit(&mut self, edit: FieldEdit) -> Result<(), WizardError> {
        self.current_index()?;
        let fields = &mut self.state.fields;
        let touched = match edit {
            FieldEdit::PostalCode(v) => {
                fields.postal_code = sanitize_postal_code(&v);
                Field::PostalCode
            }
            FieldEdit::FirstName(v) => {
                fields.first_name = v;
                Field::FirstName
            }
            FieldEdit::LastName(v) => {
                fields.last_name = v;
                Field::LastName
            }
            FieldEdit::Email(v) => {
                fields.email = v;
                Field::Email
            }
            FieldEdit::Phone(v) => {
                fields.phone = fields.calling_code.rule().format(&v);
                self.refresh_phone_error();
                return Ok(());
            }
            FieldEdit::CallingCode(code) => {
                self.set_calling_code(code);
                return Ok(());
            }
            FieldEdit::Insurance(product) => {
                self.toggle_insurance(product);
                return Ok(());
            }
            FieldEdit::Consent(v) => {
                fields.consent = v;
                Field::Consent
            }
            FieldEdit::Survey(answer) => return self.choose_survey(answer),
        };
        self.recheck(touched);
        Ok(())
    }

    /// Switch calling code, truncating and regrouping digits already typed.
    pub fn set_calling_code(&mut self, code: CallingCode) {
        let fields = &mut self.state.fields;
        let digits = digits_only(&fields.phone);
        fields.calling_code = code;
        fields.phone = code.rule().format(&digits);
        self.refresh_phone_error();
    }

    pub fn toggle_insurance(&mut self, product: InsuranceProduct) {
        let fields = &mut self.state.fields;
        fields.insurance = if fields.insurance == Some(product) {
            None
        } else {
            Some(product)
        };
        self.recheck(Field::Insurance);
    }

    /// Live length feedback while typing. An empty number is only reported
    /// once the step validator has flagged the field.
    fn refresh_phone_error(&mut self) {
        let fields = &self.state.fields;
        let rule = fields.calling_code.rule();
        let digits = fields.phone_digits();
        let msg = if digits.is_empty() {
            self.state
                .errors
                .contains_key(&Field::Phone)
                .then_some(Message::PhoneRequired)
        } else if !rule.accepts(&digits) {
            Some(Message::PhoneLength {
                min: rule.min_digits,
                max: rule.max_digits,
            })
        } else {
            None
        };
        match msg {
            Some(msg) => {
                self.state.errors.insert(Field::Phone, msg.text(self.locale));
            }
            None => {
                self.state.errors.remove(&Field::Phone);
            }
        }
    }

    /// Re-evaluate an errored field after it changed. The error is dropped
    /// once the field passes and re-rendered otherwise.
    fn recheck(&mut self, field: Field) {
        if !self.state.errors.contains_key(&field) {
            return;
        }
        let Some(check) = Check::for_field(field) else {
            self.state.errors.remove(&field);
            return;
        };
        let ctx = ValidationContext {
            locale: self.locale,
            consent_locales: &self.config.consent_locales,
        };
        match check_field(check, &self.state.fields, &ctx) {
            Some(msg) => {
                self.state.errors.insert(field, msg);
            }
            None => {
                self.state.errors.remove(&field);
            }
        }
    }

    // ── Transitions ──────────────────────────────────────────────────

    fn validate_current(&mut self, index: usize) -> Result<(), WizardError> {
        let config = Arc::clone(&self.config);
        let steps = config.active_steps(self.locale);
        let Some(step) = steps.get(index) else {
            return Ok(());
        };
        let ctx = ValidationContext {
            locale: self.locale,
            consent_locales: &config.consent_locales,
        };
        let errors = validate_step(step, &self.state.fields, &ctx);
        if errors.is_empty() {
            return Ok(());
        }
        let count = errors.len();
        debug!(step = %step.kind, count, "Step rejected");
        self.state.errors = errors;
        Err(WizardError::Invalid { count })
    }

    /// Advance one step if the current step validates.
    pub fn next(&mut self) -> Result<(), WizardError> {
        self.state.reset_messages();
        let index = self.current_index()?;
        self.ensure_not_pending()?;
        if self.is_last_step(index) {
            return Err(WizardError::SubmitRequired);
        }
        self.validate_current(index)?;
        self.state.go_to(Position::Step(index + 1));
        Ok(())
    }

    pub fn back(&mut self) -> Result<BackOutcome, WizardError> {
        self.state.reset_messages();
        let index = self.current_index()?;
        self.ensure_not_pending()?;

        let at_entry = self.config.active_indices(self.locale).get(index) == Some(&self.entry_descriptor);
        if at_entry && self.entry.returns_to_landing {
            return Ok(BackOutcome::ReturnToLanding);
        }
        if index == 0 {
            return Ok(BackOutcome::Stayed);
        }
        self.state.go_to(Position::Step(index - 1));
        Ok(BackOutcome::Moved)
    }

    /// Record a survey answer and move past the survey step.
    pub fn choose_survey(&mut self, answer: SurveyAnswer) -> Result<(), WizardError> {
        match self.current_step() {
            Some(step) if step.kind == StepKind::Survey => {}
            Some(step) => {
                return Err(WizardError::UnsupportedAction {
                    step: step.kind.to_string(),
                });
            }
            None => return Err(WizardError::Finished),
        }
        self.state.fields.survey = Some(answer);
        self.next()
    }

    /// Switch language. Position is kept on the same step when it is still
    /// shown, errors are re-rendered and transient messages cleared.
    pub fn set_locale(&mut self, locale: Locale) {
        if locale == self.locale {
            return;
        }
        let before = self.config.active_indices(self.locale);
        let after = self.config.active_indices(locale);
        self.locale = locale;
        self.state.reset_messages();

        if let Position::Step(i) = self.state.position {
            let descriptor = before.get(i).copied().unwrap_or(0);
            let moved = after
                .iter()
                .position(|&d| d >= descriptor)
                .unwrap_or(after.len().saturating_sub(1));
            self.state.position = Position::Step(moved);
        }

        let errored: Vec<Field> = self.state.errors.keys().copied().collect();
        for field in errored {
            self.recheck(field);
        }
    }

    // ── Submission ───────────────────────────────────────────────────

    /// Validate the final step, mark the wizard pending and snapshot the
    /// lead to deliver.
    pub fn begin_submit(&mut self) -> Result<LeadSubmission, WizardError> {
        self.state.reset_messages();
        let index = self.current_index()?;
        self.ensure_not_pending()?;
        if !self.is_last_step(index) {
            return Err(WizardError::NotAtSubmitStep);
        }
        self.validate_current(index)?;

        let lead = self.snapshot();
        self.state.status = SubmissionStatus::Pending;
        self.state.pending_submission = Some(lead.id);
        Ok(lead)
    }

    pub fn is_pending(&self) -> bool {
        self.state.status == SubmissionStatus::Pending
    }

    fn snapshot(&self) -> LeadSubmission {
        let fields = &self.state.fields;
        let consent_required = self.config.consent_locales.contains(&self.locale);
        LeadSubmission {
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            first_name: fields.first_name.trim().to_string(),
            last_name: fields.last_name.trim().to_string(),
            email: fields.email.trim().to_string(),
            phone_digits: fields.phone_digits(),
            calling_code: fields.calling_code,
            postal_code: fields.postal_code.trim().to_string(),
            locale: self.locale,
            insurance: fields.insurance,
            consent_to_messages: !consent_required || fields.consent,
            survey_answer: fields.survey.map(|s| s.label(self.locale).to_string()),
            referral_code: self.entry.referral_code.clone(),
            vendor_code: self.entry.vendor_code.clone(),
        }
    }

    /// Apply the outcome of a submission started with [`begin_submit`].
    ///
    /// Outcomes for any lead other than the one in flight are ignored.
    ///
    /// [`begin_submit`]: Wizard::begin_submit
    pub fn finish_submit(&mut self, submission_id: Uuid, outcome: &Result<Dispatched, SubmissionError>) {
        if self.state.pending_submission != Some(submission_id) {
            warn!(
                %submission_id,
                pending = ?self.state.pending_submission,
                "Ignoring outcome for a submission this wizard is not waiting on"
            );
            return;
        }
        match outcome {
            Ok(dispatched) => {
                info!(submission_id = %dispatched.submission_id, "Wizard confirmed");
                let mut state = WizardState::new(0, WizardFields::pristine(self.config.default_insurance));
                state.position = Position::Confirmation;
                state.status = SubmissionStatus::Succeeded;
                state.success_message = Some(Message::SubmitSuccess.text(self.locale));
                self.state = state;
            }
            Err(e) => {
                warn!(%submission_id, endpoint = e.endpoint(), error = %e, "Wizard submission failed");
                self.state.status = SubmissionStatus::Failed;
                self.state.pending_submission = None;
                self.state.error_message = Some(Message::SubmitError.text(self.locale));
            }
        }
    }

    /// Validate, deliver and record the outcome in one call.
    pub async fn submit(&mut self, submitter: &LeadSubmitter) -> Result<SubmitOutcome, WizardError> {
        let lead = self.begin_submit()?;
        let result = submitter.dispatch(&lead, &self.config.policy).await;
        self.finish_submit(lead.id, &result);
        Ok(match result {
            Ok(dispatched) => SubmitOutcome::Delivered(dispatched),
            Err(e) => SubmitOutcome::Failed(e),
        })
    }

    pub fn view(&self) -> WizardView {
        let steps: Vec<StepKind> = self.active_steps().iter().map(|s| s.kind).collect();
        let is_submit_step = match self.state.position {
            Position::Step(i) => i + 1 >= steps.len(),
            Position::Confirmation => false,
        };
        WizardView {
            variant: self.config.variant,
            locale: self.locale,
            current_step: self.current_step().map(|s| s.kind),
            steps,
            position: self.state.position,
            is_submit_step,
            fields: self.state.fields.clone(),
            errors: self.state.errors.clone(),
            status: self.state.status,
            error_message: self.state.error_message.clone(),
            success_message: self.state.success_message.clone(),
            phone_placeholder: self.state.fields.calling_code.rule().placeholder,
            consent_required: self.config.consent_locales.contains(&self.locale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::Endpoint;
    use crate::submission::testing::RecordingSink;

    fn wizard(variant: Variant, locale: Locale) -> Wizard {
        Wizard::new(
            Arc::new(WizardConfig::for_variant(variant)),
            locale,
            EntryPoint::fresh(),
        )
    }

    fn fill_contact(w: &mut Wizard) {
        for edit in [
            FieldEdit::PostalCode("94107".into()),
            FieldEdit::FirstName(" Ana ".into()),
            FieldEdit::LastName("Souza".into()),
            FieldEdit::Phone("5551234567".into()),
            FieldEdit::Email("ana@example.com".into()),
        ] {
            w.edit(edit).unwrap();
        }
    }

    /// Drive a standard wizard to its final step with valid fields.
    fn at_final_step(locale: Locale) -> Wizard {
        let mut w = wizard(Variant::Standard, locale);
        fill_contact(&mut w);
        w.edit(FieldEdit::Consent(true)).unwrap();
        while !w.view().is_submit_step {
            w.next().unwrap();
        }
        w
    }

    #[test]
    fn scenario_a_short_postal_code_is_rejected() {
        let mut w = wizard(Variant::Standard, Locale::En);
        w.edit(FieldEdit::PostalCode("1234".into())).unwrap();

        let err = w.next().unwrap_err();
        assert_eq!(err, WizardError::Invalid { count: 1 });
        assert_eq!(w.state().position, Position::Step(0));
        assert_eq!(
            w.state().errors[&Field::PostalCode],
            "ZIP Code must be exactly 5 digits."
        );
    }

    #[test]
    fn scenario_b_valid_postal_code_advances() {
        let mut w = wizard(Variant::Standard, Locale::En);
        w.edit(FieldEdit::PostalCode("94107".into())).unwrap();
        w.next().unwrap();
        assert_eq!(w.state().position, Position::Step(1));
        assert!(w.state().errors.is_empty());
    }

    #[test]
    fn scenario_c_calling_code_switch_revalidates_phone() {
        let mut w = wizard(Variant::Standard, Locale::En);
        w.edit(FieldEdit::Phone("5551234567".into())).unwrap();
        assert_eq!(w.state().fields.phone, "(555) 123-4567");
        assert!(!w.state().errors.contains_key(&Field::Phone));

        w.edit(FieldEdit::CallingCode(CallingCode::Brazil)).unwrap();
        assert_eq!(w.state().fields.phone_digits(), "5551234567");
        assert!(w.state().errors[&Field::Phone].contains("11"));

        w.edit(FieldEdit::Phone("55512345678".into())).unwrap();
        assert_eq!(w.state().fields.phone, "(55) 51234-5678");
        assert!(!w.state().errors.contains_key(&Field::Phone));
    }

    #[test]
    fn clearing_a_flagged_phone_keeps_required_error() {
        let mut w = wizard(Variant::Standard, Locale::En);
        w.edit(FieldEdit::PostalCode("94107".into())).unwrap();
        w.next().unwrap();
        w.edit(FieldEdit::FirstName("Ana".into())).unwrap();
        w.edit(FieldEdit::LastName("Souza".into())).unwrap();
        w.next().unwrap();

        w.next().unwrap_err();
        assert_eq!(w.state().errors[&Field::Phone], "Phone number is required.");
        w.edit(FieldEdit::Phone("555".into())).unwrap();
        assert!(w.state().errors[&Field::Phone].contains("10"));
        w.edit(FieldEdit::Phone(String::new())).unwrap();
        assert_eq!(w.state().errors[&Field::Phone], "Phone number is required.");
    }

    #[test]
    fn clearing_an_unflagged_phone_shows_no_error() {
        let mut w = wizard(Variant::Standard, Locale::En);
        w.edit(FieldEdit::Phone("555".into())).unwrap();
        assert!(w.state().errors.contains_key(&Field::Phone));
        w.edit(FieldEdit::Phone(String::new())).unwrap();
        assert!(!w.state().errors.contains_key(&Field::Phone));
    }

    #[test]
    fn calling_code_switch_truncates_to_new_maximum() {
        let mut w = wizard(Variant::Standard, Locale::En);
        w.edit(FieldEdit::CallingCode(CallingCode::Brazil)).unwrap();
        w.edit(FieldEdit::Phone("11912345678".into())).unwrap();
        w.edit(FieldEdit::CallingCode(CallingCode::Mexico)).unwrap();
        assert_eq!(w.state().fields.phone_digits(), "1191234567");
    }

    #[tokio::test]
    async fn scenario_d_successful_submit_resets_to_confirmation() {
        let api = RecordingSink::ok(Endpoint::LeadApi);
        let submitter = LeadSubmitter::new().with_lead_api(api.clone());
        let mut w = at_final_step(Locale::En);

        let outcome = w.submit(&submitter).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Delivered(_)));
        assert_eq!(w.state().position, Position::Confirmation);
        assert_eq!(w.state().status, SubmissionStatus::Succeeded);
        assert_eq!(w.state().fields, WizardFields::pristine(Some(InsuranceProduct::Health)));
        assert_eq!(w.state().success_message.as_deref(), Some("We will contact you soon."));

        let delivered = api.delivered.lock().await;
        assert_eq!(delivered[0].first_name, "Ana");
        assert_eq!(delivered[0].phone_digits, "5551234567");
    }

    #[tokio::test]
    async fn scenario_d_failed_submit_keeps_fields_for_retry() {
        let submitter = LeadSubmitter::new().with_lead_api(RecordingSink::failing(Endpoint::LeadApi, 500));
        let mut w = at_final_step(Locale::En);
        let before = w.state().clone();

        let outcome = w.submit(&submitter).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(w.state().position, before.position);
        assert_eq!(w.state().fields, before.fields);
        assert_eq!(w.state().status, SubmissionStatus::Failed);
        assert_eq!(
            w.state().error_message.as_deref(),
            Some("Failed to submit the form. Please try again.")
        );

        // Retry is allowed after a failure.
        let ok = LeadSubmitter::new().with_lead_api(RecordingSink::ok(Endpoint::LeadApi));
        w.submit(&ok).await.unwrap();
        assert_eq!(w.state().position, Position::Confirmation);
    }

    #[test]
    fn scenario_e_consent_blocks_submission_for_consent_locale() {
        let mut w = wizard(Variant::Conversational, Locale::Br);
        fill_contact(&mut w);
        w.next().unwrap();
        w.next().unwrap();
        w.next().unwrap();
        w.choose_survey(SurveyAnswer::FamilyCoverage).unwrap();
        assert_eq!(w.current_step().unwrap().kind, StepKind::Email);

        let err = w.begin_submit().unwrap_err();
        assert_eq!(err, WizardError::Invalid { count: 1 });
        assert!(w.state().errors.contains_key(&Field::Consent));
        assert_eq!(w.state().status, SubmissionStatus::Idle);

        w.edit(FieldEdit::Consent(true)).unwrap();
        assert!(w.state().errors.is_empty());
        let lead = w.begin_submit().unwrap();
        assert!(lead.consent_to_messages);
        assert_eq!(lead.survey_answer.as_deref(), Some(SurveyAnswer::FamilyCoverage.label(Locale::Br)));
    }

    #[test]
    fn consent_not_required_for_default_locale() {
        let mut w = wizard(Variant::Conversational, Locale::En);
        fill_contact(&mut w);
        for _ in 0..3 {
            w.next().unwrap();
        }
        w.choose_survey(SurveyAnswer::LowerCost).unwrap();
        let lead = w.begin_submit().unwrap();
        assert!(lead.consent_to_messages);
    }

    #[test]
    fn repeated_invalid_next_is_idempotent() {
        let mut w = wizard(Variant::Standard, Locale::En);
        w.edit(FieldEdit::PostalCode("12".into())).unwrap();
        w.next().unwrap_err();
        let first = w.state().clone();
        w.next().unwrap_err();
        w.next().unwrap_err();
        assert_eq!(w.state(), &first);
    }

    #[test]
    fn fixing_a_field_removes_its_error() {
        let mut w = wizard(Variant::Standard, Locale::En);
        w.next().unwrap_err();
        assert!(w.state().errors.contains_key(&Field::PostalCode));
        w.edit(FieldEdit::PostalCode("941".into())).unwrap();
        assert_eq!(
            w.state().errors[&Field::PostalCode],
            "ZIP Code must be exactly 5 digits."
        );
        w.edit(FieldEdit::PostalCode("94107".into())).unwrap();
        assert!(w.state().errors.is_empty());
    }

    #[test]
    fn next_on_final_step_requires_submit() {
        let mut w = at_final_step(Locale::En);
        assert_eq!(w.next().unwrap_err(), WizardError::SubmitRequired);
    }

    #[test]
    fn begin_submit_only_on_final_step() {
        let mut w = wizard(Variant::Standard, Locale::En);
        assert_eq!(w.begin_submit().unwrap_err(), WizardError::NotAtSubmitStep);
    }

    #[test]
    fn second_submit_while_pending_is_rejected() {
        let mut w = at_final_step(Locale::En);
        w.begin_submit().unwrap();
        assert_eq!(w.state().status, SubmissionStatus::Pending);
        assert_eq!(w.begin_submit().unwrap_err(), WizardError::SubmissionPending);
        assert_eq!(w.back().unwrap_err(), WizardError::SubmissionPending);
        // Field edits are still accepted while pending.
        w.edit(FieldEdit::FirstName("Bia".into())).unwrap();
    }

    #[test]
    fn back_from_landing_entry_returns_to_landing() {
        let config = Arc::new(WizardConfig::for_variant(Variant::Standard));
        let entry = EntryPoint::landing(config.contact_entry_index(Locale::En), "94107");
        let mut w = Wizard::new(config, Locale::En, entry);
        assert_eq!(w.state().position, Position::Step(1));
        assert_eq!(w.state().fields.postal_code, "94107");

        assert_eq!(w.back().unwrap(), BackOutcome::ReturnToLanding);
        assert_eq!(w.state().position, Position::Step(1));

        w.edit(FieldEdit::FirstName("Ana".into())).unwrap();
        w.edit(FieldEdit::LastName("Souza".into())).unwrap();
        w.next().unwrap();
        assert_eq!(w.back().unwrap(), BackOutcome::Moved);
        assert_eq!(w.state().position, Position::Step(1));
    }

    #[test]
    fn back_without_landing_walks_to_first_step() {
        let config = Arc::new(WizardConfig::for_variant(Variant::Classic));
        let entry = EntryPoint {
            step_index: 1,
            postal_code: Some("94107".into()),
            ..EntryPoint::fresh()
        };
        let mut w = Wizard::new(config, Locale::En, entry);
        assert_eq!(w.back().unwrap(), BackOutcome::Moved);
        assert_eq!(w.state().position, Position::Step(0));
        assert_eq!(w.back().unwrap(), BackOutcome::Stayed);
    }

    #[test]
    fn survey_answer_only_on_survey_step() {
        let mut w = wizard(Variant::Conversational, Locale::En);
        let err = w.choose_survey(SurveyAnswer::LowerCost).unwrap_err();
        assert_eq!(
            err,
            WizardError::UnsupportedAction {
                step: "postal_code".into()
            }
        );
    }

    #[test]
    fn insurance_toggles() {
        let mut w = wizard(Variant::Classic, Locale::En);
        assert_eq!(w.state().fields.insurance, None);
        w.edit(FieldEdit::Insurance(InsuranceProduct::Auto)).unwrap();
        assert_eq!(w.state().fields.insurance, Some(InsuranceProduct::Auto));
        w.edit(FieldEdit::Insurance(InsuranceProduct::Auto)).unwrap();
        assert_eq!(w.state().fields.insurance, None);
    }

    #[test]
    fn classic_contact_step_validates_all_fields() {
        let mut w = wizard(Variant::Classic, Locale::Es);
        w.edit(FieldEdit::PostalCode("94107".into())).unwrap();
        w.next().unwrap();
        let err = w.begin_submit().unwrap_err();
        // Names, phone, email, product and consent.
        assert_eq!(err, WizardError::Invalid { count: 6 });
    }

    #[test]
    fn locale_switch_keeps_step_and_relocalizes_errors() {
        let mut w = wizard(Variant::Standard, Locale::En);
        w.next().unwrap_err();
        w.set_locale(Locale::Es);
        assert_eq!(w.state().position, Position::Step(0));
        assert_eq!(
            w.state().errors[&Field::PostalCode],
            "El codigo ZIP es obligatorio."
        );
    }

    #[test]
    fn locale_switch_off_consent_step_lands_on_last_step() {
        let mut w = at_final_step(Locale::Br);
        assert_eq!(w.current_step().unwrap().kind, StepKind::Consent);
        w.set_locale(Locale::En);
        assert_eq!(w.current_step().unwrap().kind, StepKind::Email);
        assert!(w.view().is_submit_step);
    }

    #[test]
    fn lead_snapshot_carries_entry_codes() {
        let config = Arc::new(WizardConfig::for_variant(Variant::Standard));
        let entry = EntryPoint::landing(1, "94107")
            .with_referral(Some("agent-7".into()), Some("spring".into()));
        let mut w = Wizard::new(config, Locale::En, entry);
        fill_contact(&mut w);
        while !w.view().is_submit_step {
            w.next().unwrap();
        }
        let lead = w.begin_submit().unwrap();
        assert_eq!(lead.first_name, "Ana");
        assert_eq!(lead.referral_code.as_deref(), Some("agent-7"));
        assert_eq!(lead.vendor_code.as_deref(), Some("spring"));
        assert_eq!(lead.postal_code, "94107");
    }

    #[test]
    fn edits_after_confirmation_are_rejected() {
        let mut w = at_final_step(Locale::En);
        let lead = w.begin_submit().unwrap();
        w.finish_submit(lead.id, &Ok(Dispatched {
            submission_id: lead.id,
            confirmed_by: vec![Endpoint::LeadApi],
            background: Vec::new(),
        }));
        assert_eq!(
            w.edit(FieldEdit::FirstName("x".into())).unwrap_err(),
            WizardError::Finished
        );
        assert_eq!(w.next().unwrap_err(), WizardError::Finished);
    }

    #[test]
    fn field_edit_wire_format() {
        let edit: FieldEdit =
            serde_json::from_value(serde_json::json!({"field": "calling_code", "value": "+55"})).unwrap();
        assert_eq!(edit, FieldEdit::CallingCode(CallingCode::Brazil));
        let edit: FieldEdit =
            serde_json::from_value(serde_json::json!({"field": "insurance", "value": "1016"})).unwrap();
        assert_eq!(edit, FieldEdit::Insurance(InsuranceProduct::Auto));
    }
}
