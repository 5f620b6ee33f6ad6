//! Multi-step contact wizard.
//!
//! Variants differ only in configuration: which steps are shown, for which
//! locales, and which endpoints must accept the lead.

pub mod engine;
pub mod state;
pub mod steps;
pub mod variant;

pub use engine::{BackOutcome, EntryPoint, FieldEdit, SubmitOutcome, Wizard, WizardView};
pub use state::{Field, FieldErrors, Position, SubmissionStatus, WizardFields, WizardState};
pub use steps::{Check, StepDescriptor, StepKind, ValidationContext, check_field, validate_step};
pub use variant::{DEFAULT_CONSENT_LOCALES, Variant, WizardConfig};
