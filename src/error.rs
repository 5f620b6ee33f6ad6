//! Error types for the lead funnel.

use uuid::Uuid;

/// Top-level error type for the funnel service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised while delivering a lead to a remote endpoint.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("{endpoint} rejected the lead with status {status}")]
    Rejected { endpoint: String, status: u16 },

    #[error("{endpoint} is required by the submission policy but not configured")]
    NotConfigured { endpoint: String },
}

impl SubmissionError {
    /// Name of the endpoint that failed.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::RequestFailed { endpoint, .. }
            | Self::Rejected { endpoint, .. }
            | Self::NotConfigured { endpoint } => endpoint,
        }
    }
}

/// Rejected wizard transitions.
///
/// Field validation failures are not errors of this kind: they are stored
/// on the wizard state and rendered inline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("Step has {count} invalid field(s)")]
    Invalid { count: usize },

    #[error("The final step must be submitted, not advanced")]
    SubmitRequired,

    #[error("Submit is only available on the final input step")]
    NotAtSubmitStep,

    #[error("A submission is already in flight")]
    SubmissionPending,

    #[error("The wizard has already reached confirmation")]
    Finished,

    #[error("Step {step} does not offer that action")]
    UnsupportedAction { step: String },
}

/// Session lookup and lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(Uuid),

    #[error("Session {0} has no active wizard")]
    NoWizard(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),
}

/// Result type alias for the funnel.
pub type Result<T> = std::result::Result<T, Error>;
