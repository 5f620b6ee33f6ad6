//! Landing gate that collects the postal code unlocking the wizard.

use serde::Serialize;

use crate::locale::Locale;
use crate::messages::Message;

/// Number of digits in a postal code.
pub const POSTAL_CODE_LEN: usize = 5;

/// Strip non-digits and truncate to five characters, as the user types.
pub fn sanitize_postal_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(POSTAL_CODE_LEN)
        .collect()
}

/// Whether `code` yields exactly five digits once sanitized.
pub fn is_valid_postal_code(code: &str) -> bool {
    sanitize_postal_code(code).len() == POSTAL_CODE_LEN
}

/// Strict check used by the wizard's postal code step: the stored value
/// itself must be five digits.
pub fn matches_postal_code(code: &str) -> bool {
    let code = code.trim();
    code.len() == POSTAL_CODE_LEN && code.chars().all(|c| c.is_ascii_digit())
}

/// Postal code entry on the landing page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LandingGate {
    code: String,
    error: Option<String>,
}

impl LandingGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record a keystroke. Clears any previously surfaced error.
    pub fn input(&mut self, raw: &str) {
        self.code = sanitize_postal_code(raw);
        self.error = None;
    }

    /// Whether the continue button is enabled.
    pub fn can_continue(&self) -> bool {
        is_valid_postal_code(&self.code)
    }

    /// Attempt to proceed via form submission.
    ///
    /// Returns the code to seed the wizard with, or surfaces an inline error.
    pub fn submit(&mut self, locale: Locale) -> Option<String> {
        if self.can_continue() {
            self.error = None;
            return Some(self.code.clone());
        }
        let msg = if self.code.is_empty() {
            Message::ZipRequired
        } else {
            Message::ZipInvalid
        };
        self.error = Some(msg.text(locale));
        None
    }

    /// Localize a surfaced error after a language switch.
    pub fn relocalize(&mut self, locale: Locale) {
        if self.error.is_some() {
            self.submit(locale);
        }
    }
}
