//! Funnel sessions, one per visit from landing page to confirmation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{SessionError, WizardError};
use crate::gate::{LandingGate, matches_postal_code, sanitize_postal_code};
use crate::locale::Locale;
use crate::referral::Referral;
use crate::wizard::{BackOutcome, EntryPoint, Wizard, WizardConfig, WizardView};

/// Which screen the visitor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Landing,
    Wizard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateView {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub can_continue: bool,
}

/// Snapshot returned by every session endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub locale: Locale,
    pub screen: Screen,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral: Option<Referral>,
    pub gate: GateView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wizard: Option<WizardView>,
}

pub struct FunnelSession {
    pub id: Uuid,
    locale: Locale,
    config: Arc<WizardConfig>,
    gate: LandingGate,
    wizard: Option<Wizard>,
    referral_code: Option<String>,
    referral: Option<Referral>,
    vendor_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl FunnelSession {
    pub fn new(config: Arc<WizardConfig>, locale: Locale) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            locale,
            config,
            gate: LandingGate::new(),
            wizard: None,
            referral_code: None,
            referral: None,
            vendor_code: None,
            created_at: now,
            last_seen: now,
        }
    }

    /// Attach attribution carried by the entry URL.
    pub fn with_attribution(
        mut self,
        referral_code: Option<String>,
        referral: Option<Referral>,
        vendor_code: Option<String>,
    ) -> Self {
        self.referral_code = referral_code;
        self.referral = referral;
        self.vendor_code = vendor_code;
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn gate(&self) -> &LandingGate {
        &self.gate
    }

    pub fn wizard(&self) -> Option<&Wizard> {
        self.wizard.as_ref()
    }

    pub fn wizard_mut(&mut self) -> Result<&mut Wizard, SessionError> {
        self.wizard.as_mut().ok_or(SessionError::NoWizard(self.id))
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
        self.gate.relocalize(locale);
        if let Some(wizard) = &mut self.wizard {
            wizard.set_locale(locale);
        }
    }

    pub fn gate_input(&mut self, raw: &str) {
        self.gate.input(raw);
    }

    fn entry(&self, step_index: usize, returns_to_landing: bool, postal_code: Option<String>) -> EntryPoint {
        EntryPoint {
            step_index,
            returns_to_landing,
            postal_code,
            ..EntryPoint::fresh()
        }
        .with_referral(self.referral_code.clone(), self.vendor_code.clone())
    }

    /// A wizard with a lead in flight cannot be replaced.
    fn ensure_replaceable(&self) -> Result<(), SessionError> {
        match &self.wizard {
            Some(wizard) if wizard.is_pending() => Err(WizardError::SubmissionPending.into()),
            _ => Ok(()),
        }
    }

    /// Leave the landing page for the wizard.
    ///
    /// Returns `false` and surfaces the gate error when the code is not
    /// five digits. The wizard opens past its postal code step and Back
    /// from there returns to the landing page.
    pub fn continue_to_wizard(&mut self) -> Result<bool, SessionError> {
        self.ensure_replaceable()?;
        let Some(code) = self.gate.submit(self.locale) else {
            return Ok(false);
        };
        let step = self.config.contact_entry_index(self.locale);
        let entry = self.entry(step, true, Some(code));
        self.wizard = Some(Wizard::new(Arc::clone(&self.config), self.locale, entry));
        info!(session_id = %self.id, step, "Wizard opened from landing page");
        Ok(true)
    }

    /// Open the wizard directly, skipping the landing page.
    ///
    /// With a postal code the wizard starts at the contact step and Back
    /// walks to the postal code step; without one it starts at the first
    /// step.
    pub fn start_at_contact(&mut self, postal_code: Option<&str>) -> Result<(), SessionError> {
        self.ensure_replaceable()?;
        let entry = match postal_code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) if matches_postal_code(code) => {
                let step = self.config.contact_entry_index(self.locale);
                self.entry(step, false, Some(sanitize_postal_code(code)))
            }
            Some(code) => {
                return Err(SessionError::InvalidInput(format!("'{code}' is not a 5-digit postal code")));
            }
            None => self.entry(0, false, None),
        };
        self.wizard = Some(Wizard::new(Arc::clone(&self.config), self.locale, entry));
        info!(session_id = %self.id, "Wizard opened by deep link");
        Ok(())
    }

    /// Run Back on the wizard, closing it when it hands control back to
    /// the landing page.
    pub fn back(&mut self) -> Result<BackOutcome, SessionError> {
        let outcome = self.wizard_mut()?.back()?;
        if outcome == BackOutcome::ReturnToLanding {
            debug!(session_id = %self.id, "Returning to landing page");
            self.wizard = None;
        }
        Ok(outcome)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            locale: self.locale,
            screen: if self.wizard.is_some() {
                Screen::Wizard
            } else {
                Screen::Landing
            },
            referral_code: self.referral_code.clone(),
            referral: self.referral.clone(),
            gate: GateView {
                code: self.gate.code().to_string(),
                error: self.gate.error().map(str::to_string),
                can_continue: self.gate.can_continue(),
            },
            wizard: self.wizard.as_ref().map(Wizard::view),
        }
    }
}

pub type SharedSession = Arc<Mutex<FunnelSession>>;

/// In-memory session store.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        })
    }

    pub async fn insert(&self, session: FunnelSession) -> SharedSession {
        let id = session.id;
        let shared = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, Arc::clone(&shared));
        debug!(session_id = %id, "Session created");
        shared
    }

    pub async fn get(&self, id: Uuid) -> Result<SharedSession, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for at least the TTL. Sessions locked by a request
    /// in progress are kept.
    pub async fn expire_idle(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(s) => (now - s.last_seen).to_std().unwrap_or_default() < self.ttl,
            Err(_) => true,
        });
        let expired = before - sessions.len();
        if expired > 0 {
            info!(expired, remaining = sessions.len(), "Expired idle sessions");
        }
        expired
    }
}

/// Spawn a background task that sweeps idle sessions every `every`.
pub fn spawn_expiry_task(store: Arc<SessionStore>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            store.expire_idle().await;
        }
    })
}
