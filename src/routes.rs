//! JSON API driving funnel sessions.
//!
//! Every successful call answers with the session view. Inline validation
//! errors are part of that view, not HTTP errors.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{SessionError, WizardError};
use crate::locale::Locale;
use crate::referral::{ReferralLookup, referral_code_from_path};
use crate::session::{FunnelSession, SessionStore, SessionView};
use crate::submission::LeadSubmitter;
use crate::wizard::{FieldEdit, Variant, WizardConfig};

/// Shared state for funnel routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub submitter: LeadSubmitter,
    pub referrals: Option<Arc<dyn ReferralLookup>>,
    pub default_variant: Variant,
    pub consent_locales: Vec<Locale>,
}

impl AppState {
    fn wizard_config(&self, variant: Variant) -> Arc<WizardConfig> {
        Arc::new(WizardConfig::for_variant(variant).with_consent_locales(self.consent_locales.clone()))
    }
}

/// Build the funnel routes with CORS and request tracing.
pub fn funnel_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/locale", put(set_locale))
        .route("/api/sessions/{id}/zip", post(gate_input))
        .route("/api/sessions/{id}/continue", post(continue_to_wizard))
        .route("/api/sessions/{id}/wizard", post(start_wizard))
        .route("/api/sessions/{id}/wizard/edit", post(edit_field))
        .route("/api/sessions/{id}/wizard/next", post(next_step))
        .route("/api/sessions/{id}/wizard/back", post(previous_step))
        .route("/api/sessions/{id}/wizard/submit", post(submit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// ── Responses ───────────────────────────────────────────────────────────

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match &self {
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SessionError::NoWizard(_) | SessionError::Wizard(_) => StatusCode::CONFLICT,
        };
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

type ApiResult = Result<Json<SessionView>, SessionError>;

fn parse_id(id: &str) -> Result<Uuid, SessionError> {
    Uuid::parse_str(id).map_err(|_| SessionError::InvalidInput("Invalid session ID".into()))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, SessionError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| SessionError::InvalidInput(e.body_text()))
}

/// Lock the session, touch it and apply `f`.
async fn with_session<F>(state: &AppState, id: &str, f: F) -> ApiResult
where
    F: FnOnce(&mut FunnelSession) -> Result<(), SessionError>,
{
    let shared = state.store.get(parse_id(id)?).await?;
    let mut session = shared.lock().await;
    session.touch();
    f(&mut session)?;
    Ok(Json(session.view()))
}

/// A rejected step is still a successful request: the errors are in the view.
fn keep_invalid(result: Result<(), WizardError>) -> Result<(), SessionError> {
    match result {
        Ok(()) | Err(WizardError::Invalid { .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.store.len().await;
    Json(serde_json::json!({
        "status": "ok",
        "service": "lead-funnel",
        "sessions": sessions,
    }))
}

// ── Sessions ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct CreateSessionRequest {
    /// Landing URL path; its first segment is the referral code.
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    locale: Option<Locale>,
    #[serde(default)]
    variant: Option<Variant>,
    #[serde(default)]
    vendor_code: Option<String>,
}

async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(JsonRejection::MissingJsonContentType(_)) => CreateSessionRequest::default(),
        Err(e) => return SessionError::InvalidInput(e.body_text()).into_response(),
    };

    let locale = req.locale.unwrap_or_else(|| {
        headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(Locale::detect)
            .unwrap_or_default()
    });

    let referral_code = req.path.as_deref().and_then(referral_code_from_path);
    let referral = match (&referral_code, &state.referrals) {
        (Some(code), Some(lookup)) => lookup.lookup(code).await,
        _ => None,
    };
    let vendor_code = req.vendor_code.filter(|v| !v.trim().is_empty());

    let variant = req.variant.unwrap_or(state.default_variant);
    let session = FunnelSession::new(state.wizard_config(variant), locale).with_attribution(
        referral_code,
        referral,
        vendor_code,
    );
    let view = session.view();
    state.store.insert(session).await;

    info!(session_id = %view.id, %locale, %variant, referred = view.referral.is_some(), "Session started");
    (StatusCode::CREATED, Json(view)).into_response()
}

async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    with_session(&state, &id, |_| Ok(())).await
}

#[derive(Deserialize)]
struct LocaleRequest {
    locale: Locale,
}

async fn set_locale(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<LocaleRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    with_session(&state, &id, |s| {
        s.set_locale(req.locale);
        Ok(())
    })
    .await
}

// ── Landing gate ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ZipRequest {
    code: String,
}

async fn gate_input(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ZipRequest>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    with_session(&state, &id, |s| {
        s.gate_input(&req.code);
        Ok(())
    })
    .await
}

async fn continue_to_wizard(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    with_session(&state, &id, |s| s.continue_to_wizard().map(|_| ()))
    .await
}

// ── Wizard ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct StartWizardRequest {
    #[serde(default)]
    postal_code: Option<String>,
}

async fn start_wizard(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StartWizardRequest>, JsonRejection>,
) -> ApiResult {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(JsonRejection::MissingJsonContentType(_)) => StartWizardRequest::default(),
        Err(e) => return Err(SessionError::InvalidInput(e.body_text())),
    };
    with_session(&state, &id, |s| s.start_at_contact(req.postal_code.as_deref())).await
}

async fn edit_field(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<FieldEdit>, JsonRejection>,
) -> ApiResult {
    let edit = body(payload)?;
    with_session(&state, &id, |s| keep_invalid(s.wizard_mut()?.edit(edit))).await
}

async fn next_step(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    with_session(&state, &id, |s| keep_invalid(s.wizard_mut()?.next())).await
}

async fn previous_step(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    with_session(&state, &id, |s| s.back().map(|_| ())).await
}

/// Submit the final step.
///
/// The session is unlocked while the lead is delivered so reads and edits
/// keep working; a second submit sees the pending status and gets 409.
async fn submit(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let session_id = parse_id(&id)?;
    let shared = state.store.get(session_id).await?;

    let (lead, policy) = {
        let mut session = shared.lock().await;
        session.touch();
        let wizard = session.wizard_mut()?;
        match wizard.begin_submit() {
            Ok(lead) => (lead, wizard.policy()),
            Err(WizardError::Invalid { .. }) => return Ok(Json(session.view())),
            Err(e) => return Err(e.into()),
        }
    };

    let result = state.submitter.dispatch(&lead, &policy).await;
    if let Err(e) = &result {
        warn!(%session_id, submission_id = %lead.id, error = %e, "Lead submission failed");
    }

    let mut session = shared.lock().await;
    session.touch();
    session.wizard_mut()?.finish_submit(lead.id, &result);
    Ok(Json(session.view()))
}
