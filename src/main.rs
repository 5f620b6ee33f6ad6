use std::sync::Arc;
use std::time::Duration;

use lead_funnel::config::FunnelConfig;
use lead_funnel::referral::{ReferralClient, ReferralLookup};
use lead_funnel::routes::{AppState, funnel_routes};
use lead_funnel::session::{self, SessionStore};
use lead_funnel::submission::{LeadApiClient, LeadSubmitter, WebhookClient};
use lead_funnel::tracking::{ConversionTracker, HttpTracker, LogTracker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = FunnelConfig::from_env()?;

    eprintln!("📋 Lead Funnel v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Variant: {}", config.variant);
    eprintln!("   API: http://0.0.0.0:{}/api/sessions", config.port);
    eprintln!(
        "   Lead API: {}",
        config.lead_api_url.as_deref().unwrap_or("(disabled)")
    );
    eprintln!(
        "   Webhook: {}",
        config.webhook_url.as_deref().unwrap_or("(disabled)")
    );

    let http = reqwest::Client::new();

    // ── Submission ──────────────────────────────────────────────────────
    let mut submitter = LeadSubmitter::new();
    if let Some(url) = &config.lead_api_url {
        submitter = submitter.with_lead_api(Arc::new(LeadApiClient::new(http.clone(), url)));
    }
    if let Some(url) = &config.webhook_url {
        submitter = submitter.with_webhook(Arc::new(WebhookClient::new(http.clone(), url)));
    }
    if let Some(code) = &config.default_referral_code {
        submitter = submitter.with_default_referral_code(code);
    }

    let tracker: Arc<dyn ConversionTracker> = match &config.tracking_url {
        Some(url) => Arc::new(HttpTracker::new(http.clone(), url)),
        None => Arc::new(LogTracker),
    };
    submitter = submitter.with_tracker(tracker);

    // ── Referrals ───────────────────────────────────────────────────────
    let referrals = config
        .referral_api_url
        .as_ref()
        .map(|url| Arc::new(ReferralClient::new(http.clone(), url)) as Arc<dyn ReferralLookup>);

    // ── Sessions ────────────────────────────────────────────────────────
    let store = SessionStore::new(config.session_ttl);
    let _expiry_handle = session::spawn_expiry_task(Arc::clone(&store), Duration::from_secs(60));

    let app = funnel_routes(AppState {
        store,
        submitter,
        referrals,
        default_variant: config.variant,
        consent_locales: config.consent_locales.clone(),
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, variant = %config.variant, "Funnel server started");
    axum::serve(listener, app).await?;

    Ok(())
}
