//! Configuration types.

use std::time::Duration;

use crate::error::{self, ConfigError};
use crate::locale::Locale;
use crate::wizard::{DEFAULT_CONSENT_LOCALES, Variant};

pub const DEFAULT_LEAD_API_URL: &str = "https://admin.2easyinsurance.com/api/post/lead";
pub const DEFAULT_REFERRAL_API_URL: &str = "https://admin.2easyinsurance.com/api/get/referral/code";

/// Funnel service configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunnelConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Lead-intake API. `None` disables it.
    pub lead_api_url: Option<String>,
    /// Campaign webhook. `None` disables it.
    pub webhook_url: Option<String>,
    /// Referral lookup base; codes are appended as a path segment.
    pub referral_api_url: Option<String>,
    /// Conversion collector. Without one, conversions are only logged.
    pub tracking_url: Option<String>,
    pub variant: Variant,
    /// Attributed to leads that arrive without a referral code.
    pub default_referral_code: Option<String>,
    pub consent_locales: Vec<Locale>,
    /// Sessions idle for longer than this are dropped.
    pub session_ttl: Duration,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            lead_api_url: Some(DEFAULT_LEAD_API_URL.to_string()),
            webhook_url: None,
            referral_api_url: Some(DEFAULT_REFERRAL_API_URL.to_string()),
            tracking_url: None,
            variant: Variant::default(),
            default_referral_code: None,
            consent_locales: DEFAULT_CONSENT_LOCALES.to_vec(),
            session_ttl: Duration::from_secs(30 * 60),
        }
    }
}

impl FunnelConfig {
    /// Load from `FUNNEL_*` environment variables, falling back to defaults.
    pub fn from_env() -> error::Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok())?)
    }

    /// Load from an arbitrary key lookup.
    ///
    /// Blank values count as unset. URL variables set to `off` disable the
    /// endpoint.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let url = |key: &str, default: Option<&str>| match get(key) {
            Some(v) if v.eq_ignore_ascii_case("off") => None,
            Some(v) => Some(v),
            None => default.map(str::to_string),
        };

        let defaults = Self::default();

        let port = match get("FUNNEL_PORT") {
            Some(v) => v.parse::<u16>().map_err(|_| invalid("FUNNEL_PORT", format!("'{v}' is not a port")))?,
            None => defaults.port,
        };

        let variant = match get("FUNNEL_VARIANT") {
            Some(v) => Variant::parse(&v).ok_or_else(|| {
                invalid(
                    "FUNNEL_VARIANT",
                    format!("'{v}' is not one of classic, conversational, standard"),
                )
            })?,
            None => defaults.variant,
        };

        let consent_locales = match get("FUNNEL_CONSENT_LOCALES") {
            Some(v) => parse_locales(&v)?,
            None => defaults.consent_locales,
        };

        let session_ttl = match get("FUNNEL_SESSION_TTL_MINUTES") {
            Some(v) => {
                let minutes: u64 = v
                    .parse()
                    .ok()
                    .filter(|m| *m > 0)
                    .ok_or_else(|| invalid("FUNNEL_SESSION_TTL_MINUTES", format!("'{v}' is not a positive number")))?;
                Duration::from_secs(minutes * 60)
            }
            None => defaults.session_ttl,
        };

        Ok(Self {
            port,
            lead_api_url: url("FUNNEL_LEAD_API_URL", Some(DEFAULT_LEAD_API_URL)),
            webhook_url: url("FUNNEL_WEBHOOK_URL", None),
            referral_api_url: url("FUNNEL_REFERRAL_API_URL", Some(DEFAULT_REFERRAL_API_URL)),
            tracking_url: url("FUNNEL_TRACKING_URL", None),
            variant,
            default_referral_code: get("FUNNEL_DEFAULT_REFERRAL_CODE"),
            consent_locales,
            session_ttl,
        })
    }
}

fn invalid(key: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    }
}

/// Comma-separated locale tags. `none` yields an empty list.
fn parse_locales(value: &str) -> Result<Vec<Locale>, ConfigError> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }
    let mut locales = Vec::new();
    for tag in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let locale = Locale::from_tag(tag)
            .ok_or_else(|| invalid("FUNNEL_CONSENT_LOCALES", format!("unknown locale '{tag}'")))?;
        if !locales.contains(&locale) {
            locales.push(locale);
        }
    }
    Ok(locales)
}
