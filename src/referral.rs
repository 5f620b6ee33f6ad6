//! Referral attribution.
//!
//! A visit may arrive on `/<code>`. The code is forwarded with the lead and
//! looked up once to greet the visitor with the referring agent's name.
//! Lookup failures only cost the greeting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// First non-empty path segment, used as the referral code.
pub fn referral_code_from_path(path: &str) -> Option<String> {
    path.split('/')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// The agent a referral code belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    pub name: String,
    pub id: String,
}

#[async_trait]
pub trait ReferralLookup: Send + Sync {
    /// Resolve `code`. `None` when unknown or the lookup failed.
    async fn lookup(&self, code: &str) -> Option<Referral>;
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    data: Vec<LookupMatch>,
}

#[derive(Debug, Deserialize)]
struct LookupMatch {
    referral_name: String,
    id: serde_json::Value,
}

impl LookupMatch {
    fn into_referral(self) -> Referral {
        let id = match self.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Referral {
            name: self.referral_name,
            id,
        }
    }
}

/// Looks codes up with `GET {base}/{code}`.
pub struct ReferralClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReferralClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// `{base}/{code}` with the code percent-encoded as one path segment.
    fn url_for(&self, code: &str) -> Option<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url).ok()?;
        url.path_segments_mut().ok()?.pop_if_empty().push(code);
        Some(url)
    }
}

#[async_trait]
impl ReferralLookup for ReferralClient {
    async fn lookup(&self, code: &str) -> Option<Referral> {
        let Some(url) = self.url_for(code) else {
            warn!(base_url = %self.base_url, "Referral lookup URL is not a valid base");
            return None;
        };

        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(code, error = %e, "Referral lookup failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!(code, status = resp.status().as_u16(), "Referral lookup returned non-success status");
            return None;
        }

        let body: LookupResponse = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(code, error = %e, "Referral lookup returned a malformed body");
                return None;
            }
        };
        if !body.status {
            debug!(code, "Referral code not recognised");
            return None;
        }
        let referral = body.data.into_iter().next().map(LookupMatch::into_referral);
        if referral.is_none() {
            debug!(code, "Referral lookup returned no matches");
        }
        referral
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    async fn lookup_handler(Path(code): Path<String>) -> axum::response::Response {
        match code.as_str() {
            "agent-7" => Json(json!({
                "status": true,
                "data": [
                    {"referral_name": "Marta Lima", "id": 42},
                    {"referral_name": "Ignored", "id": "43"}
                ]
            }))
            .into_response(),
            "a b" => Json(json!({
                "status": true,
                "data": [{"referral_name": "Spaced", "id": "9"}]
            }))
            .into_response(),
            "empty" => Json(json!({"status": true, "data": []})).into_response(),
            "off" => Json(json!({"status": false})).into_response(),
            "garbled" => "not json".into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn start_stub() -> String {
        let app = Router::new().route("/api/get/referral/code/{code}", get(lookup_handler));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://127.0.0.1:{port}/api/get/referral/code")
    }

    #[test]
    fn code_is_first_path_segment() {
        assert_eq!(referral_code_from_path("/agent-7"), Some("agent-7".into()));
        assert_eq!(referral_code_from_path("//agent-7/extra"), Some("agent-7".into()));
        assert_eq!(referral_code_from_path("/"), None);
        assert_eq!(referral_code_from_path(""), None);
    }

    #[tokio::test]
    async fn first_match_is_used() {
        let client = ReferralClient::new(reqwest::Client::new(), start_stub().await);
        let referral = client.lookup("agent-7").await.unwrap();
        assert_eq!(referral.name, "Marta Lima");
        assert_eq!(referral.id, "42");
    }

    #[tokio::test]
    async fn code_is_percent_encoded() {
        let client = ReferralClient::new(reqwest::Client::new(), start_stub().await);
        let referral = client.lookup("a b").await.unwrap();
        assert_eq!(referral.name, "Spaced");
    }

    #[tokio::test]
    async fn failures_degrade_to_none() {
        let client = ReferralClient::new(reqwest::Client::new(), start_stub().await);
        for code in ["unknown", "empty", "off", "garbled"] {
            assert!(client.lookup(code).await.is_none(), "{code}");
        }
    }

    #[tokio::test]
    async fn unreachable_service_degrades_to_none() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = ReferralClient::new(reqwest::Client::new(), format!("http://127.0.0.1:{port}/codes"));
        assert!(client.lookup("agent-7").await.is_none());
    }
}
