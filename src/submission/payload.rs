//! Lead snapshot and the wire bodies built from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::InsuranceProduct;
use crate::locale::Locale;
use crate::phone::CallingCode;

/// Normalized lead captured at submit time.
///
/// Names and email are trimmed, the phone is digits only. The wizard's
/// own fields are reset after a successful submission; this snapshot is
/// what the remote endpoints see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadSubmission {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_digits: String,
    pub calling_code: CallingCode,
    pub postal_code: String,
    pub locale: Locale,
    pub insurance: Option<InsuranceProduct>,
    pub consent_to_messages: bool,
    /// Survey answer label in the submitting locale.
    pub survey_answer: Option<String>,
    pub referral_code: Option<String>,
    pub vendor_code: Option<String>,
}

/// Body of the lead-intake API: `{"parameters": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadApiEnvelope {
    pub parameters: LeadParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadParameters {
    pub firstname: String,
    pub lastname: String,
    pub language: String,
    pub phone: String,
    pub phone_code: String,
    pub email: String,
    pub zipcode: String,
    pub insurance_type_id: Option<InsuranceProduct>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
}

/// Flat body posted to the campaign webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(flatten)]
    pub lead: LeadParameters,
    pub consent_to_messages: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pesquisa: Option<String>,
}

impl From<&LeadSubmission> for LeadParameters {
    fn from(lead: &LeadSubmission) -> Self {
        Self {
            firstname: lead.first_name.clone(),
            lastname: lead.last_name.clone(),
            language: lead.locale.tag().to_string(),
            phone: lead.phone_digits.clone(),
            phone_code: lead.calling_code.prefix().to_string(),
            email: lead.email.clone(),
            zipcode: lead.postal_code.clone(),
            insurance_type_id: lead.insurance,
            referral_code: lead.referral_code.clone(),
            campaign_id: lead.vendor_code.clone(),
        }
    }
}

impl From<&LeadSubmission> for LeadApiEnvelope {
    fn from(lead: &LeadSubmission) -> Self {
        Self {
            parameters: LeadParameters::from(lead),
        }
    }
}

impl From<&LeadSubmission> for WebhookPayload {
    fn from(lead: &LeadSubmission) -> Self {
        Self {
            lead: LeadParameters::from(lead),
            consent_to_messages: lead.consent_to_messages,
            pesquisa: lead.survey_answer.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_lead() -> LeadSubmission {
    LeadSubmission {
        id: Uuid::new_v4(),
        submitted_at: Utc::now(),
        first_name: "Ana".into(),
        last_name: "Souza".into(),
        email: "ana@example.com".into(),
        phone_digits: "5551234567".into(),
        calling_code: CallingCode::UsCa,
        postal_code: "94107".into(),
        locale: Locale::Br,
        insurance: Some(InsuranceProduct::Health),
        consent_to_messages: true,
        survey_answer: None,
        referral_code: None,
        vendor_code: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_nests_parameters() {
        let lead = sample_lead();
        let json = serde_json::to_value(LeadApiEnvelope::from(&lead)).unwrap();
        let params = &json["parameters"];
        assert_eq!(params["firstname"], "Ana");
        assert_eq!(params["lastname"], "Souza");
        assert_eq!(params["language"], "br");
        assert_eq!(params["phone"], "5551234567");
        assert_eq!(params["phone_code"], "+1");
        assert_eq!(params["zipcode"], "94107");
        assert_eq!(params["insurance_type_id"], "1006");
    }

    #[test]
    fn optional_codes_are_omitted_when_absent() {
        let lead = sample_lead();
        let json = serde_json::to_value(LeadApiEnvelope::from(&lead)).unwrap();
        let params = json["parameters"].as_object().unwrap();
        assert!(!params.contains_key("referral_code"));
        assert!(!params.contains_key("campaign_id"));
    }

    #[test]
    fn optional_codes_are_forwarded_when_present() {
        let lead = LeadSubmission {
            referral_code: Some("agent-7".into()),
            vendor_code: Some("spring".into()),
            ..sample_lead()
        };
        let json = serde_json::to_value(LeadApiEnvelope::from(&lead)).unwrap();
        assert_eq!(json["parameters"]["referral_code"], "agent-7");
        assert_eq!(json["parameters"]["campaign_id"], "spring");
    }

    #[test]
    fn webhook_body_is_flat() {
        let lead = LeadSubmission {
            survey_answer: Some("Cover my whole family".into()),
            ..sample_lead()
        };
        let json = serde_json::to_value(WebhookPayload::from(&lead)).unwrap();
        assert!(json.get("parameters").is_none());
        assert_eq!(json["firstname"], "Ana");
        assert_eq!(json["consent_to_messages"], true);
        assert_eq!(json["pesquisa"], "Cover my whole family");
    }

    #[test]
    fn webhook_omits_survey_when_unanswered() {
        let json = serde_json::to_value(WebhookPayload::from(&sample_lead())).unwrap();
        assert!(json.get("pesquisa").is_none());
    }

    #[test]
    fn missing_product_serializes_as_null() {
        let lead = LeadSubmission {
            insurance: None,
            ..sample_lead()
        };
        let json = serde_json::to_value(LeadApiEnvelope::from(&lead)).unwrap();
        assert!(json["parameters"]["insurance_type_id"].is_null());
    }
}
