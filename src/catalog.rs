//! Fixed product catalog and survey options offered by the wizard.

use serde::{Deserialize, Serialize};

use crate::locale::Locale;

/// Insurance products a lead can ask a quote for.
///
/// Serialized as the lead API's `insurance_type_id` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsuranceProduct {
    #[serde(rename = "1002")]
    Life,
    #[serde(rename = "1006")]
    Health,
    #[serde(rename = "1003")]
    VisionDental,
    #[serde(rename = "1016")]
    Auto,
    #[serde(rename = "1008")]
    Other,
}

impl InsuranceProduct {
    /// Display order on the product picker.
    pub const ALL: [InsuranceProduct; 5] = [
        InsuranceProduct::Life,
        InsuranceProduct::Health,
        InsuranceProduct::VisionDental,
        InsuranceProduct::Auto,
        InsuranceProduct::Other,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Life => "1002",
            Self::Health => "1006",
            Self::VisionDental => "1003",
            Self::Auto => "1016",
            Self::Other => "1008",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code.trim())
    }

    pub fn label(&self, locale: Locale) -> &'static str {
        use Locale::*;
        match (self, locale) {
            (Self::Life, En) => "Life",
            (Self::Life, Br | Es) => "Vida",
            (Self::Health, En) => "Health",
            (Self::Health, Br) => "Saude",
            (Self::Health, Es) => "Salud",
            (Self::VisionDental, En | Es) => "Vision / Dental",
            (Self::VisionDental, Br) => "Visao / Odontologico",
            (Self::Auto, En) => "Auto",
            (Self::Auto, Br) => "Automovel",
            (Self::Auto, Es) => "Automovil",
            (Self::Other, En) => "Other Insurance",
            (Self::Other, Br) => "Outros Seguros",
            (Self::Other, Es) => "Otros Seguros",
        }
    }
}

impl std::fmt::Display for InsuranceProduct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Answers to the "what matters most in your plan" survey step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyAnswer {
    LowerCost,
    HospitalNetwork,
    FamilyCoverage,
}

impl SurveyAnswer {
    pub const ALL: [SurveyAnswer; 3] = [
        SurveyAnswer::LowerCost,
        SurveyAnswer::HospitalNetwork,
        SurveyAnswer::FamilyCoverage,
    ];

    /// Label shown on the option button, also forwarded to the webhook.
    pub fn label(&self, locale: Locale) -> &'static str {
        use Locale::*;
        match (self, locale) {
            (Self::LowerCost, En) => "Save money with full coverage",
            (Self::LowerCost, Br) => "Economizar com cobertura completa",
            (Self::LowerCost, Es) => "Ahorrar con cobertura completa",
            (Self::HospitalNetwork, En) => "Access to good hospitals and doctors",
            (Self::HospitalNetwork, Br) => "Acesso a bons hospitais e médicos",
            (Self::HospitalNetwork, Es) => "Acceso a buenos hospitales y médicos",
            (Self::FamilyCoverage, En) => "Cover my whole family",
            (Self::FamilyCoverage, Br) => "Proteger toda a minha família",
            (Self::FamilyCoverage, Es) => "Proteger a toda mi familia",
        }
    }
}
