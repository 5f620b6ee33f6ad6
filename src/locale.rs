//! Supported locales and client language detection.

use serde::{Deserialize, Serialize};

/// The three locales the funnel is translated into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    Br,
    Es,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Br, Locale::Es];

    /// Tag sent to the lead API as `language`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Br => "br",
            Self::Es => "es",
        }
    }

    /// Parse a locale tag as emitted by the language switcher.
    ///
    /// Accepts the bare tag or a region-suffixed form (`br-XX`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|l| tag == l.tag() || tag.starts_with(&format!("{}-", l.tag())))
    }

    /// Map a client language preference (`pt-BR`, `es-ES`, or a full
    /// `Accept-Language` header) onto a supported locale.
    ///
    /// Only the first listed language is considered; unknown languages fall
    /// back to the default locale.
    pub fn detect(preference: &str) -> Self {
        let first = preference
            .split(',')
            .next()
            .and_then(|entry| entry.split(';').next())
            .unwrap_or_default()
            .trim();
        let primary = first.split(['-', '_']).next().unwrap_or_default().to_ascii_lowercase();
        match primary.as_str() {
            "pt" => Self::Br,
            "es" => Self::Es,
            "en" => Self::En,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_maps_primary_subtag() {
        assert_eq!(Locale::detect("pt-BR"), Locale::Br);
        assert_eq!(Locale::detect("pt"), Locale::Br);
        assert_eq!(Locale::detect("es-ES"), Locale::Es);
        assert_eq!(Locale::detect("en-US"), Locale::En);
    }

    #[test]
    fn detect_falls_back_to_default() {
        assert_eq!(Locale::detect("fr-FR"), Locale::En);
        assert_eq!(Locale::detect(""), Locale::En);
    }

    #[test]
    fn detect_reads_first_accept_language_entry() {
        assert_eq!(Locale::detect("es-MX,es;q=0.9,en;q=0.8"), Locale::Es);
        assert_eq!(Locale::detect("pt_BR;q=1.0, en"), Locale::Br);
    }

    #[test]
    fn from_tag_accepts_region_suffix() {
        assert_eq!(Locale::from_tag("br"), Some(Locale::Br));
        assert_eq!(Locale::from_tag("ES"), Some(Locale::Es));
        assert_eq!(Locale::from_tag("en-GB"), Some(Locale::En));
        assert_eq!(Locale::from_tag("pt"), None);
        assert_eq!(Locale::from_tag("english"), None);
    }

    #[test]
    fn display_matches_serde() {
        for locale in Locale::ALL {
            let json = serde_json::to_string(&locale).unwrap();
            assert_eq!(format!("\"{locale}\""), json);
        }
    }
}
