//! Calling-code configurations and phone number formatting.
//!
//! Formatting is presentational only: stripping every non-digit from a
//! formatted number always yields the (truncated) digits it was built from.

use serde::{Deserialize, Serialize};

/// International dialing prefixes the wizard accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallingCode {
    #[default]
    #[serde(rename = "+1")]
    UsCa,
    #[serde(rename = "+52")]
    Mexico,
    #[serde(rename = "+55")]
    Brazil,
}

/// Digit bounds and display grouping for one calling code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhoneRule {
    pub min_digits: usize,
    pub max_digits: usize,
    /// Area, exchange and line group widths: `(AA) BBBB-CCCC`.
    pub groups: [usize; 3],
    pub placeholder: &'static str,
}

const US_CA: PhoneRule = PhoneRule {
    min_digits: 10,
    max_digits: 10,
    groups: [3, 3, 4],
    placeholder: "(123) 456-7890",
};

const MEXICO: PhoneRule = PhoneRule {
    min_digits: 10,
    max_digits: 10,
    groups: [2, 4, 4],
    placeholder: "(55) 1234-5678",
};

const BRAZIL: PhoneRule = PhoneRule {
    min_digits: 11,
    max_digits: 11,
    groups: [2, 5, 4],
    placeholder: "(11) 91234-5678",
};

impl CallingCode {
    pub const ALL: [CallingCode; 3] = [CallingCode::UsCa, CallingCode::Mexico, CallingCode::Brazil];

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::UsCa => "+1",
            Self::Mexico => "+52",
            Self::Brazil => "+55",
        }
    }

    /// Parse a dialing prefix. Unknown prefixes yield `None`.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.prefix() == prefix.trim())
    }

    /// Parse a dialing prefix, falling back to `+1` for anything unknown.
    pub fn resolve(prefix: &str) -> Self {
        Self::from_prefix(prefix).unwrap_or_default()
    }

    pub fn rule(&self) -> &'static PhoneRule {
        match self {
            Self::UsCa => &US_CA,
            Self::Mexico => &MEXICO,
            Self::Brazil => &BRAZIL,
        }
    }
}

impl std::fmt::Display for CallingCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

impl PhoneRule {
    /// Whether `digits` has an acceptable length for this rule.
    pub fn accepts(&self, digits: &str) -> bool {
        (self.min_digits..=self.max_digits).contains(&digits.len())
    }

    /// Strip non-digits and drop anything past `max_digits`.
    pub fn truncate(&self, input: &str) -> String {
        digits_only(input).chars().take(self.max_digits).collect()
    }

    /// Format as much of the number as has been typed.
    ///
    /// `"55512"` → `"(555) 12"`, `"5551234567"` → `"(555) 123-4567"`.
    pub fn format(&self, input: &str) -> String {
        let digits = self.truncate(input);
        let [area, exchange, _] = self.groups;

        if digits.len() <= area {
            return digits;
        }
        let (head, rest) = digits.split_at(area);
        if digits.len() <= area + exchange {
            return format!("({head}) {rest}");
        }
        let (middle, line) = rest.split_at(exchange);
        format!("({head}) {middle}-{line}")
    }
}

/// Keep only ASCII decimal digits.
pub fn digits_only(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}
