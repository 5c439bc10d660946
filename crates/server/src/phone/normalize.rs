//! Loose phone input to E.164 candidates.

use serde::Deserialize;

/// Country assumed when a number is too short to carry any country hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum DefaultCountry {
    /// US/Canada, `+1`.
    #[default]
    #[serde(rename = "us", alias = "US")]
    UnitedStates,
    /// India, `+91`.
    #[serde(rename = "in", alias = "IN")]
    India,
}

impl DefaultCountry {
    pub fn calling_prefix(self) -> &'static str {
        match self {
            DefaultCountry::UnitedStates => "+1",
            DefaultCountry::India => "+91",
        }
    }
}

/// One row of the normalization table: when `applies` matches the cleaned
/// digits, `prefix` is prepended.
struct PrefixRule {
    applies: fn(&str) -> bool,
    prefix: &'static str,
}

fn leading_digit_in(digits: &str, set: &[char]) -> bool {
    digits.chars().next().is_some_and(|c| set.contains(&c))
}

/// Evaluated top to bottom; the first match wins. Anything falling through is
/// given the configured default country.
const PREFIX_RULES: &[PrefixRule] = &[
    // Already international.
    PrefixRule {
        applies: |d| d.starts_with('+'),
        prefix: "",
    },
    // Indian number with country code but no plus.
    PrefixRule {
        applies: |d| d.starts_with("91") && d.len() == 12,
        prefix: "+",
    },
    // NANP number with country code but no plus.
    PrefixRule {
        applies: |d| d.starts_with('1') && d.len() == 11,
        prefix: "+",
    },
    // Ten digit Indian mobile.
    PrefixRule {
        applies: |d| d.len() == 10 && leading_digit_in(d, &['7', '8', '9']),
        prefix: "+91",
    },
    // Ten digit NANP number.
    PrefixRule {
        applies: |d| d.len() == 10,
        prefix: "+1",
    },
    // Some other international number without the plus.
    PrefixRule {
        applies: |d| d.len() > 10,
        prefix: "+",
    },
    // Short numbers that look like an Indian mobile fragment.
    PrefixRule {
        applies: |d| leading_digit_in(d, &['6', '7', '8', '9']),
        prefix: "+91",
    },
];

/// Normalizes user-entered numbers with a configurable fallback country.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneNormalizer {
    default_country: DefaultCountry,
}

impl PhoneNormalizer {
    pub fn new(default_country: DefaultCountry) -> Self {
        Self { default_country }
    }

    pub fn default_country(&self) -> DefaultCountry {
        self.default_country
    }

    /// Converts `raw` into an E.164 candidate. Never fails; whether the result
    /// is actually a usable number is decided by [`super::validate`].
    pub fn normalize(&self, raw: &str) -> String {
        let cleaned = clean(raw);
        let digits = cleaned.trim_start_matches('0');

        let prefix = PREFIX_RULES
            .iter()
            .find(|rule| (rule.applies)(digits))
            .map(|rule| rule.prefix)
            .unwrap_or_else(|| self.default_country.calling_prefix());

        format!("{prefix}{digits}")
    }
}

/// Normalizes with the US/Canada fallback.
pub fn normalize(raw: &str) -> String {
    PhoneNormalizer::default().normalize(raw)
}

/// Keeps ASCII digits and a `+` only when it precedes every digit.
fn clean(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_digit() || (c == '+' && out.is_empty()) {
            out.push(c);
        }
    }
    out
}
