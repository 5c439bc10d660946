//! Syntactic validation of E.164 candidates.

use super::{is_indian_shape, is_us_shape};

/// US/Canada area codes rejected outright.
pub const DENIED_AREA_CODES: &[&str] = &["748", "749", "000", "001", "911", "555"];

/// Area codes that are known to be unassigned, as opposed to reserved.
const UNASSIGNED_AREA_CODES: &[&str] = &["748", "749"];

/// Why a normalized number was rejected, when a specific reason is known.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhoneIssue {
    #[error("Area code {0} is not assigned")]
    UnassignedAreaCode(String),
    #[error("Area code cannot start with {0}")]
    AreaCodeLeadingDigit(char),
    #[error("Indian mobile numbers must start with 6, 7, 8, or 9")]
    IndianMobilePrefix,
}

/// Returns true when `candidate` is a plausible E.164 number.
///
/// Spaces, dashes and parentheses are ignored. On top of the generic
/// `+[1-9]\d{1,14}` shape, ten digit NANP numbers must have a usable area code
/// and ten digit Indian numbers must be mobiles.
pub fn validate(candidate: &str) -> bool {
    let cleaned = strip_separators(candidate);

    if !is_e164_shape(&cleaned) {
        return false;
    }

    if is_us_shape(&cleaned) {
        let area_code = &cleaned[2..5];
        if DENIED_AREA_CODES.contains(&area_code) || area_code.starts_with(['0', '1']) {
            return false;
        }
    }

    if is_indian_shape(&cleaned) && !cleaned[3..].starts_with(['6', '7', '8', '9']) {
        return false;
    }

    true
}

/// Explains a rejection for the two number shapes we know how to reason about.
///
/// Returns `None` for valid numbers and for rejections without a specific hint
/// (malformed input, reserved area codes such as 555 or 911).
pub fn diagnose(candidate: &str) -> Option<PhoneIssue> {
    let cleaned = strip_separators(candidate);
    if !is_e164_shape(&cleaned) {
        return None;
    }

    if is_us_shape(&cleaned) {
        let area_code = &cleaned[2..5];
        if UNASSIGNED_AREA_CODES.contains(&area_code) {
            return Some(PhoneIssue::UnassignedAreaCode(area_code.to_string()));
        }
        return area_code
            .chars()
            .next()
            .filter(|c| matches!(c, '0' | '1'))
            .map(PhoneIssue::AreaCodeLeadingDigit);
    }

    if is_indian_shape(&cleaned) && !cleaned[3..].starts_with(['6', '7', '8', '9']) {
        return Some(PhoneIssue::IndianMobilePrefix);
    }

    None
}

fn strip_separators(candidate: &str) -> String {
    candidate
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect()
}

/// `+`, a non-zero digit, then 1 to 14 more digits.
fn is_e164_shape(s: &str) -> bool {
    let Some(rest) = s.strip_prefix('+') else {
        return false;
    };
    let bytes = rest.as_bytes();
    (2..=15).contains(&bytes.len())
        && bytes[0] != b'0'
        && bytes.iter().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phone::normalize;

    #[test]
    fn e164_shape() {
        assert!(validate("+442079460958"));
        assert!(validate("+12"));
        assert!(!validate("+1"));
        assert!(!validate("442079460958"));
        assert!(!validate("+0442079460958"));
        assert!(!validate("+1234567890123456"));
        assert!(!validate("+44a079460958"));
    }

    #[test]
    fn separators_are_ignored() {
        assert!(validate("+1 (415) 234-5678"));
        assert!(validate("+91 98765-43210"));
    }

    #[test]
    fn denied_area_codes_are_rejected_whatever_the_rest() {
        for code in DENIED_AREA_CODES {
            for rest in ["2345678", "0000000", "9999999"] {
                let raw = format!("1{code}{rest}");
                assert!(!validate(&normalize(&raw)), "{raw} should be rejected");
            }
        }
    }

    #[test]
    fn area_codes_starting_0_or_1_are_rejected() {
        assert!(!validate("+10234567890"));
        assert!(!validate("+11234567890"));
        assert!(validate("+12234567890"));
    }

    #[test]
    fn indian_mobile_prefixes() {
        assert!(validate("+919876543210"));
        assert!(validate("+916123456789"));
        assert!(!validate("+911876543210"));
        assert!(!validate("+915876543210"));
    }

    #[test]
    fn other_countries_only_need_the_shape() {
        assert!(validate("+4915112345678"));
        assert!(validate("+9112345"));
    }

    #[test]
    fn diagnose_reports_specific_issues() {
        assert_eq!(
            diagnose("+17482345678"),
            Some(PhoneIssue::UnassignedAreaCode("748".into()))
        );
        assert_eq!(
            diagnose("+10012345678"),
            Some(PhoneIssue::AreaCodeLeadingDigit('0'))
        );
        assert_eq!(
            diagnose("+911876543210"),
            Some(PhoneIssue::IndianMobilePrefix)
        );
        assert_eq!(diagnose("+15552345678"), None);
        assert_eq!(diagnose("+14152345678"), None);
        assert_eq!(diagnose("not a number"), None);
    }
}
