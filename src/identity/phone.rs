//! Phone numbers
//!
//! Picking a number from a contacts lookup, synthesising one from a subject
//! id when nothing real is available, and formatting for display.

use crate::identity::PhoneNumber;

/// Country code prefixed to synthesised numbers.
pub const SYNTHETIC_COUNTRY_CODE: &str = "+1";

/// Used when there is no subject id to derive a number from.
pub const PLACEHOLDER_PHONE: &str = "+10000000000";

/// Number of national digits in a synthesised number.
const SYNTHETIC_DIGITS: usize = 10;

/// Country prefix that gets grouped formatting.
const INDIA_PREFIX: &str = "+91";

/// National number length for `+91` numbers.
const INDIA_DIGITS: usize = 10;

/// Choose a number from a contacts lookup.
///
/// A number typed `mobile` (any case) wins; otherwise the first entry with a
/// non-empty value. Entries with blank values are never chosen.
pub fn select_phone(numbers: &[PhoneNumber]) -> Option<String> {
    let usable = || numbers.iter().filter(|number| !number.value.trim().is_empty());

    usable()
        .find(|number| {
            number
                .kind
                .as_deref()
                .is_some_and(|kind| kind.eq_ignore_ascii_case("mobile"))
        })
        .or_else(|| usable().next())
        .map(|number| number.value.clone())
}

/// Derive a deterministic placeholder number from a subject id.
///
/// Non-digits are dropped, the last ten digits are kept (left-padded with
/// zeros when there are fewer), and the result is prefixed with `+1`. With no
/// subject id, [`PLACEHOLDER_PHONE`] is returned.
pub fn synthetic_phone(subject: Option<&str>) -> String {
    let Some(subject) = subject.map(str::trim).filter(|subject| !subject.is_empty()) else {
        return PLACEHOLDER_PHONE.to_string();
    };

    let digits: Vec<char> = subject.chars().filter(char::is_ascii_digit).collect();
    let tail: String = digits
        .iter()
        .skip(digits.len().saturating_sub(SYNTHETIC_DIGITS))
        .collect();

    format!("{SYNTHETIC_COUNTRY_CODE}{tail:0>SYNTHETIC_DIGITS$}")
}

/// Format a phone number for display.
///
/// `+91` numbers with ten national digits become `+91 XXXXX XXXXX`. Anything
/// else only has surrounding whitespace trimmed.
pub fn format_phone(raw: &str) -> String {
    let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();

    let grouped = compact
        .strip_prefix(INDIA_PREFIX)
        .filter(|national| {
            national.len() == INDIA_DIGITS && national.chars().all(|ch| ch.is_ascii_digit())
        })
        .and_then(|national| national.split_at_checked(INDIA_DIGITS / 2));

    match grouped {
        Some((head, tail)) => format!("{INDIA_PREFIX} {head} {tail}"),
        None => raw.trim().to_string(),
    }
}
