//! Project unique-code arithmetic.
//!
//! Codes look like `EQ-001`: the typology abbreviation, a dash, and a
//! per-typology sequence zero-padded to at least three digits. The storage
//! lookups live in the service crate; this module only derives the next
//! sequence from the latest code and formats it.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum digit width of the sequence part.
pub const CODE_SEQUENCE_WIDTH: usize = 3;

/// First sequence number issued for a typology.
pub const FIRST_SEQUENCE: u32 = 1;

/// Shape every stored code must have.
pub const CODE_PATTERN: &str = r"^[A-Z]+-\d{3,}$";

static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(CODE_PATTERN).expect("valid regex"));

/// Parse the numeric suffix after the last `-` of `code`.
///
/// Returns `None` when the suffix is not a non-negative integer.
pub fn parse_sequence(code: &str) -> Option<u32> {
    let suffix = code.rsplit('-').next()?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Sequence that follows the most recent code of a typology.
///
/// No previous code, or one whose suffix does not parse, restarts at
/// [`FIRST_SEQUENCE`].
pub fn next_sequence(latest_code: Option<&str>) -> u32 {
    latest_code
        .and_then(parse_sequence)
        .and_then(|n| n.checked_add(1))
        .unwrap_or(FIRST_SEQUENCE)
}

/// Format `{abbreviation}-{sequence}` with the sequence padded to
/// [`CODE_SEQUENCE_WIDTH`] digits. Wider sequences keep all their digits.
///
/// ```
/// use secplan_core::code::format_code;
/// assert_eq!(format_code("EQ", 1), "EQ-001");
/// assert_eq!(format_code("EP", 1234), "EP-1234");
/// ```
pub fn format_code(abbreviation: &str, sequence: u32) -> String {
    format!("{abbreviation}-{sequence:0width$}", width = CODE_SEQUENCE_WIDTH)
}

/// Whether `code` matches [`CODE_PATTERN`].
pub fn is_well_formed(code: &str) -> bool {
    CODE_RE.is_match(code)
}
