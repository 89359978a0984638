use once_cell::sync::Lazy;
use regex::Regex;

// Design identifiers are 3 to 8 decimal digits. Longer runs keep their
// first eight digits.
static DESIGN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{3,8}").expect("design pattern is valid"));

/// Finds the first design identifier embedded in a filename or a decoded
/// QR payload.
pub fn extract_design_number(text: &str) -> Option<String> {
    DESIGN_PATTERN
        .find(text)
        .map(|found| found.as_str().to_string())
}
