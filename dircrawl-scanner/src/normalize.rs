// Text cleanup applied to every extracted field

/// Placeholder for any field that could not be extracted.
pub const SENTINEL: &str = "N/A";

const ZERO_WIDTH_SPACE: char = '\u{200b}';

/// Strip zero-width spaces and surrounding whitespace.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(value: impl AsRef<str>) -> String {
    let stripped: String = value
        .as_ref()
        .chars()
        .filter(|c| *c != ZERO_WIDTH_SPACE)
        .collect();
    stripped.trim().to_string()
}

/// Normalize an optional value, substituting the sentinel for a miss or a blank.
pub fn or_sentinel(value: Option<impl AsRef<str>>) -> String {
    match value.map(normalize) {
        Some(v) if !v.is_empty() => v,
        _ => SENTINEL.to_string(),
    }
}

/// Collapse runs of whitespace left behind by nested inline elements.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
