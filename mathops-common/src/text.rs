//! Small text helpers for values read from the ODS and Banner

/// Trim a value and truncate it to at most `max_len` characters
///
/// The truncated value is trimmed again so a cut never leaves trailing
/// whitespace behind.
pub fn prune(value: Option<&str>, max_len: usize) -> Option<String> {
    value.map(|s| {
        let trimmed = s.trim();
        if trimmed.chars().count() > max_len {
            trimmed.chars().take(max_len).collect::<String>().trim().to_string()
        } else {
            trimmed.to_string()
        }
    })
}

/// Replace curly apostrophes and undecodable characters with `'`
///
/// Names in the ODS often carry a right single quote (or a replacement
/// character where one was lost in transit).
pub fn normalize_apostrophes(value: &str) -> String {
    value.replace(['\u{FFFD}', '\u{2019}'], "'")
}

/// First character of a trimmed middle name, or `None` if blank
pub fn middle_initial(middle_name: Option<&str>) -> Option<String> {
    middle_name
        .map(str::trim)
        .and_then(|s| s.chars().next())
        .map(|c| c.to_string())
}

/// Strip trailing zeros after a decimal point, then any trailing dot
///
/// `"3.50"` becomes `"3.5"`, `"4.0"` becomes `"4"`; values without a dot are
/// returned unchanged.
pub fn clean_gpa(gpa: &str) -> String {
    if !gpa.contains('.') {
        return gpa.to_string();
    }
    gpa.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// True if the value contains letters and none of them are lower case
pub fn is_all_upper(value: &str) -> bool {
    value.chars().any(char::is_alphabetic) && !value.chars().any(char::is_lowercase)
}
