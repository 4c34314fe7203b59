/// Lookup key for a subject name: invisible characters stripped, whitespace collapsed,
/// lowercased.
pub(crate) fn subject_key(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_ascii_lowercase()
}

/// Grades are matched trimmed and uppercased ("b " and "B" are the same grade).
pub(crate) fn normalize_grade(value: &str) -> String {
    value.trim().to_uppercase()
}
