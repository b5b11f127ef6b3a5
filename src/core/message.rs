//! Shaping of generated text into the draft commit message

/// Collapse every blank line of a generated message.
///
/// Lines that are empty or whitespace-only are dropped and the remaining lines
/// are joined with a single line break, so the result never holds two
/// consecutive line breaks. Carriage returns from CRLF output are stripped.
pub fn normalize_draft(text: &str) -> String {
    text.lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Number of display lines `text` occupies, at least one
pub fn line_count(text: &str) -> usize {
    text.lines().count().max(1)
}
