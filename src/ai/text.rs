const WRAP_WIDTH: usize = 4096;
const SENTENCE_ENDS: [char; 4] = ['.', '!', '?', '。'];

/// Convert an HTML fragment to plain text. Empty input yields an empty string.
pub fn strip_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let text = match html2text::from_read(html.as_bytes(), WRAP_WIDTH) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!("Failed to convert HTML to text: {}", e);
            return html.trim().to_string();
        }
    };

    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Shorten `text` to at most `max_chars` characters, preferring to end on a
/// sentence boundary in the second half of the window. Falls back to a hard
/// cut followed by `...`.
pub fn truncate_to_sentence(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    let cut = match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => return text.to_string(),
    };

    let boundary = cut
        .char_indices()
        .filter(|(_, c)| SENTENCE_ENDS.contains(c))
        .last();

    match boundary {
        Some((byte_idx, c)) if cut[..byte_idx].chars().count() > max_chars / 2 => {
            cut[..byte_idx + c.len_utf8()].to_string()
        }
        _ => format!("{cut}..."),
    }
}
