//! Shared utility functions.

/// Shorten `text` to at most `max_chars` characters for log output,
/// appending `…` when something was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_keeps_short_text() {
        assert_eq!(preview("hi", 10), "hi");
    }

    #[test]
    fn test_preview_cuts_on_char_boundary() {
        assert_eq!(preview("héllo wörld", 5), "héllo…");
    }

    #[test]
    fn test_preview_exact_length_is_untouched() {
        assert_eq!(preview("abcde", 5), "abcde");
    }
}
