// Clean user-supplied free text before it is placed in a model prompt.
// Removes invisible Unicode and control characters, trims, and caps length.
// Content is otherwise passed through; the model sees what the user wrote.

/// Longest chat message or history turn forwarded upstream (characters).
pub const MAX_MESSAGE_CHARS: usize = 8_000;

/// Longest observation note forwarded upstream (characters).
pub const MAX_NOTE_CHARS: usize = 300;

/// Sanitize `raw` and cut it to at most `max_chars` characters.
pub fn sanitize_user_text(raw: &str, max_chars: usize) -> String {
    let cleaned = remove_invisible_chars(raw);
    truncate_chars(cleaned.trim(), max_chars)
}

/// Remove zero-width, bidi-override, and control characters.
/// Preserves space, newline, and tab.
fn remove_invisible_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            if matches!(*c, ' ' | '\n' | '\t') {
                return true;
            }
            if matches!(
                *c,
                '\u{200B}'..='\u{200F}'
                    | '\u{202A}'..='\u{202E}'
                    | '\u{2060}'..='\u{2064}'
                    | '\u{FEFF}'
            ) {
                return false;
            }
            !c.is_control()
        })
        .collect()
}

/// Truncate on a character boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].trim_end().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_zero_width_and_bidi_chars() {
        let input = "cr\u{200B}amps\u{202E} and \u{FEFF}pain";
        assert_eq!(sanitize_user_text(input, 100), "cramps and pain");
    }

    #[test]
    fn removes_control_chars_but_keeps_newlines() {
        let input = "line one\u{0007}\nline\ttwo\r";
        assert_eq!(sanitize_user_text(input, 100), "line one\nline\ttwo");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let input = "é".repeat(20);
        let out = sanitize_user_text(&input, 5);
        assert_eq!(out.chars().count(), 5);
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(sanitize_user_text("  hello  ", 100), "hello");
    }

    #[test]
    fn very_long_message_is_capped() {
        let input = "a".repeat(MAX_MESSAGE_CHARS + 500);
        assert_eq!(sanitize_user_text(&input, MAX_MESSAGE_CHARS).len(), MAX_MESSAGE_CHARS);
    }
}
