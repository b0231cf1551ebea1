//! Input hygiene for chat text.

use super::HistoryTurn;
use crate::domain::MessageRole;

/// Longest message forwarded to the model, in characters.
pub const MAX_MESSAGE_CHARS: usize = 5000;
/// Prior turns kept in the model context.
pub const HISTORY_LIMIT: usize = 10;

/// Trim and cap a message at [`MAX_MESSAGE_CHARS`] characters.
pub fn normalize_text(input: &str) -> String {
    input.trim().chars().take(MAX_MESSAGE_CHARS).collect()
}

/// Escape HTML special characters.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Trim, escape, then cap at [`MAX_MESSAGE_CHARS`] characters, so the cap
/// holds for the escaped text.
///
/// # Examples
/// ```
/// use bookchat::domain::chat::sanitize_text;
///
/// assert_eq!(sanitize_text("  <b>hi</b> "), "&lt;b&gt;hi&lt;/b&gt;");
/// ```
pub fn sanitize_text(input: &str) -> String {
    escape_html(input.trim())
        .chars()
        .take(MAX_MESSAGE_CHARS)
        .collect()
}

/// Keep the last [`HISTORY_LIMIT`] turns that have a known role and
/// non-blank content, sanitising each.
pub fn sanitize_history(turns: &[HistoryTurn]) -> Vec<(MessageRole, String)> {
    let valid: Vec<(MessageRole, String)> = turns
        .iter()
        .filter_map(|turn| {
            let role = turn.role.parse::<MessageRole>().ok()?;
            let content = sanitize_text(&turn.content);
            (!content.is_empty()).then_some((role, content))
        })
        .collect();
    let skip = valid.len().saturating_sub(HISTORY_LIMIT);
    valid.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn turn(role: &str, content: &str) -> HistoryTurn {
        HistoryTurn {
            role: role.to_owned(),
            content: content.to_owned(),
        }
    }

    #[rstest]
    #[case("Tom & Jerry", "Tom &amp; Jerry")]
    #[case("\"quoted\" 'single'", "&quot;quoted&quot; &#x27;single&#x27;")]
    #[case("   ", "")]
    fn escapes_once(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_text(input), expected);
    }

    #[test]
    fn truncates_by_characters_not_bytes() {
        let long = "é".repeat(MAX_MESSAGE_CHARS + 10);
        assert_eq!(normalize_text(&long).chars().count(), MAX_MESSAGE_CHARS);
    }

    #[rstest]
    #[case::apostrophes("'")]
    #[case::ampersands("&")]
    fn escaped_text_respects_the_cap(#[case] unit: &str) {
        let input = unit.repeat(MAX_MESSAGE_CHARS);
        let sanitized = sanitize_text(&input);
        assert_eq!(sanitized.chars().count(), MAX_MESSAGE_CHARS);
        assert!(sanitized.starts_with('&'));
    }

    #[test]
    fn history_drops_invalid_turns_and_keeps_the_tail() {
        let mut turns = vec![turn("system", "ignore me"), turn("user", "   ")];
        turns.extend((0..12).map(|i| turn("assistant", &format!("reply {i}"))));

        let history = sanitize_history(&turns);
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(
            history.first().map(|(_, c)| c.as_str()),
            Some("reply 2")
        );
        assert!(history.iter().all(|(role, _)| *role == MessageRole::Assistant));
    }
}
