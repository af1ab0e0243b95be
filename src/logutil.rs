//! Keeps chat text on one log line.

use std::fmt::Write;

/// Longest chat preview written to the log, in characters.
const MAX_PREVIEW: usize = 200;

/// Escape line breaks, tabs, backslashes and other control characters so a
/// chat message logs as a single line. Long text is cut with an ellipsis.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 4);
    for (idx, ch) in s.chars().enumerate() {
        if idx == MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:04x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_log;

    #[test]
    fn multi_line_command_stays_on_one_line() {
        assert_eq!(escape_log("!create\nZed\t\\"), "!create\\nZed\\t\\\\");
    }

    #[test]
    fn long_text_is_cut() {
        let long = "x".repeat(500);
        let escaped = escape_log(&long);
        assert_eq!(escaped.chars().count(), 201);
        assert!(escaped.ends_with('…'));
    }

    #[test]
    fn other_controls_are_hex_escaped() {
        assert_eq!(escape_log("a\u{7}b"), "a\\u{0007}b");
    }
}
