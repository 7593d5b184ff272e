//! Comment recovery from raw text.
//!
//! The tokenizer drops comments, so they are recovered from the source: a `#` at the start of a
//! line or after whitespace begins a comment unless it lies inside a scalar's span (quoted text,
//! block scalars). Positions are char indices, the unit tokenizer spans use.

use std::ops::Range;

use crate::error::Location;

/// A comment found in the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Comment {
    /// Char index of the `#`.
    pub index: usize,
    pub location: Location,
    /// Text after `#`, trimmed.
    pub text: String,
    /// Non-blank content precedes the comment on its line.
    pub inline: bool,
}

/// Find every comment in `chars`, skipping the char ranges in `scalar_spans`.
///
/// `scalar_spans` must be sorted by start and non-overlapping.
pub(crate) fn scan_comments(chars: &[char], scalar_spans: &[Range<usize>]) -> Vec<Comment> {
    let mut out = Vec::new();
    let mut spans = scalar_spans.iter().peekable();

    let mut line = 1usize;
    let mut line_start = 0usize;
    let mut line_has_content = false;
    let mut prev_blank = true;

    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];

        while spans.peek().is_some_and(|s| s.end <= i) {
            spans.next();
        }
        let in_scalar = spans.peek().is_some_and(|s| s.start <= i && i < s.end);

        if c == '\n' {
            line += 1;
            line_start = i + 1;
            line_has_content = false;
            prev_blank = true;
            i += 1;
            continue;
        }

        if in_scalar {
            line_has_content = true;
            prev_blank = false;
            i += 1;
            continue;
        }

        if c == '#' && prev_blank {
            let end = chars[i..]
                .iter()
                .position(|&ch| ch == '\n')
                .map_or(chars.len(), |p| i + p);
            let text: String = chars[i + 1..end].iter().collect();
            out.push(Comment {
                index: i,
                location: Location::new(line, i - line_start + 1),
                text: text.trim().to_string(),
                inline: line_has_content,
            });
            i = end;
            continue;
        }

        if !c.is_whitespace() {
            line_has_content = true;
        }
        prev_blank = c.is_whitespace();
        i += 1;
    }
    out
}
