//! Line wrapping for folded (`>`) block scalars.

use std::fmt::Write;

use crate::error::Result;

/// Leading spaces of the first non-empty line.
pub(crate) fn first_line_leading_spaces(s: &str) -> usize {
    for line in s.split('\n') {
        if !line.is_empty() {
            return line.len() - line.trim_start_matches(' ').len();
        }
    }
    0
}

/// True when a line other than a blank one starts with a space or tab.
///
/// Such lines are "more indented" in a folded scalar and keep their line breaks, so folding
/// would not read back the same text.
pub(crate) fn has_more_indented_line(s: &str) -> bool {
    s.split('\n')
        .any(|line| line.starts_with(' ') || line.starts_with('\t'))
}

/// Write the body of a folded scalar whose trailing line breaks were already removed.
///
/// Every text line break becomes a blank line in the output (a single break would fold into a
/// space on reading), and long lines are wrapped at ASCII space runs near `wrap_col`. Each
/// written line is prefixed with `indent`.
pub(crate) fn write_folded_body<W: Write>(
    out: &mut W,
    body: &str,
    indent: &str,
    wrap_col: usize,
) -> Result<()> {
    let segments: Vec<&str> = body.split('\n').collect();
    for (n, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            out.write_char('\n')?;
            continue;
        }
        write_wrapped_line(out, segment, indent, wrap_col)?;
        let is_last = n + 1 == segments.len();
        if !is_last {
            out.write_char('\n')?;
        }
    }
    Ok(())
}

/// Wrap only at ASCII-space runs.
///
/// A folded line break reads back as one space. When breaking inside a run of N spaces, N-1
/// spaces stay at the end of the line, the run is consumed and the next line starts at the
/// first non-space char, so the next line never becomes more indented.
fn write_wrapped_line<W: Write>(out: &mut W, line: &str, indent: &str, wrap_col: usize) -> Result<()> {
    let mut start = 0usize;
    let mut col = 0usize;
    // (run_start_byte, run_end_byte, run_len_in_chars)
    let mut last_space_run: Option<(usize, usize, usize)> = None;

    let mut in_space_run = false;
    let mut run_start = 0usize;
    let mut run_len = 0usize;

    for (i, ch) in line.char_indices() {
        if in_space_run && ch != ' ' {
            last_space_run = Some((run_start, i, run_len));
            in_space_run = false;
            run_len = 0;
        }
        if ch == ' ' {
            if !in_space_run {
                in_space_run = true;
                run_start = i;
            }
            run_len += 1;
        }

        col += 1;
        if col > wrap_col {
            let Some((ws_start, ws_end, ws_len)) = last_space_run else {
                // No space inside the limit: leave the line long.
                continue;
            };
            out.write_str(indent)?;
            out.write_str(&line[start..ws_start])?;
            for _ in 1..ws_len {
                out.write_char(' ')?;
            }
            out.write_char('\n')?;

            start = ws_end;
            col = line[start..=i].chars().count();
            last_space_run = None;
        }
    }

    out.write_str(indent)?;
    out.write_str(&line[start..])?;
    out.write_char('\n')?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folded(body: &str, wrap: usize) -> String {
        let mut out = String::new();
        write_folded_body(&mut out, body, "  ", wrap).unwrap();
        out
    }

    #[test]
    fn leading_spaces() {
        assert_eq!(first_line_leading_spaces("hello"), 0);
        assert_eq!(first_line_leading_spaces("\n\n   world"), 3);
        assert_eq!(first_line_leading_spaces("\n\n"), 0);
    }

    #[test]
    fn simple_line() {
        assert_eq!(folded("hello world", 80), "  hello world\n");
    }

    #[test]
    fn wraps_at_space() {
        assert_eq!(folded("hello world", 8), "  hello\n  world\n");
    }

    #[test]
    fn line_breaks_become_blank_lines() {
        assert_eq!(folded("para1\npara2", 80), "  para1\n\n  para2\n");
        assert_eq!(folded("para1\n\npara2", 80), "  para1\n\n\n  para2\n");
    }

    #[test]
    fn multi_space_run_keeps_extra_spaces() {
        let mut out = String::new();
        write_folded_body(&mut out, "AA  BB", "", 4).unwrap();
        assert_eq!(out, "AA \nBB\n");
    }

    #[test]
    fn more_indented_detection() {
        assert!(has_more_indented_line("a\n  b"));
        assert!(!has_more_indented_line("a\n\nb"));
    }
}
