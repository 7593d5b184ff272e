//! Plain-scalar safety checks and quoted-scalar writers.

use std::fmt::Write;

use crate::error::Result;
use crate::parse_scalars::plain_reads_as_non_string;

/// Where a scalar is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ScalarContext {
    pub key: bool,
    pub in_flow: bool,
    /// `yes/no/on/off/y/n` read back as booleans.
    pub yaml11_booleans: bool,
}

/// Returns true if `s` can be written as a plain scalar in `ctx` and reads back as the same
/// string.
pub(crate) fn is_plain_safe(s: &str, ctx: ScalarContext) -> bool {
    if s.is_empty() || plain_reads_as_non_string(s, ctx.yaml11_booleans) {
        return false;
    }
    let bytes = s.as_bytes();
    if bytes[0].is_ascii_whitespace()
        || matches!(
            bytes[0],
            b'-' | b'?'
                | b':'
                | b','
                | b'['
                | b']'
                | b'{'
                | b'}'
                | b'#'
                | b'&'
                | b'*'
                | b'!'
                | b'|'
                | b'>'
                | b'\''
                | b'"'
                | b'%'
                | b'@'
                | b'`'
        )
    {
        return false;
    }
    if s.ends_with([' ', '\t', ':']) {
        return false;
    }
    if s.chars().any(|c| c.is_control() || c == '\u{FEFF}') {
        return false;
    }
    if s.contains(": ") || s.contains(" #") {
        return false;
    }
    if (ctx.in_flow || ctx.key) && s.contains([',', '[', ']', '{', '}']) {
        return false;
    }
    true
}

/// Single quotes cannot carry escapes; line breaks inside them fold.
pub(crate) fn needs_double_quotes(s: &str) -> bool {
    s.chars().any(|c| c.is_control() || c == '\u{FEFF}')
}

pub(crate) fn write_single_quoted<W: Write>(out: &mut W, s: &str) -> Result<()> {
    out.write_char('\'')?;
    for ch in s.chars() {
        if ch == '\'' {
            out.write_str("''")?;
        } else {
            out.write_char(ch)?;
        }
    }
    out.write_char('\'')?;
    Ok(())
}

/// Write a double-quoted string with YAML escapes.
pub(crate) fn write_double_quoted<W: Write>(out: &mut W, s: &str) -> Result<()> {
    out.write_char('"')?;
    for ch in s.chars() {
        match ch {
            '\\' => out.write_str("\\\\")?,
            '"' => out.write_str("\\\"")?,
            '\0' => out.write_str("\\0")?,
            '\u{7}' => out.write_str("\\a")?,
            '\u{8}' => out.write_str("\\b")?,
            '\t' => out.write_str("\\t")?,
            '\n' => out.write_str("\\n")?,
            '\u{b}' => out.write_str("\\v")?,
            '\u{c}' => out.write_str("\\f")?,
            '\r' => out.write_str("\\r")?,
            '\u{1b}' => out.write_str("\\e")?,
            '\u{FEFF}' => out.write_str("\\uFEFF")?,
            '\u{0085}' => out.write_str("\\N")?,
            '\u{2028}' => out.write_str("\\L")?,
            '\u{2029}' => out.write_str("\\P")?,
            c if (c as u32) <= 0xFF && c.is_control() => write!(out, "\\x{:02X}", c as u32)?,
            c if c.is_control() => write!(out, "\\u{:04X}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('"')?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUE: ScalarContext = ScalarContext {
        key: false,
        in_flow: false,
        yaml11_booleans: false,
    };
    const FLOW: ScalarContext = ScalarContext {
        key: false,
        in_flow: true,
        yaml11_booleans: false,
    };

    #[test]
    fn ordinary_words_are_plain() {
        assert!(is_plain_safe("hello world", VALUE));
        assert!(is_plain_safe("a,b", VALUE));
        assert!(is_plain_safe("http://example.com", VALUE));
    }

    #[test]
    fn lookalikes_need_quotes() {
        for s in ["", "42", "true", "null", "~", "1.5", "2024-01-01", ".inf"] {
            assert!(!is_plain_safe(s, VALUE), "{s:?} should not be plain");
        }
    }

    #[test]
    fn yaml11_words_are_plain_unless_asked() {
        let yaml11 = ScalarContext {
            yaml11_booleans: true,
            ..VALUE
        };
        for s in ["yes", "no", "on", "off", "y", "n"] {
            assert!(is_plain_safe(s, VALUE), "{s:?} should be plain");
            assert!(!is_plain_safe(s, yaml11), "{s:?} should be quoted");
        }
    }

    #[test]
    fn structure_needs_quotes() {
        assert!(!is_plain_safe("a: b", VALUE));
        assert!(!is_plain_safe("a #b", VALUE));
        assert!(!is_plain_safe("- x", VALUE));
        assert!(!is_plain_safe("trailing ", VALUE));
        assert!(!is_plain_safe("a,b", FLOW));
        assert!(!is_plain_safe("two\nlines", VALUE));
    }

    #[test]
    fn escapes() {
        let mut out = String::new();
        write_double_quoted(&mut out, "a\"b\\c\n\u{1}").unwrap();
        assert_eq!(out, "\"a\\\"b\\\\c\\n\\x01\"");
        let mut out = String::new();
        write_single_quoted(&mut out, "it's").unwrap();
        assert_eq!(out, "'it''s'");
    }
}
