//! Scalar text → typed value.
//!
//! [`parse_scalar`] is the single entry point used by the document parser: it decides between
//! null, tag-directed parsing, verbatim strings for quoted styles and plain-scalar inference.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use num_bigint::BigInt;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::metadata::ScalarStyle;
use crate::tags::{self, StandardTag};
use crate::value::{Primitive, Timestamp, Value};

/// Parse a YAML 1.1 boolean from a &str (handles the "Norway problem").
///
/// Accepted TRUE literals (case-insensitive): "y", "yes", "true", "on"
/// Accepted FALSE literals (case-insensitive): "n", "no", "false", "off"
pub(crate) fn parse_yaml11_bool(s: &str) -> Option<bool> {
    let t = s.trim();
    if t.eq_ignore_ascii_case("true")
        || t.eq_ignore_ascii_case("yes")
        || t.eq_ignore_ascii_case("y")
        || t.eq_ignore_ascii_case("on")
    {
        Some(true)
    } else if t.eq_ignore_ascii_case("false")
        || t.eq_ignore_ascii_case("no")
        || t.eq_ignore_ascii_case("n")
        || t.eq_ignore_ascii_case("off")
    {
        Some(false)
    } else {
        None
    }
}

/// `true` / `false` in any letter case.
pub(crate) fn parse_bool_strict(s: &str) -> Option<bool> {
    let t = s.trim();
    if t.eq_ignore_ascii_case("true") {
        Some(true)
    } else if t.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Plain spellings of null. Empty text counts as null too.
pub(crate) fn is_null_literal(s: &str) -> bool {
    s.is_empty() || s == "~" || s.eq_ignore_ascii_case("null")
}

fn strip_sign(t: &str) -> (bool, &str) {
    match t.strip_prefix('+') {
        Some(r) => (false, r),
        None => match t.strip_prefix('-') {
            Some(r) => (true, r),
            None => (false, t),
        },
    }
}

/// Collect digits valid for `radix`, skipping `_` separators. `None` if any other character
/// appears or no digit was seen.
fn collect_digits(digits: &str, radix: u32) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(digits.len());
    for b in digits.bytes() {
        match b {
            b'_' => continue,
            _ if (b as char).is_digit(radix) => out.push(b),
            _ => return None,
        }
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Parse an arbitrary-precision integer.
///
/// Accepts an optional sign, `0x` / `0o` / `0b` prefixes and `_` digit separators.
pub(crate) fn parse_bigint(s: &str) -> Option<BigInt> {
    let t = s.trim();
    if t.starts_with('_') {
        return None;
    }
    let (neg, rest) = strip_sign(t);

    let (radix, digits) = if let Some(r) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16u32, r)
    } else if let Some(r) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        (8u32, r)
    } else if let Some(r) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        (2u32, r)
    } else {
        (10u32, rest)
    };

    let digits = collect_digits(digits, radix)?;
    let magnitude = BigInt::parse_bytes(&digits, radix)?;
    Some(if neg { -magnitude } else { magnitude })
}

/// Shape check for decimal/scientific numbers: `[-+]?(\.d+|d+(\.d*)?)([eE][-+]?d+)?`.
///
/// The standard library float parser also accepts `inf`, `NaN` and friends, which must stay
/// strings in YAML unless spelled `.inf` / `.nan`.
fn looks_like_float(t: &str) -> bool {
    let (_, rest) = strip_sign(t);
    let bytes = rest.as_bytes();
    let mut i = 0;
    let int_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
        i += 1;
    }
    let int_digits = i - int_start;
    let mut frac_digits = 0;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
            i += 1;
        }
        frac_digits = i - frac_start;
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

/// Parse a fixed-point decimal, keeping the written scale (`1.50` stays `1.50`).
pub(crate) fn parse_decimal(s: &str) -> Option<Decimal> {
    let t = s.trim();
    if !looks_like_float(t) {
        return None;
    }
    let cleaned: String = t.chars().filter(|c| *c != '_').collect();
    if cleaned.contains(['e', 'E']) {
        Decimal::from_scientific(&cleaned).ok()
    } else {
        Decimal::from_str(&cleaned).ok()
    }
}

/// `.inf`, `-.inf`, `.nan` in the YAML 1.2 spellings.
pub(crate) fn parse_special_float(s: &str) -> Option<f64> {
    match s.trim().to_ascii_lowercase().as_str() {
        ".nan" | "+.nan" | "-.nan" => Some(f64::NAN),
        ".inf" | "+.inf" => Some(f64::INFINITY),
        "-.inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Floats a decimal cannot hold (exponent out of range).
fn parse_wide_float(s: &str) -> Option<f64> {
    let t = s.trim();
    if !looks_like_float(t) {
        return None;
    }
    let cleaned: String = t.chars().filter(|c| *c != '_').collect();
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Any YAML float spelling, most precise representation first.
pub(crate) fn parse_float(s: &str) -> Option<Primitive> {
    if let Some(d) = parse_decimal(s) {
        return Some(Primitive::Decimal(d));
    }
    parse_special_float(s)
        .or_else(|| parse_wide_float(s))
        .map(Primitive::Float)
}

const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f %:z", "%Y-%m-%dT%H:%M:%S%.f%:z"];

/// ISO-8601 / YAML timestamp: a date, a local date-time or a date-time with offset.
pub(crate) fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let t = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(Timestamp::Offset(dt));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(t, fmt) {
            return Some(Timestamp::Offset(dt));
        }
    }
    for fmt in LOCAL_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(Timestamp::Local(dt));
        }
    }
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .map(Timestamp::Date)
}

/// Infer the type of a plain, untagged scalar. `None` means "just a string".
///
/// Order: boolean, integer (narrowed), decimal, special float, timestamp. Timestamps are only
/// tried when the text contains `T` or `-` so bare numbers never become dates.
pub(crate) fn infer_plain(text: &str, yaml11_booleans: bool) -> Option<Primitive> {
    let bool_hit = if yaml11_booleans {
        parse_yaml11_bool(text)
    } else {
        parse_bool_strict(text)
    };
    if let Some(b) = bool_hit {
        return Some(Primitive::Bool(b));
    }
    if let Some(i) = parse_bigint(text) {
        return Some(Primitive::from_bigint(i));
    }
    if let Some(p) = parse_float(text) {
        return Some(p);
    }
    if text.contains(['T', '-']) {
        return parse_timestamp(text).map(Primitive::Timestamp);
    }
    None
}

/// True if a plain scalar with this text would read back as something other than a string
/// under the same boolean set the parser was given.
pub(crate) fn plain_reads_as_non_string(text: &str, yaml11_booleans: bool) -> bool {
    is_null_literal(text) || infer_plain(text, yaml11_booleans).is_some()
}

/// Turn one scalar event into a value.
///
/// Plain null spellings are null whatever the tag; the tag itself stays in the metadata.
/// Otherwise errors with [`Error::ScalarFormat`] when a standard tag demands a type the text
/// cannot be parsed as. Custom tags never fail here; they leave the scalar to ordinary inference.
pub(crate) fn parse_scalar(
    raw: &str,
    style: ScalarStyle,
    tag: Option<&str>,
    yaml11_booleans: bool,
) -> Result<Value> {
    if style == ScalarStyle::Plain && is_null_literal(raw) {
        return Ok(Value::Null);
    }

    let scalar = |inferred: Primitive| Value::Scalar {
        raw: raw.to_string(),
        inferred,
    };

    if let Some(tag) = tag {
        if tag == tags::TAG_NON_SPECIFIC {
            return Ok(scalar(Primitive::String(raw.to_string())));
        }
        if let Some(kind) = tags::standard(tag) {
            let fail = || Error::scalar_format(tag, raw);
            return match kind {
                StandardTag::Int => parse_bigint(raw)
                    .map(|i| scalar(Primitive::from_bigint(i)))
                    .ok_or_else(fail),
                StandardTag::Float => parse_float(raw).map(scalar).ok_or_else(fail),
                StandardTag::Bool => parse_bool_strict(raw)
                    .map(|b| scalar(Primitive::Bool(b)))
                    .ok_or_else(fail),
                StandardTag::Timestamp => parse_timestamp(raw)
                    .map(|t| scalar(Primitive::Timestamp(t)))
                    .ok_or_else(fail),
                StandardTag::Str => Ok(scalar(Primitive::String(raw.to_string()))),
                StandardTag::Null if is_null_literal(raw) => Ok(Value::Null),
                StandardTag::Null | StandardTag::Seq | StandardTag::Map => Err(fail()),
            };
        }
    }

    if style.is_quoted() {
        return Ok(scalar(Primitive::String(raw.to_string())));
    }

    Ok(match infer_plain(raw, yaml11_booleans) {
        Some(p) => scalar(p),
        None => scalar(Primitive::String(raw.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inferred(text: &str) -> Option<Primitive> {
        infer_plain(text, false)
    }

    #[test]
    fn integers_narrow() {
        assert_eq!(inferred("42"), Some(Primitive::Int(42)));
        assert_eq!(inferred("-3_000"), Some(Primitive::Int(-3000)));
        assert_eq!(inferred("0x1F"), Some(Primitive::Int(31)));
        assert_eq!(inferred("0b101"), Some(Primitive::Int(5)));
        assert_eq!(inferred("0o17"), Some(Primitive::Int(15)));
        assert_eq!(inferred("4294967296"), Some(Primitive::Long(4_294_967_296)));
        assert!(matches!(
            inferred("123456789012345678901234567890"),
            Some(Primitive::BigInt(_))
        ));
    }

    #[test]
    fn decimals_keep_scale() {
        assert_eq!(
            inferred("1.50").map(|p| p.to_string()),
            Some("1.50".to_string())
        );
        assert_eq!(
            inferred("1e3"),
            Some(Primitive::Decimal(Decimal::from(1000)))
        );
        assert!(matches!(inferred(".inf"), Some(Primitive::Float(f)) if f.is_infinite()));
        assert_eq!(inferred("inf"), None);
        assert_eq!(inferred("1.2.3"), None);
    }

    #[test]
    fn booleans() {
        assert_eq!(inferred("True"), Some(Primitive::Bool(true)));
        assert_eq!(inferred("yes"), None);
        assert_eq!(infer_plain("yes", true), Some(Primitive::Bool(true)));
    }

    #[test]
    fn timestamps_need_a_separator() {
        assert!(matches!(
            inferred("2024-01-15"),
            Some(Primitive::Timestamp(Timestamp::Date(_)))
        ));
        assert!(matches!(
            inferred("2024-01-15T10:30:00"),
            Some(Primitive::Timestamp(Timestamp::Local(_)))
        ));
        assert!(matches!(
            inferred("2024-01-15T10:30:00Z"),
            Some(Primitive::Timestamp(Timestamp::Offset(_)))
        ));
        assert_eq!(inferred("20240115"), Some(Primitive::Int(20240115)));
        assert_eq!(inferred("not-a-date"), None);
    }

    #[test]
    fn tags_override_quoting() {
        let v = parse_scalar("42", ScalarStyle::DoubleQuoted, Some("!!int"), false).unwrap();
        assert_eq!(v.as_primitive(), Some(&Primitive::Int(42)));
        let v = parse_scalar("42", ScalarStyle::DoubleQuoted, None, false).unwrap();
        assert_eq!(v.as_str(), Some("42"));
        let v = parse_scalar("42", ScalarStyle::Plain, Some("!"), false).unwrap();
        assert_eq!(v.as_str(), Some("42"));
        let v = parse_scalar("42", ScalarStyle::Plain, Some("!custom"), false).unwrap();
        assert_eq!(v.as_primitive(), Some(&Primitive::Int(42)));
    }

    #[test]
    fn bad_tagged_text_is_an_error() {
        let err = parse_scalar("forty", ScalarStyle::Plain, Some("!!int"), false).unwrap_err();
        assert!(matches!(err, Error::ScalarFormat { ref tag, ref raw, .. } if tag == "!!int" && raw == "forty"));
        assert!(parse_scalar("maybe", ScalarStyle::Plain, Some("!!bool"), false).is_err());
    }

    #[test]
    fn null_spellings() {
        for text in ["", "~", "null", "NULL", "Null"] {
            assert_eq!(parse_scalar(text, ScalarStyle::Plain, None, false).unwrap(), Value::Null);
        }
        assert_eq!(
            parse_scalar("null", ScalarStyle::SingleQuoted, None, false)
                .unwrap()
                .as_str(),
            Some("null")
        );
    }

    #[test]
    fn null_spellings_win_over_tags() {
        for tag in ["!!int", "!!bool", "!!str", "!color"] {
            for text in ["", "~", "null"] {
                assert_eq!(
                    parse_scalar(text, ScalarStyle::Plain, Some(tag), false).unwrap(),
                    Value::Null,
                    "{tag} {text:?}"
                );
            }
        }
        let v = parse_scalar("~", ScalarStyle::DoubleQuoted, Some("!color"), false).unwrap();
        assert_eq!(v.as_str(), Some("~"));
    }

    #[test]
    fn plain_safety_follows_the_boolean_set() {
        for word in ["no", "on", "y", "yes", "off"] {
            assert!(!plain_reads_as_non_string(word, false), "{word}");
            assert!(plain_reads_as_non_string(word, true), "{word}");
        }
        assert!(plain_reads_as_non_string("false", false));
    }
}
