//! YAML float rendering. zmij may render `4e-6`, which YAML 1.2 core schema resolves as a
//! string, so the mantissa always gets a decimal point.

use zmij::Float;
use num_traits::float::FloatCore;

/// Append `f` to `target` as a valid YAML float (`.nan`, `.inf`, `-.inf`, `1.0`, `4.0e-6`).
pub(crate) fn push_float_string<F: Float + FloatCore>(target: &mut String, f: F) {
    if f.is_nan() {
        target.push_str(".nan");
    } else if f.is_infinite() {
        if f.is_sign_positive() {
            target.push_str(".inf");
        } else {
            target.push_str("-.inf");
        }
    } else {
        let mut buf = zmij::Buffer::new();
        let s = buf.format_finite(f);
        if !s.as_bytes().contains(&b'.') {
            if let Some(exp_pos) = s.find('e').or_else(|| s.find('E')) {
                // "4e-6" -> "4.0e-6"
                target.push_str(&s[..exp_pos]);
                target.push_str(".0");
                target.push_str(&s[exp_pos..]);
            } else {
                target.push_str(s);
                target.push_str(".0");
            }
        } else {
            target.push_str(s);
        }
    }
}
