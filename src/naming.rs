//! Property name → document key derivation.

/// Derive the default document key for a property name.
///
/// A `-` goes before every upper-case letter except the first character, `_` becomes `-`, and
/// the result is lower-cased: `AppName` → `app-name`, `max_connections` → `max-connections`.
///
/// Runs of capitals are split letter by letter (`HTTPUrl` → `h-t-t-p-url`); give such
/// properties an explicit key.
pub fn derive_key(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for (i, ch) in property.chars().enumerate() {
        if ch == '_' {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            continue;
        }
        if ch.is_uppercase() && i > 0 && !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
        out.extend(ch.to_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case() {
        assert_eq!(derive_key("AppName"), "app-name");
        assert_eq!(derive_key("MaxConnections"), "max-connections");
        assert_eq!(derive_key("Name"), "name");
    }

    #[test]
    fn snake_case() {
        assert_eq!(derive_key("max_connections"), "max-connections");
        assert_eq!(derive_key("name"), "name");
    }

    #[test]
    fn acronyms_split() {
        assert_eq!(derive_key("HTTPUrl"), "h-t-t-p-url");
    }
}
