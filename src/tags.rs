//! Tag spelling and classification.
//!
//! Tags are kept in their shorthand spelling (`!!int`, `!local`, `!<uri>`). Tags arriving from
//! the tokenizer in canonical form (`tag:yaml.org,2002:int`) are normalized by [`normalize`].

pub(crate) const YAML_TAG_PREFIX: &str = "tag:yaml.org,2002:";

pub const TAG_INT: &str = "!!int";
pub const TAG_FLOAT: &str = "!!float";
pub const TAG_BOOL: &str = "!!bool";
pub const TAG_NULL: &str = "!!null";
pub const TAG_STR: &str = "!!str";
pub const TAG_TIMESTAMP: &str = "!!timestamp";
pub const TAG_SEQ: &str = "!!seq";
pub const TAG_MAP: &str = "!!map";

/// The bare non-specific tag `!`.
pub const TAG_NON_SPECIFIC: &str = "!";

/// Built-in kinds a standard tag can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StandardTag {
    Int,
    Float,
    Bool,
    Null,
    Str,
    Timestamp,
    Seq,
    Map,
}

impl StandardTag {
    pub fn as_str(self) -> &'static str {
        match self {
            StandardTag::Int => TAG_INT,
            StandardTag::Float => TAG_FLOAT,
            StandardTag::Bool => TAG_BOOL,
            StandardTag::Null => TAG_NULL,
            StandardTag::Str => TAG_STR,
            StandardTag::Timestamp => TAG_TIMESTAMP,
            StandardTag::Seq => TAG_SEQ,
            StandardTag::Map => TAG_MAP,
        }
    }
}

/// Normalize a tag as rendered by the tokenizer into shorthand spelling.
///
/// - `tag:yaml.org,2002:int` and `tag:yaml.org,2002:!int` become `!!int`
/// - anything already starting with `!` is kept (`!!int`, `!color`, `!`)
/// - any other text is a verbatim URI and becomes `!<uri>`
pub fn normalize(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix(YAML_TAG_PREFIX) {
        return format!("!!{}", rest.trim_start_matches('!'));
    }
    if raw.starts_with('!') {
        return raw.to_string();
    }
    format!("!<{raw}>")
}

/// Classify a normalized tag. `None` means a custom (application) tag.
pub fn standard(tag: &str) -> Option<StandardTag> {
    match tag {
        TAG_INT => Some(StandardTag::Int),
        TAG_FLOAT => Some(StandardTag::Float),
        TAG_BOOL => Some(StandardTag::Bool),
        TAG_NULL => Some(StandardTag::Null),
        TAG_STR => Some(StandardTag::Str),
        TAG_TIMESTAMP => Some(StandardTag::Timestamp),
        TAG_SEQ => Some(StandardTag::Seq),
        TAG_MAP => Some(StandardTag::Map),
        _ => None,
    }
}

/// True for tags that are neither a built-in kind nor the non-specific `!`.
pub fn is_custom(tag: &str) -> bool {
    standard(tag).is_none() && tag != TAG_NON_SPECIFIC
}
