//! Parse, emit and render configuration.
//!
//! All option structs have public fields and a `Default`; the [`parse_options!`](crate::parse_options!),
//! [`emit_options!`](crate::emit_options!) and [`render_options!`](crate::render_options!) macros
//! build them from field assignments.

use serde::{Deserialize, Serialize};

use crate::budget::Budget;
use crate::error::{Error, Result};
use crate::metadata::CollectionStyle;

/// Handling of mapping keys that collide.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateKeyPolicy {
    /// Keys that differ only by case (or not at all) fail the parse.
    #[default]
    Error,
    /// Case variants are allowed. An exactly repeated key keeps its first value.
    FirstWins,
    /// Case variants are allowed. An exactly repeated key keeps its last value.
    LastWins,
}

impl DuplicateKeyPolicy {
    pub(crate) fn allows_duplicates(self) -> bool {
        !matches!(self, DuplicateKeyPolicy::Error)
    }
}

/// Document parser configuration.
///
/// ```rust
/// use saphyr_meta::DuplicateKeyPolicy;
///
/// let options = saphyr_meta::parse_options! {
///     duplicate_keys: DuplicateKeyPolicy::LastWins,
/// };
/// let doc = saphyr_meta::parse_str_with_options("test: hello\nTest: world\n", &options).unwrap();
/// assert_eq!(doc.value.get("Test").and_then(|v| v.as_str()), Some("world"));
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParseOptions {
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Optional limits enforced while tokenizing.
    pub budget: Option<Budget>,
    /// Also infer `yes/no/on/off/y/n` as booleans.
    pub yaml11_booleans: bool,
}

/// Metadata-aware emitter configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EmitOptions {
    /// Skip null mapping entries. Null sequence items are always kept.
    pub omit_null: bool,
    /// Tag scalars that carry no surviving tag with the tag of their runtime kind.
    pub emit_missing_tags_from_runtime_type: bool,
    /// Force this layout on every mapping.
    pub mapping_style_override: Option<CollectionStyle>,
    /// Force this layout on every sequence.
    pub sequence_style_override: Option<CollectionStyle>,
    /// Collections nested deeper than this become empty placeholders. The root is depth 1.
    pub max_depth: usize,
    /// Quote `yes/no/on/off/y/n` strings so they stay strings for a reader parsing with
    /// [`ParseOptions::yaml11_booleans`].
    #[serde(default)]
    pub yaml11_booleans: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            omit_null: false,
            emit_missing_tags_from_runtime_type: false,
            mapping_style_override: None,
            sequence_style_override: None,
            max_depth: 64,
            yaml11_booleans: false,
        }
    }
}

/// Text rendering configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Spaces per nesting level. Must be at least 1.
    pub indent_step: usize,
    /// Folded (`>`) scalars are wrapped near this width.
    pub folded_wrap_chars: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent_step: 2,
            folded_wrap_chars: 80,
        }
    }
}

impl RenderOptions {
    pub(crate) fn consistent(&self) -> Result<()> {
        if self.indent_step == 0 {
            return Err(Error::msg("indent_step must be at least 1"));
        }
        Ok(())
    }
}
