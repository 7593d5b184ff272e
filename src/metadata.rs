//! Path-indexed metadata side channel.
//!
//! A [`MetadataStore`] node describes the value found at one document path: the comment
//! written before its key, its explicit tag, the quoting style of a scalar and the layout of a
//! mapping or sequence. Child nodes are keyed by mapping key (or property name) and sequence
//! index, so the tree mirrors the value tree it was captured from.
//!
//! The root node of a document carries the document-level layout: its own mapping/sequence
//! style is the style of the root collection, which has no owning key.
//!
//! Nodes are created lazily and never validated; a node may exist before the data it
//! describes (comments authored programmatically, for example).

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Scalar presentation style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    /// `|`
    Literal,
    /// `>`
    Folded,
}

impl ScalarStyle {
    /// Every style except plain disables type inference.
    pub fn is_quoted(self) -> bool {
        !matches!(self, ScalarStyle::Plain)
    }
}

/// Mapping / sequence layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionStyle {
    /// Indented, one entry per line.
    #[default]
    Block,
    /// Bracketed: `{a: 1}`, `[1, 2]`.
    Flow,
}

/// Address of a child node: a mapping key / property name, or a sequence index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetaKey {
    Key(String),
    Index(usize),
}

impl From<&str> for MetaKey {
    fn from(value: &str) -> Self {
        MetaKey::Key(value.to_owned())
    }
}

impl From<String> for MetaKey {
    fn from(value: String) -> Self {
        MetaKey::Key(value)
    }
}

impl From<&String> for MetaKey {
    fn from(value: &String) -> Self {
        MetaKey::Key(value.clone())
    }
}

impl From<usize> for MetaKey {
    fn from(value: usize) -> Self {
        MetaKey::Index(value)
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaKey::Key(k) => f.write_str(k),
            MetaKey::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// Render a path the way diagnostics show it: `company.staff[0].name`.
pub(crate) fn format_path(path: &[MetaKey]) -> String {
    let mut out = String::new();
    for seg in path {
        match seg {
            MetaKey::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            MetaKey::Key(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
        }
    }
    out
}

/// One metadata node plus its lazily created children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataStore {
    comment: Option<String>,
    tag: Option<String>,
    scalar_style: Option<ScalarStyle>,
    mapping_style: Option<CollectionStyle>,
    sequence_style: Option<CollectionStyle>,
    children: IndexMap<MetaKey, MetadataStore>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- fields of this node ----

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment<S: Into<String>>(&mut self, comment: Option<S>) {
        self.comment = comment.map(Into::into);
    }

    /// Add a comment line below any comment already present.
    pub fn append_comment(&mut self, line: &str) {
        match &mut self.comment {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(line);
            }
            None => self.comment = Some(line.to_string()),
        }
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn set_tag<S: Into<String>>(&mut self, tag: Option<S>) {
        self.tag = tag.map(Into::into);
    }

    pub fn scalar_style(&self) -> Option<ScalarStyle> {
        self.scalar_style
    }

    pub fn set_scalar_style(&mut self, style: Option<ScalarStyle>) {
        self.scalar_style = style;
    }

    pub fn mapping_style(&self) -> Option<CollectionStyle> {
        self.mapping_style
    }

    pub fn set_mapping_style(&mut self, style: Option<CollectionStyle>) {
        self.mapping_style = style;
    }

    pub fn sequence_style(&self) -> Option<CollectionStyle> {
        self.sequence_style
    }

    pub fn set_sequence_style(&mut self, style: Option<CollectionStyle>) {
        self.sequence_style = style;
    }

    /// Layout of the root mapping. Only meaningful on a document's root node.
    pub fn document_mapping_style(&self) -> Option<CollectionStyle> {
        self.mapping_style
    }

    pub fn set_document_mapping_style(&mut self, style: Option<CollectionStyle>) {
        self.mapping_style = style;
    }

    /// Layout of the root sequence. Only meaningful on a document's root node.
    pub fn document_sequence_style(&self) -> Option<CollectionStyle> {
        self.sequence_style
    }

    pub fn set_document_sequence_style(&mut self, style: Option<CollectionStyle>) {
        self.sequence_style = style;
    }

    /// Copy comment, tag and styles (not children) from `other`.
    pub fn copy_fields_from(&mut self, other: &MetadataStore) {
        self.comment = other.comment.clone();
        self.tag = other.tag.clone();
        self.scalar_style = other.scalar_style;
        self.mapping_style = other.mapping_style;
        self.sequence_style = other.sequence_style;
    }

    /// True when no field is set on this node (children are not considered).
    pub fn has_no_fields(&self) -> bool {
        self.comment.is_none()
            && self.tag.is_none()
            && self.scalar_style.is_none()
            && self.mapping_style.is_none()
            && self.sequence_style.is_none()
    }

    /// True when neither this node nor any descendant carries information.
    pub fn is_empty(&self) -> bool {
        self.has_no_fields() && self.children.values().all(MetadataStore::is_empty)
    }

    // ---- children ----

    /// Child node for `key`, if one was ever created.
    pub fn nested<K: Into<MetaKey>>(&self, key: K) -> Option<&MetadataStore> {
        self.children.get(&key.into())
    }

    /// Child node for `key`, created empty on first access.
    pub fn nested_mut<K: Into<MetaKey>>(&mut self, key: K) -> &mut MetadataStore {
        self.children.entry(key.into()).or_default()
    }

    pub fn insert_nested<K: Into<MetaKey>>(&mut self, key: K, node: MetadataStore) {
        self.children.insert(key.into(), node);
    }

    pub fn remove_nested<K: Into<MetaKey>>(&mut self, key: K) -> Option<MetadataStore> {
        self.children.shift_remove(&key.into())
    }

    pub fn children(&self) -> impl Iterator<Item = (&MetaKey, &MetadataStore)> {
        self.children.iter()
    }

    /// Follow `path` from this node.
    pub fn node_at(&self, path: &[MetaKey]) -> Option<&MetadataStore> {
        path.iter()
            .try_fold(self, |node, seg| node.children.get(seg))
    }

    // ---- per-property accessors ----

    pub fn property_comment(&self, property: &str) -> Option<&str> {
        self.nested(property).and_then(MetadataStore::comment)
    }

    pub fn set_property_comment<S: Into<String>>(&mut self, property: &str, comment: Option<S>) {
        self.nested_mut(property).set_comment(comment);
    }

    pub fn property_tag(&self, property: &str) -> Option<&str> {
        self.nested(property).and_then(MetadataStore::tag)
    }

    pub fn set_property_tag<S: Into<String>>(&mut self, property: &str, tag: Option<S>) {
        self.nested_mut(property).set_tag(tag);
    }

    pub fn property_scalar_style(&self, property: &str) -> Option<ScalarStyle> {
        self.nested(property).and_then(MetadataStore::scalar_style)
    }

    pub fn set_property_scalar_style(&mut self, property: &str, style: Option<ScalarStyle>) {
        self.nested_mut(property).set_scalar_style(style);
    }

    pub fn property_mapping_style(&self, property: &str) -> Option<CollectionStyle> {
        self.nested(property).and_then(MetadataStore::mapping_style)
    }

    pub fn set_property_mapping_style(&mut self, property: &str, style: Option<CollectionStyle>) {
        self.nested_mut(property).set_mapping_style(style);
    }

    pub fn property_sequence_style(&self, property: &str) -> Option<CollectionStyle> {
        self.nested(property).and_then(MetadataStore::sequence_style)
    }

    pub fn set_property_sequence_style(&mut self, property: &str, style: Option<CollectionStyle>) {
        self.nested_mut(property).set_sequence_style(style);
    }
}
