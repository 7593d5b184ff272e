//! Metadata-aware emitter: (`Value`, `MetadataStore`) → events.
//!
//! The emitter settles every presentation decision, the renderer only writes what it is
//! told. Per node:
//!
//! - collection layout: caller override, then the stored style, then (root only) the
//!   document-level style, then block. Everything inside a flow collection is flow.
//! - tags: custom tags are always written. A standard tag is written only while it still
//!   names the runtime kind of the value. With `emit_missing_tags_from_runtime_type` the
//!   runtime kind supplies a tag when none survived.
//! - scalar style: the stored style is kept whenever the text still reads back the same in
//!   it, otherwise the nearest style that does is picked.
//!
//! Depth is passed down explicitly; collections past `max_depth` become empty placeholders.

use crate::error::Result;
use crate::events::Event;
use crate::metadata::{CollectionStyle, MetadataStore, ScalarStyle};
use crate::options::EmitOptions;
use crate::quoting::{ScalarContext, is_plain_safe, needs_double_quotes};
use crate::tags::{self, StandardTag};
use crate::value::{Document, Primitive, Value};
use crate::wrapping::has_more_indented_line;

/// Events for one document, wrapped in stream and document start/end.
pub fn emit(value: &Value, metadata: &MetadataStore, options: &EmitOptions) -> Result<Vec<Event>> {
    let mut emitter = Emitter::new(options);
    emitter.events.push(Event::StreamStart);
    emitter.document(value, metadata);
    emitter.events.push(Event::StreamEnd);
    Ok(emitter.events)
}

/// Events for a stream of documents.
pub fn emit_all(documents: &[Document], options: &EmitOptions) -> Result<Vec<Event>> {
    let mut emitter = Emitter::new(options);
    emitter.events.push(Event::StreamStart);
    for doc in documents {
        emitter.document(&doc.value, &doc.metadata);
    }
    emitter.events.push(Event::StreamEnd);
    Ok(emitter.events)
}

struct Emitter<'o> {
    options: &'o EmitOptions,
    events: Vec<Event>,
}

/// Where a node sits.
#[derive(Clone, Copy)]
struct Place {
    root: bool,
    in_flow: bool,
    depth: usize,
}

impl<'o> Emitter<'o> {
    fn new(options: &'o EmitOptions) -> Self {
        Self {
            options,
            events: Vec::new(),
        }
    }

    fn document(&mut self, value: &Value, metadata: &MetadataStore) {
        log::trace!("emitting document");
        self.events.push(Event::DocumentStart);
        self.comment(metadata);
        let place = Place {
            root: true,
            in_flow: false,
            depth: 1,
        };
        self.node(value, metadata, place);
        self.events.push(Event::DocumentEnd);
    }

    fn comment(&mut self, meta: &MetadataStore) {
        if let Some(text) = meta.comment() {
            for line in text.split('\n') {
                self.events.push(Event::block_comment(line));
            }
        }
    }

    fn node(&mut self, value: &Value, meta: &MetadataStore, place: Place) {
        match value {
            Value::Null => {
                let tag = self.tag_for(meta.tag(), value);
                self.events.push(Event::Scalar {
                    value: "null".to_string(),
                    tag,
                    style: ScalarStyle::Plain,
                });
            }
            Value::Scalar { raw, inferred } => self.scalar(raw, inferred, value, meta, place),
            Value::Mapping(entries) => self.mapping(entries, value, meta, place),
            Value::Sequence(items) => self.sequence(items, value, meta, place),
        }
    }

    fn layout(
        &self,
        forced: Option<CollectionStyle>,
        stored: Option<CollectionStyle>,
        document: Option<CollectionStyle>,
        place: Place,
    ) -> CollectionStyle {
        if place.in_flow {
            return CollectionStyle::Flow;
        }
        forced
            .or(stored)
            .or(if place.root { document } else { None })
            .unwrap_or_default()
    }

    fn mapping(
        &mut self,
        entries: &[(String, Value)],
        value: &Value,
        meta: &MetadataStore,
        place: Place,
    ) {
        let tag = self.tag_for(meta.tag(), value);
        if place.depth > self.options.max_depth {
            log::debug!("mapping at depth {} emitted as an empty placeholder", place.depth);
            self.events.push(Event::MappingStart {
                tag,
                style: CollectionStyle::Flow,
            });
            self.events.push(Event::MappingEnd);
            return;
        }
        let style = self.layout(
            self.options.mapping_style_override,
            meta.mapping_style(),
            meta.document_mapping_style(),
            place,
        );
        let in_flow = style == CollectionStyle::Flow;
        self.events.push(Event::MappingStart { tag, style });

        let absent = MetadataStore::new();
        for (key, item) in entries {
            if self.options.omit_null && item.is_null() {
                continue;
            }
            let child = meta.nested(key).unwrap_or(&absent);
            self.comment(child);
            self.key(key, in_flow);
            let child_place = Place {
                root: false,
                in_flow,
                depth: place.depth + 1,
            };
            self.node(item, child, child_place);
        }
        self.events.push(Event::MappingEnd);
    }

    fn sequence(&mut self, items: &[Value], value: &Value, meta: &MetadataStore, place: Place) {
        let tag = self.tag_for(meta.tag(), value);
        if place.depth > self.options.max_depth {
            log::debug!("sequence at depth {} emitted as an empty placeholder", place.depth);
            self.events.push(Event::SequenceStart {
                tag,
                style: CollectionStyle::Flow,
            });
            self.events.push(Event::SequenceEnd);
            return;
        }
        let style = self.layout(
            self.options.sequence_style_override,
            meta.sequence_style(),
            meta.document_sequence_style(),
            place,
        );
        let in_flow = style == CollectionStyle::Flow;
        self.events.push(Event::SequenceStart { tag, style });

        let absent = MetadataStore::new();
        for (i, item) in items.iter().enumerate() {
            let child = meta.nested(i).unwrap_or(&absent);
            self.comment(child);
            let child_place = Place {
                root: false,
                in_flow,
                depth: place.depth + 1,
            };
            self.node(item, child, child_place);
        }
        self.events.push(Event::SequenceEnd);
    }

    fn key(&mut self, key: &str, in_flow: bool) {
        let ctx = ScalarContext {
            key: true,
            in_flow,
            yaml11_booleans: self.options.yaml11_booleans,
        };
        let style = if is_plain_safe(key, ctx) {
            ScalarStyle::Plain
        } else {
            ScalarStyle::DoubleQuoted
        };
        self.events.push(Event::Scalar {
            value: key.to_string(),
            tag: None,
            style,
        });
    }

    fn scalar(
        &mut self,
        raw: &str,
        inferred: &Primitive,
        value: &Value,
        meta: &MetadataStore,
        place: Place,
    ) {
        let tag = self.tag_for(meta.tag(), value);
        let stored = meta.scalar_style();
        let (text, style) = match inferred {
            Primitive::String(s) => {
                let ctx = ScalarContext {
                    key: false,
                    in_flow: place.in_flow,
                    yaml11_booleans: self.options.yaml11_booleans,
                };
                (s.clone(), string_style(s, stored, ctx))
            }
            // Quotes on a non-string only survive together with the tag that types them.
            _ => {
                let style = match stored {
                    Some(style @ (ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted))
                        if tag.is_some() =>
                    {
                        style
                    }
                    _ => ScalarStyle::Plain,
                };
                (raw.to_string(), style)
            }
        };
        self.events.push(Event::Scalar {
            value: text,
            tag,
            style,
        });
    }

    /// The tag to write for `value`, if any.
    fn tag_for(&self, stored: Option<&str>, value: &Value) -> Option<String> {
        let kept = stored.filter(|tag| match tags::standard(tag) {
            Some(kind) => kind_matches(kind, value),
            None if *tag == tags::TAG_NON_SPECIFIC => {
                matches!(value.as_primitive(), Some(Primitive::String(_)))
            }
            None => true,
        });
        match kept {
            Some(tag) => Some(tag.to_string()),
            None if self.options.emit_missing_tags_from_runtime_type => {
                runtime_tag(value).map(|kind| kind.as_str().to_string())
            }
            None => None,
        }
    }
}

fn kind_matches(kind: StandardTag, value: &Value) -> bool {
    match (kind, value) {
        (StandardTag::Null, Value::Null) => true,
        (StandardTag::Map, Value::Mapping(_)) => true,
        (StandardTag::Seq, Value::Sequence(_)) => true,
        (kind, Value::Scalar { inferred, .. }) => match kind {
            StandardTag::Int => inferred.is_integer(),
            StandardTag::Float => inferred.is_float(),
            StandardTag::Bool => matches!(inferred, Primitive::Bool(_)),
            StandardTag::Timestamp => matches!(inferred, Primitive::Timestamp(_)),
            StandardTag::Str => matches!(inferred, Primitive::String(_)),
            StandardTag::Null | StandardTag::Map | StandardTag::Seq => false,
        },
        _ => false,
    }
}

fn runtime_tag(value: &Value) -> Option<StandardTag> {
    let kind = match value.as_primitive()? {
        Primitive::Bool(_) => StandardTag::Bool,
        p if p.is_integer() => StandardTag::Int,
        p if p.is_float() => StandardTag::Float,
        Primitive::Timestamp(_) => StandardTag::Timestamp,
        _ => StandardTag::Str,
    };
    Some(kind)
}

fn has_control_besides_newline(s: &str) -> bool {
    s.chars()
        .any(|c| (c.is_control() && c != '\n') || c == '\u{FEFF}')
}

/// Pick the style for a string scalar, honoring `stored` where the text allows it.
fn string_style(s: &str, stored: Option<ScalarStyle>, ctx: ScalarContext) -> ScalarStyle {
    let block_ok =
        !ctx.in_flow && !s.trim_end_matches('\n').is_empty() && !has_control_besides_newline(s);
    match stored {
        Some(ScalarStyle::DoubleQuoted) => ScalarStyle::DoubleQuoted,
        Some(ScalarStyle::SingleQuoted) => {
            if s.contains('\n') || needs_double_quotes(s) {
                ScalarStyle::DoubleQuoted
            } else {
                ScalarStyle::SingleQuoted
            }
        }
        Some(ScalarStyle::Literal) if block_ok => ScalarStyle::Literal,
        Some(ScalarStyle::Folded) if block_ok => {
            if has_more_indented_line(s) {
                ScalarStyle::Literal
            } else {
                ScalarStyle::Folded
            }
        }
        Some(ScalarStyle::Literal | ScalarStyle::Folded) => ScalarStyle::DoubleQuoted,
        Some(ScalarStyle::Plain) | None => {
            if is_plain_safe(s, ctx) {
                ScalarStyle::Plain
            } else if stored.is_none() && block_ok && s.contains('\n') {
                ScalarStyle::Literal
            } else {
                ScalarStyle::DoubleQuoted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: ScalarContext = ScalarContext {
        key: false,
        in_flow: false,
        yaml11_booleans: false,
    };

    #[test]
    fn stored_styles_survive_when_valid() {
        assert_eq!(
            string_style("hello", Some(ScalarStyle::SingleQuoted), BLOCK),
            ScalarStyle::SingleQuoted
        );
        assert_eq!(
            string_style("a\nb", Some(ScalarStyle::SingleQuoted), BLOCK),
            ScalarStyle::DoubleQuoted
        );
        assert_eq!(
            string_style("  indented\ntext", Some(ScalarStyle::Folded), BLOCK),
            ScalarStyle::Literal
        );
        assert_eq!(
            string_style("a\tb\nc", Some(ScalarStyle::Literal), BLOCK),
            ScalarStyle::DoubleQuoted
        );
    }

    #[test]
    fn unstyled_strings() {
        assert_eq!(string_style("plain", None, BLOCK), ScalarStyle::Plain);
        assert_eq!(string_style("true", None, BLOCK), ScalarStyle::DoubleQuoted);
        assert_eq!(string_style("two\nlines", None, BLOCK), ScalarStyle::Literal);
        let flow = ScalarContext {
            in_flow: true,
            ..BLOCK
        };
        assert_eq!(string_style("two\nlines", None, flow), ScalarStyle::DoubleQuoted);
    }

    #[test]
    fn stale_standard_tags_are_dropped() {
        let options = EmitOptions::default();
        let emitter = Emitter::new(&options);
        let int = Value::scalar(Primitive::Int(42));
        let text = Value::string("forty-two");
        assert_eq!(emitter.tag_for(Some("!!int"), &int).as_deref(), Some("!!int"));
        assert_eq!(emitter.tag_for(Some("!!int"), &text), None);
        assert_eq!(emitter.tag_for(Some("!color"), &text).as_deref(), Some("!color"));
    }

    #[test]
    fn runtime_tags_fill_in() {
        let options = EmitOptions {
            emit_missing_tags_from_runtime_type: true,
            ..EmitOptions::default()
        };
        let emitter = Emitter::new(&options);
        assert_eq!(
            emitter
                .tag_for(None, &Value::scalar(Primitive::Bool(true)))
                .as_deref(),
            Some("!!bool")
        );
        assert_eq!(
            emitter.tag_for(Some("!!int"), &Value::string("x")).as_deref(),
            Some("!!str")
        );
        assert_eq!(emitter.tag_for(None, &Value::Null), None);
    }
}
