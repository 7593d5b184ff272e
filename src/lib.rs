//! Metadata-preserving YAML document model.
//!
//! Parsing produces a [`Document`]: a [`Value`] tree plus a [`MetadataStore`] that mirrors it
//! and carries comments, tags and layout (scalar, mapping and sequence styles). The
//! [`Mapper`] turns documents into typed classes declared with [`yaml_object!`] and back,
//! keeping the metadata on each instance, and the emitter writes everything out again so
//! that an unmodified document round-trips with its comments, tags and styles intact.
//!
//! ```rust
//! let doc = saphyr_meta::parse_str("# answer\nnumber: !!int \"42\"\nlist: [a, b]\n").unwrap();
//! assert_eq!(doc.metadata.property_comment("number"), Some("answer"));
//! assert_eq!(doc.metadata.property_tag("number"), Some("!!int"));
//! assert_eq!(
//!     doc.to_yaml_string().unwrap(),
//!     "# answer\nnumber: !!int \"42\"\nlist: [a, b]\n"
//! );
//! ```

pub use budget::{Budget, BudgetBreach, BudgetReport, check_budget};
pub use converter::{Converter, ConverterRegistry};
pub use emitter::{emit, emit_all};
pub use error::{Error, Location, Result};
pub use events::{Event, Events, ReplayEvents};
pub use mapper::Mapper;
pub use metadata::{CollectionStyle, MetaKey, MetadataStore, ScalarStyle};
pub use naming::derive_key;
pub use object::{
    Data, Property, PropertyDescriptor, PropertyType, TypeRegistry, TypedClass, YamlObject,
    downcast_data,
};
pub use options::{DuplicateKeyPolicy, EmitOptions, ParseOptions, RenderOptions};
pub use parser::parse_events;
pub use render::render;
pub use value::{Document, Primitive, Timestamp, Value};

use live_events::LiveEvents;
use parser::DocumentParser;

pub mod budget;
mod comments;
mod converter;
mod emitter;
mod error;
mod events;
mod float_format;
mod live_events;
mod macros;
mod mapper;
mod metadata;
mod naming;
mod object;
mod options;
mod parse_scalars;
mod parser;
mod quoting;
mod render;
pub mod tags;
mod value;
mod wrapping;

/// Parse a single YAML document.
///
/// Empty input gives a document whose value is [`Value::Null`]. Input with several documents
/// is rejected with [`Error::MultipleDocuments`]; use [`parse_all`] for streams.
pub fn parse_str(input: &str) -> Result<Document> {
    parse_str_with_options(input, &ParseOptions::default())
}

/// Parse a single YAML document with configurable [`ParseOptions`].
pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Result<Document> {
    parse_single(input, options, false)
}

/// Parse every document of a YAML stream.
///
/// ```rust
/// let docs = saphyr_meta::parse_all("a: 1\n---\nb: 2\n").unwrap();
/// assert_eq!(docs.len(), 2);
/// ```
pub fn parse_all(input: &str) -> Result<Vec<Document>> {
    parse_all_with_options(input, &ParseOptions::default())
}

pub fn parse_all_with_options(input: &str, options: &ParseOptions) -> Result<Vec<Document>> {
    let mut events = LiveEvents::new(input, options.budget.clone());
    DocumentParser::new(&mut events, options).parse_stream()
}

/// `case_variants_ok` leaves keys that differ only by case to the typed mapper.
pub(crate) fn parse_single(
    input: &str,
    options: &ParseOptions,
    case_variants_ok: bool,
) -> Result<Document> {
    let mut events = LiveEvents::new(input, options.budget.clone());
    let mut parser = DocumentParser::new(&mut events, options);
    if case_variants_ok {
        parser = parser.allow_case_variants();
    }
    let mut docs = parser.parse_stream()?;
    match docs.len() {
        0 => Ok(Document::default()),
        1 => Ok(docs.remove(0)),
        count => Err(Error::MultipleDocuments { count }),
    }
}

/// Emit and render a document with default options.
pub fn to_string(doc: &Document) -> Result<String> {
    to_string_with_options(doc, &EmitOptions::default(), &RenderOptions::default())
}

pub fn to_string_with_options(
    doc: &Document,
    emit_options: &EmitOptions,
    render_options: &RenderOptions,
) -> Result<String> {
    let events = emit(&doc.value, &doc.metadata, emit_options)?;
    render(&events, render_options)
}

/// Emit and render several documents as one stream.
pub fn to_string_all(docs: &[Document]) -> Result<String> {
    let events = emit_all(docs, &EmitOptions::default())?;
    render(&events, &RenderOptions::default())
}
