//! Defines error and its location
use std::fmt;

use saphyr_parser::{ScanError, Span};

use crate::budget::BudgetBreach;

/// Row/column location within the source YAML document (1-indexed).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    /// 1-indexed row number in the input stream.
    pub(crate) row: u32,
    /// 1-indexed column number in the input stream.
    pub(crate) column: u32,
}

impl Location {
    /// Sentinel value meaning "location unknown".
    ///
    /// Events replayed from memory and errors raised by the typed mapper carry this value.
    pub const UNKNOWN: Self = Self { row: 0, column: 0 };

    /// Create a new location record from 1-indexed coordinates.
    pub(crate) const fn new(row: usize, column: usize) -> Self {
        Self {
            row: row as u32,
            column: column as u32,
        }
    }

    /// 1-indexed line number.
    pub fn line(&self) -> u64 {
        self.row as u64
    }

    /// 1-indexed column number.
    pub fn column(&self) -> u64 {
        self.column as u64
    }

    fn is_known(&self) -> bool {
        self != &Location::UNKNOWN
    }
}

/// Convert a `saphyr_parser::Span` to a 1-indexed `Location`.
pub(crate) fn location_from_span(span: &Span) -> Location {
    let start = &span.start;
    Location::new(start.line(), start.col() + 1)
}

/// Errors produced while parsing, mapping or emitting documents.
///
/// Structural problems (duplicate keys), tag format problems and converter
/// configuration problems always surface here. Scalar-to-property coercion
/// failures never do: the mapper recovers from those locally.
#[derive(Debug)]
pub enum Error {
    /// Free-form error.
    Message { msg: String },
    /// The tokenizer rejected the input text.
    Scan { msg: String, location: Location },
    /// Unexpected end of the event stream.
    Eof { location: Location },
    /// Something else than the expected event was seen.
    Unexpected {
        expected: &'static str,
        location: Location,
    },
    /// Keys of one mapping collide when compared case-insensitively.
    DuplicateKey {
        keys: Vec<String>,
        path: String,
        location: Location,
    },
    /// A property names a converter that is not registered.
    ConverterResolution { name: String },
    /// A converter declined the tag / target type it was asked to handle.
    ConverterMismatch {
        converter: String,
        tag: Option<String>,
        target_type: String,
    },
    /// A converter accepted a value and then failed to convert it.
    Converter { converter: String, msg: String },
    /// A property typed as an object refers to a class the mapper cannot build.
    UnsupportedNestedType { property: String, type_name: String },
    /// A tagged scalar whose text cannot be parsed as the tag demands.
    ScalarFormat {
        tag: String,
        raw: String,
        location: Location,
    },
    /// The requested target type is not a registered typed class.
    Type { type_name: String },
    /// A YAML budget limit was exceeded while reading events.
    Budget {
        breach: BudgetBreach,
        location: Location,
    },
    /// Nesting went deeper than the configured maximum.
    DepthLimit { depth: usize, max_depth: usize },
    /// A single-document entry point received a stream with several documents.
    MultipleDocuments { count: usize },
    /// Wrapper for formatting errors raised while rendering text.
    Format { error: fmt::Error },
}

impl Error {
    /// Construct a `Message` error.
    pub(crate) fn msg<S: Into<String>>(s: S) -> Self {
        Error::Message { msg: s.into() }
    }

    pub(crate) fn unexpected(what: &'static str) -> Self {
        Error::Unexpected {
            expected: what,
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn eof() -> Self {
        Error::Eof {
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn scalar_format(tag: &str, raw: &str) -> Self {
        Error::ScalarFormat {
            tag: tag.to_string(),
            raw: raw.to_string(),
            location: Location::UNKNOWN,
        }
    }

    /// Attach/override a concrete location to this error and return it.
    ///
    /// Variants that do not describe a position in the input are returned unchanged.
    pub(crate) fn with_location(mut self, set_location: Location) -> Self {
        match &mut self {
            Error::Scan { location, .. }
            | Error::Eof { location }
            | Error::Unexpected { location, .. }
            | Error::DuplicateKey { location, .. }
            | Error::ScalarFormat { location, .. }
            | Error::Budget { location, .. } => {
                if !location.is_known() {
                    *location = set_location;
                }
            }
            _ => {}
        }
        self
    }

    /// If the error has a known location, return it.
    pub fn location(&self) -> Option<Location> {
        match self {
            Error::Scan { location, .. }
            | Error::Eof { location }
            | Error::Unexpected { location, .. }
            | Error::DuplicateKey { location, .. }
            | Error::ScalarFormat { location, .. }
            | Error::Budget { location, .. } => location.is_known().then_some(*location),
            _ => None,
        }
    }

    /// Map a `saphyr_parser::ScanError` into our error type with location.
    pub(crate) fn from_scan_error(err: ScanError) -> Self {
        let mark = err.marker();
        Error::Scan {
            msg: err.info().to_owned(),
            location: Location::new(mark.line(), mark.col() + 1),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Message { msg } => f.write_str(msg),
            Error::Scan { msg, location } => fmt_with_location(f, msg, location),
            Error::Eof { location } => fmt_with_location(f, "unexpected end of input", location),
            Error::Unexpected { expected, location } => {
                fmt_with_location(f, &format!("unexpected event: expected {expected}"), location)
            }
            Error::DuplicateKey {
                keys,
                path,
                location,
            } => {
                let listed = keys
                    .iter()
                    .map(|k| format!("`{k}`"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let at = if path.is_empty() { "<root>" } else { path.as_str() };
                fmt_with_location(
                    f,
                    &format!(
                        "duplicate keys {listed} in mapping `{at}` (keys are compared \
                         case-insensitively); bind each variant to its own property with an \
                         explicit key override"
                    ),
                    location,
                )
            }
            Error::ConverterResolution { name } => {
                write!(f, "converter `{name}` is not registered")
            }
            Error::ConverterMismatch {
                converter,
                tag,
                target_type,
            } => write!(
                f,
                "converter `{converter}` cannot handle tag `{}` for target type `{target_type}`",
                tag.as_deref().unwrap_or("<none>")
            ),
            Error::Converter { converter, msg } => {
                write!(f, "converter `{converter}` failed: {msg}")
            }
            Error::UnsupportedNestedType {
                property,
                type_name,
            } => write!(
                f,
                "property `{property}` has type `{type_name}`, which is not a registered typed class"
            ),
            Error::ScalarFormat { tag, raw, location } => fmt_with_location(
                f,
                &format!("scalar `{raw}` cannot be parsed as required by tag `{tag}`"),
                location,
            ),
            Error::Type { type_name } => {
                write!(f, "`{type_name}` is not a registered typed class")
            }
            Error::Budget { breach, location } => {
                fmt_with_location(f, &format!("YAML budget breached: {breach:?}"), location)
            }
            Error::DepthLimit { depth, max_depth } => {
                write!(f, "nesting depth {depth} exceeds the maximum of {max_depth}")
            }
            Error::MultipleDocuments { count } => write!(
                f,
                "expected a single YAML document, found {count}; use `parse_all` for streams"
            ),
            Error::Format { error } => write!(f, "formatting error: {error}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Format { error } => Some(error),
            _ => None,
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(error: fmt::Error) -> Self {
        Error::Format { error }
    }
}

/// Print a message optionally suffixed with "at line X, column Y".
fn fmt_with_location(f: &mut fmt::Formatter<'_>, msg: &str, location: &Location) -> fmt::Result {
    if location.is_known() {
        write!(
            f,
            "{msg} at line {}, column {}",
            location.row, location.column
        )
    } else {
        write!(f, "{msg}")
    }
}

/// Convert a budget breach report into a user-facing error.
pub(crate) fn budget_error(breach: BudgetBreach) -> Error {
    Error::Budget {
        breach,
        location: Location::UNKNOWN,
    }
}

/// Result alias.
pub type Result<T> = std::result::Result<T, Error>;
