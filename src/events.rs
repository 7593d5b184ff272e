//! Structural events shared by the parser (consumer), the emitter (producer) and the renderer.

use std::collections::VecDeque;

use crate::error::{Location, Result};
use crate::metadata::{CollectionStyle, ScalarStyle};

/// One structural event of a YAML stream.
///
/// Tags are in shorthand spelling (see [`crate::tags::normalize`]).
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    MappingStart {
        tag: Option<String>,
        style: CollectionStyle,
    },
    MappingEnd,
    SequenceStart {
        tag: Option<String>,
        style: CollectionStyle,
    },
    SequenceEnd,
    Scalar {
        value: String,
        tag: Option<String>,
        style: ScalarStyle,
    },
    /// Comment text without the leading `#` and surrounding blanks.
    ///
    /// `inline` comments trail other content on their line; block comments stand alone.
    Comment { text: String, inline: bool },
    /// Reference to an anchor. Aliases are not resolved.
    Alias { anchor: usize },
}

impl Event {
    pub fn scalar<S: Into<String>>(value: S) -> Self {
        Event::Scalar {
            value: value.into(),
            tag: None,
            style: ScalarStyle::Plain,
        }
    }

    pub fn block_comment<S: Into<String>>(text: S) -> Self {
        Event::Comment {
            text: text.into(),
            inline: false,
        }
    }

    /// Human name of the event kind for diagnostics.
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Event::StreamStart => "stream start",
            Event::StreamEnd => "stream end",
            Event::DocumentStart => "document start",
            Event::DocumentEnd => "document end",
            Event::MappingStart { .. } => "mapping start",
            Event::MappingEnd => "mapping end",
            Event::SequenceStart { .. } => "sequence start",
            Event::SequenceEnd => "sequence end",
            Event::Scalar { .. } => "scalar",
            Event::Comment { .. } => "comment",
            Event::Alias { .. } => "alias",
        }
    }
}

/// Pull-style source of [`Event`]s.
pub trait Events {
    /// Pull the next event from the stream.
    ///
    /// Returns:
    /// - `Ok(Some(Event))` for a real event,
    /// - `Ok(None)` at true end-of-stream,
    /// - `Err(Error)` on tokenizer or budget failure.
    fn next(&mut self) -> Result<Option<Event>>;

    /// Peek at the next event without consuming it.
    fn peek(&mut self) -> Result<Option<&Event>>;

    /// Location of the event most recently returned by `next` or `peek`.
    fn last_location(&self) -> Location;
}

/// Event source that replays a pre-recorded buffer.
pub struct ReplayEvents {
    buf: VecDeque<Event>,
}

impl ReplayEvents {
    pub fn new(events: Vec<Event>) -> Self {
        Self { buf: events.into() }
    }
}

impl Events for ReplayEvents {
    fn next(&mut self) -> Result<Option<Event>> {
        Ok(self.buf.pop_front())
    }

    fn peek(&mut self) -> Result<Option<&Event>> {
        Ok(self.buf.front())
    }

    fn last_location(&self) -> Location {
        Location::UNKNOWN
    }
}
