//! Event sink: renders an event stream as YAML text.
//!
//! The renderer trusts the styles it is handed. Scalar styles were already checked by the
//! emitter, so the only adjustments made here are forced by layout: block scalars and comments
//! cannot appear inside flow collections, and a block scalar cannot be a key.

use std::fmt::Write;

use crate::error::{Error, Result};
use crate::events::Event;
use crate::metadata::{CollectionStyle, ScalarStyle};
use crate::options::RenderOptions;
use crate::quoting::{write_double_quoted, write_single_quoted};
use crate::wrapping::{first_line_leading_spaces, write_folded_body};

/// Render `events` to text. Documents after the first are introduced with `---`.
pub fn render(events: &[Event], options: &RenderOptions) -> Result<String> {
    options.consistent()?;
    let mut renderer = Renderer {
        events,
        pos: 0,
        out: String::new(),
        options,
    };
    renderer.stream()?;
    Ok(renderer.out)
}

/// Where the node being written starts.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// At the start of a line, document level.
    Root,
    /// Right after `key:`.
    Value,
    /// Right after `-`.
    Item,
}

struct Renderer<'a> {
    events: &'a [Event],
    pos: usize,
    out: String,
    options: &'a RenderOptions,
}

impl<'a> Renderer<'a> {
    fn peek(&self) -> Option<&'a Event> {
        self.events.get(self.pos)
    }

    fn next(&mut self) -> Result<&'a Event> {
        let ev = self
            .events
            .get(self.pos)
            .ok_or_else(|| Error::msg("event stream ended inside a document"))?;
        self.pos += 1;
        Ok(ev)
    }

    fn stream(&mut self) -> Result<()> {
        let mut documents = 0usize;
        while let Some(ev) = self.peek() {
            self.pos += 1;
            match ev {
                Event::StreamStart | Event::StreamEnd => {}
                Event::DocumentStart => {
                    if documents > 0 {
                        self.out.push_str("---\n");
                    }
                    documents += 1;
                    self.document()?;
                }
                Event::Comment { text, .. } => self.comment_line(0, text),
                other => {
                    return Err(Error::msg(format!(
                        "{} outside of a document",
                        other.describe()
                    )));
                }
            }
        }
        Ok(())
    }

    fn document(&mut self) -> Result<()> {
        self.block_comments(0);
        if !matches!(self.peek(), Some(Event::DocumentEnd) | None) {
            self.node(0, Slot::Root)?;
        }
        self.block_comments(0);
        match self.peek() {
            Some(Event::DocumentEnd) => {
                self.pos += 1;
                Ok(())
            }
            None => Ok(()),
            Some(other) => Err(Error::msg(format!(
                "expected document end, found {}",
                other.describe()
            ))),
        }
    }

    fn comment_line(&mut self, indent: usize, text: &str) {
        push_indent(&mut self.out, indent);
        if text.is_empty() {
            self.out.push_str("#\n");
        } else {
            self.out.push_str("# ");
            self.out.push_str(text);
            self.out.push('\n');
        }
    }

    /// Write every upcoming comment at `indent`.
    fn block_comments(&mut self, indent: usize) {
        while let Some(Event::Comment { text, .. }) = self.peek() {
            self.pos += 1;
            self.comment_line(indent, text);
        }
    }

    fn skip_comments(&mut self) {
        while let Some(Event::Comment { .. }) = self.peek() {
            self.pos += 1;
        }
    }

    /// Flow collections have no place for comments.
    fn drop_flow_comments(&mut self) {
        while let Some(Event::Comment { text, .. }) = self.peek() {
            log::debug!("comment inside a flow collection dropped: {text}");
            self.pos += 1;
        }
    }

    /// True if the collection starting at `at` has no entries.
    fn is_empty_at(&self, at: usize) -> bool {
        let mut i = at + 1;
        while let Some(Event::Comment { .. }) = self.events.get(i) {
            i += 1;
        }
        matches!(
            self.events.get(i),
            Some(Event::MappingEnd | Event::SequenceEnd)
        )
    }

    /// A block collection without tag whose first entry can share the line of a `-`.
    fn starts_inline_block(&self, at: usize) -> bool {
        match self.events.get(at) {
            Some(
                Event::MappingStart {
                    tag: None,
                    style: CollectionStyle::Block,
                }
                | Event::SequenceStart {
                    tag: None,
                    style: CollectionStyle::Block,
                },
            ) => !self.is_empty_at(at),
            _ => false,
        }
    }

    /// Comments that precede the first entry of a chain of inline block collections starting
    /// at `at`. They are written above the `-` because the first entry shares its line.
    fn hoisted_comments(&self, mut at: usize) -> Vec<&'a str> {
        let mut found = Vec::new();
        while self.starts_inline_block(at) {
            let is_sequence = matches!(self.events.get(at), Some(Event::SequenceStart { .. }));
            at += 1;
            while let Some(Event::Comment { text, .. }) = self.events.get(at) {
                found.push(text.as_str());
                at += 1;
            }
            if !is_sequence {
                break;
            }
        }
        found
    }

    fn node(&mut self, indent: usize, slot: Slot) -> Result<()> {
        let at = self.pos;
        match self.next()? {
            Event::Scalar { value, tag, style } => {
                if slot != Slot::Root {
                    self.out.push(' ');
                }
                write_tag(&mut self.out, tag.as_deref());
                self.scalar(value, *style, indent)
            }
            Event::MappingStart { tag, style } => {
                let tag = tag.as_deref();
                if *style == CollectionStyle::Flow || self.is_empty_at(at) {
                    self.inline_start(tag, slot);
                    self.pos = at;
                    self.flow_node()?;
                    self.out.push('\n');
                    return Ok(());
                }
                let inner = self.open_block(tag, indent, slot);
                self.block_mapping(inner, slot == Slot::Item && tag.is_none())
            }
            Event::SequenceStart { tag, style } => {
                let tag = tag.as_deref();
                if *style == CollectionStyle::Flow || self.is_empty_at(at) {
                    self.inline_start(tag, slot);
                    self.pos = at;
                    self.flow_node()?;
                    self.out.push('\n');
                    return Ok(());
                }
                let inner = self.open_block(tag, indent, slot);
                self.block_sequence(inner, slot == Slot::Item && tag.is_none())
            }
            Event::Alias { .. } => Err(Error::msg("aliases cannot be rendered")),
            other => Err(Error::msg(format!("expected a node, found {}", other.describe()))),
        }
    }

    fn inline_start(&mut self, tag: Option<&str>, slot: Slot) {
        if slot != Slot::Root {
            self.out.push(' ');
        }
        write_tag(&mut self.out, tag);
    }

    /// Start a non-empty block collection and return the indent of its entries.
    fn open_block(&mut self, tag: Option<&str>, indent: usize, slot: Slot) -> usize {
        match slot {
            Slot::Root => {
                if let Some(tag) = tag {
                    self.out.push_str(tag);
                    self.out.push('\n');
                }
                indent
            }
            Slot::Value => {
                if let Some(tag) = tag {
                    self.out.push(' ');
                    self.out.push_str(tag);
                }
                self.out.push('\n');
                indent + self.options.indent_step
            }
            Slot::Item => {
                match tag {
                    Some(tag) => {
                        self.out.push(' ');
                        self.out.push_str(tag);
                        self.out.push('\n');
                    }
                    None => self.out.push(' '),
                }
                indent + 2
            }
        }
    }

    /// Entries of a block mapping. With `inline_first`, the first key continues the current
    /// line and its comments were already written.
    fn block_mapping(&mut self, indent: usize, mut inline_first: bool) -> Result<()> {
        loop {
            if inline_first {
                self.skip_comments();
            } else {
                self.block_comments(indent);
            }
            if let Some(Event::MappingEnd) = self.peek() {
                self.pos += 1;
                return Ok(());
            }
            if !inline_first {
                push_indent(&mut self.out, indent);
            }
            inline_first = false;
            match self.next()? {
                Event::Scalar { value, tag, style } => {
                    write_tag(&mut self.out, tag.as_deref());
                    write_inline_scalar(&mut self.out, value, *style)?;
                    self.out.push(':');
                }
                other => {
                    return Err(Error::msg(format!(
                        "mapping keys must be scalars, found {}",
                        other.describe()
                    )));
                }
            }
            self.node(indent, Slot::Value)?;
        }
    }

    fn block_sequence(&mut self, indent: usize, mut inline_first: bool) -> Result<()> {
        loop {
            if inline_first {
                self.skip_comments();
            } else {
                self.block_comments(indent);
            }
            if let Some(Event::SequenceEnd) = self.peek() {
                self.pos += 1;
                return Ok(());
            }
            if !inline_first {
                for text in self.hoisted_comments(self.pos) {
                    self.comment_line(indent, text);
                }
                push_indent(&mut self.out, indent);
            }
            inline_first = false;
            self.out.push('-');
            self.node(indent, Slot::Item)?;
        }
    }

    /// Write one flow node, consuming its events. Comments inside flow are dropped.
    fn flow_node(&mut self) -> Result<()> {
        self.drop_flow_comments();
        match self.next()? {
            Event::Scalar { value, tag, style } => {
                write_tag(&mut self.out, tag.as_deref());
                write_inline_scalar(&mut self.out, value, *style)
            }
            Event::MappingStart { tag, .. } => {
                write_tag(&mut self.out, tag.as_deref());
                self.out.push('{');
                let mut first = true;
                loop {
                    self.drop_flow_comments();
                    if let Some(Event::MappingEnd) = self.peek() {
                        self.pos += 1;
                        break;
                    }
                    if !first {
                        self.out.push_str(", ");
                    }
                    first = false;
                    self.flow_node()?;
                    self.out.push_str(": ");
                    self.flow_node()?;
                }
                self.out.push('}');
                Ok(())
            }
            Event::SequenceStart { tag, .. } => {
                write_tag(&mut self.out, tag.as_deref());
                self.out.push('[');
                let mut first = true;
                loop {
                    self.drop_flow_comments();
                    if let Some(Event::SequenceEnd) = self.peek() {
                        self.pos += 1;
                        break;
                    }
                    if !first {
                        self.out.push_str(", ");
                    }
                    first = false;
                    self.flow_node()?;
                }
                self.out.push(']');
                Ok(())
            }
            Event::Alias { .. } => Err(Error::msg("aliases cannot be rendered")),
            other => Err(Error::msg(format!(
                "expected a flow node, found {}",
                other.describe()
            ))),
        }
    }

    /// Write a scalar in block context, ending the line.
    fn scalar(&mut self, value: &str, style: ScalarStyle, indent: usize) -> Result<()> {
        match style {
            ScalarStyle::Literal | ScalarStyle::Folded => {
                self.block_scalar(value, style == ScalarStyle::Folded, indent)
            }
            _ => {
                write_inline_scalar(&mut self.out, value, style)?;
                self.out.push('\n');
                Ok(())
            }
        }
    }

    /// `|` / `>` scalar. Chomping follows the trailing line breaks of `value`.
    fn block_scalar(&mut self, value: &str, folded: bool, indent: usize) -> Result<()> {
        let body = value.trim_end_matches('\n');
        let trailing = value.len() - body.len();
        let step = self.options.indent_step;

        self.out.push(if folded { '>' } else { '|' });
        if first_line_leading_spaces(body) > 0 {
            write!(self.out, "{}", step.min(9))?;
        }
        match trailing {
            0 => self.out.push('-'),
            1 => {}
            _ => self.out.push('+'),
        }
        self.out.push('\n');

        let pad = " ".repeat(indent + step.min(9));
        if folded {
            write_folded_body(&mut self.out, body, &pad, self.options.folded_wrap_chars)?;
        } else {
            for line in body.split('\n') {
                if !line.is_empty() {
                    self.out.push_str(&pad);
                    self.out.push_str(line);
                }
                self.out.push('\n');
            }
        }
        if !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        for _ in 1..trailing {
            self.out.push('\n');
        }
        Ok(())
    }
}

fn push_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push(' ');
    }
}

fn write_tag(out: &mut String, tag: Option<&str>) {
    if let Some(tag) = tag {
        out.push_str(tag);
        out.push(' ');
    }
}

/// Scalars that must fit on one line. Block styles fall back to double quotes.
fn write_inline_scalar(out: &mut String, value: &str, style: ScalarStyle) -> Result<()> {
    match style {
        ScalarStyle::Plain => {
            out.push_str(value);
            Ok(())
        }
        ScalarStyle::SingleQuoted => write_single_quoted(out, value),
        ScalarStyle::DoubleQuoted | ScalarStyle::Literal | ScalarStyle::Folded => {
            write_double_quoted(out, value)
        }
    }
}
