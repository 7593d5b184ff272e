//! Live events: the text-backed event source.
//!
//! Responsibilities
//! - Run `saphyr_parser::Parser` over the input and translate its events into [`Event`]s.
//! - Normalize tags into shorthand spelling.
//! - Decide flow vs block layout for every collection from the source text.
//! - Recover comments (the tokenizer drops them) and interleave them by position.
//! - Enforce the optional [`Budget`].
//!
//! Anchors are discarded and aliases pass through as [`Event::Alias`]; the document parser reads
//! them as null.
//!
//! The whole input is tokenized on the first pull. Comment recovery needs the span of every
//! scalar in the stream before it can tell a `#` inside quoted text from a real comment.

use std::collections::VecDeque;

use saphyr_parser::{Event as RawEvent, Parser, ScalarStyle as RawScalarStyle};

use crate::budget::{Budget, BudgetEnforcer};
use crate::comments::scan_comments;
use crate::error::{Error, Location, Result, budget_error, location_from_span};
use crate::events::{Event, Events};
use crate::metadata::{CollectionStyle, ScalarStyle};
use crate::tags;

/// Event source over YAML text.
pub(crate) struct LiveEvents<'a> {
    input: &'a str,
    budget: Option<Budget>,
    queue: VecDeque<(Event, Location)>,
    filled: bool,
    last_location: Location,
}

impl<'a> LiveEvents<'a> {
    pub(crate) fn new(input: &'a str, budget: Option<Budget>) -> Self {
        Self {
            input,
            budget,
            queue: VecDeque::new(),
            filled: false,
            last_location: Location::UNKNOWN,
        }
    }

    fn ensure_filled(&mut self) -> Result<()> {
        if self.filled {
            return Ok(());
        }
        self.filled = true;

        let chars: Vec<char> = self.input.chars().collect();
        let mut enforcer = self.budget.take().map(BudgetEnforcer::new);
        let mut parser = Parser::new_from_str(self.input);

        let mut translated: Vec<(Event, usize, Location)> = Vec::new();
        let mut scalar_spans = Vec::new();
        // Flow flag per open collection; anything nested in flow is flow too.
        let mut flow_stack: Vec<bool> = Vec::new();

        while let Some(item) = parser.next() {
            let (raw, span) = item.map_err(Error::from_scan_error)?;
            let location = location_from_span(&span);
            let index = span.start.index();

            if let Some(budget) = enforcer.as_mut() {
                budget
                    .observe(&raw)
                    .map_err(|breach| budget_error(breach).with_location(location))?;
            }

            let ev = match raw {
                RawEvent::StreamStart => Event::StreamStart,
                RawEvent::StreamEnd => Event::StreamEnd,
                RawEvent::DocumentStart(_) => Event::DocumentStart,
                RawEvent::DocumentEnd => Event::DocumentEnd,
                RawEvent::Scalar(value, style, anchor_id, tag) => {
                    scalar_spans.push(index..span.end.index());
                    warn_anchor(anchor_id, location);
                    Event::Scalar {
                        value: value.into_owned(),
                        tag: tag.map(|t| tags::normalize(&t.to_string())),
                        style: scalar_style(style),
                    }
                }
                RawEvent::MappingStart(anchor_id, tag) => {
                    warn_anchor(anchor_id, location);
                    let style = open_collection(&mut flow_stack, &chars, index, '{');
                    Event::MappingStart {
                        tag: tag.map(|t| tags::normalize(&t.to_string())),
                        style,
                    }
                }
                RawEvent::SequenceStart(anchor_id, tag) => {
                    warn_anchor(anchor_id, location);
                    let style = open_collection(&mut flow_stack, &chars, index, '[');
                    Event::SequenceStart {
                        tag: tag.map(|t| tags::normalize(&t.to_string())),
                        style,
                    }
                }
                RawEvent::MappingEnd => {
                    flow_stack.pop();
                    Event::MappingEnd
                }
                RawEvent::SequenceEnd => {
                    flow_stack.pop();
                    Event::SequenceEnd
                }
                RawEvent::Alias(anchor) => Event::Alias { anchor },
                RawEvent::Nothing => continue,
            };
            translated.push((ev, index, location));
        }

        let comments = scan_comments(&chars, &scalar_spans);
        let mut comments = comments.into_iter().peekable();
        for (ev, index, location) in translated {
            while let Some(comment) = comments.next_if(|c| c.index < index) {
                if let Some(budget) = enforcer.as_mut() {
                    budget
                        .observe_comment()
                        .map_err(|breach| budget_error(breach).with_location(comment.location))?;
                }
                self.queue.push_back((
                    Event::Comment {
                        text: comment.text,
                        inline: comment.inline,
                    },
                    comment.location,
                ));
            }
            self.queue.push_back((ev, location));
        }
        Ok(())
    }
}

fn warn_anchor(anchor_id: usize, location: Location) {
    if anchor_id != 0 {
        log::warn!(
            "anchor at line {}, column {} is discarded",
            location.line(),
            location.column()
        );
    }
}

fn scalar_style(style: RawScalarStyle) -> ScalarStyle {
    match style {
        RawScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        RawScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        RawScalarStyle::Literal => ScalarStyle::Literal,
        RawScalarStyle::Folded => ScalarStyle::Folded,
        _ => ScalarStyle::Plain,
    }
}

/// Push the layout of a collection that starts at `index` and return it.
fn open_collection(
    flow_stack: &mut Vec<bool>,
    chars: &[char],
    index: usize,
    open: char,
) -> CollectionStyle {
    let flow = flow_stack.last().copied().unwrap_or(false) || first_content_char(chars, index) == Some(open);
    flow_stack.push(flow);
    if flow {
        CollectionStyle::Flow
    } else {
        CollectionStyle::Block
    }
}

/// First char at or after `index` that is not blank, a tag or an anchor.
fn first_content_char(chars: &[char], mut i: usize) -> Option<char> {
    loop {
        match *chars.get(i)? {
            '!' | '&' => {
                while chars.get(i).is_some_and(|c| !c.is_whitespace()) {
                    i += 1;
                }
            }
            c if c.is_whitespace() => i += 1,
            c => return Some(c),
        }
    }
}

impl<'a> Events for LiveEvents<'a> {
    fn next(&mut self) -> Result<Option<Event>> {
        self.ensure_filled()?;
        Ok(self.queue.pop_front().map(|(ev, location)| {
            self.last_location = location;
            ev
        }))
    }

    fn peek(&mut self) -> Result<Option<&Event>> {
        self.ensure_filled()?;
        if let Some((_, location)) = self.queue.front() {
            self.last_location = *location;
        }
        Ok(self.queue.front().map(|(ev, _)| ev))
    }

    fn last_location(&self) -> Location {
        self.last_location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &str) -> Vec<Event> {
        let mut events = LiveEvents::new(input, None);
        let mut out = Vec::new();
        while let Some(ev) = events.next().unwrap() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn flow_and_block_are_told_apart() {
        let evs = collect("a: {b: [1]}\nc:\n  - 2\n");
        let styles: Vec<CollectionStyle> = evs
            .iter()
            .filter_map(|e| match e {
                Event::MappingStart { style, .. } | Event::SequenceStart { style, .. } => {
                    Some(*style)
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            styles,
            vec![
                CollectionStyle::Block,
                CollectionStyle::Flow,
                CollectionStyle::Flow,
                CollectionStyle::Block
            ]
        );
    }

    #[test]
    fn comments_are_interleaved() {
        let evs = collect("# top\na: 1 # one\nb: 2\n");
        let pos_top = evs
            .iter()
            .position(|e| matches!(e, Event::Comment { text, inline: false } if text == "top"))
            .unwrap();
        let pos_one = evs
            .iter()
            .position(|e| matches!(e, Event::Comment { text, inline: true } if text == "one"))
            .unwrap();
        let pos_b = evs
            .iter()
            .position(|e| matches!(e, Event::Scalar { value, .. } if value == "b"))
            .unwrap();
        assert!(pos_top < pos_one && pos_one < pos_b);
    }

    #[test]
    fn tags_are_shorthand() {
        let evs = collect("n: !!int \"42\"\nc: !color red\n");
        let tags: Vec<Option<String>> = evs
            .iter()
            .filter_map(|e| match e {
                Event::Scalar { tag, .. } => Some(tag.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            tags,
            vec![
                None,
                Some("!!int".to_string()),
                None,
                Some("!color".to_string())
            ]
        );
    }
}
