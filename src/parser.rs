//! Document parser: events → (`Value`, `MetadataStore`).
//!
//! Recursive descent over an [`Events`] source. Every node's tag and style land on the metadata
//! node passed into [`DocumentParser::parse_node`], which the caller then files under the key or
//! index the node was found at. Comments are attached as they are drained:
//!
//! - an inline comment belongs to the entry that precedes it on its line,
//! - a block comment belongs to the entry that follows it. It waits in `pending` until the next
//!   key or item appears, even if that is in an enclosing collection.

use std::collections::HashMap;

use crate::error::{Error, Location, Result, budget_error};
use crate::budget::BudgetBreach;
use crate::events::{Event, Events};
use crate::metadata::{MetaKey, MetadataStore, format_path};
use crate::options::{DuplicateKeyPolicy, ParseOptions};
use crate::parse_scalars::parse_scalar;
use crate::value::{Document, Value};

pub(crate) struct DocumentParser<'e, E: Events> {
    events: &'e mut E,
    duplicate_keys: DuplicateKeyPolicy,
    yaml11_booleans: bool,
    max_depth: Option<usize>,
    /// Keys differing only by case are left for the typed mapper to judge.
    case_variants_ok: bool,
    /// Block comment lines waiting for the next key or item.
    pending: Option<String>,
}

impl<'e, E: Events> DocumentParser<'e, E> {
    pub(crate) fn new(events: &'e mut E, options: &ParseOptions) -> Self {
        Self {
            events,
            duplicate_keys: options.duplicate_keys,
            yaml11_booleans: options.yaml11_booleans,
            max_depth: options.budget.as_ref().map(|b| b.max_depth),
            case_variants_ok: false,
            pending: None,
        }
    }

    pub(crate) fn allow_case_variants(mut self) -> Self {
        self.case_variants_ok = true;
        self
    }

    /// Parse every document of the stream.
    pub(crate) fn parse_stream(&mut self) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        while let Some(ev) = self.events.next()? {
            match ev {
                Event::StreamStart | Event::StreamEnd => {}
                Event::DocumentStart => docs.push(self.parse_document()?),
                // Comments ahead of an implicit document start belong to its first entry.
                Event::Comment { text, .. } => self.pend(&text),
                other => {
                    return Err(self.unexpected("document start", &other));
                }
            }
        }
        if let Some(dropped) = self.pending.take() {
            log::debug!("comment after the last document dropped: {dropped}");
        }
        Ok(docs)
    }

    fn parse_document(&mut self) -> Result<Document> {
        log::trace!("parsing document at line {}", self.events.last_location().line());
        let mut metadata = MetadataStore::new();
        let mut path = Vec::new();

        self.drain_block_comments()?;
        let value = match self.events.peek()? {
            Some(Event::DocumentEnd) | None => Value::Null,
            Some(_) => self.parse_node(&mut metadata, 1, &mut path)?,
        };

        self.drain_block_comments()?;
        match self.events.next()? {
            Some(Event::DocumentEnd) | None => {}
            Some(other) => return Err(self.unexpected("document end", &other)),
        }
        if let Some(dropped) = self.pending.take() {
            log::debug!("trailing comment at end of document dropped: {dropped}");
        }
        Ok(Document::new(value, metadata))
    }

    fn pend(&mut self, text: &str) {
        match &mut self.pending {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(text);
            }
            None => self.pending = Some(text.to_string()),
        }
    }

    /// Move every upcoming comment, inline or not, into `pending`.
    fn drain_block_comments(&mut self) -> Result<()> {
        while let Some(Event::Comment { .. }) = self.events.peek()? {
            if let Some(Event::Comment { text, .. }) = self.events.next()? {
                self.pend(&text);
            }
        }
        Ok(())
    }

    /// Drain upcoming comments. Inline ones go to `owner` when there is one.
    fn drain_comments(&mut self, mut owner: Option<&mut MetadataStore>) -> Result<()> {
        while let Some(Event::Comment { .. }) = self.events.peek()? {
            let Some(Event::Comment { text, inline }) = self.events.next()? else {
                break;
            };
            match owner.as_deref_mut() {
                Some(node) if inline => node.append_comment(&text),
                _ => self.pend(&text),
            }
        }
        Ok(())
    }

    fn next_event(&mut self) -> Result<Event> {
        match self.events.next()? {
            Some(ev) => Ok(ev),
            None => Err(Error::eof().with_location(self.events.last_location())),
        }
    }

    fn unexpected(&self, expected: &'static str, got: &Event) -> Error {
        log::debug!("expected {expected}, got {}", got.describe());
        Error::unexpected(expected).with_location(self.events.last_location())
    }

    fn location(&self) -> Location {
        self.events.last_location()
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        match self.max_depth {
            Some(max) if depth > max => {
                Err(budget_error(BudgetBreach::Depth { depth }).with_location(self.location()))
            }
            _ => Ok(()),
        }
    }

    /// Parse one node, recording its tag and style on `meta`.
    fn parse_node(
        &mut self,
        meta: &mut MetadataStore,
        depth: usize,
        path: &mut Vec<MetaKey>,
    ) -> Result<Value> {
        self.drain_block_comments()?;
        match self.next_event()? {
            Event::Scalar { value, tag, style } => {
                meta.set_scalar_style(Some(style));
                meta.set_tag(tag.clone());
                parse_scalar(&value, style, tag.as_deref(), self.yaml11_booleans)
                    .map_err(|err| err.with_location(self.location()))
            }
            Event::MappingStart { tag, style } => {
                self.check_depth(depth)?;
                meta.set_mapping_style(Some(style));
                meta.set_tag(tag);
                self.parse_mapping(meta, depth, path)
            }
            Event::SequenceStart { tag, style } => {
                self.check_depth(depth)?;
                meta.set_sequence_style(Some(style));
                meta.set_tag(tag);
                self.parse_sequence(meta, depth, path)
            }
            Event::Alias { anchor } => {
                log::warn!(
                    "alias *{anchor} at `{}` read as null; aliases are not resolved",
                    format_path(path)
                );
                Ok(Value::Null)
            }
            other => Err(self.unexpected("node", &other)),
        }
    }

    fn parse_key(&mut self) -> Result<String> {
        match self.next_event()? {
            Event::Scalar { value, tag, .. } => {
                if let Some(tag) = tag {
                    log::debug!("tag {tag} on mapping key `{value}` ignored");
                }
                Ok(value)
            }
            other => Err(self.unexpected("scalar mapping key", &other)),
        }
    }

    fn parse_mapping(
        &mut self,
        meta: &mut MetadataStore,
        depth: usize,
        path: &mut Vec<MetaKey>,
    ) -> Result<Value> {
        let mut entries: Vec<(String, Value)> = Vec::new();
        // lower-cased key -> distinct spellings seen so far
        let mut spellings: HashMap<String, Vec<String>> = HashMap::new();
        let mut last_key: Option<String> = None;

        loop {
            let owner = match &last_key {
                Some(k) => Some(meta.nested_mut(k.as_str())),
                None => None,
            };
            self.drain_comments(owner)?;

            match self.events.peek()? {
                Some(Event::MappingEnd) => {
                    self.events.next()?;
                    break;
                }
                None => return Err(Error::eof().with_location(self.location())),
                Some(_) => {}
            }

            let key = self.parse_key()?;
            let key_location = self.location();

            let mut child = MetadataStore::new();
            child.set_comment(self.pending.take());
            self.drain_comments(Some(&mut child))?;

            path.push(MetaKey::from(key.as_str()));
            let value = self.parse_node(&mut child, depth + 1, path)?;
            path.pop();

            let variants = spellings.entry(key.to_lowercase()).or_default();
            let exact_repeat = variants.contains(&key);
            if !exact_repeat {
                variants.push(key.clone());
            }
            let collides = exact_repeat || (variants.len() > 1 && !self.case_variants_ok);
            if collides && !self.duplicate_keys.allows_duplicates() {
                return Err(Error::DuplicateKey {
                    keys: variants.clone(),
                    path: format_path(path),
                    location: key_location,
                });
            }

            if exact_repeat {
                match self.duplicate_keys {
                    DuplicateKeyPolicy::LastWins => {
                        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
                            slot.1 = value;
                        }
                        meta.insert_nested(key.as_str(), child);
                    }
                    _ => log::debug!("repeated key `{key}` ignored, first value kept"),
                }
            } else {
                entries.push((key.clone(), value));
                meta.insert_nested(key.as_str(), child);
            }
            last_key = Some(key);
        }

        Ok(Value::Mapping(entries))
    }

    fn parse_sequence(
        &mut self,
        meta: &mut MetadataStore,
        depth: usize,
        path: &mut Vec<MetaKey>,
    ) -> Result<Value> {
        let mut items = Vec::new();

        loop {
            let owner = match items.len() {
                0 => None,
                n => Some(meta.nested_mut(n - 1)),
            };
            self.drain_comments(owner)?;

            match self.events.peek()? {
                Some(Event::SequenceEnd) => {
                    self.events.next()?;
                    break;
                }
                None => return Err(Error::eof().with_location(self.location())),
                Some(_) => {}
            }

            let index = items.len();
            let mut child = MetadataStore::new();
            child.set_comment(self.pending.take());

            path.push(MetaKey::Index(index));
            let value = self.parse_node(&mut child, depth + 1, path)?;
            path.pop();

            items.push(value);
            meta.insert_nested(index, child);
        }

        Ok(Value::Sequence(items))
    }
}

/// Parse every document produced by `events`.
pub fn parse_events<E: Events>(events: &mut E, options: &ParseOptions) -> Result<Vec<Document>> {
    DocumentParser::new(events, options).parse_stream()
}
