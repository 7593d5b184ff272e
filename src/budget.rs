//! Streaming YAML budget checker.
//!
//! The live event source feeds every tokenizer event and every recovered comment through a
//! [`BudgetEnforcer`] before the parser sees it, so oversized or hostile inputs are rejected
//! before a value tree is built for them.

use std::collections::HashSet;

use saphyr_parser::{Event, Parser};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Limits checked while the input is tokenized.
///
/// The defaults leave room for large configuration files.
///
/// ```rust
/// use saphyr_meta::{Budget, ParseOptions};
///
/// let options = ParseOptions {
///     budget: Some(Budget {
///         max_nodes: 8,
///         ..Budget::default()
///     }),
///     ..ParseOptions::default()
/// };
///
/// let small = saphyr_meta::parse_str_with_options("a: 1\nb: 2\n", &options);
/// assert!(small.is_ok());
///
/// let big = saphyr_meta::parse_str_with_options("[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]", &options);
/// assert!(big.is_err());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Budget {
    /// Tokenizer events, comments not included. Default 1,000,000.
    pub max_events: usize,
    /// `*alias` events. Each alias reads as null. Default 50,000.
    pub max_aliases: usize,
    /// Distinct `&anchor` names. Default 50,000.
    pub max_anchors: usize,
    /// Collection nesting. Default 2,000.
    pub max_depth: usize,
    /// Documents in one stream. Default 1,024.
    pub max_documents: usize,
    /// Scalars plus collection starts. Default 250,000.
    pub max_nodes: usize,
    /// Bytes summed over all scalar texts. Default 64 MiB.
    pub max_total_scalar_bytes: usize,
    /// Comment lines. Default 250,000.
    pub max_comments: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_events: 1_000_000,
            max_aliases: 50_000,
            max_anchors: 50_000,
            max_depth: 2_000,
            max_documents: 1_024,
            max_nodes: 250_000,
            max_total_scalar_bytes: 64 * 1024 * 1024,
            max_comments: 250_000,
        }
    }
}

/// What tripped the budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetBreach {
    /// More events than [`Budget::max_events`].
    Events { events: usize },
    /// More aliases than [`Budget::max_aliases`].
    Aliases { aliases: usize },
    /// More distinct anchors than [`Budget::max_anchors`].
    Anchors { anchors: usize },
    /// Nesting deeper than [`Budget::max_depth`].
    Depth { depth: usize },
    /// More documents than [`Budget::max_documents`].
    Documents { documents: usize },
    /// More nodes than [`Budget::max_nodes`].
    Nodes { nodes: usize },
    /// More scalar bytes than [`Budget::max_total_scalar_bytes`].
    ScalarBytes { total_scalar_bytes: usize },
    /// More comment lines than [`Budget::max_comments`].
    Comments { comments: usize },
    /// A closing event without a matching opening event.
    Unbalanced,
}

/// Counters accumulated during a scan.
#[derive(Clone, Debug, Default)]
pub struct BudgetReport {
    /// `Some(..)` if a limit was exceeded.
    pub breached: Option<BudgetBreach>,
    pub events: usize,
    pub aliases: usize,
    pub anchors: usize,
    pub documents: usize,
    pub nodes: usize,
    /// Deepest nesting seen.
    pub max_depth: usize,
    pub total_scalar_bytes: usize,
    pub comments: usize,
}

/// Stateful helper that enforces a [`Budget`] while consuming tokenizer events.
#[derive(Debug)]
pub struct BudgetEnforcer {
    budget: Budget,
    report: BudgetReport,
    depth: usize,
    defined_anchors: HashSet<usize>,
}

impl BudgetEnforcer {
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            report: BudgetReport::default(),
            depth: 0,
            defined_anchors: HashSet::with_capacity(64),
        }
    }

    /// Observe a tokenizer event, failing as soon as a limit is exceeded.
    pub fn observe(&mut self, ev: &Event) -> std::result::Result<(), BudgetBreach> {
        self.report.events += 1;
        if self.report.events > self.budget.max_events {
            return Err(BudgetBreach::Events {
                events: self.report.events,
            });
        }

        match ev {
            Event::DocumentStart(_) => {
                self.report.documents += 1;
                if self.report.documents > self.budget.max_documents {
                    return Err(BudgetBreach::Documents {
                        documents: self.report.documents,
                    });
                }
            }
            Event::Alias(_) => {
                self.report.aliases += 1;
                if self.report.aliases > self.budget.max_aliases {
                    return Err(BudgetBreach::Aliases {
                        aliases: self.report.aliases,
                    });
                }
            }
            Event::Scalar(value, _style, anchor_id, _tag) => {
                self.bump_nodes()?;
                self.report.total_scalar_bytes =
                    self.report.total_scalar_bytes.saturating_add(value.len());
                if self.report.total_scalar_bytes > self.budget.max_total_scalar_bytes {
                    return Err(BudgetBreach::ScalarBytes {
                        total_scalar_bytes: self.report.total_scalar_bytes,
                    });
                }
                self.record_anchor(*anchor_id)?;
            }
            Event::SequenceStart(anchor_id, _) | Event::MappingStart(anchor_id, _) => {
                self.bump_nodes()?;
                self.depth = self.depth.saturating_add(1);
                if self.depth > self.report.max_depth {
                    self.report.max_depth = self.depth;
                }
                if self.report.max_depth > self.budget.max_depth {
                    return Err(BudgetBreach::Depth {
                        depth: self.report.max_depth,
                    });
                }
                self.record_anchor(*anchor_id)?;
            }
            Event::SequenceEnd | Event::MappingEnd => {
                self.depth = self
                    .depth
                    .checked_sub(1)
                    .ok_or(BudgetBreach::Unbalanced)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Count one recovered comment line.
    pub fn observe_comment(&mut self) -> std::result::Result<(), BudgetBreach> {
        self.report.comments += 1;
        if self.report.comments > self.budget.max_comments {
            return Err(BudgetBreach::Comments {
                comments: self.report.comments,
            });
        }
        Ok(())
    }

    fn bump_nodes(&mut self) -> std::result::Result<(), BudgetBreach> {
        self.report.nodes += 1;
        if self.report.nodes > self.budget.max_nodes {
            return Err(BudgetBreach::Nodes {
                nodes: self.report.nodes,
            });
        }
        Ok(())
    }

    fn record_anchor(&mut self, anchor_id: usize) -> std::result::Result<(), BudgetBreach> {
        if anchor_id != 0 && self.defined_anchors.insert(anchor_id) {
            let count = self.defined_anchors.len();
            if count > self.budget.max_anchors {
                self.report.anchors = count;
                return Err(BudgetBreach::Anchors { anchors: count });
            }
        }
        self.report.anchors = self.defined_anchors.len();
        Ok(())
    }

    /// Consume the enforcer and return what it counted.
    pub fn finalize(mut self) -> BudgetReport {
        self.report.anchors = self.defined_anchors.len();
        self.report
    }
}

/// Scan `input` against `budget` without building a value tree.
///
/// `Ok(report)` with `report.breached == None` means the input is within budget. Comments are
/// not counted here; the parser counts them while it runs.
pub fn check_budget(input: &str, budget: &Budget) -> Result<BudgetReport> {
    let mut parser = Parser::new_from_str(input);
    let mut enforcer = BudgetEnforcer::new(budget.clone());

    while let Some(item) = parser.next() {
        let (ev, _span) = item.map_err(Error::from_scan_error)?;
        if let Err(breach) = enforcer.observe(&ev) {
            let mut report = enforcer.finalize();
            report.breached = Some(breach);
            return Ok(report);
        }
    }
    Ok(enforcer.finalize())
}
