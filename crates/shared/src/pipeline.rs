use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::attribution;
use crate::episode;
use crate::error::ExtractionError;
use crate::extractor;
use crate::models::{Episode, Extraction, RawItem, Script, TaggedFact};
use crate::normalizer;
use crate::script::ScriptAssembler;

/// Result of one pass over a batch of feed items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub script: Script,
    pub episode: Episode,
    /// Items that produced a fact, before the cap was applied
    pub accepted: usize,
    pub rejected: BTreeMap<ExtractionError, usize>,
}

impl RunOutcome {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

pub struct Pipeline {
    assembler: ScriptAssembler,
    show_title: String,
}

impl Pipeline {
    pub fn new(assembler: ScriptAssembler, show_title: impl Into<String>) -> Self {
        Self {
            assembler,
            show_title: show_title.into(),
        }
    }

    /// Run normalize → extract → tag on every item, then assemble and package.
    ///
    /// `items` must be in feed order. Rejected items are skipped, never fatal.
    pub fn run(&self, items: &[RawItem], now: NaiveDateTime) -> RunOutcome {
        let mut facts: Vec<TaggedFact> = Vec::new();
        let mut rejected: BTreeMap<ExtractionError, usize> = BTreeMap::new();

        for item in items {
            match process_item(item) {
                Ok(fact) => facts.push(fact),
                Err(reason) => {
                    debug!(
                        source = %item.source_name,
                        title = %item.title,
                        %reason,
                        "Skipping item"
                    );
                    *rejected.entry(reason).or_default() += 1;
                }
            }
        }

        let accepted = facts.len();
        let script = self.assembler.assemble(facts, now);
        let episode = episode::package(&script, now.date(), &self.show_title);

        info!(
            items = items.len(),
            accepted,
            included = episode.fact_count,
            "Assembled script"
        );

        RunOutcome {
            script,
            episode,
            accepted,
            rejected,
        }
    }
}

/// Carry one raw item through the per-item stages.
pub fn process_item(item: &RawItem) -> Result<TaggedFact, ExtractionError> {
    let normalized = normalizer::normalize(item)?;
    let verdict = extractor::extract(&normalized);

    match &verdict {
        Extraction::Rejected { reason } => Err(*reason),
        Extraction::Accepted { .. } => {
            attribution::tag(&normalized, &verdict).ok_or(ExtractionError::NoCleanFact)
        }
    }
}
