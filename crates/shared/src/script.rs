use anyhow::Result;
use chrono::{NaiveDateTime, Timelike};
use tracing::debug;

use crate::models::{Script, TaggedFact};

pub const DEFAULT_MAX_ITEMS: usize = 12;

/// Orders tagged facts into a script between fixed intro and outro lines
#[derive(Debug, Clone)]
pub struct ScriptAssembler {
    show_title: String,
    max_items: usize,
}

impl ScriptAssembler {
    pub fn new(show_title: impl Into<String>, max_items: usize) -> Result<Self> {
        anyhow::ensure!(max_items > 0, "MAX_ITEMS must be a positive integer");

        Ok(Self {
            show_title: show_title.into(),
            max_items,
        })
    }

    /// `facts` must already be in feed order; the earliest `max_items` are kept.
    pub fn assemble(&self, facts: Vec<TaggedFact>, now: NaiveDateTime) -> Script {
        let available = facts.len();
        let facts: Vec<TaggedFact> = facts.into_iter().take(self.max_items).collect();

        if available > facts.len() {
            debug!(
                dropped = available - facts.len(),
                max_items = self.max_items,
                "Dropped facts beyond the item cap"
            );
        }

        let outro = if facts.is_empty() {
            self.empty_outro()
        } else {
            self.outro(now)
        };

        Script {
            intro: self.intro(now),
            facts,
            outro,
        }
    }

    fn intro(&self, now: NaiveDateTime) -> String {
        // Format as "Monday, October 19, 2026"
        let date = now.format("%A, %B %-d, %Y");
        format!(
            "{}, it's {}. This is the {}.",
            greeting(now.hour()),
            date,
            self.show_title
        )
    }

    fn outro(&self, now: NaiveDateTime) -> String {
        format!(
            "That's the {} for {}. Every story you heard was credited to the outlet that reported it. Thanks for listening.",
            self.show_title,
            now.format("%B %-d")
        )
    }

    fn empty_outro(&self) -> String {
        format!(
            "We couldn't find any stories we could attribute cleanly today, so that's all for the {}. Thanks for listening.",
            self.show_title
        )
    }
}

fn greeting(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Good morning",
        12..=16 => "Good afternoon",
        17..=21 => "Good evening",
        _ => "Hello",
    }
}
