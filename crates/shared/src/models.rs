use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ExtractionError;

/// A feed entry exactly as the fetcher produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub source_name: String,
    pub title: String,
    pub link: Url,
    pub published_at: Option<DateTime<Utc>>,
    pub summary_html: String,
}

/// Plain-text view of a feed entry, limited to its first paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedItem {
    pub source_name: String,
    pub title: String,
    pub link: Url,
    pub excerpt_text: String,
}

/// Verdict of the fact extractor for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Accepted { fact_text: String },
    Rejected { reason: ExtractionError },
}

/// An accepted fact with its attribution applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedFact {
    pub source_name: String,
    /// Headline and link travel along for the show notes; they never reach the script
    pub title: String,
    pub link: Url,
    pub fact_text: String,
    pub display_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub intro: String,
    pub facts: Vec<TaggedFact>,
    pub outro: String,
}

impl Script {
    /// True when no fact survived extraction; the episode still goes out
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// One story credited in the show notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowNote {
    pub source_name: String,
    pub title: String,
    pub link: Url,
}

/// Complete output of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub date: NaiveDate,
    pub title: String,
    pub script_text: String,
    pub fact_count: usize,
    /// Unknown until audio exists
    pub duration_secs: Option<u64>,
    pub show_notes: Vec<ShowNote>,
}

impl Episode {
    pub fn is_empty(&self) -> bool {
        self.fact_count == 0
    }
}

/// What the publisher keeps about an episode so the feed can be rebuilt later
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedEpisode {
    pub version: String,
    pub episode: Episode,
    /// File name under `episodes/`, absent when no audio was produced
    pub audio_file: Option<String>,
    pub audio_bytes: u64,
    pub published_at: DateTime<FixedOffset>,
}

impl PublishedEpisode {
    pub fn new(
        episode: Episode,
        audio_file: Option<String>,
        audio_bytes: u64,
        published_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            version: "1.0".to_string(),
            episode,
            audio_file,
            audio_bytes,
            published_at,
        }
    }
}
