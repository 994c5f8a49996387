// Public modules
pub mod attribution;
pub mod config;
pub mod episode;
pub mod error;
pub mod extractor;
pub mod feeds;
pub mod io;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod publish;
pub mod script;
pub mod tts;

// Re-export commonly used types
pub use config::{Config, FeedSource, FeedsConfig};
pub use error::ExtractionError;
pub use feeds::FeedFetcher;
pub use models::{
    Episode, Extraction, NormalizedItem, PublishedEpisode, RawItem, Script, ShowNote, TaggedFact,
};
pub use pipeline::{Pipeline, RunOutcome};
pub use publish::SiteWriter;
pub use script::{ScriptAssembler, DEFAULT_MAX_ITEMS};
pub use tts::SpeechSynthesizer;
