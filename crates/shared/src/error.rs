use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an item was left out of the script.
///
/// None of these are fatal to a run: a rejected item is simply skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Error, Serialize, Deserialize)]
pub enum ExtractionError {
    /// Nothing usable was left after stripping markup
    #[error("no usable text after normalization")]
    EmptyContent,

    /// Text exists, but no self-contained factual sentence
    #[error("no self-contained factual sentence")]
    NoCleanFact,

    /// The item itself is malformed
    #[error("malformed item")]
    Unparseable,
}
