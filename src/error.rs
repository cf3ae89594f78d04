use std::io;

use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ExtractionError {
    #[error("invalid number of json blocks: 0, expected exactly 1")]
    NoMatch,

    #[error("invalid number of json blocks: {count}, expected exactly 1")]
    MultipleMatches { count: usize },

    #[error("read from source failed")]
    Read(#[source] io::Error),

    #[error("write to destination failed")]
    Write(#[source] io::Error),
}

impl ExtractionError {
    /// Number of `json` blocks seen, for the count mismatch variants.
    #[cfg(test)]
    pub(crate) fn match_count(&self) -> Option<usize> {
        match self {
            ExtractionError::NoMatch => Some(0),
            ExtractionError::MultipleMatches { count } => Some(*count),
            ExtractionError::Read(_) | ExtractionError::Write(_) => None,
        }
    }
}
