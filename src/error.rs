//! Error types for the recommender

use std::path::PathBuf;

use thiserror::Error;

use crate::vectorizer::corpus::BookId;

/// Result type alias for recommender operations
pub type Result<T> = std::result::Result<T, RecommenderError>;

#[derive(Error, Debug)]
pub enum RecommenderError {
    /// Fit was asked to build a model from zero books
    #[error("cannot fit a model on an empty corpus")]
    EmptyCorpus,

    /// Every token was a stop word or too short
    #[error("vocabulary is empty after stop-word removal")]
    DegenerateVocabulary,

    /// Two corpus items share a book id
    #[error("book {0} appears more than once in the corpus")]
    DuplicateBookId(BookId),

    #[error("corpus has {len} books, limit is {max}")]
    CorpusTooLarge { len: usize, max: usize },

    /// No artifact has been built or loaded yet
    #[error("no model artifact at {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("row {row} out of range for a model with {rows} rows")]
    IndexOutOfRange { row: usize, rows: usize },

    /// The book id has no row in the current model
    #[error("book {0} is not part of the current model")]
    UnknownBook(BookId),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Loaded artifact breaks a model invariant
    #[error("corrupt model artifact: {0}")]
    CorruptArtifact(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact encoding error: {0}")]
    Codec(#[from] serde_cbor::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl RecommenderError {
    /// Errors caused by the caller's arguments; rejected, never retried
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfRange { .. } | Self::UnknownBook(_) | Self::InvalidArgument(_)
        )
    }

    /// Errors a caller can recover from by triggering a rebuild
    pub fn needs_rebuild(&self) -> bool {
        matches!(self, Self::ModelNotFound(_) | Self::CorruptArtifact(_))
    }
}
