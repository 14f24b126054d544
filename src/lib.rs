//! Content-based book recommender over TF-IDF vectors of book descriptions.

pub mod config;
pub mod error;
pub mod model;
pub mod service;
pub mod utils;
pub mod vectorizer;

/// Recommender Service
/// The value the host application owns: loads or builds the model at startup,
/// swaps in a fresh model after every corpus change, and answers
/// "similar to this book" / "similar to this text" queries.
///
/// Queries read a snapshot of the current model and run concurrently;
/// rebuilds are serialized and never expose a half-built model.
pub use service::RecommenderService;

/// Settings for fitting and persistence, loadable from TOML.
pub use config::RecommenderConfig;

/// Error type and result alias of every fallible operation.
pub use error::{RecommenderError, Result};

/// TF-IDF Vectorizer
/// Fits the vector space over an ordered corpus:
/// - normalizes and stems descriptions
/// - keeps the top `max_features` terms (stop words excluded)
/// - weighs each book with smoothed IDF and L2-normalizes it
/// - optionally precomputes the all-pairs cosine similarity matrix
pub use vectorizer::{FitSettings, TFIDFVectorizer};

/// Text normalizer shared by fit and query.
pub use vectorizer::analyzer::Analyzer;

/// Corpus input: one `CorpusItem` per book, identified by `BookId`.
pub use vectorizer::corpus::{BookId, CorpusItem};

/// Token occurrence counts of one document.
pub use vectorizer::token::TokenFrequency;

/// Frozen vocabulary with IDF weights, and the TF scaling it applies.
pub use vectorizer::tfidf::{TfWeighting, Vocabulary};

/// Fitted space answering top-k queries by row, book id, or free text.
pub use vectorizer::index::SimilarityIndex;

/// Search Hits and Hit Entry structures
/// - `Hits`: ranked results, best first
/// - `HitEntry`: a book id and its cosine similarity score
pub use vectorizer::evaluate::scoring::{HitEntry, Hits};

/// Persisted bundle of one fit, and the single-slot store that writes it.
pub use model::{ModelArtifact, ModelStore};
