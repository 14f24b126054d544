pub mod analyzer;
pub mod corpus;
pub mod evaluate;
pub mod index;
pub mod stop_words;
pub mod tfidf;
pub mod token;

use indexmap::IndexSet;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::RecommenderConfig,
    error::{RecommenderError, Result},
    vectorizer::{
        analyzer::Analyzer,
        corpus::{Corpus, CorpusItem},
        evaluate::similarity::SimilarityMatrix,
        index::SimilarityIndex,
        tfidf::{TfWeighting, Vocabulary},
        token::TokenFrequency,
    },
};

/// Parameters that shape a fitted model. An artifact fitted with
/// different settings is stale even when the corpus is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitSettings {
    pub max_features: usize,
    pub min_token_len: usize,
    pub weighting: TfWeighting,
    pub precompute_similarity: bool,
}

/// TF-IDF vector space builder.
///
/// `fit` turns an ordered corpus into a [`SimilarityIndex`]:
/// 1. normalize every description (lowercase, words, strip, stem)
/// 2. count terms, dropping stop words and short tokens
/// 3. keep the top `max_features` terms by corpus count
/// 4. weigh each book `tf * idf`, L2-normalize
/// 5. optionally precompute all-pairs cosine similarity
///
/// Fitting the same corpus twice gives bit-identical output.
#[derive(Debug)]
pub struct TFIDFVectorizer {
    analyzer: Analyzer,
    max_features: usize,
    min_token_len: usize,
    weighting: TfWeighting,
    precompute_similarity: bool,
    max_corpus_size: Option<usize>,
}

impl Default for TFIDFVectorizer {
    fn default() -> Self {
        Self::from_config(&RecommenderConfig::default())
    }
}

impl TFIDFVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RecommenderConfig) -> Self {
        Self {
            analyzer: Analyzer::english(),
            max_features: config.max_features,
            min_token_len: config.min_token_len,
            weighting: if config.sublinear_tf {
                TfWeighting::Sublinear
            } else {
                TfWeighting::Raw
            },
            precompute_similarity: config.precompute_similarity,
            max_corpus_size: config.max_corpus_size,
        }
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_weighting(mut self, weighting: TfWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_precompute_similarity(mut self, precompute: bool) -> Self {
        self.precompute_similarity = precompute;
        self
    }

    /// Normalizer used at fit time, handed on to every fitted index
    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn settings(&self) -> FitSettings {
        FitSettings {
            max_features: self.max_features,
            min_token_len: self.min_token_len,
            weighting: self.weighting,
            precompute_similarity: self.precompute_similarity,
        }
    }

    /// Fit the vector space over `items`, in order.
    ///
    /// # Errors
    /// * `EmptyCorpus` - no items
    /// * `CorpusTooLarge` - more items than `max_corpus_size`
    /// * `DuplicateBookId` - a book id appears twice
    /// * `DegenerateVocabulary` - no term survives stop-word removal
    pub fn fit(&self, items: &[CorpusItem]) -> Result<SimilarityIndex> {
        if items.is_empty() {
            return Err(RecommenderError::EmptyCorpus);
        }
        if let Some(max) = self.max_corpus_size {
            if items.len() > max {
                return Err(RecommenderError::CorpusTooLarge {
                    len: items.len(),
                    max,
                });
            }
        }
        let mut row_ids = IndexSet::with_capacity(items.len());
        for item in items {
            if !row_ids.insert(item.book_id) {
                return Err(RecommenderError::DuplicateBookId(item.book_id));
            }
        }

        let freqs: Vec<TokenFrequency> = items
            .par_iter()
            .map(|item| self.analyzer.term_frequency(item.text(), self.min_token_len))
            .collect();

        let mut corpus = Corpus::new();
        for freq in &freqs {
            corpus.add_doc(freq);
        }
        let vocabulary = Vocabulary::fit(&corpus, self.max_features, self.weighting);
        if vocabulary.is_empty() {
            return Err(RecommenderError::DegenerateVocabulary);
        }
        debug!(
            "vocabulary: {} of {} distinct terms kept over {} books",
            vocabulary.len(),
            corpus.vocab_size(),
            items.len()
        );

        let matrix: Vec<_> = freqs.par_iter().map(|freq| vocabulary.weigh(freq)).collect();
        let zero_rows = matrix.iter().filter(|r| r.is_zero()).count();
        if zero_rows > 0 {
            debug!("{} books have no in-vocabulary term", zero_rows);
        }

        let similarity = self
            .precompute_similarity
            .then(|| SimilarityMatrix::compute(&matrix));

        Ok(SimilarityIndex::new(
            self.analyzer.clone(),
            vocabulary,
            matrix,
            similarity,
            row_ids,
        ))
    }
}
