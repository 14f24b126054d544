use indexmap::IndexSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    error::{RecommenderError, Result},
    utils::math::vector::SparseVec,
    vectorizer::{
        analyzer::Analyzer,
        corpus::BookId,
        evaluate::{
            scoring::{top_k_rows, HitEntry, Hits},
            similarity::SimilarityMatrix,
        },
        tfidf::Vocabulary,
        token::TokenFrequency,
    },
};

/// Fitted vector space: frozen vocabulary, one unit-length TF-IDF row per
/// book, the optional all-pairs matrix and the row -> book id mapping.
///
/// Row `i` of `matrix`, row `i` of `similarity` and `row_ids[i]` all
/// describe the same book. Queries are read-only.
///
/// Text queries go through the analyzer the rows were fitted with. It holds
/// no learned state, so it is not serialized and comes back as the English
/// analyzer on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityIndex {
    #[serde(skip)]
    analyzer: Analyzer,
    vocabulary: Vocabulary,
    matrix: Vec<SparseVec<f64>>,
    similarity: Option<SimilarityMatrix>,
    row_ids: IndexSet<BookId>,
}

impl SimilarityIndex {
    pub(crate) fn new(
        analyzer: Analyzer,
        vocabulary: Vocabulary,
        matrix: Vec<SparseVec<f64>>,
        similarity: Option<SimilarityMatrix>,
        row_ids: IndexSet<BookId>,
    ) -> Self {
        Self {
            analyzer,
            vocabulary,
            matrix,
            similarity,
            row_ids,
        }
    }

    /// number of rows (books)
    #[inline]
    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Normalizer applied to text queries
    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// TF-IDF row of a book position
    pub fn row(&self, row: usize) -> Option<&SparseVec<f64>> {
        self.matrix.get(row)
    }

    pub fn rows(&self) -> &[SparseVec<f64>] {
        &self.matrix
    }

    pub fn similarity(&self) -> Option<&SimilarityMatrix> {
        self.similarity.as_ref()
    }

    pub fn book_id(&self, row: usize) -> Option<BookId> {
        self.row_ids.get_index(row).copied()
    }

    pub fn row_of(&self, book_id: BookId) -> Option<usize> {
        self.row_ids.get_index_of(&book_id)
    }

    /// Book ids in row order
    pub fn book_ids(&self) -> impl Iterator<Item = BookId> + '_ {
        self.row_ids.iter().copied()
    }

    /// Books most similar to the book at `row`, the book itself excluded.
    ///
    /// # Arguments
    /// * `row` - row index in the fitted matrix
    /// * `k` - at most this many hits, must be >= 1
    pub fn query_by_row(&self, row: usize, k: usize) -> Result<Hits> {
        check_k(k)?;
        let rows = self.len();
        if row >= rows {
            return Err(RecommenderError::IndexOutOfRange { row, rows });
        }
        let top = match self.similarity.as_ref().and_then(|sim| sim.row(row)) {
            Some(scores) => top_k_rows(
                scores.iter().copied().enumerate().filter(|(j, _)| *j != row),
                k,
            ),
            None => {
                let target = &self.matrix[row];
                let scores: Vec<f64> = self.matrix.par_iter().map(|r| target.dot(r)).collect();
                top_k_rows(scores.into_iter().enumerate().filter(|(j, _)| *j != row), k)
            }
        };
        Ok(self.to_hits(top))
    }

    /// Books most similar to `book_id`, resolved through the stored row mapping
    pub fn query_by_book(&self, book_id: BookId, k: usize) -> Result<Hits> {
        check_k(k)?;
        let row = self.row_of(book_id).ok_or(RecommenderError::UnknownBook(book_id))?;
        self.query_by_row(row, k)
    }

    /// Books most similar to a free-text description.
    ///
    /// The text is normalized with the fit-time analyzer, projected onto
    /// the frozen vocabulary with the frozen idf, and scored against every
    /// row. Unknown terms are ignored; text with no known term scores 0
    /// everywhere and yields the first `k` rows.
    pub fn query_by_text(&self, raw_text: &str, k: usize) -> Result<Hits> {
        check_k(k)?;
        let mut freq = TokenFrequency::new();
        freq.add_tokens(&self.analyzer.tokens(raw_text));
        let query = self.vocabulary.weigh(&freq);
        Ok(self.query_by_vector(&query, k))
    }

    /// Score an already weighted, unit-length query vector against all rows
    pub fn query_by_vector(&self, query: &SparseVec<f64>, k: usize) -> Hits {
        let scores: Vec<f64> = self.matrix.par_iter().map(|r| query.dot(r)).collect();
        self.to_hits(top_k_rows(scores.into_iter().enumerate(), k))
    }

    fn to_hits(&self, top: Vec<(usize, f64)>) -> Hits {
        Hits::new(
            top.into_iter()
                .filter_map(|(row, score)| {
                    self.book_id(row).map(|book_id| HitEntry { book_id, score })
                })
                .collect(),
        )
    }

    /// Check the row-alignment invariants, used after loading from disk
    pub fn validate(&self) -> Result<()> {
        let corrupt = |msg: String| Err(RecommenderError::CorruptArtifact(msg));
        let rows = self.matrix.len();
        if self.vocabulary.is_empty() {
            return corrupt("empty vocabulary".to_string());
        }
        if !self.vocabulary.is_well_formed() {
            return corrupt("non-finite or non-positive idf".to_string());
        }
        if self.row_ids.len() != rows {
            return corrupt(format!(
                "{} book ids for {} matrix rows (duplicate ids?)",
                self.row_ids.len(),
                rows
            ));
        }
        if let Some(sim) = &self.similarity {
            if sim.len() != rows || !sim.is_well_formed() {
                return corrupt(format!("similarity matrix does not match {} rows", rows));
            }
        }
        let dim = self.vocabulary.len();
        if let Some(i) = self.matrix.iter().position(|r| r.len() != dim || !r.is_well_formed()) {
            return corrupt(format!("row {} does not fit a {}-term vocabulary", i, dim));
        }
        Ok(())
    }
}

/// Fitted data only; the analyzer carries no state of its own.
impl PartialEq for SimilarityIndex {
    fn eq(&self, other: &Self) -> bool {
        self.vocabulary == other.vocabulary
            && self.matrix == other.matrix
            && self.similarity == other.similarity
            && self.row_ids == other.row_ids
    }
}

fn check_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(RecommenderError::InvalidArgument("k must be at least 1".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::{corpus::CorpusItem, TFIDFVectorizer};

    fn items(texts: &[&str]) -> Vec<CorpusItem> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| CorpusItem::new(i as i64 + 1, *t))
            .collect()
    }

    fn dragons() -> Vec<CorpusItem> {
        items(&[
            "a wizard battles a dragon",
            "a dragon hoards gold",
            "a knight fights a dragon",
            "a detective solves a murder in london",
        ])
    }

    #[test]
    fn dragon_books_outrank_unrelated_book() {
        let index = TFIDFVectorizer::new().fit(&dragons()).unwrap();
        let hits = index.query_by_row(0, 3).unwrap();
        assert_eq!(hits.book_ids(), vec![2, 3, 4]);
        // equal overlap, tie resolved by ascending row
        assert_eq!(hits.list[0].score, hits.list[1].score);
        assert!(hits.list[1].score > 0.0);
        assert_eq!(hits.list[2].score, 0.0);
    }

    #[test]
    fn three_dragon_books() {
        let corpus = items(&[
            "a wizard battles a dragon",
            "a dragon hoards gold",
            "a knight fights a dragon",
        ]);
        let index = TFIDFVectorizer::new().fit(&corpus).unwrap();
        let hits = index.query_by_row(0, 2).unwrap();
        assert_eq!(hits.book_ids(), vec![2, 3]);
        assert!(hits.iter().all(|h| h.score > 0.0));
    }

    #[test]
    fn query_by_row_excludes_self_and_sorts_descending() {
        let index = TFIDFVectorizer::new().fit(&dragons()).unwrap();
        for row in 0..index.len() {
            let hits = index.query_by_row(row, 10).unwrap();
            let self_id = index.book_id(row).unwrap();
            assert_eq!(hits.len(), index.len() - 1);
            assert!(!hits.book_ids().contains(&self_id));
            for w in hits.list.windows(2) {
                assert!(w[0].score >= w[1].score);
                if w[0].score == w[1].score {
                    assert!(index.row_of(w[0].book_id) < index.row_of(w[1].book_id));
                }
            }
        }
    }

    #[test]
    fn bad_row_and_bad_k_are_rejected() {
        let index = TFIDFVectorizer::new().fit(&dragons()).unwrap();
        assert!(matches!(
            index.query_by_row(4, 1),
            Err(RecommenderError::IndexOutOfRange { row: 4, rows: 4 })
        ));
        assert!(matches!(index.query_by_row(0, 0), Err(RecommenderError::InvalidArgument(_))));
        assert!(matches!(
            index.query_by_text("dragon", 0),
            Err(RecommenderError::InvalidArgument(_))
        ));
    }

    #[test]
    fn query_by_book_uses_row_mapping() {
        let corpus = vec![
            CorpusItem::new(40, "a dragon hoards gold"),
            CorpusItem::new(10, "a wizard battles a dragon"),
            CorpusItem::new(30, "a detective solves a murder"),
        ];
        let index = TFIDFVectorizer::new().fit(&corpus).unwrap();
        assert_eq!(index.row_of(10), Some(1));
        let hits = index.query_by_book(10, 1).unwrap();
        assert_eq!(hits.book_ids(), vec![40]);
        assert!(matches!(index.query_by_book(99, 1), Err(RecommenderError::UnknownBook(99))));
    }

    #[test]
    fn text_identical_to_a_book_ranks_it_first() {
        let index = TFIDFVectorizer::new().fit(&dragons()).unwrap();
        let hits = index.query_by_text("a knight fights a dragon", 2).unwrap();
        assert_eq!(hits.list[0].book_id, 3);
        assert!((hits.list[0].score - 1.0).abs() < 1e-9);
        assert!(hits.list[1].score < hits.list[0].score);
    }

    #[test]
    fn text_query_can_return_every_row() {
        let index = TFIDFVectorizer::new().fit(&dragons()).unwrap();
        let hits = index.query_by_text("dragon", 50).unwrap();
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn unknown_text_gives_deterministic_zero_hits() {
        let index = TFIDFVectorizer::new().fit(&dragons()).unwrap();
        let hits = index.query_by_text("zzyzx qwxv", 2).unwrap();
        assert_eq!(hits.book_ids(), vec![1, 2]);
        assert!(hits.iter().all(|h| h.score == 0.0));
    }

    #[test]
    fn text_queries_survive_a_serde_round_trip() {
        let index = TFIDFVectorizer::new().fit(&dragons()).unwrap();
        let bytes = serde_cbor::to_vec(&index).unwrap();
        let loaded: SimilarityIndex = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(loaded, index);
        // inflected query words stem to the fitted terms
        let text = "Knights fighting dragons";
        assert_eq!(
            loaded.analyzer().normalize(text),
            index.analyzer().normalize(text)
        );
        assert_eq!(loaded.query_by_text(text, 2).unwrap(), index.query_by_text(text, 2).unwrap());
        assert_eq!(loaded.query_by_text(text, 1).unwrap().book_ids(), vec![3]);
    }

    #[test]
    fn on_the_fly_scoring_matches_precomputed_matrix() {
        let with = TFIDFVectorizer::new().fit(&dragons()).unwrap();
        let without = TFIDFVectorizer::new()
            .with_precompute_similarity(false)
            .fit(&dragons())
            .unwrap();
        assert!(without.similarity().is_none());
        for row in 0..with.len() {
            assert_eq!(with.query_by_row(row, 3).unwrap(), without.query_by_row(row, 3).unwrap());
        }
    }

    #[test]
    fn validate_catches_misaligned_rows() {
        let index = TFIDFVectorizer::new().fit(&dragons()).unwrap();
        let mut broken = index.clone();
        broken.row_ids.pop();
        assert!(matches!(broken.validate(), Err(RecommenderError::CorruptArtifact(_))));

        let mut broken = index.clone();
        broken.similarity = Some(SimilarityMatrix::compute(&index.matrix[..2]));
        assert!(matches!(broken.validate(), Err(RecommenderError::CorruptArtifact(_))));

        let mut broken = index;
        broken.matrix[0] = SparseVec::new(1);
        assert!(matches!(broken.validate(), Err(RecommenderError::CorruptArtifact(_))));
    }
}
