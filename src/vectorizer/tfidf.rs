use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    utils::math::vector::SparseVec,
    vectorizer::{corpus::Corpus, token::TokenFrequency},
};

/// Term-frequency scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TfWeighting {
    /// raw count
    #[default]
    Raw,
    /// 1 + ln(count)
    Sublinear,
}

impl TfWeighting {
    #[inline]
    pub fn tf(self, count: u32) -> f64 {
        if count == 0 {
            return 0.0;
        }
        match self {
            TfWeighting::Raw => count as f64,
            TfWeighting::Sublinear => 1.0 + (count as f64).ln(),
        }
    }
}

/// Smoothed inverse document frequency
/// idf(t) = ln((1 + n) / (1 + df(t))) + 1
///
/// Always >= 1 for df <= n, so no term ever gets a zero weight.
#[inline]
pub fn smoothed_idf(doc_num: u64, doc_freq: u64) -> f64 {
    ((1.0 + doc_num as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
}

/// Vocabulary frozen at fit time: term -> column, plus the IDF of every column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// term -> idf, column index is the map position
    #[serde(with = "indexmap::map::serde_seq")]
    terms: IndexMap<String, f64>,
    weighting: TfWeighting,
    /// corpus size the idf was computed on
    doc_num: u64,
}

impl Vocabulary {
    /// Pick the top `max_features` terms of `corpus` and compute their idf.
    /// Column order follows the ranking.
    pub fn fit(corpus: &Corpus, max_features: usize, weighting: TfWeighting) -> Self {
        let doc_num = corpus.get_doc_num();
        let terms = corpus
            .top_terms(max_features)
            .into_iter()
            .map(|(term, stat)| (term.to_string(), smoothed_idf(doc_num, stat.doc_freq)))
            .collect();
        Self {
            terms,
            weighting,
            doc_num,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn weighting(&self) -> TfWeighting {
        self.weighting
    }

    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    /// Column of `term`
    pub fn column(&self, term: &str) -> Option<usize> {
        self.terms.get_index_of(term)
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.terms.get(term).copied()
    }

    /// Terms in column order
    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ {
        self.terms.keys().map(|t| t.as_str())
    }

    /// TF-IDF vector of `freq` in this space, L2-normalized.
    /// Out-of-vocabulary tokens contribute nothing; a document with no
    /// known token gives the zero vector.
    pub fn weigh(&self, freq: &TokenFrequency) -> SparseVec<f64> {
        let mut inds = Vec::with_capacity(freq.token_num());
        let mut vals = Vec::with_capacity(freq.token_num());
        for (token, count) in freq.iter() {
            if let Some((col, _, &idf)) = self.terms.get_full(token) {
                inds.push(col as u32);
                vals.push(self.weighting.tf(count) * idf);
            }
        }
        let mut vec = SparseVec::from_unsorted(self.len(), inds, vals);
        vec.normalize();
        vec.shrink_to_fit();
        vec
    }

    /// idf values positive and finite
    pub(crate) fn is_well_formed(&self) -> bool {
        self.terms.values().all(|idf| idf.is_finite() && *idf > 0.0)
    }
}
