use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::vectorizer::token::TokenFrequency;

/// Book identity as issued by the persistence layer
pub type BookId = i64;

/// Description the scraper stores when a book page has none
const MISSING_DESCRIPTION: &str = "no description available";

/// One book supplied to the recommender at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusItem {
    pub book_id: BookId,
    pub description: String,
    /// used when the description is blank or the scraper placeholder
    #[serde(default)]
    pub title: Option<String>,
}

impl CorpusItem {
    pub fn new(book_id: BookId, description: impl Into<String>) -> Self {
        Self {
            book_id,
            description: description.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Text that gets vectorized for this book
    pub fn text(&self) -> &str {
        let desc = self.description.trim();
        let missing = desc.is_empty() || desc.eq_ignore_ascii_case(MISSING_DESCRIPTION);
        match (&self.title, missing) {
            (Some(title), true) => title,
            _ => &self.description,
        }
    }
}

/// SHA-256 over the ordered (book_id, text) pairs, hex encoded.
/// Any add, edit, removal or reorder changes it.
pub fn corpus_fingerprint(items: &[CorpusItem]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((items.len() as u64).to_le_bytes());
    for item in items {
        let text = item.text();
        hasher.update(item.book_id.to_le_bytes());
        hasher.update((text.len() as u64).to_le_bytes());
        hasher.update(text.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Per-term statistics over the corpus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermStat {
    /// documents containing the term
    pub doc_freq: u64,
    /// occurrences over all documents
    pub total_count: u64,
    /// first-seen position, vocabulary tie-break
    pub first_seen: usize,
}

/// Document frequencies and term counts of a corpus.
/// Terms are kept in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    doc_num: u64,
    term_stats: IndexMap<Box<str>, TermStat>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one document's token counts
    pub fn add_doc(&mut self, freq: &TokenFrequency) {
        self.doc_num += 1;
        for (term, count) in freq.iter() {
            let next = self.term_stats.len();
            let stat = self
                .term_stats
                .entry(term.into())
                .or_insert_with(|| TermStat {
                    first_seen: next,
                    ..TermStat::default()
                });
            stat.doc_freq += 1;
            stat.total_count += count as u64;
        }
    }

    pub fn get_doc_num(&self) -> u64 {
        self.doc_num
    }

    /// Documents containing `term`
    pub fn get_doc_freq(&self, term: &str) -> u64 {
        self.term_stats.get(term).map_or(0, |s| s.doc_freq)
    }

    pub fn term_stat(&self, term: &str) -> Option<&TermStat> {
        self.term_stats.get(term)
    }

    /// Number of distinct terms
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_stats.len()
    }

    /// Top `max` terms by total count, descending, ties in first-seen order
    pub fn top_terms(&self, max: usize) -> Vec<(&str, TermStat)> {
        let mut terms: Vec<(&str, TermStat)> = self
            .term_stats
            .iter()
            .map(|(t, s)| (&**t, *s))
            .collect();
        terms.sort_by(|a, b| {
            b.1.total_count
                .cmp(&a.1.total_count)
                .then_with(|| a.1.first_seen.cmp(&b.1.first_seen))
        });
        terms.truncate(max);
        terms
    }
}
