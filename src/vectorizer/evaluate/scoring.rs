use std::{cmp::Ordering, fmt::{self, Debug, Display}};

use serde::{Deserialize, Serialize};

use crate::vectorizer::corpus::BookId;

/// One recommendation: a book and its cosine similarity to the query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitEntry {
    pub book_id: BookId,
    pub score: f64,
}

/// Ranked recommendations, best first
#[derive(Clone, Default, PartialEq)]
pub struct Hits {
    pub list: Vec<HitEntry>,
}

impl Hits {
    pub fn new(list: Vec<HitEntry>) -> Self {
        Hits { list }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HitEntry> {
        self.list.iter()
    }

    pub fn book_ids(&self) -> Vec<BookId> {
        self.list.iter().map(|h| h.book_id).collect()
    }

    pub fn into_vec(self) -> Vec<HitEntry> {
        self.list
    }
}

impl IntoIterator for Hits {
    type Item = HitEntry;
    type IntoIter = std::vec::IntoIter<HitEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.into_iter()
    }
}

impl Debug for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Hits [")?;
            for hit in &self.list {
                writeln!(f, "    {:?}: {:.6}", hit.book_id, hit.score)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}

impl Display for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rank, hit) in self.list.iter().enumerate() {
            writeln!(f, "{:>3}. book {} ({:.4})", rank + 1, hit.book_id, hit.score)?;
        }
        Ok(())
    }
}

/// score descending, then row ascending
#[inline]
fn rank_order(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Best `k` (row, score) pairs, score descending, ties by ascending row.
/// NaN scores are dropped. Fewer than `k` candidates returns them all.
pub fn top_k_rows<I>(scores: I, k: usize) -> Vec<(usize, f64)>
where
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut list: Vec<(usize, f64)> = scores.into_iter().filter(|(_, s)| !s.is_nan()).collect();
    if k == 0 {
        return Vec::new();
    }
    if list.len() > k {
        list.select_nth_unstable_by(k - 1, rank_order);
        list.truncate(k);
    }
    list.sort_unstable_by(rank_order);
    list
}
