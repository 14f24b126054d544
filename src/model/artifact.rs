use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{
    error::{RecommenderError, Result},
    vectorizer::{
        corpus::{corpus_fingerprint, CorpusItem},
        index::SimilarityIndex,
        FitSettings,
    },
};

/// On-disk layout revision, bumped on incompatible changes
pub const FORMAT_VERSION: u32 = 2;

/// Everything one fit produced, versioned and replaced as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// build generation, previous + 1
    pub version: u64,
    /// UNIX seconds
    pub built_at: u64,
    /// fingerprint of the corpus this was fitted on
    pub corpus_fingerprint: String,
    /// vectorizer parameters of the fit
    pub settings: FitSettings,
    pub index: SimilarityIndex,
}

impl ModelArtifact {
    pub fn new(
        version: u64,
        corpus_fingerprint: String,
        settings: FitSettings,
        index: SimilarityIndex,
    ) -> Self {
        let built_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            format_version: FORMAT_VERSION,
            version,
            built_at,
            corpus_fingerprint,
            settings,
            index,
        }
    }

    /// Number of books in the model
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether this artifact was fitted on exactly `items` (same order and
    /// text) with exactly `settings`
    pub fn is_current_for(&self, items: &[CorpusItem], settings: &FitSettings) -> bool {
        self.settings == *settings && self.corpus_fingerprint == corpus_fingerprint(items)
    }

    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(RecommenderError::CorruptArtifact(format!(
                "format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        self.index.validate()
    }
}
