use std::{fs, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};

use crate::error::{RecommenderError, Result};

/// Recommender settings.
/// Every key is optional in TOML; missing keys take the defaults below.
///
/// ```toml
/// artifact_path = "recommender/model.cbor"
/// max_features = 5000
/// min_token_len = 2
/// sublinear_tf = false
/// precompute_similarity = true
/// default_k = 5
/// # max_corpus_size = 50000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// where the single current artifact lives
    pub artifact_path: PathBuf,
    /// vocabulary cap, top terms by corpus count
    pub max_features: usize,
    /// shorter tokens never enter the vocabulary
    pub min_token_len: usize,
    /// `1 + ln(count)` instead of the raw count
    pub sublinear_tf: bool,
    /// keep the all-pairs matrix in the artifact
    pub precompute_similarity: bool,
    pub default_k: usize,
    /// refuse to fit more books than this
    pub max_corpus_size: Option<usize>,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("recommender/model.cbor"),
            max_features: 5000,
            min_token_len: 2,
            sublinear_tf: false,
            precompute_similarity: true,
            default_k: 5,
            max_corpus_size: None,
        }
    }
}

impl RecommenderConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Same settings with another artifact location
    pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = path.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(RecommenderError::InvalidArgument(
                "max_features must be at least 1".to_string(),
            ));
        }
        if self.default_k == 0 {
            return Err(RecommenderError::InvalidArgument(
                "default_k must be at least 1".to_string(),
            ));
        }
        if self.max_corpus_size == Some(0) {
            return Err(RecommenderError::InvalidArgument(
                "max_corpus_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
