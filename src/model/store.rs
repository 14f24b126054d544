use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use log::{debug, info};
use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::{
    config::RecommenderConfig,
    error::{RecommenderError, Result},
    model::artifact::ModelArtifact,
    vectorizer::{
        corpus::{corpus_fingerprint, CorpusItem},
        TFIDFVectorizer,
    },
};

/// Leading fields of a persisted artifact; the index is skipped.
#[derive(Deserialize)]
struct ArtifactHeader {
    version: u64,
}

/// Single-slot artifact store at a fixed path.
///
/// `rebuild` fits and overwrites; there is no history. Writes go to a
/// temp file in the same directory and are renamed into place, so `load`
/// sees either the old artifact or the new one, never a partial file.
///
/// Callers serialize `rebuild`; see `RecommenderService`.
#[derive(Debug)]
pub struct ModelStore {
    path: PathBuf,
    vectorizer: TFIDFVectorizer,
    /// highest version built or loaded by this store
    last_version: AtomicU64,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>, vectorizer: TFIDFVectorizer) -> Self {
        Self {
            path: path.into(),
            vectorizer,
            last_version: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &RecommenderConfig) -> Self {
        Self::new(config.artifact_path.clone(), TFIDFVectorizer::from_config(config))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn vectorizer(&self) -> &TFIDFVectorizer {
        &self.vectorizer
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Fit `items` and persist the result as the current artifact.
    /// Nothing is written if the fit fails.
    ///
    /// The new version follows the highest one this store has seen, or the
    /// one already on disk when this store has seen none.
    pub fn rebuild(&self, items: &[CorpusItem]) -> Result<ModelArtifact> {
        let index = self.vectorizer.fit(items)?;
        let previous = match self.last_version.load(Ordering::Acquire) {
            0 => self.persisted_version(),
            seen => seen,
        };
        let version = previous + 1;
        let artifact = ModelArtifact::new(
            version,
            corpus_fingerprint(items),
            self.vectorizer.settings(),
            index,
        );
        self.persist(&artifact)?;
        self.last_version.fetch_max(version, Ordering::AcqRel);
        info!(
            "model v{} built: {} books, {} terms",
            version,
            artifact.len(),
            artifact.index.vocabulary().len()
        );
        Ok(artifact)
    }

    /// Atomically write `artifact` to the store path
    pub fn persist(&self, artifact: &ModelArtifact) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let temp_file = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file());
            serde_cbor::to_writer(&mut writer, artifact)?;
            writer.flush()?;
        }
        temp_file.as_file().sync_all()?;
        temp_file.persist(&self.path).map_err(|e| e.error)?;
        debug!("model v{} written to {}", artifact.version, self.path.display());
        Ok(())
    }

    /// Version of the artifact on disk, 0 when there is none or it cannot
    /// be decoded
    fn persisted_version(&self) -> u64 {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(_) => return 0,
        };
        match serde_cbor::from_reader::<ArtifactHeader, _>(BufReader::new(file)) {
            Ok(header) => {
                self.last_version.fetch_max(header.version, Ordering::AcqRel);
                header.version
            }
            Err(e) => {
                debug!("no readable version in {}: {}", self.path.display(), e);
                0
            }
        }
    }

    /// Read and validate the persisted artifact.
    ///
    /// # Errors
    /// * `ModelNotFound` - nothing was ever built at the path
    /// * `Codec` / `CorruptArtifact` - unreadable or inconsistent file
    pub fn load(&self) -> Result<ModelArtifact> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RecommenderError::ModelNotFound(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let artifact: ModelArtifact = serde_cbor::from_reader(BufReader::new(file))?;
        artifact.validate()?;
        self.last_version.fetch_max(artifact.version, Ordering::AcqRel);
        info!(
            "model v{} loaded from {} ({} books)",
            artifact.version,
            self.path.display(),
            artifact.len()
        );
        Ok(artifact)
    }

    /// Delete the persisted artifact, if any
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<CorpusItem> {
        vec![
            CorpusItem::new(1, "a wizard battles a dragon"),
            CorpusItem::new(2, "a dragon hoards gold"),
            CorpusItem::new(3, "a knight fights a dragon"),
        ]
    }

    fn store_in(dir: &Path) -> ModelStore {
        ModelStore::new(dir.join("models").join("model.cbor"), TFIDFVectorizer::new())
    }

    #[test]
    fn load_before_build_is_model_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(!store.exists());
        let err = store.load().unwrap_err();
        assert!(matches!(err, RecommenderError::ModelNotFound(_)));
        assert!(err.needs_rebuild());
    }

    #[test]
    fn rebuild_then_load_gives_same_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let built = store.rebuild(&corpus()).unwrap();
        assert!(store.exists());
        assert_eq!(built.version, 1);
        let loaded = store.load().unwrap();
        assert_eq!(loaded, built);
    }

    #[test]
    fn versions_increase_across_stores() {
        let dir = tempfile::tempdir().unwrap();
        let first = store_in(dir.path());
        first.rebuild(&corpus()).unwrap();
        first.rebuild(&corpus()).unwrap();

        let second = store_in(dir.path());
        assert_eq!(second.load().unwrap().version, 2);
        assert_eq!(second.rebuild(&corpus()).unwrap().version, 3);
    }

    #[test]
    fn fresh_store_continues_from_version_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let first = store_in(dir.path());
        for _ in 0..3 {
            first.rebuild(&corpus()).unwrap();
        }

        // no load before the rebuild
        let second = store_in(dir.path());
        assert_eq!(second.rebuild(&corpus()).unwrap().version, 4);
        assert_eq!(second.rebuild(&corpus()).unwrap().version, 5);
        assert_eq!(store_in(dir.path()).load().unwrap().version, 5);
    }

    #[test]
    fn unreadable_file_restarts_versions_at_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.cbor");
        fs::write(&path, b"not a model").unwrap();
        let store = ModelStore::new(&path, TFIDFVectorizer::new());
        assert_eq!(store.rebuild(&corpus()).unwrap().version, 1);
        assert_eq!(store.load().unwrap().version, 1);
    }

    #[test]
    fn failed_fit_keeps_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let built = store.rebuild(&corpus()).unwrap();
        assert!(matches!(store.rebuild(&[]), Err(RecommenderError::EmptyCorpus)));
        assert_eq!(store.load().unwrap(), built);
    }

    #[test]
    fn failed_persist_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        // target path is a directory, the rename fails
        let target = dir.path().join("model.cbor");
        fs::create_dir(&target).unwrap();
        let store = ModelStore::new(&target, TFIDFVectorizer::new());
        assert!(matches!(store.rebuild(&corpus()), Err(RecommenderError::Io(_))));
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
        assert!(target.is_dir());
    }

    #[test]
    fn garbage_file_is_a_codec_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.cbor");
        fs::write(&path, b"not a model").unwrap();
        let store = ModelStore::new(&path, TFIDFVectorizer::new());
        assert!(matches!(store.load(), Err(RecommenderError::Codec(_))));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.rebuild(&corpus()).unwrap();
        store.remove().unwrap();
        store.remove().unwrap();
        assert!(!store.exists());
    }
}
