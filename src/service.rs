use std::sync::Arc;

use arc_swap::ArcSwapOption;
use log::{info, warn};
use parking_lot::Mutex;

use crate::{
    config::RecommenderConfig,
    error::{RecommenderError, Result},
    model::{ModelArtifact, ModelStore},
    vectorizer::{
        corpus::{BookId, CorpusItem},
        evaluate::scoring::Hits,
    },
};

/// Recommender owned by the host application.
///
/// Holds one swappable reference to the current artifact. Queries read a
/// snapshot and never block; `rebuild` builds the next artifact off to the
/// side, persists it, then swaps it in. A failed rebuild leaves the
/// previous artifact serving.
///
/// The host must call `rebuild` with the full corpus after every book add,
/// edit or removal before relying on recommendations again.
#[derive(Debug)]
pub struct RecommenderService {
    config: RecommenderConfig,
    store: ModelStore,
    current: ArcSwapOption<ModelArtifact>,
    rebuild_lock: Mutex<()>,
}

impl RecommenderService {
    /// Service with no model loaded
    pub fn new(config: RecommenderConfig) -> Result<Self> {
        config.validate()?;
        let store = ModelStore::from_config(&config);
        Ok(Self {
            config,
            store,
            current: ArcSwapOption::empty(),
            rebuild_lock: Mutex::new(()),
        })
    }

    /// Service with the persisted artifact loaded when there is one
    pub fn open(config: RecommenderConfig) -> Result<Self> {
        let service = Self::new(config)?;
        match service.load() {
            Ok(_) => {}
            Err(RecommenderError::ModelNotFound(path)) => {
                info!("no model at {}, waiting for first rebuild", path.display());
            }
            Err(e) => return Err(e),
        }
        Ok(service)
    }

    /// Startup path: load the persisted artifact, rebuild when it is
    /// missing or unreadable, or was fitted on a different corpus or with
    /// different fit settings.
    pub fn load_or_build(config: RecommenderConfig, items: &[CorpusItem]) -> Result<Self> {
        let service = Self::new(config)?;
        let settings = service.store.vectorizer().settings();
        match service.load() {
            Ok(artifact) if artifact.is_current_for(items, &settings) => return Ok(service),
            Ok(artifact) => warn!("model v{} is stale, rebuilding", artifact.version),
            Err(e) if e.needs_rebuild() => info!("{}, rebuilding", e),
            Err(RecommenderError::Codec(e)) => warn!("unreadable model ({}), rebuilding", e),
            Err(e) => return Err(e),
        }
        service.rebuild(items)?;
        Ok(service)
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Load the persisted artifact and make it current.
    /// Waits for a running rebuild, so a loaded artifact never replaces a
    /// newer rebuilt one.
    pub fn load(&self) -> Result<Arc<ModelArtifact>> {
        let _guard = self.rebuild_lock.lock();
        let artifact = Arc::new(self.store.load()?);
        self.current.store(Some(Arc::clone(&artifact)));
        Ok(artifact)
    }

    /// Full refit over `items`, persisted, then swapped in.
    /// Concurrent calls run one after another.
    pub fn rebuild(&self, items: &[CorpusItem]) -> Result<Arc<ModelArtifact>> {
        let _guard = self.rebuild_lock.lock();
        info!("rebuilding model over {} books", items.len());
        match self.store.rebuild(items) {
            Ok(artifact) => {
                let artifact = Arc::new(artifact);
                self.current.store(Some(Arc::clone(&artifact)));
                Ok(artifact)
            }
            Err(e) => {
                warn!("rebuild failed, keeping previous model: {}", e);
                Err(e)
            }
        }
    }

    /// Snapshot of the current artifact
    pub fn current(&self) -> Result<Arc<ModelArtifact>> {
        self.current
            .load_full()
            .ok_or_else(|| RecommenderError::ModelNotFound(self.store.path().to_path_buf()))
    }

    pub fn is_ready(&self) -> bool {
        self.current.load().is_some()
    }

    /// Books most similar to `book_id`, best first
    pub fn recommend_similar_to_book(&self, book_id: BookId, k: usize) -> Result<Hits> {
        self.current()?.index.query_by_book(book_id, k)
    }

    /// Books most similar to a free-text description, best first
    pub fn recommend_similar_to_text(&self, description: &str, k: usize) -> Result<Hits> {
        self.current()?.index.query_by_text(description, k)
    }

    /// `recommend_similar_to_book` with the configured default k
    pub fn similar_to_book(&self, book_id: BookId) -> Result<Hits> {
        self.recommend_similar_to_book(book_id, self.config.default_k)
    }

    /// `recommend_similar_to_text` with the configured default k
    pub fn similar_to_text(&self, description: &str) -> Result<Hits> {
        self.recommend_similar_to_text(description, self.config.default_k)
    }
}
