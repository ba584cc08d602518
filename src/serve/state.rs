//! Shared model state for the serving layer
//!
//! A single mutable "current pipeline" reference shared across request
//! handlers. Readers clone the inner `Arc`; a retrain builds a completely
//! independent trainer and swaps the reference whole, so a reader always
//! observes either the old pipeline or the new one, never a mix.

use crate::models::trainer::{ModelTrainer, TrainingOptions};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

/// Atomically swappable handle to the currently served pipeline.
#[derive(Clone, Default)]
pub struct ModelHandle {
    inner: Arc<RwLock<Option<Arc<ModelTrainer>>>>,
}

impl ModelHandle {
    /// A handle with no model loaded yet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(trainer: ModelTrainer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(Arc::new(trainer)))),
        }
    }

    /// The pipeline currently being served, if any.
    pub fn current(&self) -> Option<Arc<ModelTrainer>> {
        self.inner.read().clone()
    }

    /// Swap in a freshly trained pipeline. In-flight readers keep the
    /// previous `Arc` until they drop it.
    pub fn replace(&self, trainer: ModelTrainer) {
        *self.inner.write() = Some(Arc::new(trainer));
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.read().is_some()
    }
}

/// Where and how a background retrain runs.
#[derive(Debug, Clone)]
pub struct RetrainConfig {
    /// Training CSV consumed by a retrain
    pub data_path: PathBuf,
    /// Artifact directory the retrained pipeline is saved to
    pub artifact_dir: PathBuf,
    pub options: TrainingOptions,
}

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub handle: ModelHandle,
    pub retrain: RetrainConfig,
}
