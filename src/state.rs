use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::data::loader::load_file;
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Dataset state
// ---------------------------------------------------------------------------

/// Holds the survey snapshot that request handlers read from.
///
/// Loading happens only when asked; readers get a cheap `Arc` clone that stays
/// valid even if the state is reloaded or invalidated afterwards.
#[derive(Debug, Default)]
pub struct DatasetState {
    /// Loaded dataset (None until `load` succeeds).
    dataset: Option<Arc<Dataset>>,

    /// Where the current snapshot came from.
    source: Option<PathBuf>,
}

impl DatasetState {
    /// Wrap an already-loaded dataset.
    pub fn from_dataset(dataset: Dataset) -> Self {
        Self {
            dataset: Some(Arc::new(dataset)),
            source: None,
        }
    }

    /// Load `path` and make it the current snapshot.
    pub fn load(&mut self, path: &Path) -> Result<Arc<Dataset>> {
        let dataset = load_file(path)
            .with_context(|| format!("loading survey dataset from {}", path.display()))?;
        let snapshot = Arc::new(dataset);
        self.dataset = Some(Arc::clone(&snapshot));
        self.source = Some(path.to_path_buf());
        Ok(snapshot)
    }

    /// Re-read the file the current snapshot came from.
    ///
    /// On failure the previous snapshot is kept.
    pub fn reload(&mut self) -> Result<Arc<Dataset>> {
        let path = self
            .source
            .clone()
            .context("no file-backed dataset to reload")?;
        info!("reloading dataset from {}", path.display());
        self.load(&path)
    }

    /// Drop the current snapshot. Outstanding `Arc`s are unaffected.
    pub fn invalidate(&mut self) {
        self.dataset = None;
    }

    /// The current snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<Dataset>> {
        if self.dataset.is_none() {
            warn!("dataset snapshot requested before any dataset was loaded");
        }
        self.dataset.clone()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.is_some()
    }
}
