//! Time-bounded memoization of loaded datasets
//!
//! Loading is keyed by the pair of configured source paths. A cached copy is
//! served until its lifetime elapses, even if the files changed meanwhile.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;

use crate::config::DatasetConfig;
use crate::dataset::Dataset;
use crate::error::{CensoError, Result};
use crate::loader::DatasetLoader;

type CacheKey = (PathBuf, PathBuf);

#[derive(Debug)]
struct CacheEntry {
    dataset: Arc<Dataset>,
    loaded_at: DateTime<Utc>,
}

/// Loaded datasets shared across explorer cycles
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl DatasetCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for these sources, loading it if absent or expired
    ///
    /// # Errors
    /// Returns the loader's error; nothing is cached on failure
    pub fn get_or_load(&self, config: &DatasetConfig) -> Result<Arc<Dataset>> {
        self.get_or_load_with(config, || DatasetLoader::new(config.clone()).load())
    }

    /// Like [`get_or_load`](Self::get_or_load) with a custom load function
    pub fn get_or_load_with<F>(&self, config: &DatasetConfig, load: F) -> Result<Arc<Dataset>>
    where
        F: FnOnce() -> Result<Dataset>,
    {
        let key = (config.parquet_path.clone(), config.csv_path.clone());
        let ttl = TimeDelta::from_std(config.cache_ttl).unwrap_or(TimeDelta::MAX);
        let now = Utc::now();

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CensoError::configuration("Dataset cache lock poisoned"))?;

        if let Some(entry) = entries.get(&key) {
            if now.signed_duration_since(entry.loaded_at) < ttl {
                debug!("Serving cached dataset loaded at {}", entry.loaded_at);
                return Ok(Arc::clone(&entry.dataset));
            }
            debug!("Cached dataset loaded at {} expired", entry.loaded_at);
        }

        let dataset = Arc::new(load()?);
        entries.insert(
            key,
            CacheEntry {
                dataset: Arc::clone(&dataset),
                loaded_at: now,
            },
        );
        Ok(dataset)
    }

    /// Drop every cached dataset
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Number of cached datasets, including expired ones not yet replaced
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
