//! Dataset sources and the load-once dataset cache.
//!
//! The plant dataset is a single CSV that does not change during a session, so
//! it is fetched once and shared read-only through `DatasetCache`.

use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::data::dataset::parse_dataset;
use crate::domain::Dataset;
use crate::error::PipelineError;

/// Location of the published power plant CSV.
pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/David1r20/Produ-o-de-energia-el-trica/main/Power_data.csv";

/// Environment variable overriding `DEFAULT_SOURCE_URL`.
pub const SOURCE_URL_ENV: &str = "POWER_DATA_URL";

/// Anything that can produce a full `Dataset`.
pub trait DatasetLoader: Send + Sync {
    fn load(&self) -> Result<Dataset, PipelineError>;

    /// Short description for logs and reports.
    fn describe(&self) -> String;
}

/// Where the dataset CSV lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Remote(String),
    File(PathBuf),
}

impl DataSource {
    /// Remote source from `POWER_DATA_URL` (via `.env`), else the default URL.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        match std::env::var(SOURCE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => DataSource::Remote(url.trim().to_string()),
            _ => DataSource::Remote(DEFAULT_SOURCE_URL.to_string()),
        }
    }

    fn fetch_remote(url: &str) -> Result<Dataset, PipelineError> {
        let resp = Client::new()
            .get(url)
            .send()
            .map_err(|e| PipelineError::DataUnavailable(format!("request to {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(PipelineError::DataUnavailable(format!(
                "request to {url} failed with status {}.",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| PipelineError::DataUnavailable(format!("failed to read body from {url}: {e}")))?;
        parse_dataset(body.as_bytes())
    }

    fn read_file(path: &PathBuf) -> Result<Dataset, PipelineError> {
        let file = File::open(path).map_err(|e| {
            PipelineError::DataUnavailable(format!("failed to open '{}': {e}", path.display()))
        })?;
        parse_dataset(file)
    }
}

impl DatasetLoader for DataSource {
    fn load(&self) -> Result<Dataset, PipelineError> {
        match self {
            DataSource::Remote(url) => Self::fetch_remote(url),
            DataSource::File(path) => Self::read_file(path),
        }
    }

    fn describe(&self) -> String {
        match self {
            DataSource::Remote(url) => url.clone(),
            DataSource::File(path) => path.display().to_string(),
        }
    }
}

/// A dataset snapshot held by the cache.
#[derive(Debug, Clone)]
pub struct CachedDataset {
    pub dataset: Arc<Dataset>,
    pub loaded_at: DateTime<Utc>,
    pub source: String,
}

/// Load-once, read-many dataset cache.
///
/// The first `get` loads through the wrapped loader; later calls return the
/// same `Arc` until `invalidate` is called. Load failures are not cached.
pub struct DatasetCache {
    loader: Box<dyn DatasetLoader>,
    slot: RwLock<Option<CachedDataset>>,
}

impl DatasetCache {
    pub fn new(loader: impl DatasetLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            slot: RwLock::new(None),
        }
    }

    /// Cache pre-populated with an in-memory dataset (never calls the loader
    /// until invalidated).
    pub fn with_dataset(loader: impl DatasetLoader + 'static, dataset: Dataset) -> Self {
        let source = loader.describe();
        let cache = Self::new(loader);
        if let Ok(mut slot) = cache.slot.write() {
            *slot = Some(CachedDataset {
                dataset: Arc::new(dataset),
                loaded_at: Utc::now(),
                source,
            });
        }
        cache
    }

    pub fn get(&self) -> Result<CachedDataset, PipelineError> {
        if let Some(cached) = self.read_slot()? {
            debug!(source = %cached.source, "dataset cache hit");
            return Ok(cached);
        }

        let mut slot = self
            .slot
            .write()
            .map_err(|_| PipelineError::DataUnavailable("dataset cache lock poisoned".into()))?;

        // Another caller may have filled the slot while we waited for the lock.
        if let Some(cached) = slot.as_ref() {
            return Ok(cached.clone());
        }

        let source = self.loader.describe();
        info!(%source, "loading dataset");
        let dataset = self.loader.load()?;
        info!(rows = dataset.len(), %source, "dataset loaded");

        let cached = CachedDataset {
            dataset: Arc::new(dataset),
            loaded_at: Utc::now(),
            source,
        };
        *slot = Some(cached.clone());
        Ok(cached)
    }

    /// Drop the cached dataset so the next `get` reloads it.
    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.slot.write() {
            if slot.take().is_some() {
                info!("dataset cache invalidated");
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().map(|s| s.is_some()).unwrap_or(false)
    }

    fn read_slot(&self) -> Result<Option<CachedDataset>, PipelineError> {
        let slot = self
            .slot
            .read()
            .map_err(|_| PipelineError::DataUnavailable("dataset cache lock poisoned".into()))?;
        Ok(slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureVector, Observation};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl DatasetLoader for CountingLoader {
        fn load(&self) -> Result<Dataset, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PipelineError::DataUnavailable("offline".into()));
            }
            Ok(Dataset::new(vec![Observation {
                features: FeatureVector::new(1.0, 2.0, 3.0, 4.0),
                net_output: 5.0,
            }]))
        }

        fn describe(&self) -> String {
            "counting".into()
        }
    }

    #[test]
    fn cache_loads_once_until_invalidated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = DatasetCache::new(CountingLoader {
            calls: calls.clone(),
            fail: false,
        });
        assert!(!cache.is_loaded());

        let a = cache.get().unwrap();
        let b = cache.get().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a.dataset, &b.dataset));

        cache.invalidate();
        assert!(!cache.is_loaded());
        let c = cache.get().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!Arc::ptr_eq(&a.dataset, &c.dataset));
    }

    #[test]
    fn cache_does_not_store_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = DatasetCache::new(CountingLoader {
            calls: calls.clone(),
            fail: true,
        });
        assert!(matches!(cache.get(), Err(PipelineError::DataUnavailable(_))));
        assert!(cache.get().is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!cache.is_loaded());
    }

    #[test]
    fn preloaded_cache_skips_loader_until_invalidated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let preloaded = Dataset::new(vec![]);
        let cache = DatasetCache::with_dataset(
            CountingLoader {
                calls: calls.clone(),
                fail: false,
            },
            preloaded,
        );
        assert!(cache.is_loaded());
        assert!(cache.get().unwrap().dataset.is_empty());
        assert_eq!(cache.get().unwrap().source, "counting");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        cache.invalidate();
        assert_eq!(cache.get().unwrap().dataset.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let src = DataSource::File(PathBuf::from("/definitely/not/here.csv"));
        assert!(matches!(src.load(), Err(PipelineError::DataUnavailable(_))));
    }
}
