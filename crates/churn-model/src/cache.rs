//! Process-wide predictor cache.
//!
//! The classifier and manifest are loaded together on first use and kept for
//! the life of the process. Concurrent first callers wait on the single
//! in-flight load. A failed load leaves the cache uninitialized, so the next
//! call starts again from scratch. Once ready, reads go through an immutable
//! `Arc` without locking.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use churn_core::error::{Error, Result};
use churn_core::traits::Classifier;
use churn_core::types::RawRecord;
use tokio::sync::OnceCell;

use crate::artifacts::{ArtifactLocator, ArtifactPaths};
use crate::encoder::{Encoding, FeatureEncoder};
use crate::inference::{LogisticModel, Prediction};
use crate::manifest::Manifest;

/// Classifier and manifest loaded as one consistent pair
pub struct LoadedModel {
    classifier: Box<dyn Classifier>,
    encoder: FeatureEncoder,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("n_features", &self.classifier.n_features())
            .field("manifest", self.encoder.manifest())
            .finish()
    }
}

impl LoadedModel {
    /// Pair a classifier with its manifest, rejecting width mismatches
    pub fn new(classifier: Box<dyn Classifier>, manifest: Manifest) -> Result<Self> {
        if classifier.n_features() != manifest.len() {
            return Err(Error::SchemaMismatch {
                expected: classifier.n_features(),
                actual: manifest.len(),
            });
        }
        Ok(Self {
            classifier,
            encoder: FeatureEncoder::new(manifest),
        })
    }

    /// The manifest vectors are aligned to
    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        self.encoder.manifest()
    }

    /// Encode a record against the manifest
    pub fn encode(&self, raw: &RawRecord) -> Result<Encoding> {
        self.encoder.encode_with_report(raw)
    }

    /// Label and probabilities from one vector, in one call
    pub fn predict(&self, vector: &[f64]) -> Result<Prediction> {
        let start = Instant::now();
        let label = self.classifier.predict_label(vector)?;
        let [stay_probability, churn_probability] = self.classifier.predict_proba(vector)?;

        for p in [stay_probability, churn_probability] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::ModelError(format!("probability {p} out of range")));
            }
        }

        Ok(Prediction {
            label,
            stay_probability,
            churn_probability,
            latency_ns: u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX),
        })
    }
}

/// Something that can produce a [`LoadedModel`].
///
/// Loading is blocking and runs on the blocking thread pool.
pub trait ArtifactSource: Send + Sync + 'static {
    /// Load a fresh classifier/manifest pair
    fn load(&self) -> Result<LoadedModel>;
}

/// Loads artifacts from the filesystem
#[derive(Debug, Clone)]
pub struct FsArtifactSource {
    paths: SourcePaths,
}

#[derive(Debug, Clone)]
enum SourcePaths {
    /// Resolved again on every attempt so a fixed environment takes effect on retry
    Locate(ArtifactLocator),
    Fixed(ArtifactPaths),
}

impl FsArtifactSource {
    /// Resolve paths with `locator` at each load attempt
    #[must_use]
    pub fn new(locator: ArtifactLocator) -> Self {
        Self {
            paths: SourcePaths::Locate(locator),
        }
    }

    /// Always load from the given paths
    #[must_use]
    pub fn from_paths(model: impl Into<PathBuf>, manifest: impl Into<PathBuf>) -> Self {
        Self {
            paths: SourcePaths::Fixed(ArtifactPaths {
                model: model.into(),
                manifest: manifest.into(),
            }),
        }
    }

    /// Paths the next load would use
    #[must_use]
    pub fn paths(&self) -> ArtifactPaths {
        match &self.paths {
            SourcePaths::Locate(locator) => locator.resolve(),
            SourcePaths::Fixed(paths) => paths.clone(),
        }
    }
}

impl ArtifactSource for FsArtifactSource {
    fn load(&self) -> Result<LoadedModel> {
        let paths = self.paths();

        tracing::info!("Loading model from {}", paths.model.display());
        let classifier = LogisticModel::load(&paths.model)?;

        tracing::info!("Loading model columns from {}", paths.manifest.display());
        let manifest = Manifest::load(&paths.manifest)?;

        LoadedModel::new(Box::new(classifier), manifest)
            .map_err(|e| Error::artifact(&paths.model, e))
    }
}

/// Lazily loaded, process-wide classifier + manifest
pub struct PredictorCache {
    inner: Arc<CacheState>,
}

struct CacheState {
    source: Arc<dyn ArtifactSource>,
    cell: OnceCell<Arc<LoadedModel>>,
    load_attempts: AtomicU64,
}

impl CacheState {
    async fn initialize(&self) -> Result<Arc<LoadedModel>> {
        let loaded = self.cell.get_or_try_init(|| self.load_artifacts()).await?;
        Ok(Arc::clone(loaded))
    }

    async fn load_artifacts(&self) -> Result<Arc<LoadedModel>> {
        self.load_attempts.fetch_add(1, Ordering::SeqCst);
        let source = Arc::clone(&self.source);
        let loaded = tokio::task::spawn_blocking(move || source.load())
            .await
            .map_err(|e| Error::Internal(format!("artifact load task failed: {e}")))?;

        match loaded {
            Ok(model) => {
                tracing::info!("Model loaded successfully");
                Ok(Arc::new(model))
            }
            Err(e) => {
                tracing::error!("Error loading model: {}", e);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for PredictorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictorCache")
            .field("ready", &self.is_ready())
            .field("load_attempts", &self.load_attempts())
            .finish_non_exhaustive()
    }
}

impl PredictorCache {
    /// Create an uninitialized cache over `source`
    #[must_use]
    pub fn new(source: Arc<dyn ArtifactSource>) -> Self {
        Self {
            inner: Arc::new(CacheState {
                source,
                cell: OnceCell::new(),
                load_attempts: AtomicU64::new(0),
            }),
        }
    }

    /// Cache backed by the filesystem
    #[must_use]
    pub fn from_locator(locator: ArtifactLocator) -> Self {
        Self::new(Arc::new(FsArtifactSource::new(locator)))
    }

    /// Load the classifier and manifest if absent. Idempotent.
    ///
    /// The load runs on its own task, so a caller dropped mid-load does not
    /// release the cell; later callers wait on the same in-flight load.
    pub async fn ensure_ready(&self) -> Result<Arc<LoadedModel>> {
        if let Some(loaded) = self.inner.cell.get() {
            return Ok(Arc::clone(loaded));
        }

        let state = Arc::clone(&self.inner);
        tokio::spawn(async move { state.initialize().await })
            .await
            .map_err(|e| Error::Internal(format!("artifact load task failed: {e}")))?
    }

    /// Whether a load has succeeded
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.cell.initialized()
    }

    /// Number of load attempts so far, successful or not
    #[must_use]
    pub fn load_attempts(&self) -> u64 {
        self.inner.load_attempts.load(Ordering::SeqCst)
    }

    /// Predict from an already encoded vector
    pub async fn predict(&self, vector: &[f64]) -> Result<Prediction> {
        self.ensure_ready().await?.predict(vector)
    }

    /// Encode a record and predict
    pub async fn predict_record(&self, raw: &RawRecord) -> Result<Prediction> {
        let model = self.ensure_ready().await?;
        let encoding = model.encode(raw)?;

        for unseen in &encoding.unseen {
            tracing::warn!(
                field = %unseen.field,
                value = %unseen.value,
                "Categorical value unseen at training time; encoded as no known category"
            );
        }
        if !encoding.dropped.is_empty() {
            tracing::debug!(columns = ?encoding.dropped, "Dropped columns absent from manifest");
        }

        model.predict(&encoding.vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    fn columns() -> Vec<String> {
        ["Age", "Geography_France", "Geography_Spain"]
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    struct CountingSource {
        loads: AtomicU64,
        fail: AtomicBool,
        delay: Duration,
    }

    impl CountingSource {
        fn new(fail: bool, delay: Duration) -> Self {
            Self {
                loads: AtomicU64::new(0),
                fail: AtomicBool::new(fail),
                delay,
            }
        }
    }

    impl ArtifactSource for CountingSource {
        fn load(&self) -> Result<LoadedModel> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::artifact("model.json", "missing"));
            }
            let model = LogisticModel::new(vec![0.01, -0.5, 0.5], -0.2);
            LoadedModel::new(Box::new(model), Manifest::new(columns()).unwrap())
        }
    }

    fn record() -> RawRecord {
        let mut raw = RawRecord::new();
        raw.insert("Age", 40);
        raw.insert("Geography", "Spain");
        raw
    }

    #[test]
    fn test_loaded_model_rejects_width_mismatch() {
        let model = LogisticModel::new(vec![1.0, 2.0], 0.0);
        let err = LoadedModel::new(Box::new(model), Manifest::new(columns()).unwrap()).unwrap_err();
        assert_eq!(
            err,
            Error::SchemaMismatch {
                expected: 2,
                actual: 3
            }
        );
    }

    #[tokio::test]
    async fn test_ensure_ready_is_idempotent() {
        let source = Arc::new(CountingSource::new(false, Duration::ZERO));
        let cache = PredictorCache::new(source.clone());
        assert!(!cache.is_ready());

        cache.ensure_ready().await.unwrap();
        cache.ensure_ready().await.unwrap();

        assert!(cache.is_ready());
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.load_attempts(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let source = Arc::new(CountingSource::new(true, Duration::ZERO));
        let cache = PredictorCache::new(source.clone());

        let err = cache.ensure_ready().await.unwrap_err();
        assert!(err.is_artifact_load());
        assert!(!cache.is_ready());

        assert!(cache.ensure_ready().await.is_err());
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);

        source.fail.store(false, Ordering::SeqCst);
        cache.ensure_ready().await.unwrap();
        assert!(cache.is_ready());
        assert_eq!(source.loads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_requests_load_once() {
        let source = Arc::new(CountingSource::new(false, Duration::from_millis(50)));
        let cache = Arc::new(PredictorCache::new(source.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.predict_record(&record()).await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| w[0].proba() == w[1].proba()));
    }

    struct SlowSource {
        loads: AtomicU64,
        in_flight: AtomicU64,
        max_in_flight: AtomicU64,
    }

    impl ArtifactSource for SlowSource {
        fn load(&self) -> Result<LoadedModel> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(300));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let model = LogisticModel::new(vec![0.01, -0.5, 0.5], -0.2);
            LoadedModel::new(Box::new(model), Manifest::new(columns()).unwrap())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_aborted_caller_does_not_start_second_load() {
        let source = Arc::new(SlowSource {
            loads: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
            max_in_flight: AtomicU64::new(0),
        });
        let cache = Arc::new(PredictorCache::new(source.clone()));

        let first = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.ensure_ready().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        first.abort();

        cache.ensure_ready().await.unwrap();

        assert!(cache.is_ready());
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(cache.load_attempts(), 1);
    }

    #[tokio::test]
    async fn test_predict_record_consistent() {
        let cache = PredictorCache::new(Arc::new(CountingSource::new(false, Duration::ZERO)));
        let raw = record();

        let first = cache.predict_record(&raw).await.unwrap();
        let second = cache.predict_record(&raw).await.unwrap();

        assert_eq!(first.label, second.label);
        assert_eq!(first.proba(), second.proba());
        assert!((first.stay_probability + first.churn_probability - 1.0).abs() < 1e-9);
        // 0.4 + 0.5 - 0.2 > 0
        assert!(first.is_churn());
    }

    #[tokio::test]
    async fn test_fs_source_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let columns_path = dir.path().join("model_columns.json");
        std::fs::write(&model_path, r#"{"coefficients":[0.01,-0.5,0.5],"intercept":-0.2}"#)
            .unwrap();
        std::fs::write(&columns_path, serde_json::to_string(&columns()).unwrap()).unwrap();

        let cache = PredictorCache::new(Arc::new(FsArtifactSource::from_paths(
            &model_path,
            &columns_path,
        )));
        let prediction = cache.predict(&[30.0, 1.0, 0.0]).await.unwrap();
        assert_eq!(prediction.label, 0);
    }

    #[tokio::test]
    async fn test_fs_source_missing_then_present() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let columns_path = dir.path().join("model_columns.json");
        let cache = PredictorCache::new(Arc::new(FsArtifactSource::from_paths(
            &model_path,
            &columns_path,
        )));

        assert!(cache.ensure_ready().await.unwrap_err().is_artifact_load());

        std::fs::write(&model_path, r#"{"coefficients":[1.0,1.0,1.0],"intercept":0.0}"#).unwrap();
        std::fs::write(&columns_path, serde_json::to_string(&columns()).unwrap()).unwrap();
        cache.ensure_ready().await.unwrap();
        assert_eq!(cache.load_attempts(), 2);
    }
}
