//! Engine orchestration: cached bundle, invalidation, recommendation.

use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::bundle::{FittedBundle, artifact};
use crate::core::config::RecommenderConfig;
use crate::core::errors::{RecommendError, RecommendResult};
use crate::core::report::{Recommendation, ReportQuery};
use crate::corpus::Corpus;
use crate::ranking::rank_reports;

struct CachedState {
    bundle: Arc<FittedBundle>,
    source_modified: Option<DateTime<Utc>>,
}

/// Process-wide recommendation engine.
///
/// The fitted bundle lives behind a read-write lock and is replaced
/// wholesale: readers clone the current `Arc` and keep ranking against it
/// while a writer swaps in a rebuilt bundle, so no query ever observes a
/// partially built state. Rebuilds happen only when the corpus source
/// file's modification time changes, on the first request, or on an
/// explicit [`refit`](Self::refit).
pub struct RecommendationEngine {
    config: RecommenderConfig,
    state: RwLock<Option<CachedState>>,
}

impl RecommendationEngine {
    /// Create an engine from validated configuration.
    ///
    /// No corpus access happens here; the bundle is built lazily on the
    /// first request.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: RecommenderConfig) -> RecommendResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: RwLock::new(None),
        })
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Recommend with the configured default result count.
    ///
    /// # Errors
    /// Returns an error if the bundle cannot be built or the query cannot
    /// be embedded.
    pub fn recommend(&self, query: &ReportQuery) -> RecommendResult<Vec<Recommendation>> {
        self.recommend_top(query, self.config.scoring.top_n)
    }

    /// Recommend the top `top_n` eligible reports for the query.
    ///
    /// # Errors
    /// Returns an error if the bundle cannot be built or the query cannot
    /// be embedded.
    pub fn recommend_top(
        &self,
        query: &ReportQuery,
        top_n: usize,
    ) -> RecommendResult<Vec<Recommendation>> {
        let bundle = self.current_bundle()?;
        rank_reports(&bundle, query, &self.config.scoring, top_n)
    }

    /// Current bundle, building it on demand.
    ///
    /// Fast path: a read lock and an `Arc` clone when the cached state
    /// matches the corpus file's modification time. Slow path: a write
    /// lock with a re-check, then artifact restore or fresh fit.
    ///
    /// # Errors
    /// Returns an error if neither the artifact nor a fresh fit yields a
    /// usable bundle.
    pub fn current_bundle(&self) -> RecommendResult<Arc<FittedBundle>> {
        let source_modified = source_modified(&self.config.corpus.path);

        {
            let guard = self
                .state
                .read()
                .map_err(|_| RecommendError::StatePoisoned)?;
            if let Some(state) = guard.as_ref() {
                if state.source_modified == source_modified {
                    return Ok(Arc::clone(&state.bundle));
                }
            }
        }

        let mut guard = self
            .state
            .write()
            .map_err(|_| RecommendError::StatePoisoned)?;
        // Another writer may have rebuilt while we waited for the lock.
        if let Some(state) = guard.as_ref() {
            if state.source_modified == source_modified {
                return Ok(Arc::clone(&state.bundle));
            }
        }

        if guard.is_some() {
            info!("corpus source changed; rebuilding model bundle");
        }

        let bundle = Arc::new(self.load_or_fit(source_modified)?);
        *guard = Some(CachedState {
            bundle: Arc::clone(&bundle),
            source_modified,
        });
        Ok(bundle)
    }

    /// Force a rebuild from the corpus, bypassing cache and artifact.
    ///
    /// # Errors
    /// Returns an error if the corpus cannot be loaded or fitted.
    pub fn refit(&self) -> RecommendResult<Arc<FittedBundle>> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| RecommendError::StatePoisoned)?;
        let source_modified = source_modified(&self.config.corpus.path);
        let bundle = Arc::new(self.fit_from_corpus()?);
        *guard = Some(CachedState {
            bundle: Arc::clone(&bundle),
            source_modified,
        });
        Ok(bundle)
    }

    /// Persist the current bundle to the configured artifact path.
    ///
    /// # Errors
    /// Returns an error if no artifact path is configured or writing fails.
    pub fn save_artifact(&self) -> RecommendResult<()> {
        let Some(path) = self.config.artifact.path.clone() else {
            return Err(RecommendError::InvalidConfig(
                "artifact.path is not configured".to_string(),
            ));
        };

        let _ = self.current_bundle()?;
        let guard = self
            .state
            .read()
            .map_err(|_| RecommendError::StatePoisoned)?;
        match guard.as_ref() {
            Some(state) => artifact::save_bundle(&state.bundle, state.source_modified, &path),
            None => Err(RecommendError::NotFitted("engine")),
        }
    }

    fn load_or_fit(
        &self,
        source_modified: Option<DateTime<Utc>>,
    ) -> RecommendResult<FittedBundle> {
        if let Some(path) = &self.config.artifact.path {
            match artifact::load_bundle(path) {
                Ok(loaded) if loaded.source_modified == source_modified => {
                    return Ok(loaded.bundle);
                }
                Ok(_) => {
                    warn!(path = %path.display(), "artifact is stale; refitting from corpus");
                }
                Err(
                    err @ (RecommendError::ArtifactNotFound(_)
                    | RecommendError::ArtifactCorrupt(_)),
                ) => {
                    warn!("artifact unavailable ({err}); refitting from corpus");
                }
                Err(err) => return Err(err),
            }
        }

        let bundle = self.fit_from_corpus()?;
        if self.config.artifact.write_on_fit {
            if let Some(path) = &self.config.artifact.path {
                artifact::save_bundle(&bundle, source_modified, path)?;
            }
        }
        Ok(bundle)
    }

    fn fit_from_corpus(&self) -> RecommendResult<FittedBundle> {
        let corpus = Corpus::load_csv(&self.config.corpus.path, self.config.corpus.delimiter)?;
        FittedBundle::fit(corpus)
    }
}

fn source_modified(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    use super::*;

    const CORPUS_V1: &str = "\
type_object,description,type_breaking,text_report,diagnostic_data,was_done,result,name_component,quality_report
pump,leaking seal,mechanical,replaced seal kit,1,1,1,1,Meets criteria
pump,bearing noise,mechanical,greased bearing,1,1,1,1,Meets criteria
valve,stuck open,hydraulic,flushed actuator,1,1,1,1,Meets criteria
";

    const CORPUS_V2: &str = "\
type_object,description,type_breaking,text_report,diagnostic_data,was_done,result,name_component,quality_report
pump,leaking seal,mechanical,replaced seal kit,1,1,1,1,Meets criteria
pump,bearing noise,mechanical,greased bearing,1,1,1,1,Meets criteria
valve,stuck open,hydraulic,flushed actuator,1,1,1,1,Meets criteria
pump,low pressure,mechanical,cleaned impeller,1,1,1,1,Meets criteria
";

    fn write_corpus(path: &PathBuf, contents: &str, modified: SystemTime) {
        let mut file = File::create(path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.set_modified(modified).unwrap();
        file.sync_all().unwrap();
    }

    fn make_config(dir: &Path, with_artifact: bool) -> RecommenderConfig {
        let mut config = RecommenderConfig::default();
        config.corpus.path = dir.join("reports.csv");
        if with_artifact {
            config.artifact.path = Some(dir.join("model.bin"));
        }
        config
    }

    fn pump_query() -> ReportQuery {
        ReportQuery::new("pump", "leaking seal", "mechanical")
    }

    #[test]
    fn test_recommend_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = make_config(dir.path(), false);
        write_corpus(&config.corpus.path, CORPUS_V1, SystemTime::now());

        let engine = RecommendationEngine::new(config).unwrap();
        let first = engine.recommend(&pump_query()).unwrap();
        let second = engine.recommend(&pump_query()).unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.text_report, b.text_report);
            assert!((a.final_score - b.final_score).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_bundle_cached_while_mtime_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let config = make_config(dir.path(), false);
        let stamp = SystemTime::now() - Duration::from_secs(3600);
        write_corpus(&config.corpus.path, CORPUS_V1, stamp);

        let engine = RecommendationEngine::new(config.clone()).unwrap();
        let before = engine.recommend(&pump_query()).unwrap();

        // Rewrite the file but restore the old mtime: the cache must hold.
        write_corpus(&config.corpus.path, CORPUS_V2, stamp);
        let after = engine.recommend(&pump_query()).unwrap();
        assert_eq!(before.len(), after.len());
    }

    #[test]
    fn test_bundle_rebuilt_when_mtime_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = make_config(dir.path(), false);
        let stamp = SystemTime::now() - Duration::from_secs(3600);
        write_corpus(&config.corpus.path, CORPUS_V1, stamp);

        let engine = RecommendationEngine::new(config.clone()).unwrap();
        let before = engine.recommend(&pump_query()).unwrap();
        assert_eq!(before.len(), 2);

        write_corpus(
            &config.corpus.path,
            CORPUS_V2,
            stamp + Duration::from_secs(60),
        );
        let after = engine.recommend(&pump_query()).unwrap();
        assert_eq!(after.len(), 3);
    }

    #[test]
    fn test_refit_picks_up_new_rows() {
        let dir = tempfile::tempdir().unwrap();
        let config = make_config(dir.path(), false);
        let stamp = SystemTime::now() - Duration::from_secs(3600);
        write_corpus(&config.corpus.path, CORPUS_V1, stamp);

        let engine = RecommendationEngine::new(config.clone()).unwrap();
        assert_eq!(engine.current_bundle().unwrap().corpus().len(), 3);

        write_corpus(&config.corpus.path, CORPUS_V2, stamp);
        let bundle = engine.refit().unwrap();
        assert_eq!(bundle.corpus().len(), 4);
    }

    #[test]
    fn test_artifact_written_and_restored() {
        let dir = tempfile::tempdir().unwrap();
        let config = make_config(dir.path(), true);
        let stamp = SystemTime::now() - Duration::from_secs(3600);
        write_corpus(&config.corpus.path, CORPUS_V1, stamp);

        let engine = RecommendationEngine::new(config.clone()).unwrap();
        let fresh = engine.recommend(&pump_query()).unwrap();
        let artifact_path = config.artifact.path.clone().unwrap();
        assert!(artifact_path.exists());

        // Make the corpus unreadable as CSV but keep its mtime: a second
        // engine must serve from the artifact without touching the corpus.
        write_corpus(&config.corpus.path, "garbage", stamp);
        let restored_engine = RecommendationEngine::new(config).unwrap();
        let restored = restored_engine.recommend(&pump_query()).unwrap();

        assert_eq!(fresh.len(), restored.len());
        for (a, b) in fresh.iter().zip(&restored) {
            assert_eq!(a.text_report, b.text_report);
            assert!((a.final_score - b.final_score).abs() < 1e-12);
        }
    }

    #[test]
    fn test_corrupt_artifact_falls_back_to_fit() {
        let dir = tempfile::tempdir().unwrap();
        let config = make_config(dir.path(), true);
        write_corpus(&config.corpus.path, CORPUS_V1, SystemTime::now());
        std::fs::write(config.artifact.path.clone().unwrap(), b"garbage").unwrap();

        let engine = RecommendationEngine::new(config).unwrap();
        let results = engine.recommend(&pump_query()).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_missing_corpus_surfaces_data_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = make_config(dir.path(), false);

        let engine = RecommendationEngine::new(config).unwrap();
        let err = engine.recommend(&pump_query()).unwrap_err();
        assert!(matches!(err, RecommendError::DataLoad(_)));
    }

    #[test]
    fn test_save_artifact_requires_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = make_config(dir.path(), false);
        write_corpus(&config.corpus.path, CORPUS_V1, SystemTime::now());

        let engine = RecommendationEngine::new(config).unwrap();
        let err = engine.save_artifact().unwrap_err();
        assert!(matches!(err, RecommendError::InvalidConfig(_)));
    }
}
