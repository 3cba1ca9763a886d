//! Configuration for the recommendation engine.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{RecommendError, RecommendResult};

/// Top-level configuration for the recommendation engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Corpus source settings.
    pub corpus: CorpusConfig,
    /// Persisted artifact settings.
    pub artifact: ArtifactConfig,
    /// Ranking and eligibility settings.
    pub scoring: ScoringConfig,
}

impl RecommenderConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> RecommendResult<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> RecommendResult<()> {
        if self.corpus.path.as_os_str().is_empty() {
            return Err(RecommendError::InvalidConfig(
                "corpus.path must not be empty".to_string(),
            ));
        }

        if !self.corpus.delimiter.is_ascii() {
            return Err(RecommendError::InvalidConfig(
                "corpus.delimiter must be an ASCII character".to_string(),
            ));
        }

        if self.scoring.top_n == 0 {
            return Err(RecommendError::InvalidConfig(
                "scoring.top_n must be > 0".to_string(),
            ));
        }

        for (name, weight) in [
            ("scoring.similarity_weight", self.scoring.similarity_weight),
            ("scoring.quality_weight", self.scoring.quality_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RecommendError::InvalidConfig(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }

        if self.scoring.similarity_weight + self.scoring.quality_weight <= 0.0 {
            return Err(RecommendError::InvalidConfig(
                "scoring weights must not both be zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Corpus source settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Path to the tabular report corpus (CSV).
    pub path: PathBuf,
    /// Field delimiter used by the corpus file.
    pub delimiter: char,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("reports.csv"),
            delimiter: ',',
        }
    }
}

/// Persisted artifact settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Path of the serialized model bundle; `None` disables persistence.
    pub path: Option<PathBuf>,
    /// Write the artifact automatically after a fresh fit.
    pub write_on_fit: bool,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            path: None,
            write_on_fit: true,
        }
    }
}

/// Ranking coefficients and eligibility settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Weight of the textual similarity component.
    pub similarity_weight: f64,
    /// Weight of the report quality component.
    pub quality_weight: f64,
    /// Default number of recommendations to return.
    pub top_n: usize,
    /// `quality_report` label that excludes a row from recommendation.
    pub excluded_quality_label: String,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            similarity_weight: 0.6,
            quality_weight: 0.4,
            top_n: 3,
            excluded_quality_label: "Does not meet criteria".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RecommenderConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_weights() {
        let scoring = ScoringConfig::default();
        assert!((scoring.similarity_weight - 0.6).abs() < f64::EPSILON);
        assert!((scoring.quality_weight - 0.4).abs() < f64::EPSILON);
        assert_eq!(scoring.top_n, 3);
    }

    #[test]
    fn test_zero_top_n_rejected() {
        let mut config = RecommenderConfig::default();
        config.scoring.top_n = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = RecommenderConfig::default();
        config.scoring.quality_weight = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_both_weights_zero_rejected() {
        let mut config = RecommenderConfig::default();
        config.scoring.similarity_weight = 0.0;
        config.scoring.quality_weight = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_corpus_path_rejected() {
        let mut config = RecommenderConfig::default();
        config.corpus.path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = RecommenderConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: RecommenderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.scoring.top_n, config.scoring.top_n);
        assert_eq!(restored.corpus.delimiter, config.corpus.delimiter);
    }
}
