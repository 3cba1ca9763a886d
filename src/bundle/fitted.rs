//! Fitted model bundle shared by all recommendation requests.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::errors::RecommendResult;
use crate::corpus::Corpus;
use crate::encoding::{TfidfVector, TfidfVectorizer};
use crate::quality::StandardScaler;

/// Immutable fitted state: corpus snapshot, feature space, feature matrix,
/// and quality moments.
///
/// Invariant: `matrix[i]` and `quality_scores[i]` describe `corpus.rows()[i]`;
/// the arrays stay parallel for the lifetime of the bundle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedBundle {
    corpus: Corpus,
    vectorizer: TfidfVectorizer,
    scaler: StandardScaler,
    matrix: Vec<TfidfVector>,
    quality_scores: Vec<f64>,
}

impl FittedBundle {
    /// Fit the feature space and quality moments over the corpus.
    ///
    /// # Errors
    /// Returns an error if vectorization fails.
    pub fn fit(corpus: Corpus) -> RecommendResult<Self> {
        let mut vectorizer = TfidfVectorizer::new();
        let matrix = vectorizer.fit_transform(&corpus.text_features())?;

        let indicator_rows = corpus.indicator_rows();
        let mut scaler = StandardScaler::new();
        scaler.fit(&indicator_rows);
        let quality_scores = scaler.score_all(&indicator_rows)?;

        info!(
            rows = corpus.len(),
            vocabulary = vectorizer.vocabulary_len(),
            "model fitted"
        );

        Ok(Self {
            corpus,
            vectorizer,
            scaler,
            matrix,
            quality_scores,
        })
    }

    /// Corpus snapshot the bundle was fitted over.
    #[must_use]
    pub const fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Fitted feature encoder.
    #[must_use]
    pub const fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    /// Fitted quality scaler.
    #[must_use]
    pub const fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Per-row feature vectors, parallel to the corpus rows.
    #[must_use]
    pub fn matrix(&self) -> &[TfidfVector] {
        &self.matrix
    }

    /// Per-row quality scores, parallel to the corpus rows.
    #[must_use]
    pub fn quality_scores(&self) -> &[f64] {
        &self.quality_scores
    }

    /// Parallel-array and fitted-state consistency, checked after restores.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.corpus.len() == self.matrix.len()
            && self.corpus.len() == self.quality_scores.len()
            && self.vectorizer.is_fitted()
            && self.scaler.is_fitted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::{QualityIndicators, ReportRow};

    fn make_row(object_type: &str, description: &str, text_report: &str) -> ReportRow {
        ReportRow::new(
            object_type,
            description,
            "mechanical",
            text_report,
            QualityIndicators::default(),
            "Meets criteria",
        )
    }

    #[test]
    fn test_fit_keeps_arrays_parallel() {
        let corpus = Corpus::from_rows(vec![
            make_row("pump", "leaking seal", "replaced seal kit"),
            make_row("valve", "stuck open", "flushed actuator"),
        ]);
        let bundle = FittedBundle::fit(corpus).unwrap();

        assert!(bundle.is_consistent());
        assert_eq!(bundle.matrix().len(), 2);
        assert_eq!(bundle.quality_scores().len(), 2);
    }

    #[test]
    fn test_fit_empty_corpus() {
        let bundle = FittedBundle::fit(Corpus::from_rows(Vec::new())).unwrap();
        assert!(bundle.is_consistent());
        assert!(bundle.corpus().is_empty());
    }
}
