//! Report, query, and recommendation data types.

use serde::{Deserialize, Serialize};

/// Number of boolean quality indicators per report.
pub const INDICATOR_COUNT: usize = 4;

/// Boolean quality indicators recorded against a report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityIndicators {
    /// Diagnostic data was attached.
    pub diagnostic_data: bool,
    /// The work was carried out.
    pub was_done: bool,
    /// A result was recorded.
    pub result: bool,
    /// The affected component was named.
    pub name_component: bool,
}

impl QualityIndicators {
    /// Indicator values as a numeric feature row (`1.0` / `0.0`).
    #[must_use]
    pub fn to_features(self) -> [f64; INDICATOR_COUNT] {
        [
            f64::from(u8::from(self.diagnostic_data)),
            f64::from(u8::from(self.was_done)),
            f64::from(u8::from(self.result)),
            f64::from(u8::from(self.name_component)),
        ]
    }
}

/// One historical report row of the corpus.
///
/// `text_features` is derived at construction and feeds the vectorizer;
/// it concatenates the categorical labels with both free-text fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Categorical label of the physical asset type.
    pub object_type: String,
    /// Free text describing the issue.
    pub description: String,
    /// Categorical label of the fault category.
    pub breakage_type: String,
    /// Free text of the resolution report (the recommended payload).
    pub text_report: String,
    /// Boolean quality indicators.
    pub indicators: QualityIndicators,
    /// Eligibility label; the exclusion sentinel disqualifies the row.
    pub quality_report: String,
    /// Derived textual features used for vectorization.
    pub text_features: String,
}

impl ReportRow {
    /// Build a row and compute its derived `text_features`.
    #[must_use]
    pub fn new(
        object_type: impl Into<String>,
        description: impl Into<String>,
        breakage_type: impl Into<String>,
        text_report: impl Into<String>,
        indicators: QualityIndicators,
        quality_report: impl Into<String>,
    ) -> Self {
        let object_type = object_type.into();
        let description = description.into();
        let breakage_type = breakage_type.into();
        let text_report = text_report.into();
        let text_features = format!("{object_type} {description} {breakage_type} {text_report}");

        Self {
            object_type,
            description,
            breakage_type,
            text_report,
            indicators,
            quality_report: quality_report.into(),
            text_features,
        }
    }
}

/// An incoming recommendation query from the surrounding API layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportQuery {
    /// Asset type of the new task.
    pub object_type: String,
    /// Free-text description of the new task.
    pub description: String,
    /// Fault category of the new task.
    pub breakage_type: String,
}

impl ReportQuery {
    /// Create a query.
    #[must_use]
    pub fn new(
        object_type: impl Into<String>,
        description: impl Into<String>,
        breakage_type: impl Into<String>,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            description: description.into(),
            breakage_type: breakage_type.into(),
        }
    }

    /// Query text embedded into the corpus feature space.
    #[must_use]
    pub fn query_text(&self) -> String {
        format!(
            "{} {} {}",
            self.object_type, self.description, self.breakage_type
        )
    }
}

/// A recommended report with its score breakdown.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recommendation {
    /// Resolution report text of the matched row.
    pub text_report: String,
    /// Blended score used for ranking.
    pub final_score: f64,
    /// Cosine similarity component.
    pub similarity: f64,
    /// Normalized quality component.
    pub quality_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_features_concatenation() {
        let row = ReportRow::new(
            "pump",
            "leaking seal",
            "mechanical",
            "replaced seal kit",
            QualityIndicators::default(),
            "Meets criteria",
        );
        assert_eq!(
            row.text_features,
            "pump leaking seal mechanical replaced seal kit"
        );
    }

    #[test]
    fn test_indicator_features_binary() {
        let indicators = QualityIndicators {
            diagnostic_data: true,
            was_done: false,
            result: true,
            name_component: false,
        };
        assert_eq!(indicators.to_features(), [1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_query_text_order() {
        let query = ReportQuery::new("valve", "stuck open", "hydraulic");
        assert_eq!(query.query_text(), "valve stuck open hydraulic");
    }

    #[test]
    fn test_query_text_with_empty_description() {
        let query = ReportQuery::new("valve", "", "hydraulic");
        assert_eq!(query.query_text(), "valve  hydraulic");
    }
}
