//! Corpus loading from tabular report exports.

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::errors::{RecommendError, RecommendResult};
use crate::core::report::{INDICATOR_COUNT, QualityIndicators, ReportRow};

/// Column headers the corpus export must provide, in any order.
const REQUIRED_COLUMNS: [&str; 9] = [
    "type_object",
    "description",
    "type_breaking",
    "text_report",
    "diagnostic_data",
    "was_done",
    "result",
    "name_component",
    "quality_report",
];

/// The historical report corpus, in source-file order.
///
/// Row order is load order and stays stable for the lifetime of the value;
/// downstream feature matrices index into it by position.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    rows: Vec<ReportRow>,
}

impl Corpus {
    /// Build a corpus from already-constructed rows.
    #[must_use]
    pub fn from_rows(rows: Vec<ReportRow>) -> Self {
        Self { rows }
    }

    /// Load the corpus from a delimited text export.
    ///
    /// Headers are matched by name, not position. Boolean indicator cells
    /// accept `1`/`0`, `true`/`false`, and `yes`/`no` (case-insensitive);
    /// an empty cell counts as `false`.
    ///
    /// # Errors
    /// Returns an error if the file is unreadable, a required column is
    /// missing, or a row cannot be parsed.
    pub fn load_csv(path: &Path, delimiter: char) -> RecommendResult<Self> {
        let delimiter = u8::try_from(delimiter).map_err(|_| {
            RecommendError::InvalidConfig("corpus delimiter must be ASCII".to_string())
        })?;

        let file = File::open(path).map_err(|err| {
            RecommendError::DataLoad(format!("cannot open {}: {err}", path.display()))
        })?;

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|err| RecommendError::DataLoad(format!("cannot read header row: {err}")))?
            .clone();

        let mut columns = [0_usize; REQUIRED_COLUMNS.len()];
        for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| RecommendError::MissingColumn(name.to_string()))?;
        }
        let [
            type_object,
            description,
            type_breaking,
            text_report,
            diagnostic_data,
            was_done,
            result,
            name_component,
            quality_report,
        ] = columns;

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            // Header row is line 1; data rows are 1-based after it.
            let row_number = index + 2;
            let record = record.map_err(|err| {
                RecommendError::DataLoad(format!("row {row_number} is malformed: {err}"))
            })?;

            let indicators = QualityIndicators {
                diagnostic_data: parse_flag(&record, diagnostic_data, row_number)?,
                was_done: parse_flag(&record, was_done, row_number)?,
                result: parse_flag(&record, result, row_number)?,
                name_component: parse_flag(&record, name_component, row_number)?,
            };

            rows.push(ReportRow::new(
                field(&record, type_object, row_number)?,
                field(&record, description, row_number)?,
                field(&record, type_breaking, row_number)?,
                field(&record, text_report, row_number)?,
                indicators,
                field(&record, quality_report, row_number)?,
            ));
        }

        info!(rows = rows.len(), path = %path.display(), "corpus loaded");
        Ok(Self { rows })
    }

    /// Corpus rows in stable source order.
    #[must_use]
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the corpus has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Derived textual features, one entry per row.
    #[must_use]
    pub fn text_features(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.text_features.as_str()).collect()
    }

    /// Numeric quality-indicator matrix, one row per corpus row.
    #[must_use]
    pub fn indicator_rows(&self) -> Vec<[f64; INDICATOR_COUNT]> {
        self.rows.iter().map(|row| row.indicators.to_features()).collect()
    }
}

fn field<'r>(record: &'r StringRecord, index: usize, row_number: usize) -> RecommendResult<&'r str> {
    record.get(index).ok_or_else(|| {
        RecommendError::DataLoad(format!("row {row_number} is missing column {index}"))
    })
}

fn parse_flag(record: &StringRecord, index: usize, row_number: usize) -> RecommendResult<bool> {
    let raw = field(record, index, row_number)?;
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "" | "0" | "false" | "no" => Ok(false),
        other => Err(RecommendError::DataLoad(format!(
            "row {row_number} has invalid boolean value {other:?}"
        ))),
    }
}
