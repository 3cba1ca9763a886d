//! Recommendation ranking: eligibility filtering and blended scoring.

use tracing::debug;

use crate::bundle::FittedBundle;
use crate::core::config::ScoringConfig;
use crate::core::errors::RecommendResult;
use crate::core::report::{Recommendation, ReportQuery};

/// Rank eligible corpus rows against the query and return the top `top_n`.
///
/// A row is eligible when its `object_type` equals the query's exactly and
/// its `quality_report` differs from the configured exclusion label. The
/// blended score is `similarity * similarity_weight + quality_score *
/// quality_weight`; equal scores keep corpus order (the sort is stable).
/// Fewer eligible rows than `top_n` returns them all; none returns an
/// empty vector rather than an error.
///
/// # Errors
/// Returns an error if the query cannot be embedded.
pub fn rank_reports(
    bundle: &FittedBundle,
    query: &ReportQuery,
    scoring: &ScoringConfig,
    top_n: usize,
) -> RecommendResult<Vec<Recommendation>> {
    let query_vector = bundle.vectorizer().transform(&query.query_text())?;

    let mut ranked = Vec::new();
    for (index, row) in bundle.corpus().rows().iter().enumerate() {
        if row.object_type != query.object_type {
            continue;
        }
        if row.quality_report == scoring.excluded_quality_label {
            continue;
        }

        let similarity = query_vector.cosine(&bundle.matrix()[index]);
        let quality_score = bundle.quality_scores()[index];
        let final_score = scoring
            .similarity_weight
            .mul_add(similarity, quality_score * scoring.quality_weight);

        ranked.push(Recommendation {
            text_report: row.text_report.clone(),
            final_score,
            similarity,
            quality_score,
        });
    }

    ranked.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
    ranked.truncate(top_n);

    debug!(
        object_type = %query.object_type,
        returned = ranked.len(),
        top_n,
        "ranked recommendations"
    );
    Ok(ranked)
}
