//! Merge of two recommendation sources into one list: bandit-driven
//! ("vertical") rows weighted by the RL weight and collaborative
//! ("horizontal") rows weighted by the CF weight. Each startup appears once,
//! under whichever source gave it the higher weighted score.

use dealflow_core::config::BlendConfig;
use dealflow_core::{DealflowError, DealflowResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    Vertical,
    Horizontal,
}

/// One row from an upstream source. Vertical rows carry `rl_score`,
/// horizontal rows `cf_score`; a missing score counts as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRow {
    pub startup_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub rl_score: Option<f64>,
    #[serde(default)]
    pub cf_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendedRecommendation {
    pub source: RecommendationSource,
    pub startup_id: String,
    pub name: Option<String>,
    pub industry: String,
    pub stage: String,
    pub score: f64,
}

/// Weight, deduplicate and sort. On equal scores the row seen first wins the
/// dedupe and keeps its position in the sort; vertical rows are seen first.
pub fn merge_recommendations(
    vertical: &[SourceRow],
    horizontal: &[SourceRow],
    weights: &BlendConfig,
) -> DealflowResult<Vec<BlendedRecommendation>> {
    let weighted = vertical
        .iter()
        .map(|row| (RecommendationSource::Vertical, row, row.rl_score, weights.rl_weight))
        .chain(
            horizontal
                .iter()
                .map(|row| (RecommendationSource::Horizontal, row, row.cf_score, weights.cf_weight)),
        );

    let mut merged: Vec<BlendedRecommendation> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();
    for (source, row, raw, weight) in weighted {
        let raw = raw.unwrap_or(0.0);
        if !raw.is_finite() {
            return Err(DealflowError::InvalidInput(format!(
                "score for startup {} must be finite, got {raw}",
                row.startup_id
            )));
        }
        let candidate = BlendedRecommendation {
            source,
            startup_id: row.startup_id.clone(),
            name: row.name.clone(),
            industry: row.industry.clone(),
            stage: row.stage.clone(),
            score: raw * weight,
        };
        match position.get(row.startup_id.as_str()).copied() {
            Some(i) if candidate.score > merged[i].score => merged[i] = candidate,
            Some(_) => {}
            None => {
                position.insert(row.startup_id.as_str(), merged.len());
                merged.push(candidate);
            }
        }
    }

    merged.sort_by(|a, b| b.score.total_cmp(&a.score));

    metrics::counter!("blend.merged").increment(merged.len() as u64);
    debug!(
        vertical = vertical.len(),
        horizontal = horizontal.len(),
        merged = merged.len(),
        "Recommendation sources merged"
    );
    Ok(merged)
}
