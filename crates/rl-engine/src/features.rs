//! Candidate feature encoding: industry one-hot, stage one-hot and three
//! normalized metrics, in that order.

use dealflow_core::config::NormalizationConfig;
use dealflow_core::types::{
    CandidateRecord, METRIC_BURN_RATE, METRIC_FOUNDER_EXPERIENCE, METRIC_MRR,
};
use dealflow_core::{DealflowError, DealflowResult, Taxonomy};
use ndarray::Array1;
use serde_json::{Map, Value};

pub type FeatureVector = Array1<f64>;

#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    taxonomy: Taxonomy,
    normalization: NormalizationConfig,
}

impl FeatureEncoder {
    pub fn new(taxonomy: Taxonomy, normalization: NormalizationConfig) -> Self {
        Self {
            taxonomy,
            normalization,
        }
    }

    pub fn dimension(&self) -> usize {
        self.taxonomy.feature_dimension()
    }

    /// Encode a record. Unknown industries or stages leave their block at
    /// zero; missing or null metrics count as 0.0 before normalization.
    pub fn encode(&self, record: &CandidateRecord) -> DealflowResult<FeatureVector> {
        let n_industries = self.taxonomy.industries.len();
        let n_stages = self.taxonomy.stages.len();
        let mut x = Array1::<f64>::zeros(self.dimension());

        if let Some(i) = self.taxonomy.industry_index(&record.industry) {
            x[i] = 1.0;
        }
        if let Some(s) = self.taxonomy.stage_index(&record.stage) {
            x[n_industries + s] = 1.0;
        }

        let norm = &self.normalization;
        let offset = n_industries + n_stages;
        let metrics = [
            (METRIC_MRR, norm.mrr_divisor),
            (METRIC_BURN_RATE, norm.burn_rate_divisor),
            (METRIC_FOUNDER_EXPERIENCE, norm.founder_experience_divisor),
        ];
        for (j, (key, divisor)) in metrics.into_iter().enumerate() {
            let raw = metric_value(&record.metrics, key)?;
            // Upper clamp only: negative metrics pass through.
            x[offset + j] = (raw / divisor).min(norm.upper_bound);
        }

        Ok(x)
    }
}

/// Read a metric as a real number. Accepts JSON numbers and numeric strings;
/// absent keys and `null` read as 0.0.
pub fn metric_value(metrics: &Map<String, Value>, key: &str) -> DealflowResult<f64> {
    let value = match metrics.get(key) {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Some(_) => None,
    };

    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(DealflowError::InvalidInput(format!(
            "metric {key:?} is not a real number: {}",
            metrics.get(key).map(Value::to_string).unwrap_or_default()
        ))),
    }
}
