use crate::error::{DealflowError, DealflowResult};
use crate::taxonomy::Taxonomy;
use serde::Deserialize;
use std::path::Path;

/// Root engine configuration. Loaded from an optional `dealflow.toml` and
/// environment variables with the prefix `DEALFLOW__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bandit: BanditConfig,
    #[serde(default)]
    pub linalg: LinalgConfig,
    #[serde(default)]
    pub taxonomy: Taxonomy,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub blend: BlendConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BanditConfig {
    /// Exploration weight applied to the uncertainty term.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinalgConfig {
    /// Pivots smaller than this (relative to the largest entry) are singular.
    #[serde(default = "default_pivot_tolerance")]
    pub pivot_tolerance: f64,
    #[serde(default = "default_max_condition_number")]
    pub max_condition_number: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NormalizationConfig {
    #[serde(default = "default_mrr_divisor")]
    pub mrr_divisor: f64,
    #[serde(default = "default_burn_rate_divisor")]
    pub burn_rate_divisor: f64,
    #[serde(default = "default_founder_experience_divisor")]
    pub founder_experience_divisor: f64,
    /// Upper clamp for every normalized metric. There is no lower clamp.
    #[serde(default = "default_upper_bound")]
    pub upper_bound: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationConfig {
    #[serde(default = "default_industry_penalty")]
    pub industry_penalty: f64,
    #[serde(default = "default_stage_penalty")]
    pub stage_penalty: f64,
    #[serde(default = "default_valuation_penalty")]
    pub valuation_penalty: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

/// Weights for mixing the reinforcement and collaborative components of the
/// heuristic score and of merged recommendation lists.
#[derive(Debug, Clone, Deserialize)]
pub struct BlendConfig {
    #[serde(default = "default_rl_weight")]
    pub rl_weight: f64,
    #[serde(default = "default_cf_weight")]
    pub cf_weight: f64,
}

// Default functions
fn default_alpha() -> f64 {
    1.0
}
fn default_pivot_tolerance() -> f64 {
    1e-10
}
fn default_max_condition_number() -> f64 {
    1e12
}
fn default_mrr_divisor() -> f64 {
    200_000.0
}
fn default_burn_rate_divisor() -> f64 {
    100_000.0
}
fn default_founder_experience_divisor() -> f64 {
    10.0
}
fn default_upper_bound() -> f64 {
    1.0
}
fn default_industry_penalty() -> f64 {
    0.7
}
fn default_stage_penalty() -> f64 {
    0.8
}
fn default_valuation_penalty() -> f64 {
    0.6
}
fn default_top_n() -> usize {
    10
}
fn default_max_candidates() -> usize {
    50
}
fn default_rl_weight() -> f64 {
    0.7
}
fn default_cf_weight() -> f64 {
    0.3
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
        }
    }
}

impl Default for LinalgConfig {
    fn default() -> Self {
        Self {
            pivot_tolerance: default_pivot_tolerance(),
            max_condition_number: default_max_condition_number(),
        }
    }
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            mrr_divisor: default_mrr_divisor(),
            burn_rate_divisor: default_burn_rate_divisor(),
            founder_experience_divisor: default_founder_experience_divisor(),
            upper_bound: default_upper_bound(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            industry_penalty: default_industry_penalty(),
            stage_penalty: default_stage_penalty(),
            valuation_penalty: default_valuation_penalty(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            max_candidates: default_max_candidates(),
        }
    }
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            rl_weight: default_rl_weight(),
            cf_weight: default_cf_weight(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `dealflow.toml` (if present) and environment.
    pub fn load() -> DealflowResult<Self> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of `dealflow.toml` when given.
    /// Environment variables always take precedence over file values.
    pub fn load_from(path: Option<&Path>) -> DealflowResult<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name("dealflow").required(false),
        };

        let builder = config::Config::builder().add_source(file).add_source(
            config::Environment::with_prefix("DEALFLOW")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("taxonomy.industries")
                .with_list_parse_key("taxonomy.stages"),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        tracing::debug!(
            alpha = config.bandit.alpha,
            taxonomy = %config.taxonomy.version,
            dimension = config.taxonomy.feature_dimension(),
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> DealflowResult<()> {
        if !self.bandit.alpha.is_finite() || self.bandit.alpha < 0.0 {
            return Err(DealflowError::Config(format!(
                "bandit.alpha must be finite and non-negative, got {}",
                self.bandit.alpha
            )));
        }
        require_positive("linalg.pivot_tolerance", self.linalg.pivot_tolerance)?;
        require_positive("linalg.max_condition_number", self.linalg.max_condition_number)?;
        require_positive("normalization.mrr_divisor", self.normalization.mrr_divisor)?;
        require_positive(
            "normalization.burn_rate_divisor",
            self.normalization.burn_rate_divisor,
        )?;
        require_positive(
            "normalization.founder_experience_divisor",
            self.normalization.founder_experience_divisor,
        )?;
        if !self.normalization.upper_bound.is_finite() {
            return Err(DealflowError::Config(
                "normalization.upper_bound must be finite".into(),
            ));
        }
        for (key, factor) in [
            ("calibration.industry_penalty", self.calibration.industry_penalty),
            ("calibration.stage_penalty", self.calibration.stage_penalty),
            ("calibration.valuation_penalty", self.calibration.valuation_penalty),
            ("blend.rl_weight", self.blend.rl_weight),
            ("blend.cf_weight", self.blend.cf_weight),
        ] {
            if !factor.is_finite() || factor < 0.0 {
                return Err(DealflowError::Config(format!(
                    "{key} must be finite and non-negative, got {factor}"
                )));
            }
        }
        if self.ranking.top_n == 0 {
            return Err(DealflowError::Config("ranking.top_n must be at least 1".into()));
        }
        self.taxonomy.validate()
    }
}

fn require_positive(key: &str, value: f64) -> DealflowResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DealflowError::Config(format!(
            "{key} must be finite and positive, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_v1_encoding() {
        let config = AppConfig::default();
        assert!((config.bandit.alpha - 1.0).abs() < f64::EPSILON);
        assert!((config.normalization.mrr_divisor - 200_000.0).abs() < f64::EPSILON);
        assert!((config.normalization.burn_rate_divisor - 100_000.0).abs() < f64::EPSILON);
        assert!((config.normalization.founder_experience_divisor - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.ranking.top_n, 10);
        assert_eq!(config.ranking.max_candidates, 50);
        assert_eq!(config.taxonomy.feature_dimension(), 18);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_alpha() {
        let mut config = AppConfig::default();
        config.bandit.alpha = -0.5;
        assert!(matches!(config.validate(), Err(DealflowError::Config(_))));

        config.bandit.alpha = f64::NAN;
        assert!(matches!(config.validate(), Err(DealflowError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_divisor() {
        let mut config = AppConfig::default();
        config.normalization.burn_rate_divisor = 0.0;
        assert!(matches!(config.validate(), Err(DealflowError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_negative_blend_weight() {
        let mut config = AppConfig::default();
        assert!((config.blend.rl_weight - 0.7).abs() < f64::EPSILON);
        assert!((config.blend.cf_weight - 0.3).abs() < f64::EPSILON);
        config.blend.cf_weight = -0.1;
        assert!(matches!(config.validate(), Err(DealflowError::Config(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"bandit": {"alpha": 0.25}, "ranking": {"top_n": 3}}"#)
                .unwrap();
        assert!((config.bandit.alpha - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.ranking.top_n, 3);
        assert_eq!(config.ranking.max_candidates, 50);
        assert_eq!(config.taxonomy, Taxonomy::v1());
    }
}
