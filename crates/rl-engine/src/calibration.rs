//! Preference calibration: multiplicative penalties applied to the raw UCB
//! score when a candidate falls outside an investor's declared thesis.

use crate::features::metric_value;
use dealflow_core::config::CalibrationConfig;
use dealflow_core::types::{CandidateRecord, InvestorPreferences, METRIC_VALUATION};
use dealflow_core::DealflowResult;

#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    config: CalibrationConfig,
}

impl Calibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    /// Penalties compose: an off-thesis industry and stage yields
    /// `score * industry_penalty * stage_penalty`. The valuation check only
    /// applies when both ticket bounds are set and non-zero; a missing
    /// valuation reads 0.0.
    pub fn calibrate(
        &self,
        score: f64,
        record: &CandidateRecord,
        preferences: &InvestorPreferences,
    ) -> DealflowResult<f64> {
        let mut calibrated = score;

        if let Some(industries) = &preferences.industries {
            if !industries.contains(&record.industry) {
                calibrated *= self.config.industry_penalty;
            }
        }

        if let Some(stages) = &preferences.stages {
            if !stages.contains(&record.stage) {
                calibrated *= self.config.stage_penalty;
            }
        }

        let bound = |v: Option<f64>| v.filter(|b| *b != 0.0);
        if let (Some(min), Some(max)) = (
            bound(preferences.ticket_size_min),
            bound(preferences.ticket_size_max),
        ) {
            let valuation = metric_value(&record.metrics, METRIC_VALUATION)?;
            if valuation < min || valuation > max {
                calibrated *= self.config.valuation_penalty;
            }
        }

        Ok(calibrated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealflow_core::DealflowError;

    fn prefs() -> InvestorPreferences {
        InvestorPreferences {
            industries: Some(vec!["SaaS".into(), "FinTech".into()]),
            stages: Some(vec!["Seed".into()]),
            ticket_size_min: Some(1_000_000.0),
            ticket_size_max: Some(10_000_000.0),
        }
    }

    #[test]
    fn test_on_thesis_candidate_is_unchanged() {
        let record = CandidateRecord::new("SaaS", "Seed").with_metric("valuation", 5_000_000);
        let score = Calibrator::default().calibrate(2.0, &record, &prefs()).unwrap();
        assert!((score - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_penalties_compose_multiplicatively() {
        let record = CandidateRecord::new("Gaming", "Series B").with_metric("valuation", 50_000_000);
        let score = Calibrator::default().calibrate(1.0, &record, &prefs()).unwrap();
        assert!((score - 0.7 * 0.8 * 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_missing_valuation_is_out_of_range() {
        let record = CandidateRecord::new("SaaS", "Seed");
        let score = Calibrator::default().calibrate(1.0, &record, &prefs()).unwrap();
        assert!((score - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_valuation_check_needs_both_bounds() {
        let preferences = InvestorPreferences {
            ticket_size_min: Some(1_000_000.0),
            ..Default::default()
        };
        let record = CandidateRecord::new("Gaming", "Seed");
        let score = Calibrator::default().calibrate(1.0, &record, &preferences).unwrap();
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_ticket_bound_disables_valuation_check() {
        let record = CandidateRecord::new("SaaS", "Seed").with_metric("valuation", 9_000_000);
        for (min, max) in [(0.0, 5_000_000.0), (1_000_000.0, 0.0)] {
            let preferences = InvestorPreferences {
                ticket_size_min: Some(min),
                ticket_size_max: Some(max),
                ..Default::default()
            };
            let score = Calibrator::default().calibrate(1.0, &record, &preferences).unwrap();
            assert!((score - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_empty_preferences_are_neutral() {
        let record = CandidateRecord::new("Unknown", "Unknown");
        let score = Calibrator::default()
            .calibrate(-0.4, &record, &InvestorPreferences::default())
            .unwrap();
        assert!((score + 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_valuation_is_invalid_input() {
        let record = CandidateRecord::new("SaaS", "Seed").with_metric("valuation", "n/a");
        assert!(matches!(
            Calibrator::default().calibrate(1.0, &record, &prefs()),
            Err(DealflowError::InvalidInput(_))
        ));
    }
}
