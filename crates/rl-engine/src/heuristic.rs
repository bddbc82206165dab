//! Rule-based deal scoring for investors without bandit history.
//!
//! Two components on a 0 to 100 scale: a reinforcement-style fit against the
//! investor's thesis, and a collaborative prior from how popular the
//! industry and stage are across investors. The final score is their
//! weighted blend, rounded.

use dealflow_core::config::BlendConfig;
use dealflow_core::types::{InvestmentThesis, StartupProfile};
use dealflow_core::{DealflowError, DealflowResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

const STAGE_MULTIPLIERS: &[(&str, f64)] = &[
    ("Pre-Seed", 1.2),
    ("Seed", 1.5),
    ("Series A", 1.8),
    ("Series B", 2.0),
];

const INDUSTRY_POPULARITY: &[(&str, f64)] = &[
    ("FinTech", 0.85),
    ("HealthTech", 0.80),
    ("AI/ML", 0.90),
    ("EdTech", 0.70),
    ("CleanTech", 0.75),
    ("Cybersecurity", 0.85),
    ("E-commerce", 0.65),
    ("HR Tech", 0.60),
    ("AgTech", 0.55),
];

const STAGE_POPULARITY: &[(&str, f64)] = &[
    ("Pre-Seed", 0.6),
    ("Seed", 0.8),
    ("Series A", 0.9),
    ("Series B", 0.7),
];

/// Growth multiple above which a startup counts as hypergrowth.
const HYPERGROWTH: f64 = 2.0;

fn lookup(table: &[(&str, f64)], key: &str, default: f64) -> f64 {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map_or(default, |(_, v)| *v)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub rl: f64,
    pub cf: f64,
}

impl From<&BlendConfig> for BlendWeights {
    fn from(config: &BlendConfig) -> Self {
        Self {
            rl: config.rl_weight,
            cf: config.cf_weight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub reinforcement_learning: f64,
    pub collaborative_filtering: f64,
    pub weights: BlendWeights,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeuristicScore {
    pub score: u32,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    weights: BlendWeights,
}

impl HeuristicScorer {
    pub fn new(config: &BlendConfig) -> Self {
        Self {
            weights: BlendWeights::from(config),
        }
    }

    pub fn score(
        &self,
        startup: &StartupProfile,
        thesis: &InvestmentThesis,
    ) -> DealflowResult<HeuristicScore> {
        let rl = reinforcement_score(startup, thesis)?;
        let cf = collaborative_score(startup)?;
        let score = (rl * self.weights.rl + cf * self.weights.cf).round() as u32;

        metrics::counter!("heuristic.scores").increment(1);
        debug!(
            industry = %startup.industry,
            stage = %startup.stage,
            rl,
            cf,
            score,
            "Heuristic score computed"
        );
        Ok(HeuristicScore {
            score,
            breakdown: ScoreBreakdown {
                reinforcement_learning: rl,
                collaborative_filtering: cf,
                weights: self.weights,
            },
        })
    }
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new(&BlendConfig::default())
    }
}

/// Thesis fit in `[0, 100]`: industry, stage, valuation, growth, burn and
/// founder experience each add a bonus or subtract a capped penalty.
pub fn reinforcement_score(
    startup: &StartupProfile,
    thesis: &InvestmentThesis,
) -> DealflowResult<f64> {
    check_startup(startup)?;
    check_thesis(thesis)?;
    let growth = startup.mrr_growth;
    let mut score = 0.0_f64;

    if thesis.industries.contains(&startup.industry) {
        score += 25.0 + (growth * 3.0).min(15.0);
    } else {
        score -= 10.0;
    }

    if thesis.stages.contains(&startup.stage) {
        score += 20.0 + growth * lookup(STAGE_MULTIPLIERS, &startup.stage, 1.0);
    }

    let (low, high) = (thesis.valuation_min, thesis.valuation_max);
    let valuation = startup.valuation;
    if (low..=high).contains(&valuation) {
        // Up to 10 more for sitting near the middle of the range.
        let width = high - low;
        let deviation = if width > 0.0 {
            (valuation - (low + high) / 2.0).abs() / width
        } else {
            0.0
        };
        score += 20.0 + 10.0 * (1.0 - deviation);
    } else {
        let overshoot = if valuation > high {
            (valuation - high) / high
        } else {
            (low - valuation) / low
        };
        // A zero bound makes the overshoot infinite; `min` caps it.
        score -= (overshoot * 30.0).min(20.0);
    }

    if growth > 0.0 {
        score += (growth * 8.0).min(20.0);
        if growth > HYPERGROWTH {
            score += 5.0;
        }
    } else {
        score -= 15.0;
    }

    let max_burn = thesis.max_burn_rate;
    if startup.burn_rate < max_burn {
        score += (max_burn - startup.burn_rate) / max_burn * 15.0;
    } else {
        score -= ((startup.burn_rate - max_burn) / max_burn * 25.0).min(20.0);
    }

    let founder = startup.founder_experience_score;
    score += if founder > 7.0 {
        10.0 + (founder - 7.0) * 2.0
    } else {
        founder
    };

    Ok(score.clamp(0.0, 100.0))
}

/// Popularity prior in `[0, 100]` around a neutral 50. Industries and stages
/// outside the popularity tables count as neutral.
pub fn collaborative_score(startup: &StartupProfile) -> DealflowResult<f64> {
    check_startup(startup)?;
    let mut score = 50.0_f64;
    score += (lookup(INDUSTRY_POPULARITY, &startup.industry, 0.5) - 0.5) * 30.0;
    score += (lookup(STAGE_POPULARITY, &startup.stage, 0.5) - 0.5) * 20.0;

    let growth = startup.mrr_growth;
    if growth > HYPERGROWTH {
        score += 15.0;
    } else if growth > 1.0 {
        score += 10.0;
    } else if growth < 0.0 {
        score -= 15.0;
    }

    Ok(score.clamp(0.0, 100.0))
}

/// Logistic score in percent for pre-computed match signals, weighted
/// 0.4 / 0.3 / 0.3.
pub fn sigmoid_score(industry_match: f64, stage_match: f64, traction: f64) -> DealflowResult<u32> {
    for (name, v) in [
        ("industry_match", industry_match),
        ("stage_match", stage_match),
        ("traction", traction),
    ] {
        if !v.is_finite() {
            return Err(DealflowError::InvalidInput(format!(
                "{name} must be finite, got {v}"
            )));
        }
    }
    let raw = 0.4 * industry_match + 0.3 * stage_match + 0.3 * traction;
    Ok((100.0 / (1.0 + (-raw).exp())).round() as u32)
}

fn check_startup(startup: &StartupProfile) -> DealflowResult<()> {
    for (name, v) in [
        ("valuation", startup.valuation),
        ("mrrGrowth", startup.mrr_growth),
        ("burnRate", startup.burn_rate),
        ("founderExperienceScore", startup.founder_experience_score),
    ] {
        if !v.is_finite() {
            return Err(DealflowError::InvalidInput(format!(
                "startup {name} must be finite, got {v}"
            )));
        }
    }
    Ok(())
}

fn check_thesis(thesis: &InvestmentThesis) -> DealflowResult<()> {
    if !thesis.valuation_min.is_finite()
        || !thesis.valuation_max.is_finite()
        || thesis.valuation_min > thesis.valuation_max
    {
        return Err(DealflowError::InvalidInput(format!(
            "valuation range [{}, {}] is not a finite interval",
            thesis.valuation_min, thesis.valuation_max
        )));
    }
    if !thesis.max_burn_rate.is_finite() || thesis.max_burn_rate <= 0.0 {
        return Err(DealflowError::InvalidInput(format!(
            "maxBurnRate must be finite and positive, got {}",
            thesis.max_burn_rate
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thesis(industries: &[&str], stages: &[&str]) -> InvestmentThesis {
        InvestmentThesis {
            industries: industries.iter().map(|s| s.to_string()).collect(),
            stages: stages.iter().map(|s| s.to_string()).collect(),
            valuation_min: 1_000_000.0,
            valuation_max: 10_000_000.0,
            max_burn_rate: 50_000.0,
        }
    }

    fn startup(industry: &str, stage: &str, valuation: f64, growth: f64, burn: f64, founder: f64) -> StartupProfile {
        StartupProfile {
            industry: industry.into(),
            stage: stage.into(),
            valuation,
            mrr_growth: growth,
            burn_rate: burn,
            founder_experience_score: founder,
        }
    }

    #[test]
    fn test_strong_fit_saturates_reinforcement_score() {
        let s = startup("FinTech", "Seed", 5_000_000.0, 1.5, 30_000.0, 8.0);
        let result = HeuristicScorer::default()
            .score(&s, &thesis(&["FinTech"], &["Seed"]))
            .unwrap();
        assert!((result.breakdown.reinforcement_learning - 100.0).abs() < 1e-9);
        // 50 + 0.35·30 + 0.3·20 + 10 for growth above 1.0
        assert!((result.breakdown.collaborative_filtering - 76.5).abs() < 1e-9);
        assert_eq!(result.score, 93);
        assert!((result.breakdown.weights.rl - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_fit_accumulates_bonuses() {
        // Off-industry, on-stage, valuation at the range edge, burn at the cap.
        let s = startup("HealthTech", "Series A", 1_000_000.0, 0.5, 50_000.0, 7.0);
        let t = thesis(&["FinTech"], &["Series A"]);
        let rl = reinforcement_score(&s, &t).unwrap();
        assert!((rl - 46.9).abs() < 1e-9);
        let cf = collaborative_score(&s).unwrap();
        assert!((cf - 67.0).abs() < 1e-9);
        assert_eq!(HeuristicScorer::default().score(&s, &t).unwrap().score, 53);
    }

    #[test]
    fn test_off_thesis_startup_floors_at_zero() {
        let s = startup("Gaming", "Series C", 20_000_000.0, -0.5, 100_000.0, 5.0);
        let t = thesis(&["FinTech"], &["Seed"]);
        assert!(reinforcement_score(&s, &t).unwrap().abs() < f64::EPSILON);
        // Unknown industry and stage are neutral; shrinking revenue costs 15.
        assert!((collaborative_score(&s).unwrap() - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_hypergrowth_bonus() {
        let t = thesis(&[], &[]);
        let steady = startup("AI/ML", "Series B", 5_500_000.0, 2.0, 0.0, 0.0);
        let hyper = startup("AI/ML", "Series B", 5_500_000.0, 2.5, 0.0, 0.0);
        let steady_rl = reinforcement_score(&steady, &t).unwrap();
        let hyper_rl = reinforcement_score(&hyper, &t).unwrap();
        // 2.0 earns 16 growth points; 2.5 hits the cap of 20 plus the flat 5.
        assert!((hyper_rl - steady_rl - 9.0).abs() < 1e-9);
        assert!(
            (collaborative_score(&hyper).unwrap() - collaborative_score(&steady).unwrap() - 5.0).abs()
                < 1e-9
        );
    }

    #[test]
    fn test_zero_width_valuation_range() {
        let mut t = thesis(&[], &[]);
        t.valuation_min = 4_000_000.0;
        t.valuation_max = 4_000_000.0;
        let s = startup("AgTech", "Seed", 4_000_000.0, 0.0, 50_000.0, 0.0);
        // -10 industry, +30 valuation at the midpoint, -15 growth
        assert!((reinforcement_score(&s, &t).unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_valuation_bound_caps_penalty() {
        let mut t = thesis(&["FinTech"], &[]);
        t.valuation_min = 0.0;
        t.valuation_max = 0.0;
        let s = startup("FinTech", "Seed", 1_000.0, 0.0, 50_000.0, 0.0);
        // +25 industry, -20 valuation, -15 growth
        assert!(reinforcement_score(&s, &t).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let t = thesis(&[], &[]);
        let bad = startup("FinTech", "Seed", f64::NAN, 1.0, 0.0, 5.0);
        assert!(matches!(
            reinforcement_score(&bad, &t),
            Err(DealflowError::InvalidInput(_))
        ));
        assert!(matches!(
            collaborative_score(&bad),
            Err(DealflowError::InvalidInput(_))
        ));

        let good = startup("FinTech", "Seed", 1.0, 1.0, 0.0, 5.0);
        let mut inverted = thesis(&[], &[]);
        inverted.valuation_min = 2e7;
        assert!(matches!(
            reinforcement_score(&good, &inverted),
            Err(DealflowError::InvalidInput(_))
        ));
        let mut no_burn = thesis(&[], &[]);
        no_burn.max_burn_rate = 0.0;
        assert!(matches!(
            reinforcement_score(&good, &no_burn),
            Err(DealflowError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_sigmoid_score() {
        assert_eq!(sigmoid_score(0.0, 0.0, 0.0).unwrap(), 50);
        assert_eq!(sigmoid_score(1.0, 1.0, 1.0).unwrap(), 73);
        assert_eq!(sigmoid_score(-10.0, -10.0, -10.0).unwrap(), 0);
        assert_eq!(sigmoid_score(50.0, 50.0, 50.0).unwrap(), 100);
        assert!(matches!(
            sigmoid_score(f64::NAN, 0.0, 0.0),
            Err(DealflowError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_breakdown_serializes_camel_case() {
        let s = startup("FinTech", "Seed", 5_000_000.0, 1.5, 30_000.0, 8.0);
        let result = HeuristicScorer::default()
            .score(&s, &thesis(&["FinTech"], &["Seed"]))
            .unwrap();
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["score"], 93);
        assert!(json["breakdown"]["reinforcementLearning"].is_number());
        assert!(json["breakdown"]["weights"]["cf"].is_number());
    }
}
