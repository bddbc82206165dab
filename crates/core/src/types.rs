use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const METRIC_MRR: &str = "mrr";
pub const METRIC_BURN_RATE: &str = "burn_rate";
pub const METRIC_FOUNDER_EXPERIENCE: &str = "founder_experience_score";
pub const METRIC_VALUATION: &str = "valuation";

/// A startup as submitted by the surrounding service. Metrics are kept as raw
/// JSON values; the encoder decides what counts as a number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metrics: Map<String, Value>,
}

impl CandidateRecord {
    pub fn new(industry: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            industry: industry.into(),
            stage: stage.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_metric(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metrics.insert(key.to_string(), value.into());
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Investor-declared preferences used to penalise off-thesis candidates.
/// An absent list or bound means "no preference".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestorPreferences {
    #[serde(default)]
    pub industries: Option<Vec<String>>,
    #[serde(default)]
    pub stages: Option<Vec<String>>,
    #[serde(default)]
    pub ticket_size_min: Option<f64>,
    #[serde(default)]
    pub ticket_size_max: Option<f64>,
}

/// Outcome recorded for an investor/startup pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    Invest,
    Pass,
}

impl Interaction {
    pub fn from_reward(reward: f64) -> Self {
        if reward > 0.0 {
            Interaction::Invest
        } else {
            Interaction::Pass
        }
    }
}

/// A ranked candidate returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub candidate_id: Option<String>,
    pub name: Option<String>,
    pub industry: String,
    pub stage: String,
    /// Score after preference calibration; the ranking key.
    pub score: f64,
    /// LinUCB score before calibration.
    pub raw_score: f64,
}

/// Startup summary consumed by the rule-based scorer. `mrr_growth` is a
/// growth multiple (1.0 = doubled), not a percentage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupProfile {
    pub industry: String,
    pub stage: String,
    pub valuation: f64,
    pub mrr_growth: f64,
    pub burn_rate: f64,
    pub founder_experience_score: f64,
}

/// Hard investment thesis for rule-based scoring. Unlike
/// [`InvestorPreferences`], every field is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentThesis {
    pub industries: Vec<String>,
    pub stages: Vec<String>,
    pub valuation_min: f64,
    pub valuation_max: f64,
    pub max_burn_rate: f64,
}
