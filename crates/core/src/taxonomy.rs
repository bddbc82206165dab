//! Versioned industry/stage taxonomy used by the feature encoder.
//!
//! The label order is part of the encoding: the index of a label in its list
//! is the position of its one-hot indicator. Changing the order or contents
//! changes the feature space, so every change must bump `version` and start
//! from fresh bandit state.

use crate::error::{DealflowError, DealflowResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const TAXONOMY_V1: &str = "v1";

pub const V1_INDUSTRIES: [&str; 10] = [
    "HealthTech",
    "FinTech",
    "EdTech",
    "AI/ML",
    "SaaS",
    "Gaming",
    "CleanTech",
    "E-commerce",
    "Biotech",
    "Cybersecurity",
];

pub const V1_STAGES: [&str; 5] = ["Pre-Seed", "Seed", "Series A", "Series B", "Series C+"];

/// Number of normalized metric dimensions appended after the one-hot blocks.
pub const METRIC_DIMS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_industries")]
    pub industries: Vec<String>,
    #[serde(default = "default_stages")]
    pub stages: Vec<String>,
}

impl Taxonomy {
    pub fn v1() -> Self {
        Self {
            version: default_version(),
            industries: default_industries(),
            stages: default_stages(),
        }
    }

    pub fn industry_index(&self, label: &str) -> Option<usize> {
        self.industries.iter().position(|i| i == label)
    }

    pub fn stage_index(&self, label: &str) -> Option<usize> {
        self.stages.iter().position(|s| s == label)
    }

    /// Length of every feature vector produced under this taxonomy.
    pub fn feature_dimension(&self) -> usize {
        self.industries.len() + self.stages.len() + METRIC_DIMS
    }

    pub fn validate(&self) -> DealflowResult<()> {
        if self.version.trim().is_empty() {
            return Err(DealflowError::Config("taxonomy version is empty".into()));
        }
        check_labels("industries", &self.industries)?;
        check_labels("stages", &self.stages)
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::v1()
    }
}

fn check_labels(block: &str, labels: &[String]) -> DealflowResult<()> {
    if labels.is_empty() {
        return Err(DealflowError::Config(format!("taxonomy {block} list is empty")));
    }
    let mut seen = HashSet::new();
    for label in labels {
        if label.is_empty() {
            return Err(DealflowError::Config(format!(
                "taxonomy {block} contains an empty label"
            )));
        }
        if !seen.insert(label.as_str()) {
            return Err(DealflowError::Config(format!(
                "taxonomy {block} contains duplicate label {label:?}"
            )));
        }
    }
    Ok(())
}

fn default_version() -> String {
    TAXONOMY_V1.to_string()
}
fn default_industries() -> Vec<String> {
    V1_INDUSTRIES.iter().map(|s| s.to_string()).collect()
}
fn default_stages() -> Vec<String> {
    V1_STAGES.iter().map(|s| s.to_string()).collect()
}
