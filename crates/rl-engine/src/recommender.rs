//! Recommendation flow: filter seen candidates, encode, score against one
//! snapshot of the model, calibrate to investor preferences, keep the top N.

use crate::calibration::Calibrator;
use crate::features::{FeatureEncoder, FeatureVector};
use crate::linalg::LinearAlgebra;
use crate::linucb::{sort_descending, LinUcb};
use dealflow_core::config::RankingConfig;
use dealflow_core::types::{CandidateRecord, Interaction, InvestorPreferences, Recommendation};
use dealflow_core::{AppConfig, DealflowError, DealflowResult};
use std::collections::HashSet;
use tracing::{debug, info};

pub struct Recommender {
    encoder: FeatureEncoder,
    calibrator: Calibrator,
    ranking: RankingConfig,
}

impl Recommender {
    pub fn new(encoder: FeatureEncoder, calibrator: Calibrator, ranking: RankingConfig) -> Self {
        Self {
            encoder,
            calibrator,
            ranking,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            FeatureEncoder::new(config.taxonomy.clone(), config.normalization.clone()),
            Calibrator::new(config.calibration.clone()),
            config.ranking.clone(),
        )
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Rank `records` for one investor. Records whose id is in `seen` are
    /// skipped; at most `max_candidates` are scored, in input order. A
    /// malformed record fails the whole call.
    pub fn recommend<K: LinearAlgebra>(
        &self,
        model: &LinUcb<K>,
        records: &[CandidateRecord],
        preferences: &InvestorPreferences,
        seen: &HashSet<String>,
        top_n: Option<usize>,
    ) -> DealflowResult<Vec<Recommendation>> {
        self.check_model(model)?;
        let top_n = top_n.unwrap_or(self.ranking.top_n);

        let candidates: Vec<&CandidateRecord> = records
            .iter()
            .filter(|r| r.id.as_ref().map_or(true, |id| !seen.contains(id)))
            .take(self.ranking.max_candidates)
            .collect();
        if candidates.is_empty() {
            debug!(total = records.len(), "No unseen candidates to rank");
            return Ok(Vec::new());
        }

        let vectors = candidates
            .iter()
            .map(|r| self.encoder.encode(r))
            .collect::<DealflowResult<Vec<FeatureVector>>>()?;
        let raw = model.rank_indices(&vectors)?;

        let mut scored = Vec::with_capacity(raw.len());
        for (i, raw_score) in raw {
            let record = candidates[i];
            let score = self.calibrator.calibrate(raw_score, record, preferences)?;
            scored.push(((i, raw_score), score));
        }
        // Restore input order so ties after calibration resolve by position.
        scored.sort_by_key(|((i, _), _)| *i);
        sort_descending(&mut scored);
        scored.truncate(top_n);

        metrics::counter!("recommender.candidates_ranked").increment(candidates.len() as u64);
        debug!(
            ranked = candidates.len(),
            returned = scored.len(),
            skipped_seen = records.len().saturating_sub(candidates.len()),
            "Recommendations generated"
        );

        Ok(scored
            .into_iter()
            .map(|((i, raw_score), score)| {
                let record = candidates[i];
                Recommendation {
                    candidate_id: record.id.clone(),
                    name: record.name.clone(),
                    industry: record.industry.clone(),
                    stage: record.stage.clone(),
                    score,
                    raw_score,
                }
            })
            .collect())
    }

    /// Fold an observed outcome for `record` into the model.
    pub fn record_feedback<K: LinearAlgebra>(
        &self,
        model: &mut LinUcb<K>,
        record: &CandidateRecord,
        reward: f64,
    ) -> DealflowResult<Interaction> {
        self.check_model(model)?;
        let x = self.encoder.encode(record)?;
        model.update(&x, reward)?;
        let interaction = Interaction::from_reward(reward);
        info!(
            candidate_id = record.id.as_deref().unwrap_or("<none>"),
            reward,
            interaction = ?interaction,
            observations = model.state().observations,
            "Bandit feedback recorded"
        );
        Ok(interaction)
    }

    fn check_model<K: LinearAlgebra>(&self, model: &LinUcb<K>) -> DealflowResult<()> {
        if model.dimension() != self.encoder.dimension() {
            return Err(DealflowError::dimension(
                self.encoder.dimension(),
                model.dimension(),
            ));
        }
        Ok(())
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
