//! Contextual bandit engine for startup recommendations: fixed-schema feature
//! encoding, a dense linear-algebra kernel, LinUCB scoring and ranking, and
//! preference calibration on top. A rule-based scorer and a two-source merge
//! cover investors and callers outside the bandit loop.

pub mod blend;
pub mod calibration;
pub mod features;
pub mod heuristic;
pub mod linalg;
pub mod linucb;
pub mod recommender;
pub mod shared;
pub mod store;

pub use blend::{merge_recommendations, BlendedRecommendation, RecommendationSource, SourceRow};
pub use calibration::Calibrator;
pub use features::{FeatureEncoder, FeatureVector};
pub use heuristic::{HeuristicScore, HeuristicScorer};
pub use linalg::{Cholesky, GaussJordan, LinearAlgebra, Matrix, Vector};
pub use linucb::{BanditState, LinUcb, ScoreResult};
pub use recommender::Recommender;
pub use shared::SharedBandit;
pub use store::{load_or_init, BanditStateStore, InMemoryStateStore};
