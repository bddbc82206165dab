//! Benchmarks for LinUCB scoring and ranking.
//! Run with: cargo bench -p dealflow-rl-engine

use dealflow_core::types::{CandidateRecord, InvestorPreferences};
use dealflow_core::Taxonomy;
use dealflow_rl_engine::{Cholesky, LinUcb, Recommender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::time::Instant;

fn create_pipeline(rng: &mut StdRng, n: usize) -> Vec<CandidateRecord> {
    let taxonomy = Taxonomy::v1();
    (0..n)
        .map(|i| {
            let industry = &taxonomy.industries[rng.gen_range(0..taxonomy.industries.len())];
            let stage = &taxonomy.stages[rng.gen_range(0..taxonomy.stages.len())];
            CandidateRecord::new(industry.clone(), stage.clone())
                .with_id(format!("startup-{i:04}"))
                .with_metric("mrr", rng.gen_range(0.0..300_000.0))
                .with_metric("burn_rate", rng.gen_range(0.0..150_000.0))
                .with_metric("founder_experience_score", rng.gen_range(0.0..10.0))
        })
        .collect()
}

fn main() {
    let mut rng = StdRng::seed_from_u64(2024);
    let recommender = Recommender::default();
    let pipeline = create_pipeline(&mut rng, 50);
    let prefs = InvestorPreferences::default();
    let seen = HashSet::new();

    let mut model = LinUcb::new(18, 1.0).expect("Failed to create model");
    for record in pipeline.iter().take(20) {
        let reward = if rng.gen_bool(0.3) { 1.0 } else { -1.0 };
        recommender
            .record_feedback(&mut model, record, reward)
            .expect("Failed to record feedback");
    }

    // Warmup
    for _ in 0..10 {
        recommender
            .recommend(&model, &pipeline, &prefs, &seen, None)
            .unwrap();
    }

    let iterations = 2_000;
    let start = Instant::now();
    for _ in 0..iterations {
        let _ = recommender
            .recommend(&model, &pipeline, &prefs, &seen, None)
            .unwrap();
    }
    let elapsed = start.elapsed();

    println!("=== LinUCB Ranking Benchmark (gauss_jordan) ===");
    println!("Iterations:  {}", iterations);
    println!("Total time:  {:?}", elapsed);
    println!("Per call:    {:?}", elapsed / iterations);
    println!("Throughput:  {:.0} rankings/sec", iterations as f64 / elapsed.as_secs_f64());
    println!("Batch size:  {}", pipeline.len());

    let cholesky = LinUcb::from_state(model.state().clone(), 1.0, Cholesky::default())
        .expect("Failed to restore model");
    let start = Instant::now();
    for _ in 0..iterations {
        let _ = recommender
            .recommend(&cholesky, &pipeline, &prefs, &seen, None)
            .unwrap();
    }
    let elapsed = start.elapsed();

    println!("=== LinUCB Ranking Benchmark (cholesky) ===");
    println!("Total time:  {:?}", elapsed);
    println!("Per call:    {:?}", elapsed / iterations);
}
