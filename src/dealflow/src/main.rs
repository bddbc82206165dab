//! Dealflow: LinUCB startup recommendations for investors.
//!
//! Thin driver around the engine: loads configuration, keeps one bandit state
//! file per investor, and prints JSON results on stdout.

mod file_store;

use clap::{Parser, Subcommand};
use dealflow_core::config::AppConfig;
use dealflow_core::types::{CandidateRecord, InvestmentThesis, InvestorPreferences, StartupProfile};
use dealflow_rl_engine::{
    load_or_init, merge_recommendations, BanditStateStore, GaussJordan, HeuristicScorer, LinUcb,
    Recommender, SourceRow,
};
use file_store::{read_json, FileStateStore};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dealflow")]
#[command(about = "Contextual-bandit startup recommendations")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./dealflow.toml when present)
    #[arg(long, env = "DEALFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding one bandit state file per investor
    #[arg(long, env = "DEALFLOW_STATE_DIR", default_value = "./bandit-state")]
    state_dir: PathBuf,

    /// Exploration weight (overrides config)
    #[arg(long)]
    alpha: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank candidate startups for an investor
    Rank {
        #[arg(long)]
        investor: String,

        /// JSON array of candidate records
        #[arg(long)]
        candidates: PathBuf,

        /// JSON investor preferences
        #[arg(long)]
        preferences: Option<PathBuf>,

        /// Comma-separated ids the investor has already seen
        #[arg(long, value_delimiter = ',')]
        seen: Vec<String>,

        /// Number of recommendations to return (overrides config)
        #[arg(long)]
        top_n: Option<usize>,
    },

    /// Record the investor's reaction to one startup
    Update {
        #[arg(long)]
        investor: String,

        /// JSON candidate record
        #[arg(long)]
        candidate: PathBuf,

        /// Observed reward, e.g. 1 for invest and -1 for pass
        #[arg(long, allow_hyphen_values = true)]
        reward: f64,
    },

    /// Rule-based score for one startup against an investment thesis
    Score {
        /// JSON startup profile
        #[arg(long)]
        startup: PathBuf,

        /// JSON investment thesis
        #[arg(long)]
        thesis: PathBuf,
    },

    /// Merge bandit and collaborative recommendation lists
    Merge {
        /// JSON array of rows carrying `rl_score`
        #[arg(long)]
        vertical: PathBuf,

        /// JSON array of rows carrying `cf_score`
        #[arg(long)]
        horizontal: PathBuf,
    },
}

#[derive(Serialize)]
struct UpdateOutput {
    success: bool,
    interaction: dealflow_core::types::Interaction,
    observations: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dealflow=info,dealflow_rl_engine=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load_from(cli.config.as_deref())?;
    if let Some(alpha) = cli.alpha {
        config.bandit.alpha = alpha;
        config.validate()?;
    }

    info!(
        alpha = config.bandit.alpha,
        taxonomy = %config.taxonomy.version,
        state_dir = %cli.state_dir.display(),
        "Configuration loaded"
    );

    let store = FileStateStore::new(&cli.state_dir)?;
    let recommender = Recommender::from_config(&config);
    let dimension = recommender.encoder().dimension();
    let kernel = GaussJordan::new(&config.linalg);

    match cli.command {
        Commands::Rank {
            investor,
            candidates,
            preferences,
            seen,
            top_n,
        } => {
            let state = load_or_init(&store, &investor, dimension)?;
            let model = LinUcb::from_state(state, config.bandit.alpha, kernel)?;

            let records: Vec<CandidateRecord> = read_json(&candidates)?;
            let preferences: InvestorPreferences = match preferences {
                Some(path) => read_json(&path)?,
                None => InvestorPreferences::default(),
            };
            let seen: HashSet<String> = seen.into_iter().collect();

            let recommendations =
                recommender.recommend(&model, &records, &preferences, &seen, top_n)?;
            info!(
                investor = %investor,
                candidates = records.len(),
                returned = recommendations.len(),
                "Generated LinUCB recommendations"
            );
            println!("{}", serde_json::to_string_pretty(&recommendations)?);
        }
        Commands::Update {
            investor,
            candidate,
            reward,
        } => {
            let state = load_or_init(&store, &investor, dimension)?;
            let mut model = LinUcb::from_state(state, config.bandit.alpha, kernel)?;

            let record: CandidateRecord = read_json(&candidate)?;
            let interaction = recommender.record_feedback(&mut model, &record, reward)?;
            store.save(&investor, model.state())?;

            let output = UpdateOutput {
                success: true,
                interaction,
                observations: model.state().observations,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Score { startup, thesis } => {
            let startup: StartupProfile = read_json(&startup)?;
            let thesis: InvestmentThesis = read_json(&thesis)?;
            let result = HeuristicScorer::new(&config.blend).score(&startup, &thesis)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Merge {
            vertical,
            horizontal,
        } => {
            let vertical: Vec<SourceRow> = read_json(&vertical)?;
            let horizontal: Vec<SourceRow> = read_json(&horizontal)?;
            let merged = merge_recommendations(&vertical, &horizontal, &config.blend)?;
            info!(returned = merged.len(), "Merged recommendation sources");
            println!("{}", serde_json::to_string_pretty(&merged)?);
        }
    }

    Ok(())
}
