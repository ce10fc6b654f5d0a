use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use role_model::{load_dataset, train, EncoderFitScope, TrainConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Which rows the feature encoders are fitted on.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEncoderFit {
    /// Fit on every row before splitting
    Full,
    /// Fit on the training partition only
    Train,
}

impl From<CliEncoderFit> for EncoderFitScope {
    fn from(value: CliEncoderFit) -> Self {
        match value {
            CliEncoderFit::Full => EncoderFitScope::FullDataset,
            CliEncoderFit::Train => EncoderFitScope::TrainPartition,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "trainer",
    version,
    about = "Train the job-role classifier and write its artifact set"
)]
struct TrainerCli {
    /// Labeled CSV dataset.
    #[arg(long, env = "TRAINER_DATASET", default_value = "Dataset.csv")]
    dataset: PathBuf,

    /// Directory the artifact set is written to (served by the API's ARTIFACT_DIR).
    #[arg(long, env = "TRAINER_OUTPUT_DIR", default_value = "artifacts")]
    output_dir: PathBuf,

    /// Fraction of rows held out for the accuracy check.
    #[arg(long, env = "TRAINER_TEST_RATIO", default_value_t = 0.35)]
    test_ratio: f64,

    /// Seed for the split and the forest.
    #[arg(long, env = "TRAINER_SEED", default_value_t = 42)]
    seed: u64,

    #[arg(long, env = "TRAINER_N_ESTIMATORS", default_value_t = 500)]
    n_estimators: usize,

    /// Unlimited when omitted.
    #[arg(long, env = "TRAINER_MAX_DEPTH")]
    max_depth: Option<usize>,

    #[arg(long, env = "TRAINER_MIN_SAMPLES_SPLIT", default_value_t = 2)]
    min_samples_split: usize,

    #[arg(long, env = "TRAINER_ENCODER_FIT", value_enum, default_value_t = CliEncoderFit::Full)]
    encoder_fit: CliEncoderFit,
}

impl TrainerCli {
    fn train_config(&self) -> TrainConfig {
        TrainConfig {
            test_ratio: self.test_ratio,
            seed: self.seed,
            encoder_fit: self.encoder_fit.into(),
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = TrainerCli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("trainer=info,role_model=info")
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting trainer v{}", env!("CARGO_PKG_VERSION"));

    let dataset = load_dataset(&cli.dataset)
        .with_context(|| format!("failed to load dataset {}", cli.dataset.display()))?;

    let config = cli.train_config();
    let outcome = train(&dataset, &config).context("training failed")?;

    info!(
        "Test accuracy: {:.4} ({} train / {} test rows, {} classes, width {})",
        outcome.report.accuracy,
        outcome.report.n_train,
        outcome.report.n_test,
        outcome.report.classes.len(),
        outcome.report.feature_width
    );

    let manifest = outcome
        .artifacts
        .save(&cli.output_dir)
        .with_context(|| format!("failed to write artifacts to {}", cli.output_dir.display()))?;

    info!(
        "Artifacts written to {} (run {}, fingerprint {})",
        cli.output_dir.display(),
        manifest.run_id,
        manifest.feature_fingerprint
    );
    Ok(())
}
