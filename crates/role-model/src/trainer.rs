//! Offline training: split, fit encoders and forest, report held-out accuracy.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::artifact::ArtifactBundle;
use crate::classifier::Classifier;
use crate::encoding::{CategoricalEncoder, FeatureEncoders};
use crate::error::{ModelError, Result};
use crate::forest::{ForestParams, RandomForest};
use crate::record::{ApplicantRecord, LabeledRecord};
use crate::split::{train_test_split, SplitIndices};

/// Which rows the feature encoders are fitted on.
///
/// `FullDataset` fits before splitting, so test-partition vocabulary leaks
/// into the encoders; `TrainPartition` keeps the test rows unseen and lets
/// them exercise the fallback encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderFitScope {
    #[default]
    FullDataset,
    TrainPartition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub test_ratio: f64,
    /// Seeds both the train/test shuffle and the forest.
    pub seed: u64,
    pub encoder_fit: EncoderFitScope,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        let forest = ForestParams::default();
        Self {
            test_ratio: 0.35,
            seed: 42,
            encoder_fit: EncoderFitScope::default(),
            n_estimators: forest.n_estimators,
            max_depth: forest.max_depth,
            min_samples_split: forest.min_samples_split,
        }
    }
}

impl TrainConfig {
    fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Fraction of test rows whose predicted role matches the label.
    pub accuracy: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub feature_width: usize,
    pub classes: Vec<String>,
    pub encoder_fit: EncoderFitScope,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifacts: ArtifactBundle,
    pub report: TrainingReport,
    pub split: SplitIndices,
}

pub fn train(dataset: &[LabeledRecord], config: &TrainConfig) -> Result<TrainingOutcome> {
    if dataset.is_empty() {
        return Err(ModelError::Dataset("dataset has no rows".into()));
    }

    let split = train_test_split(dataset.len(), config.test_ratio, config.seed)?;

    let encoder_rows: Vec<&ApplicantRecord> = match config.encoder_fit {
        EncoderFitScope::FullDataset => dataset.iter().map(|r| &r.record).collect(),
        EncoderFitScope::TrainPartition => {
            split.train.iter().map(|&i| &dataset[i].record).collect()
        }
    };
    let feature_encoders = FeatureEncoders::fit(&encoder_rows);

    // Every label must be decodable, so the target encoder always sees all rows.
    let target_encoder =
        CategoricalEncoder::fit_normalized(dataset.iter().map(|r| r.job_role.clone()));
    let labels: Vec<usize> = dataset
        .iter()
        .map(|r| {
            target_encoder
                .index_of(&r.job_role)
                .ok_or_else(|| ModelError::Training(format!("unencodable label '{}'", r.job_role)))
        })
        .collect::<Result<_>>()?;

    let x_train: Vec<Vec<f64>> = split
        .train
        .iter()
        .map(|&i| feature_encoders.encode(&dataset[i].record))
        .collect();
    let y_train: Vec<usize> = split.train.iter().map(|&i| labels[i]).collect();

    let model = RandomForest::fit(
        &x_train,
        &y_train,
        target_encoder.len(),
        &config.forest_params(),
    )?;

    let correct = split
        .test
        .iter()
        .filter(|&&i| model.predict(&feature_encoders.encode(&dataset[i].record)) == labels[i])
        .count();
    let accuracy = correct as f64 / split.test.len() as f64;

    let report = TrainingReport {
        accuracy,
        n_train: split.train.len(),
        n_test: split.test.len(),
        feature_width: feature_encoders.width(),
        classes: target_encoder.classes().to_vec(),
        encoder_fit: config.encoder_fit,
    };

    info!(
        accuracy = report.accuracy,
        n_train = report.n_train,
        n_test = report.n_test,
        feature_width = report.feature_width,
        n_classes = report.classes.len(),
        encoder_fit = ?report.encoder_fit,
        "training finished"
    );
    if accuracy < 0.5 {
        warn!(accuracy, "held-out accuracy is below 50%");
    }

    Ok(TrainingOutcome {
        artifacts: ArtifactBundle::new(model, target_encoder, feature_encoders),
        report,
        split,
    })
}
