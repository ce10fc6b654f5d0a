//! Serving-side pipeline: normalize, encode, score, decode.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::artifact::ArtifactBundle;
use crate::classifier::{argmax, Classifier};
use crate::encoding::{CategoricalEncoder, FeatureEncoders};
use crate::error::{ModelError, Result};
use crate::record::ApplicantRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleConfidence {
    pub role: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub role: String,
    /// One entry per known class, in class-index order.
    pub distribution: Vec<RoleConfidence>,
}

/// Immutable prediction pipeline, built once and shared read-only.
pub struct Predictor {
    model: Box<dyn Classifier>,
    feature_encoders: FeatureEncoders,
    target_encoder: CategoricalEncoder,
    run_id: Option<Uuid>,
}

impl Predictor {
    /// Assembles a predictor, checking that the classifier matches the
    /// encoders' feature width and the target vocabulary.
    pub fn new(
        model: impl Classifier + 'static,
        feature_encoders: FeatureEncoders,
        target_encoder: CategoricalEncoder,
    ) -> Result<Self> {
        if model.n_features() != feature_encoders.width() {
            return Err(ModelError::ArtifactMismatch(format!(
                "classifier expects {} features, encoders produce {}",
                model.n_features(),
                feature_encoders.width()
            )));
        }
        if model.n_classes() != target_encoder.len() || target_encoder.is_empty() {
            return Err(ModelError::ArtifactMismatch(format!(
                "classifier has {} classes, target encoder has {}",
                model.n_classes(),
                target_encoder.len()
            )));
        }
        Ok(Self {
            model: Box::new(model),
            feature_encoders,
            target_encoder,
            run_id: None,
        })
    }

    pub fn from_bundle(bundle: ArtifactBundle) -> Result<Self> {
        let run_id = bundle.run_id;
        let mut predictor =
            Self::new(bundle.model, bundle.feature_encoders, bundle.target_encoder)?;
        predictor.run_id = Some(run_id);
        Ok(predictor)
    }

    /// Loads and verifies the artifact set in `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::from_bundle(ArtifactBundle::load(dir)?)
    }

    /// Feature vector for a record, exactly as the trainer built it.
    pub fn encode(&self, record: &ApplicantRecord) -> Vec<f64> {
        self.feature_encoders.encode(record)
    }

    pub fn predict(&self, record: &ApplicantRecord) -> Result<Prediction> {
        if !record.cgpa.is_finite() {
            warn!(field = "cgpa", value = record.cgpa, "rejecting non-finite value");
            return Err(ModelError::malformed("cgpa", "value is not a finite number"));
        }

        let features = self.encode(record);
        let proba = self.model.predict_proba(&features);
        if proba.len() != self.target_encoder.len() {
            return Err(ModelError::ArtifactMismatch(format!(
                "classifier returned {} scores for {} classes",
                proba.len(),
                self.target_encoder.len()
            )));
        }

        let best = argmax(&proba);
        let distribution: Vec<RoleConfidence> = self
            .target_encoder
            .classes()
            .iter()
            .zip(&proba)
            .map(|(role, &confidence)| RoleConfidence {
                role: role.clone(),
                confidence,
            })
            .collect();
        let role = distribution[best].role.clone();

        debug!(role = %role, confidence = proba[best], "prediction made");
        Ok(Prediction { role, distribution })
    }

    pub fn roles(&self) -> &[String] {
        self.target_encoder.classes()
    }

    pub fn feature_width(&self) -> usize {
        self.feature_encoders.width()
    }

    /// Training run the artifacts came from, when loaded from disk.
    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }
}
