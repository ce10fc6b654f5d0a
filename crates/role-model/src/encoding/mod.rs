//! Encoder registry and the fixed feature-vector layout.
//!
//! The vector fed to the classifier is
//! `[degree, major, cgpa, experience, industry_preference, employed]`
//! followed by the skills indicators and then the certifications indicators.
//! Training and serving both go through [`FeatureEncoders::encode`], and the
//! layout plus every vocabulary is folded into [`FeatureEncoders::fingerprint`]
//! so a mismatched artifact set is caught at load time.

mod categorical;
mod multi_label;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use categorical::{CategoricalEncoder, FALLBACK_INDEX};
pub use multi_label::MultiLabelEncoder;

use crate::error::{ModelError, Result};
use crate::record::ApplicantRecord;

/// Fields with a fitted [`CategoricalEncoder`].
pub const CATEGORICAL_FIELDS: [&str; 4] = ["degree", "major", "industry_preference", "employed"];

/// Leading scalar slots of the feature vector, in order.
pub const SCALAR_LAYOUT: [&str; 6] = [
    "degree",
    "major",
    "cgpa",
    "experience",
    "industry_preference",
    "employed",
];

pub const SKILLS_FIELD: &str = "skills";
pub const CERTIFICATIONS_FIELD: &str = "certifications";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoders {
    pub label_encoders: BTreeMap<String, CategoricalEncoder>,
    pub skills: MultiLabelEncoder,
    pub certifications: MultiLabelEncoder,
}

impl FeatureEncoders {
    /// Fits every encoder over the given records.
    pub fn fit(records: &[&ApplicantRecord]) -> Self {
        let label_encoders = CATEGORICAL_FIELDS
            .iter()
            .map(|&field| {
                let values = records.iter().map(|r| category(r, field));
                (field.to_string(), CategoricalEncoder::fit(values))
            })
            .collect();

        let skills = MultiLabelEncoder::fit(records.iter().map(|r| r.skills.as_slice()));
        let certifications =
            MultiLabelEncoder::fit(records.iter().map(|r| r.certifications.as_slice()));

        Self {
            label_encoders,
            skills,
            certifications,
        }
    }

    /// Total feature-vector width W.
    pub fn width(&self) -> usize {
        SCALAR_LAYOUT.len() + self.skills.width() + self.certifications.width()
    }

    /// Assembles the feature vector for one record.
    pub fn encode(&self, record: &ApplicantRecord) -> Vec<f64> {
        let mut features = vec![0.0; self.width()];
        for (slot, field) in SCALAR_LAYOUT.iter().enumerate() {
            features[slot] = match *field {
                "cgpa" => record.cgpa,
                "experience" => f64::from(record.experience),
                _ => self.encode_category(field, category(record, field)) as f64,
            };
        }

        let skills_end = SCALAR_LAYOUT.len() + self.skills.width();
        self.skills.encode_into(
            SKILLS_FIELD,
            &record.skills,
            &mut features[SCALAR_LAYOUT.len()..skills_end],
        );
        self.certifications.encode_into(
            CERTIFICATIONS_FIELD,
            &record.certifications,
            &mut features[skills_end..],
        );
        features
    }

    fn encode_category(&self, field: &str, value: &str) -> usize {
        self.label_encoders
            .get(field)
            .map(|enc| enc.encode(field, value))
            .unwrap_or(FALLBACK_INDEX)
    }

    /// Checks that every categorical field has an encoder.
    pub fn validate(&self) -> Result<()> {
        for field in CATEGORICAL_FIELDS {
            if !self.label_encoders.contains_key(field) {
                return Err(ModelError::ArtifactMismatch(format!(
                    "feature encoders are missing the '{field}' encoder"
                )));
            }
        }
        Ok(())
    }

    /// Hex blake3 digest over the field order and every fitted vocabulary.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for field in SCALAR_LAYOUT {
            hasher.update(field.as_bytes());
            hasher.update(b"|");
        }
        for (field, encoder) in &self.label_encoders {
            hash_vocabulary(&mut hasher, field, encoder.classes());
        }
        hash_vocabulary(&mut hasher, SKILLS_FIELD, self.skills.vocabulary());
        hash_vocabulary(&mut hasher, CERTIFICATIONS_FIELD, self.certifications.vocabulary());
        hasher.finalize().to_hex().to_string()
    }
}

fn hash_vocabulary(hasher: &mut blake3::Hasher, field: &str, values: &[String]) {
    hasher.update(field.as_bytes());
    hasher.update(b":");
    for value in values {
        hasher.update(&(value.len() as u64).to_le_bytes());
        hasher.update(value.as_bytes());
    }
    hasher.update(b";");
}

/// Categorical value of a record by field name.
fn category<'r>(record: &'r ApplicantRecord, field: &str) -> &'r str {
    match field {
        "degree" => &record.degree,
        "major" => &record.major,
        "industry_preference" => &record.industry_preference,
        "employed" => &record.employed,
        _ => "",
    }
}
