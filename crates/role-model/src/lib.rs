//! Job-role model: the encoding contract shared by the offline trainer and
//! the prediction API.
//!
//! - [`encoding`]: categorical and multi-label encoders plus the fixed feature layout
//! - [`forest`]: pure-Rust random forest implementing [`Classifier`]
//! - [`trainer`]: seeded split, fitting, held-out accuracy
//! - [`artifact`]: versioned, checksummed artifact set on disk
//! - [`predictor`]: the serving pipeline built from an artifact set

pub mod artifact;
pub mod classifier;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod forest;
pub mod normalize;
pub mod predictor;
pub mod record;
pub mod split;
pub mod trainer;

pub use artifact::{ArtifactBundle, ArtifactManifest, SCHEMA_VERSION};
pub use classifier::Classifier;
pub use dataset::load_dataset;
pub use encoding::{CategoricalEncoder, FeatureEncoders, MultiLabelEncoder};
pub use error::{ModelError, Result};
pub use forest::{ForestParams, RandomForest};
pub use predictor::{Prediction, Predictor, RoleConfidence};
pub use record::{ApplicantRecord, LabeledRecord, RawApplicant};
pub use trainer::{train, EncoderFitScope, TrainConfig, TrainingOutcome, TrainingReport};
