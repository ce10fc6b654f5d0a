//! Versioned on-disk artifact set shared by the trainer and the API.
//!
//! Layout of an artifact directory:
//!
//! ```text
//! CURRENT                      run id of the published set
//! runs/<run_id>/model.json             fitted RandomForest
//! runs/<run_id>/target_encoder.json    job-role encoder
//! runs/<run_id>/feature_encoders.json  categorical + multi-label encoders
//! runs/<run_id>/manifest.json          schema version, run id, fingerprint, checksums
//! ```
//!
//! A save writes the whole set into a staging directory under `runs/`, renames
//! it to `runs/<run_id>`, and only then replaces `CURRENT` through a temp file
//! rename. Readers follow `CURRENT`, so they see either the previous set or the
//! new one in full. Superseded and abandoned run directories are pruned after
//! the pointer moves.
//!
//! Every blob carries the run id of the training run that wrote it and the
//! manifest pins a blake3 checksum per blob.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::classifier::Classifier;
use crate::encoding::{CategoricalEncoder, FeatureEncoders, SCALAR_LAYOUT};
use crate::error::{ModelError, Result};
use crate::forest::RandomForest;

/// Bumped whenever the feature layout or any blob format changes.
pub const SCHEMA_VERSION: u32 = 1;

pub const MODEL_FILE: &str = "model.json";
pub const TARGET_ENCODER_FILE: &str = "target_encoder.json";
pub const FEATURE_ENCODERS_FILE: &str = "feature_encoders.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Pointer file naming the published run.
pub const CURRENT_FILE: &str = "CURRENT";
pub const RUNS_DIR: &str = "runs";

const STAGING_PREFIX: &str = ".staging-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub schema_version: u32,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub feature_layout: Vec<String>,
    pub feature_fingerprint: String,
    pub feature_width: usize,
    pub n_classes: usize,
    /// File name -> hex blake3 digest.
    pub checksums: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize)]
struct Blob<T> {
    schema_version: u32,
    run_id: Uuid,
    payload: T,
}

/// Everything one training run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub model: RandomForest,
    pub target_encoder: CategoricalEncoder,
    pub feature_encoders: FeatureEncoders,
}

/// Directory holding the files of one run inside an artifact directory.
pub fn run_dir(dir: &Path, run_id: Uuid) -> PathBuf {
    dir.join(RUNS_DIR).join(run_id.to_string())
}

impl ArtifactBundle {
    pub fn new(
        model: RandomForest,
        target_encoder: CategoricalEncoder,
        feature_encoders: FeatureEncoders,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            model,
            target_encoder,
            feature_encoders,
        }
    }

    /// Writes the artifact set into `dir` and publishes it, creating `dir`
    /// if needed.
    pub fn save(&self, dir: &Path) -> Result<ArtifactManifest> {
        let runs = dir.join(RUNS_DIR);
        fs::create_dir_all(&runs)?;

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&runs)?;
        let manifest = self.write_set(staging.path())?;

        let target = run_dir(dir, self.run_id);
        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        fs::rename(staging.path(), &target)?;

        write_atomic(dir, CURRENT_FILE, format!("{}\n", self.run_id).as_bytes())?;
        prune_runs(&runs, self.run_id);

        info!(dir = %dir.display(), run_id = %self.run_id, "artifacts published");
        Ok(manifest)
    }

    /// Writes the three blobs and then the manifest into `target`.
    fn write_set(&self, target: &Path) -> Result<ArtifactManifest> {
        let mut checksums = BTreeMap::new();
        for (name, bytes) in [
            (MODEL_FILE, self.blob_bytes(&self.model)?),
            (TARGET_ENCODER_FILE, self.blob_bytes(&self.target_encoder)?),
            (FEATURE_ENCODERS_FILE, self.blob_bytes(&self.feature_encoders)?),
        ] {
            write_synced(&target.join(name), &bytes)?;
            checksums.insert(name.to_string(), blake3::hash(&bytes).to_hex().to_string());
        }

        let manifest = ArtifactManifest {
            schema_version: SCHEMA_VERSION,
            run_id: self.run_id,
            created_at: self.created_at,
            feature_layout: feature_layout(),
            feature_fingerprint: self.feature_encoders.fingerprint(),
            feature_width: self.feature_encoders.width(),
            n_classes: self.target_encoder.len(),
            checksums,
        };
        write_synced(
            &target.join(MANIFEST_FILE),
            &serde_json::to_vec_pretty(&manifest)?,
        )?;
        Ok(manifest)
    }

    fn blob_bytes<T: Serialize>(&self, payload: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&Blob {
            schema_version: SCHEMA_VERSION,
            run_id: self.run_id,
            payload,
        })?)
    }

    /// Loads the published set and cross-checks it. Any inconsistency between
    /// the pointer, the manifest and the blobs is an
    /// [`ModelError::ArtifactMismatch`].
    pub fn load(dir: &Path) -> Result<Self> {
        let pointer = read_file(dir, CURRENT_FILE)?;
        let run_id = std::str::from_utf8(&pointer)
            .ok()
            .and_then(|text| Uuid::parse_str(text.trim()).ok())
            .ok_or_else(|| mismatch(format!("{CURRENT_FILE} does not name a run")))?;

        let bundle = Self::load_run(&run_dir(dir, run_id))?;
        if bundle.run_id != run_id {
            return Err(mismatch(format!(
                "{CURRENT_FILE} names run {run_id} but its manifest is run {}",
                bundle.run_id
            )));
        }

        info!(
            dir = %dir.display(),
            run_id = %run_id,
            feature_width = bundle.feature_encoders.width(),
            n_classes = bundle.target_encoder.len(),
            "artifacts loaded"
        );
        Ok(bundle)
    }

    fn load_run(run: &Path) -> Result<Self> {
        let manifest: ArtifactManifest = serde_json::from_slice(&read_file(run, MANIFEST_FILE)?)
            .map_err(|e| mismatch(format!("{MANIFEST_FILE} is not a valid manifest: {e}")))?;

        if manifest.schema_version != SCHEMA_VERSION {
            return Err(mismatch(format!(
                "schema version {} is not supported (expected {SCHEMA_VERSION})",
                manifest.schema_version
            )));
        }
        if manifest.feature_layout != feature_layout() {
            return Err(mismatch(format!(
                "feature layout {:?} does not match {:?}",
                manifest.feature_layout,
                feature_layout()
            )));
        }

        let model: RandomForest = read_blob(run, MODEL_FILE, &manifest)?;
        let target_encoder: CategoricalEncoder = read_blob(run, TARGET_ENCODER_FILE, &manifest)?;
        let feature_encoders: FeatureEncoders = read_blob(run, FEATURE_ENCODERS_FILE, &manifest)?;

        feature_encoders.validate()?;
        let fingerprint = feature_encoders.fingerprint();
        if fingerprint != manifest.feature_fingerprint {
            return Err(mismatch(format!(
                "feature fingerprint {fingerprint} does not match manifest {}",
                manifest.feature_fingerprint
            )));
        }
        if feature_encoders.width() != manifest.feature_width
            || model.n_features() != manifest.feature_width
        {
            return Err(mismatch(format!(
                "feature width: manifest {}, encoders {}, model {}",
                manifest.feature_width,
                feature_encoders.width(),
                model.n_features()
            )));
        }
        if target_encoder.len() != manifest.n_classes || model.n_classes() != manifest.n_classes {
            return Err(mismatch(format!(
                "class count: manifest {}, target encoder {}, model {}",
                manifest.n_classes,
                target_encoder.len(),
                model.n_classes()
            )));
        }
        model.validate()?;

        Ok(Self {
            run_id: manifest.run_id,
            created_at: manifest.created_at,
            model,
            target_encoder,
            feature_encoders,
        })
    }
}

/// Scalar slots followed by the two indicator blocks.
fn feature_layout() -> Vec<String> {
    SCALAR_LAYOUT
        .iter()
        .chain(["skills", "certifications"].iter())
        .map(|s| s.to_string())
        .collect()
}

fn mismatch(message: String) -> ModelError {
    ModelError::ArtifactMismatch(message)
}

fn read_file(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(name);
    fs::read(&path).map_err(|e| mismatch(format!("cannot read {}: {e}", path.display())))
}

fn read_blob<T: DeserializeOwned>(
    dir: &Path,
    name: &str,
    manifest: &ArtifactManifest,
) -> Result<T> {
    let bytes = read_file(dir, name)?;

    let expected = manifest
        .checksums
        .get(name)
        .ok_or_else(|| mismatch(format!("manifest has no checksum for {name}")))?;
    let actual = blake3::hash(&bytes).to_hex().to_string();
    if &actual != expected {
        return Err(mismatch(format!(
            "{name} checksum {actual} does not match manifest {expected}"
        )));
    }

    let blob: Blob<T> = serde_json::from_slice(&bytes)
        .map_err(|e| mismatch(format!("{name} could not be decoded: {e}")))?;
    if blob.run_id != manifest.run_id || blob.schema_version != manifest.schema_version {
        return Err(mismatch(format!(
            "{name} belongs to run {} (schema {}), manifest is run {} (schema {})",
            blob.run_id, blob.schema_version, manifest.run_id, manifest.schema_version
        )));
    }
    Ok(blob.payload)
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

/// Replaces `dir/name` in one rename.
fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dir.join(name)).map_err(|e| e.error)?;
    Ok(())
}

/// Removes every run directory except `keep`, including staging leftovers
/// from interrupted saves. Failures are logged; the new set is already live.
fn prune_runs(runs: &Path, keep: Uuid) {
    let keep = keep.to_string();
    let entries = match fs::read_dir(runs) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %runs.display(), error = %e, "cannot list old artifact runs");
            return;
        }
    };
    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy() == keep.as_str() {
            continue;
        }
        let path = entry.path();
        if let Err(e) = fs::remove_dir_all(&path) {
            warn!(path = %path.display(), error = %e, "cannot remove old artifact run");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestParams;
    use crate::record::ApplicantRecord;

    fn bundle() -> ArtifactBundle {
        let a = ApplicantRecord::new("btech", "cs", 8.0, 1, "no", "software", "python", "aws");
        let b = ApplicantRecord::new("mba", "finance", 6.5, 4, "yes", "banking", "excel", "");
        let encoders = FeatureEncoders::fit(&[&a, &b]);
        let x = vec![encoders.encode(&a), encoders.encode(&b)];
        let target = CategoricalEncoder::fit_normalized(vec![
            "Developer".to_string(),
            "Financial Analyst".to_string(),
        ]);
        let params = ForestParams {
            n_estimators: 3,
            ..ForestParams::default()
        };
        let model = RandomForest::fit(&x, &[0, 1], 2, &params).unwrap();
        ArtifactBundle::new(model, target, encoders)
    }

    fn read_manifest(path: &Path) -> ArtifactManifest {
        serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
    }

    /// Rewrites a blob and patches its checksum so only deeper checks can object.
    fn replace_blob(run: &Path, name: &str, bytes: &[u8]) {
        fs::write(run.join(name), bytes).unwrap();
        let manifest_path = run.join(MANIFEST_FILE);
        let mut manifest = read_manifest(&manifest_path);
        manifest
            .checksums
            .insert(name.to_string(), blake3::hash(bytes).to_hex().to_string());
        fs::write(&manifest_path, serde_json::to_vec(&manifest).unwrap()).unwrap();
    }

    #[test]
    fn test_save_then_load_restores_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let original = bundle();
        let manifest = original.save(dir.path()).unwrap();

        assert_eq!(manifest.schema_version, SCHEMA_VERSION);
        assert_eq!(manifest.checksums.len(), 3);
        assert_eq!(manifest.feature_width, original.feature_encoders.width());
        assert!(run_dir(dir.path(), original.run_id).join(MANIFEST_FILE).is_file());

        let loaded = ArtifactBundle::load(dir.path()).unwrap();
        assert_eq!(loaded.run_id, original.run_id);
        assert_eq!(loaded.model, original.model);
        assert_eq!(loaded.feature_encoders, original.feature_encoders);
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactBundle::load(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, ModelError::ArtifactMismatch(_)));
    }

    #[test]
    fn test_interrupted_save_keeps_previous_set_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let first = bundle();
        first.save(dir.path()).unwrap();

        // A retrain that died midway: one staged blob, and a complete run
        // directory whose pointer update never happened.
        let second = bundle();
        let model_bytes = second.blob_bytes(&second.model).unwrap();
        let staging = dir.path().join(RUNS_DIR).join(format!("{STAGING_PREFIX}crashed"));
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join(MODEL_FILE), &model_bytes).unwrap();
        let orphan = run_dir(dir.path(), second.run_id);
        fs::create_dir_all(&orphan).unwrap();
        second.write_set(&orphan).unwrap();

        let loaded = ArtifactBundle::load(dir.path()).unwrap();
        assert_eq!(loaded.run_id, first.run_id);
        assert_eq!(loaded.model, first.model);
    }

    #[test]
    fn test_resave_publishes_new_run_and_prunes_old_ones() {
        let dir = tempfile::tempdir().unwrap();
        let first = bundle();
        first.save(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join(RUNS_DIR).join(format!("{STAGING_PREFIX}left")))
            .unwrap();

        let second = bundle();
        second.save(dir.path()).unwrap();

        assert_eq!(ArtifactBundle::load(dir.path()).unwrap().run_id, second.run_id);
        let remaining: Vec<String> = fs::read_dir(dir.path().join(RUNS_DIR))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(remaining, vec![second.run_id.to_string()]);
    }

    #[test]
    fn test_garbage_pointer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        bundle().save(dir.path()).unwrap();
        fs::write(dir.path().join(CURRENT_FILE), "not-a-run\n").unwrap();

        match ArtifactBundle::load(dir.path()).unwrap_err() {
            ModelError::ArtifactMismatch(msg) => assert!(msg.contains(CURRENT_FILE), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tampered_blob_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = bundle().save(dir.path()).unwrap();

        let path = run_dir(dir.path(), manifest.run_id).join(TARGET_ENCODER_FILE);
        let mut contents = fs::read_to_string(&path).unwrap();
        contents = contents.replace("Developer", "Designer");
        fs::write(&path, contents).unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        match err {
            ModelError::ArtifactMismatch(msg) => assert!(msg.contains("checksum"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blob_from_another_run_is_rejected() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let first_manifest = bundle().save(first.path()).unwrap();
        let second_manifest = bundle().save(second.path()).unwrap();

        let foreign =
            fs::read(run_dir(second.path(), second_manifest.run_id).join(MODEL_FILE)).unwrap();
        replace_blob(
            &run_dir(first.path(), first_manifest.run_id),
            MODEL_FILE,
            &foreign,
        );

        let err = ArtifactBundle::load(first.path()).unwrap_err();
        match err {
            ModelError::ArtifactMismatch(msg) => assert!(msg.contains("belongs to run"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_structurally_broken_model_is_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = bundle().save(dir.path()).unwrap();
        let run = run_dir(dir.path(), manifest.run_id);

        let mut blob: serde_json::Value =
            serde_json::from_slice(&fs::read(run.join(MODEL_FILE)).unwrap()).unwrap();
        blob["payload"]["trees"][0]["nodes"] = serde_json::json!([]);
        replace_blob(&run, MODEL_FILE, &serde_json::to_vec(&blob).unwrap());

        match ArtifactBundle::load(dir.path()).unwrap_err() {
            ModelError::ArtifactMismatch(msg) => assert!(msg.contains("tree 0"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unsupported_schema_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let saved = bundle().save(dir.path()).unwrap();

        let manifest_path = run_dir(dir.path(), saved.run_id).join(MANIFEST_FILE);
        let mut manifest = read_manifest(&manifest_path);
        manifest.schema_version = SCHEMA_VERSION + 1;
        fs::write(&manifest_path, serde_json::to_vec(&manifest).unwrap()).unwrap();

        assert!(matches!(
            ArtifactBundle::load(dir.path()),
            Err(ModelError::ArtifactMismatch(_))
        ));
    }
}
