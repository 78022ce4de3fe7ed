//! Runtime configuration loaded from the process environment.

use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;

use crate::classifier::ClassifierKind;

/// Snapshot of configuration values consumed by both binaries.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub data_csv: PathBuf,
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub classifier: ClassifierKind,
    pub test_ratio: f64,
    pub seed: u64,
    /// Service-account key; when present predictions go to Firestore.
    pub credentials: Option<PathBuf>,
    pub collection: String,
    pub local_log: PathBuf,
}

impl AppConfig {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a snapshot from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let classifier = get("DIABETES_CLASSIFIER", "logistic_regression")
            .parse()
            .context("DIABETES_CLASSIFIER")?;
        let test_ratio: f64 = get("DIABETES_TEST_RATIO", "0.2")
            .parse()
            .context("DIABETES_TEST_RATIO must be a number")?;
        if !(0.0..1.0).contains(&test_ratio) {
            bail!("DIABETES_TEST_RATIO must be in [0, 1), got {test_ratio}");
        }
        let seed = get("DIABETES_SEED", "42")
            .parse()
            .context("DIABETES_SEED must be an unsigned integer")?;

        Ok(Self {
            data_csv: get("DIABETES_DATA_CSV", "data/diabetes.csv").into(),
            model_path: get("DIABETES_MODEL_PATH", "artifacts/model.msgpack").into(),
            scaler_path: get("DIABETES_SCALER_PATH", "artifacts/scaler.msgpack").into(),
            classifier,
            test_ratio,
            seed,
            credentials: lookup("DIABETES_CREDENTIALS")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            collection: get("DIABETES_COLLECTION", "previsoes"),
            local_log: get("DIABETES_LOCAL_LOG", "predictions.jsonl").into(),
        })
    }
}
