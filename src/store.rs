//! Prediction log sinks.
//!
//! Each prediction produces one [`PredictionLogEntry`], written once and
//! never updated. A failed write is returned to the caller as is: nothing
//! here retries or buffers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::predictor::Prediction;
use crate::record::{ClinicalInput, Outcome, Sex};

/// The reduced record persisted for every prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionLogEntry {
    #[serde(rename = "sexo")]
    pub sex: Sex,
    #[serde(rename = "idade")]
    pub age: i64,
    #[serde(rename = "imc")]
    pub bmi: f64,
    #[serde(rename = "probabilidade")]
    pub probability: f64,
    #[serde(rename = "resultado")]
    pub outcome: Outcome,
}

impl PredictionLogEntry {
    pub fn new(sex: Sex, input: &ClinicalInput, prediction: &Prediction) -> Self {
        Self {
            sex,
            age: input.age.round() as i64,
            bmi: input.bmi,
            probability: prediction.probability,
            outcome: prediction.outcome,
        }
    }
}

/// Somewhere prediction log entries can be added.
pub trait PredictionStore {
    /// Adds one entry. Called exactly once per prediction.
    fn add(&mut self, entry: &PredictionLogEntry) -> Result<()>;

    /// Short description used in log lines.
    fn describe(&self) -> String;
}

/// Appends entries as JSON lines to a local file.
#[derive(Debug, Clone)]
pub struct LocalLogStore {
    path: PathBuf,
}

impl LocalLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PredictionStore for LocalLogStore {
    fn add(&mut self, entry: &PredictionLogEntry) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("failed to open prediction log {}", self.path.display()))?;
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        file.write_all(line.as_bytes())
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        debug!(path = %self.path.display(), "prediction appended");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("local log {}", self.path.display())
    }
}
