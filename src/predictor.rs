//! Serving-side inference: a fitted classifier behind the scaler it was
//! trained with, loaded once from the saved artifacts.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::artifact;
use crate::classifier::Classifier;
use crate::preprocessing::StandardScaler;
use crate::record::{ClinicalInput, Outcome};

/// Result of a single prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub outcome: Outcome,
    /// Probability of the positive class, in `[0, 1]`.
    pub probability: f64,
}

impl Prediction {
    /// `[P(no diabetes), P(diabetes)]`.
    pub fn class_probabilities(&self) -> [f64; 2] {
        [1.0 - self.probability, self.probability]
    }
}

/// A fitted model paired with the scaler it was trained behind.
#[derive(Debug)]
pub struct Predictor {
    model: Classifier,
    scaler: StandardScaler,
}

impl Predictor {
    pub fn new(model: Classifier, scaler: StandardScaler) -> Self {
        Self { model, scaler }
    }

    /// Loads both artifacts from disk.
    pub fn load(model_path: &Path, scaler_path: &Path) -> Result<Self> {
        println!("📦 Loading model from {:?}", model_path);
        let model: Classifier = artifact::load(model_path).context("model artifact")?;
        let scaler: StandardScaler = artifact::load(scaler_path).context("scaler artifact")?;
        info!(kind = %model.kind(), features = scaler.n_features(), "artifacts loaded");
        Ok(Self { model, scaler })
    }

    /// Writes both artifacts to disk.
    pub fn save(&self, model_path: &Path, scaler_path: &Path) -> Result<()> {
        println!("💾 Saving model to {:?}", model_path);
        artifact::save(&self.model, model_path)?;
        artifact::save(&self.scaler, scaler_path)?;
        Ok(())
    }

    /// Scales the eight inputs with the captured statistics and classifies them.
    pub fn predict(&self, input: &ClinicalInput) -> Result<Prediction> {
        let scaled = self.scaler.transform_row(&input.features())?;
        let label = self.model.predict(&scaled)?[0];
        let probability = self.model.positive_probability(&scaled)?[0];
        Ok(Prediction {
            outcome: Outcome::from_label(label),
            probability,
        })
    }

    pub fn model(&self) -> &Classifier {
        &self.model
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }
}
