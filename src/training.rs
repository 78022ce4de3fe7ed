//! Offline pipeline: clean, split, scale, fit and evaluate.

use anyhow::{Context, Result, bail};
use std::path::Path;
use tracing::info;

use crate::classifier::{Classifier, ClassifierKind};
use crate::metrics::{self, EvaluationReport};
use crate::predictor::Predictor;
use crate::preprocessing::{
    self, ColumnMedians, StandardScaler, clean_records, split_features_labels, train_test_split,
};
use crate::record::ClinicalRecord;

/// Knobs of a training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingOptions {
    /// Variant kept as the served model.
    pub kind: ClassifierKind,
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::LogisticRegression,
            test_ratio: 0.2,
            seed: 42,
        }
    }
}

/// What a training run produced.
#[derive(Debug)]
pub struct TrainingRun {
    pub predictor: Predictor,
    pub medians: ColumnMedians,
    /// Held-out evaluation of every variant, in [`ClassifierKind::ALL`] order.
    pub reports: Vec<(ClassifierKind, EvaluationReport)>,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl TrainingRun {
    pub fn report(&self, kind: ClassifierKind) -> Option<&EvaluationReport> {
        self.reports.iter().find(|(k, _)| *k == kind).map(|(_, r)| r)
    }
}

/// Runs the pipeline on raw records.
///
/// Medians are fitted over all records, the scaler on the training split
/// only. All three variants are evaluated on the same held-out rows; the
/// one named by `options.kind` is returned for serving.
pub fn train(records: &[ClinicalRecord], options: TrainingOptions) -> Result<TrainingRun> {
    let (cleaned, medians) = clean_records(records)?;
    let split = train_test_split(&cleaned, options.test_ratio, options.seed);
    if split.train.is_empty() || split.test.is_empty() {
        bail!(
            "split of {} rows at ratio {} leaves an empty side",
            cleaned.len(),
            options.test_ratio
        );
    }
    info!(train = split.train.len(), test = split.test.len(), "dataset split");

    let (x_train, y_train) = split_features_labels(&split.train);
    let (x_test, y_test) = split_features_labels(&split.test);
    let (x_train, scaler) = StandardScaler::fit_transform(&x_train)?;
    let x_test = scaler.transform(&x_test)?;

    let mut reports = Vec::with_capacity(ClassifierKind::ALL.len());
    let mut chosen: Option<Classifier> = None;
    for kind in ClassifierKind::ALL {
        let model = kind.fit(&x_train, &y_train, options.seed)?;
        let report = metrics::evaluate(&model, &x_test, &y_test)?;
        info!(kind = kind.key(), accuracy = report.accuracy, "evaluated");
        reports.push((kind, report));
        if kind == options.kind {
            chosen = Some(model);
        }
    }
    let model = chosen.with_context(|| format!("{} was not trained", options.kind))?;

    Ok(TrainingRun {
        predictor: Predictor::new(model, scaler),
        medians,
        reports,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
    })
}

/// Loads the CSV at `path` and runs [`train`] on it.
pub fn train_from_csv(path: &Path, options: TrainingOptions) -> Result<TrainingRun> {
    let records = preprocessing::load_records(path)?;
    info!(rows = records.len(), path = %path.display(), "loaded training data");
    train(&records, options)
}
