//! Held-out evaluation: accuracy, per-class precision/recall/F1 and the
//! confusion matrix of a binary classifier.

use anyhow::{Result, bail};
use ndarray::{ArrayBase, Data, Ix1, Ix2};
use serde::Serialize;
use std::fmt;

use crate::classifier::Classifier;
use crate::record::Outcome;

/// 2x2 confusion matrix; rows are true labels, columns predicted labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConfusionMatrix {
    counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[usize], y_pred: &[usize]) -> Self {
        let mut counts = [[0; 2]; 2];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            counts[t.min(1)][p.min(1)] += 1;
        }
        Self { counts }
    }

    /// Samples with true label `actual` predicted as `predicted`.
    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        self.counts[actual][predicted]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        self.counts[0][0] + self.counts[1][1]
    }

    pub fn rows(&self) -> [[usize; 2]; 2] {
        self.counts
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>16} {:>8} {:>8}", "", "pred 0", "pred 1")?;
        for (label, row) in self.counts.iter().enumerate() {
            writeln!(f, "{:>16} {:>8} {:>8}", format!("true {label}"), row[0], row[1])?;
        }
        Ok(())
    }
}

/// Precision, recall and F1 for one class (or an average across classes).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl ClassMetrics {
    fn for_class(cm: &ConfusionMatrix, class: usize) -> Self {
        let other = 1 - class;
        let tp = cm.get(class, class);
        let fp = cm.get(other, class);
        let fn_ = cm.get(class, other);
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Self {
            precision,
            recall,
            f1,
            support: tp + fn_,
        }
    }
}

/// Everything printed after evaluating a classifier on the held-out split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub classes: [ClassMetrics; 2],
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: ConfusionMatrix,
}

impl EvaluationReport {
    /// Builds the report from true and predicted 0/1 labels.
    pub fn from_labels(y_true: &[usize], y_pred: &[usize]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            bail!("{} true labels but {} predictions", y_true.len(), y_pred.len());
        }
        if y_true.is_empty() {
            bail!("cannot evaluate on an empty split");
        }
        let confusion = ConfusionMatrix::from_labels(y_true, y_pred);
        let classes = [
            ClassMetrics::for_class(&confusion, 0),
            ClassMetrics::for_class(&confusion, 1),
        ];
        let total = confusion.total();

        let macro_avg = ClassMetrics {
            precision: (classes[0].precision + classes[1].precision) / 2.0,
            recall: (classes[0].recall + classes[1].recall) / 2.0,
            f1: (classes[0].f1 + classes[1].f1) / 2.0,
            support: total,
        };
        let weight = |pick: fn(&ClassMetrics) -> f64| {
            classes
                .iter()
                .map(|c| pick(c) * c.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = ClassMetrics {
            precision: weight(|c| c.precision),
            recall: weight(|c| c.recall),
            f1: weight(|c| c.f1),
            support: total,
        };

        Ok(Self {
            accuracy: ratio(confusion.correct(), total),
            classes,
            macro_avg,
            weighted_avg,
            confusion,
        })
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;
        writeln!(
            f,
            "{:>16} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        let mut row = |name: &str, m: &ClassMetrics| {
            writeln!(
                f,
                "{:>16} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )
        };
        row(Outcome::NoDiabetes.as_str(), &self.classes[0])?;
        row(Outcome::Diabetes.as_str(), &self.classes[1])?;
        row("macro avg", &self.macro_avg)?;
        row("weighted avg", &self.weighted_avg)?;
        writeln!(f, "Confusion matrix:")?;
        write!(f, "{}", self.confusion)
    }
}

/// Predicts on the held-out matrix and scores against the true labels.
pub fn evaluate<S, T>(
    model: &Classifier,
    x_test: &ArrayBase<S, Ix2>,
    y_test: &ArrayBase<T, Ix1>,
) -> Result<EvaluationReport>
where
    S: Data<Elem = f64>,
    T: Data<Elem = usize>,
{
    let predicted = model.predict(x_test)?;
    EvaluationReport::from_labels(&y_test.to_vec(), &predicted.to_vec())
}
