//! The three interchangeable classifier variants behind one fit/predict
//! capability. Fitting and inference are delegated to linfa; this module only
//! selects, bags and votes.

use anyhow::{Context, Result, bail};
use linfa::prelude::*;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use linfa_nn::distance::L2Dist;
use linfa_nn::{CommonNearestNeighbour, NearestNeighbour, NearestNeighbourIndex};
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Iteration cap for logistic regression.
pub const LOGISTIC_MAX_ITERATIONS: u64 = 1000;
/// Trees in the random forest ensemble.
pub const FOREST_TREES: usize = 100;
/// Neighbours consulted by the nearest-neighbours vote.
pub const KNN_NEIGHBOURS: usize = 5;

/// Selects which classifier to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    LogisticRegression,
    RandomForest,
    Knn,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 3] = [
        ClassifierKind::LogisticRegression,
        ClassifierKind::RandomForest,
        ClassifierKind::Knn,
    ];

    /// Configuration key, e.g. `random_forest`.
    pub fn key(self) -> &'static str {
        match self {
            ClassifierKind::LogisticRegression => "logistic_regression",
            ClassifierKind::RandomForest => "random_forest",
            ClassifierKind::Knn => "knn",
        }
    }

    /// Fits this variant on a scaled feature matrix and 0/1 labels.
    ///
    /// `seed` drives the bootstrap samples of the random forest and is
    /// ignored by the other variants.
    pub fn fit(self, x: &Array2<f64>, y: &Array1<usize>, seed: u64) -> Result<Classifier> {
        if x.nrows() != y.len() {
            bail!("{} feature rows but {} labels", x.nrows(), y.len());
        }
        if x.nrows() == 0 {
            bail!("cannot fit {self} on an empty dataset");
        }
        if let Some(bad) = y.iter().find(|&&label| label > 1) {
            bail!("labels must be 0 or 1, found {bad}");
        }
        debug!(kind = self.key(), rows = x.nrows(), "fitting classifier");

        let classifier = match self {
            ClassifierKind::LogisticRegression => {
                let dataset = Dataset::new(x.clone(), y.clone());
                let model = LogisticRegression::default()
                    .max_iterations(LOGISTIC_MAX_ITERATIONS)
                    .fit(&dataset)
                    .context("logistic regression training failed")?;
                Classifier::LogisticRegression(model)
            }
            ClassifierKind::RandomForest => {
                Classifier::RandomForest(RandomForest::fit(x, y, FOREST_TREES, seed)?)
            }
            ClassifierKind::Knn => {
                Classifier::Knn(KNearestNeighbours::fit(x, y, KNN_NEIGHBOURS))
            }
        };
        Ok(classifier)
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClassifierKind::LogisticRegression => "Logistic Regression",
            ClassifierKind::RandomForest => "Random Forest (bagged trees)",
            ClassifierKind::Knn => "KNN",
        })
    }
}

impl FromStr for ClassifierKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        ClassifierKind::ALL
            .into_iter()
            .find(|kind| kind.key() == normalized)
            .with_context(|| {
                format!("unknown classifier {s:?}, expected logistic_regression, random_forest or knn")
            })
    }
}

/// A fitted classifier of one of the three kinds.
#[derive(Serialize, Deserialize)]
pub enum Classifier {
    LogisticRegression(FittedLogisticRegression<f64, usize>),
    RandomForest(RandomForest),
    Knn(KNearestNeighbours),
}

impl Classifier {
    pub fn kind(&self) -> ClassifierKind {
        match self {
            Classifier::LogisticRegression(_) => ClassifierKind::LogisticRegression,
            Classifier::RandomForest(_) => ClassifierKind::RandomForest,
            Classifier::Knn(_) => ClassifierKind::Knn,
        }
    }

    /// Predicted label (0 or 1) for every row.
    pub fn predict<S: Data<Elem = f64>>(&self, x: &ArrayBase<S, Ix2>) -> Result<Array1<usize>> {
        Ok(self.positive_probability(x)?.mapv(|p| usize::from(p > 0.5)))
    }

    /// Probability of the positive class for every row.
    pub fn positive_probability<S: Data<Elem = f64>>(
        &self,
        x: &ArrayBase<S, Ix2>,
    ) -> Result<Array1<f64>> {
        match self {
            Classifier::LogisticRegression(model) => {
                // linfa reports the probability of whichever class it fitted as
                // positive: the more frequent one, or the first seen on a tie.
                let p = model.predict_probabilities(x);
                Ok(if model.labels().pos.class == 1 {
                    p
                } else {
                    p.mapv(|p| 1.0 - p)
                })
            }
            Classifier::RandomForest(forest) => Ok(forest.positive_fraction(x)),
            Classifier::Knn(knn) => knn.positive_fraction(x),
        }
    }

    /// Class probabilities, one row per sample: `[P(0), P(1)]`.
    pub fn predict_proba<S: Data<Elem = f64>>(&self, x: &ArrayBase<S, Ix2>) -> Result<Array2<f64>> {
        let positive = self.positive_probability(x)?;
        let mut proba = Array2::zeros((positive.len(), 2));
        for (mut row, p) in proba.axis_iter_mut(Axis(0)).zip(positive) {
            row[0] = 1.0 - p;
            row[1] = p;
        }
        Ok(proba)
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Classifier").field(&self.kind()).finish()
    }
}

/// Random forest reduced to bagging: each tree sees a bootstrap sample of the
/// rows and every column. linfa-trees has no per-split feature sampling.
#[derive(Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree<f64, usize>>,
}

impl RandomForest {
    pub fn fit(x: &Array2<f64>, y: &Array1<usize>, n_trees: usize, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = x.nrows();
        let mut trees = Vec::with_capacity(n_trees);
        for i in 0..n_trees {
            let rows: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            let sample = Dataset::new(x.select(Axis(0), &rows), y.select(Axis(0), &rows));
            let tree = DecisionTree::<f64, usize>::params()
                .fit(&sample)
                .with_context(|| format!("decision tree {i} training failed"))?;
            trees.push(tree);
        }
        Ok(Self { trees })
    }

    /// Fraction of trees voting for the positive class.
    pub fn positive_fraction<S: Data<Elem = f64>>(&self, x: &ArrayBase<S, Ix2>) -> Array1<f64> {
        let mut votes = Array1::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            let labels: Array1<usize> = tree.predict(x);
            votes.zip_mut_with(&labels, |v, &label| *v += label as f64);
        }
        votes / self.trees.len().max(1) as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Uniform-vote k-nearest neighbours over the stored training points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNearestNeighbours {
    k: usize,
    points: Array2<f64>,
    labels: Array1<usize>,
}

impl KNearestNeighbours {
    pub fn fit(x: &Array2<f64>, y: &Array1<usize>, k: usize) -> Self {
        Self {
            k: k.clamp(1, x.nrows().max(1)),
            points: x.clone(),
            labels: y.clone(),
        }
    }

    /// Fraction of the `k` nearest training points (Euclidean) labelled positive.
    pub fn positive_fraction<S: Data<Elem = f64>>(&self, x: &ArrayBase<S, Ix2>) -> Result<Array1<f64>> {
        let index = CommonNearestNeighbour::KdTree
            .from_batch(&self.points, L2Dist)
            .context("failed to index training points")?;
        let mut out = Array1::zeros(x.nrows());
        for (slot, row) in out.iter_mut().zip(x.rows()) {
            let neighbours = index.k_nearest(row, self.k).context("neighbour query failed")?;
            let positives = neighbours
                .iter()
                .filter(|(_, idx)| self.labels[*idx] == 1)
                .count();
            *slot = positives as f64 / neighbours.len().max(1) as f64;
        }
        Ok(out)
    }

    pub fn k(&self) -> usize {
        self.k
    }
}
