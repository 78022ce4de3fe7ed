//! Data preparation: CSV loading, zero-as-missing cleaning with median
//! imputation, feature/label split and feature standardization.

use anyhow::{Context, Result, bail};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::record::{ClinicalRecord, Feature, N_FEATURES};

/// Loads every row of a header-named clinical CSV.
pub fn load_records(path: &Path) -> Result<Vec<ClinicalRecord>> {
    let file = File::open(path).with_context(|| format!("failed to open CSV {}", path.display()))?;
    read_records(file).with_context(|| format!("failed to parse CSV {}", path.display()))
}

/// Parses clinical rows from any reader producing CSV with a header line.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<ClinicalRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let record: ClinicalRecord = result.with_context(|| format!("invalid CSV row {}", line + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Per-column medians of the zero-as-missing columns, computed once over the
/// training set.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMedians {
    values: Vec<(usize, f64)>,
}

impl ColumnMedians {
    /// Computes the median of the non-missing values of every
    /// [`Feature::ZERO_AS_MISSING`] column.
    pub fn fit(records: &[ClinicalRecord]) -> Result<Self> {
        let mut values = Vec::with_capacity(Feature::ZERO_AS_MISSING.len());
        for feature in Feature::ZERO_AS_MISSING {
            let present: Vec<f64> = records
                .iter()
                .map(|r| r.input().get(feature))
                .filter(|&v| v != 0.0)
                .collect();
            let Some(m) = median(present) else {
                bail!("column {} has no non-missing values", feature.column());
            };
            debug!(column = feature.column(), median = m, "fitted imputation median");
            values.push((feature.index(), m));
        }
        Ok(Self { values })
    }

    /// The median fitted for `feature`, if it is a zero-as-missing column.
    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values
            .iter()
            .find(|(idx, _)| *idx == feature.index())
            .map(|&(_, m)| m)
    }

    /// Replaces each zero in a bounded column with that column's median.
    pub fn apply(&self, record: &ClinicalRecord) -> ClinicalRecord {
        let mut input = record.input();
        for feature in Feature::ZERO_AS_MISSING {
            if input.get(feature) == 0.0 {
                if let Some(m) = self.get(feature) {
                    input.set(feature, m);
                }
            }
        }
        ClinicalRecord::new(input, record.outcome)
    }
}

/// Median of the given values; the mean of the two middle values for an even count.
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Fits medians over `records` and returns the imputed table alongside them.
pub fn clean_records(records: &[ClinicalRecord]) -> Result<(Vec<ClinicalRecord>, ColumnMedians)> {
    let medians = ColumnMedians::fit(records)?;
    let cleaned = records.iter().map(|r| medians.apply(r)).collect();
    Ok((cleaned, medians))
}

/// Splits records into a feature matrix (model column order) and a label vector.
pub fn split_features_labels(records: &[ClinicalRecord]) -> (Array2<f64>, Array1<usize>) {
    let mut x = Array2::zeros((records.len(), N_FEATURES));
    for (mut row, record) in x.axis_iter_mut(Axis(0)).zip(records) {
        row.assign(&Array1::from(record.input().features().to_vec()));
    }
    let y = records.iter().map(|r| r.outcome as usize).collect();
    (x, y)
}

/// A helper type for holding train/test splits.
#[derive(Debug)]
pub struct DatasetSplit {
    pub train: Vec<ClinicalRecord>,
    pub test: Vec<ClinicalRecord>,
}

/// Shuffles with a fixed seed and holds out `round(n * test_ratio)` rows.
pub fn train_test_split(data: &[ClinicalRecord], test_ratio: f64, seed: u64) -> DatasetSplit {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = data.to_vec();
    data.shuffle(&mut rng);

    let test_size = ((data.len() as f64) * test_ratio).round() as usize;
    let test_size = test_size.min(data.len());
    let train = data.split_off(test_size);

    DatasetSplit { train, test: data }
}

/// Per-column standardization captured from the training matrix.
///
/// Immutable once fitted: [`StandardScaler::transform`] never updates the
/// captured statistics, so the same input always maps to the same output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Captures per-column mean and population standard deviation.
    /// Constant columns get a scale of 1.
    pub fn fit<S: Data<Elem = f64>>(x: &ArrayBase<S, Ix2>) -> Result<Self> {
        let Some(mean) = x.mean_axis(Axis(0)) else {
            bail!("cannot fit a scaler on an empty matrix");
        };
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 { 1.0 } else { s });
        Ok(Self { mean, scale })
    }

    /// Fits on `x` and returns the scaled matrix together with the scaler.
    pub fn fit_transform<S: Data<Elem = f64>>(x: &ArrayBase<S, Ix2>) -> Result<(Array2<f64>, Self)> {
        let scaler = Self::fit(x)?;
        let scaled = scaler.transform(x)?;
        Ok((scaled, scaler))
    }

    /// Applies the captured statistics to `x`, which must have the same columns.
    pub fn transform<S: Data<Elem = f64>>(&self, x: &ArrayBase<S, Ix2>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            bail!(
                "scaler was fitted on {} features but got {}",
                self.n_features(),
                x.ncols()
            );
        }
        Ok((x - &self.mean) / &self.scale)
    }

    /// Scales a single row, returning a `1 x n` matrix ready for prediction.
    pub fn transform_row(&self, row: &[f64]) -> Result<Array2<f64>> {
        let x = Array2::from_shape_vec((1, row.len()), row.to_vec())?;
        self.transform(&x)
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ClinicalInput;
    use ndarray::array;

    fn record(values: [f64; N_FEATURES], outcome: u8) -> ClinicalRecord {
        ClinicalRecord::new(ClinicalInput::from_features(values), outcome)
    }

    fn table() -> Vec<ClinicalRecord> {
        vec![
            record([6.0, 148.0, 72.0, 35.0, 0.0, 33.6, 0.627, 50.0], 1),
            record([1.0, 85.0, 66.0, 29.0, 0.0, 26.6, 0.351, 31.0], 0),
            record([8.0, 183.0, 64.0, 0.0, 0.0, 23.3, 0.672, 32.0], 1),
            record([1.0, 89.0, 66.0, 23.0, 94.0, 28.1, 0.167, 21.0], 0),
            record([0.0, 137.0, 40.0, 35.0, 168.0, 43.1, 2.288, 33.0], 1),
            record([5.0, 0.0, 74.0, 0.0, 0.0, 25.6, 0.201, 30.0], 0),
        ]
    }

    #[test]
    fn median_handles_odd_and_even_counts() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(vec![4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(vec![]), None);
    }

    #[test]
    fn zeros_in_bounded_columns_become_the_median() {
        let raw = table();
        let (cleaned, medians) = clean_records(&raw).unwrap();

        // insulin: non-missing values are 94 and 168
        assert_eq!(medians.get(Feature::Insulin), Some(131.0));
        // skin thickness: 35, 29, 23, 35
        assert_eq!(medians.get(Feature::SkinThickness), Some(32.0));
        // glucose: 148, 85, 183, 89, 137
        assert_eq!(medians.get(Feature::Glucose), Some(137.0));
        assert_eq!(medians.get(Feature::Pregnancies), None);

        for (before, after) in raw.iter().zip(&cleaned) {
            for feature in Feature::ZERO_AS_MISSING {
                let (b, a) = (before.input().get(feature), after.input().get(feature));
                if b == 0.0 {
                    assert_eq!(a, medians.get(feature).unwrap());
                } else {
                    assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn unbounded_zeros_are_real_values() {
        let (cleaned, _) = clean_records(&table()).unwrap();
        assert_eq!(cleaned[4].pregnancies, 0.0);
        assert_eq!(cleaned[4].outcome, 1);
    }

    #[test]
    fn all_missing_column_is_an_error() {
        let rows = vec![record([1.0, 100.0, 70.0, 20.0, 0.0, 30.0, 0.5, 40.0], 0)];
        assert!(ColumnMedians::fit(&rows).is_err());
    }

    #[test]
    fn split_keeps_order_and_labels() {
        let (x, y) = split_features_labels(&table());
        assert_eq!(x.dim(), (6, N_FEATURES));
        assert_eq!(x[[0, 1]], 148.0);
        assert_eq!(x[[3, 6]], 0.167);
        assert_eq!(y.to_vec(), vec![1, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn train_test_split_is_seeded() {
        let rows = table();
        let a = train_test_split(&rows, 0.34, 7);
        let b = train_test_split(&rows, 0.34, 7);
        assert_eq!(a.test.len(), 2);
        assert_eq!(a.train.len(), 4);
        assert_eq!(a.test, b.test);
        assert_eq!(a.train, b.train);
    }

    #[test]
    fn scaled_training_matrix_is_standardized() {
        let x = array![[1.0, 10.0, 5.0], [2.0, 20.0, 5.0], [3.0, 60.0, 5.0], [6.0, 30.0, 5.0]];
        let (scaled, scaler) = StandardScaler::fit_transform(&x).unwrap();
        let mean = scaled.mean_axis(Axis(0)).unwrap();
        let std = scaled.std_axis(Axis(0), 0.0);
        for j in 0..2 {
            assert!(mean[j].abs() < 1e-9);
            assert!((std[j] - 1.0).abs() < 1e-9);
        }
        // constant column: centered, scale 1
        assert_eq!(scaler.scale()[2], 1.0);
        assert!(scaled.column(2).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn transform_is_pure() {
        let x = array![[1.0, 2.0], [3.0, 8.0], [5.0, 5.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        let before = scaler.clone();
        let a = scaler.transform_row(&[4.0, 4.0]).unwrap();
        let b = scaler.transform_row(&[4.0, 4.0]).unwrap();
        assert_eq!(a, b);
        assert_eq!(scaler, before);
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let x = array![[1.0, 2.0], [3.0, 8.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        assert!(scaler.transform_row(&[1.0, 2.0, 3.0]).is_err());
    }
}
