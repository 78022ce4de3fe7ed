#![allow(dead_code)]

use anyhow::{Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};

use diabetes_risk::record::{ClinicalInput, ClinicalRecord};
use diabetes_risk::store::{PredictionLogEntry, PredictionStore};

/// Synthetic cohort where risk rises with glucose and BMI, with zeros
/// sprinkled into the bounded columns the way the real dataset has them.
pub fn cohort(n: usize, seed: u64) -> Vec<ClinicalRecord> {
    skewed_cohort(n, seed, 0.0)
}

/// Same cohort with the positive cut moved to `threshold`; a positive
/// threshold leaves class 0 in the majority, as in the real dataset.
pub fn skewed_cohort(n: usize, seed: u64, threshold: f64) -> Vec<ClinicalRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let glucose: f64 = rng.random_range(70.0..200.0_f64).round();
            let bmi: f64 = (rng.random_range(18.0..48.0_f64) * 10.0).round() / 10.0;
            let score = (glucose - 135.0) / 30.0 + (bmi - 32.0) / 8.0 + rng.random_range(-0.4..0.4);
            let input = ClinicalInput {
                pregnancies: rng.random_range(0..10) as f64,
                glucose: if i % 53 == 0 { 0.0 } else { glucose },
                blood_pressure: if i % 29 == 0 { 0.0 } else { rng.random_range(50..100) as f64 },
                skin_thickness: if i % 5 == 0 { 0.0 } else { rng.random_range(10..50) as f64 },
                insulin: if i % 3 == 0 { 0.0 } else { rng.random_range(20..300) as f64 },
                bmi: if i % 41 == 0 { 0.0 } else { bmi },
                pedigree: (rng.random_range(0.08..1.5_f64) * 1000.0).round() / 1000.0,
                age: rng.random_range(21..70) as f64,
            };
            ClinicalRecord::new(input, u8::from(score > threshold))
        })
        .collect()
}

/// Fresh scratch directory for one test.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("diabetes-risk-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_csv(path: &Path, records: &[ClinicalRecord]) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    for record in records {
        writer.serialize(record).unwrap();
    }
    writer.flush().unwrap();
}

/// Keeps every entry in memory.
#[derive(Default)]
pub struct MemoryStore {
    pub entries: Vec<PredictionLogEntry>,
}

impl PredictionStore for MemoryStore {
    fn add(&mut self, entry: &PredictionLogEntry) -> Result<()> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Rejects every write, like an unreachable remote store.
#[derive(Default)]
pub struct FailingStore {
    pub attempts: usize,
}

impl PredictionStore for FailingStore {
    fn add(&mut self, _entry: &PredictionLogEntry) -> Result<()> {
        self.attempts += 1;
        bail!("quota exceeded")
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}
