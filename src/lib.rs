//! # diabetes-risk 🧠🩺
//!
//! Predict diabetes risk from eight clinical measurements with a pre-trained
//! classifier, and log every prediction.
//!
//! The offline `train` binary cleans a CSV of clinical records (zeros in the
//! physiologically bounded columns are treated as missing and replaced with the
//! column median), standardizes the features, fits and evaluates the
//! [`linfa`](https://crates.io/crates/linfa) based classifiers, and writes the
//! chosen model and its scaler as MessagePack artifacts. The interactive
//! `diabetes-risk` binary loads those artifacts, asks for the eight inputs,
//! and prints the verdict, a probability chart and session statistics.
//!
//! ## Features
//! - Median imputation of zero-as-missing values
//! - Standard scaling fitted on the training split only
//! - Logistic regression, random forest and k-nearest neighbours
//! - Accuracy, per-class precision/recall/F1 and confusion matrix
//! - Model persistence with `rmp-serde` (MessagePack)
//! - Prediction log to Cloud Firestore or a local JSON-lines file
//!
//! ## Example
//! ```rust,no_run
//! use std::path::Path;
//! use diabetes_risk::predictor::Predictor;
//! use diabetes_risk::record::ClinicalInput;
//!
//! let predictor = Predictor::load(
//!     Path::new("artifacts/model.msgpack"),
//!     Path::new("artifacts/scaler.msgpack"),
//! )?;
//! let input = ClinicalInput::from_features([1.0, 120.0, 70.0, 20.0, 85.0, 28.0, 0.4, 30.0]);
//! let prediction = predictor.predict(&input)?;
//! println!("{} ({:.2}%)", prediction.outcome, prediction.probability * 100.0);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod app;
pub mod artifact;
pub mod classifier;
pub mod config;
pub mod firestore;
pub mod form;
pub mod metrics;
pub mod predictor;
pub mod preprocessing;
pub mod record;
pub mod session;
pub mod store;
pub mod training;

use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
