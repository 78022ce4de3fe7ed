use anyhow::Result;
use std::io;
use tracing::warn;

use diabetes_risk::app;
use diabetes_risk::config::AppConfig;
use diabetes_risk::firestore::{FirestoreStore, ServiceAccount};
use diabetes_risk::form::Form;
use diabetes_risk::predictor::Predictor;
use diabetes_risk::store::{LocalLogStore, PredictionStore};

fn open_store(cfg: &AppConfig) -> Result<Box<dyn PredictionStore>> {
    match &cfg.credentials {
        Some(path) => {
            let account = ServiceAccount::from_file(path)?;
            Ok(Box::new(FirestoreStore::connect(account, &cfg.collection)?))
        }
        None => {
            warn!(
                path = %cfg.local_log.display(),
                "DIABETES_CREDENTIALS not set, logging predictions locally"
            );
            Ok(Box::new(LocalLogStore::new(&cfg.local_log)))
        }
    }
}

fn main() -> Result<()> {
    diabetes_risk::init_tracing();
    let cfg = AppConfig::load()?;

    let predictor = Predictor::load(&cfg.model_path, &cfg.scaler_path)?;
    let mut store = open_store(&cfg)?;

    println!("🧠 Diabetes prediction with machine learning");
    println!("Fill in the clinical data below to predict the probability of diabetes.");
    println!("Press Enter to keep the value in brackets, type 'exit' to quit.\n");

    let mut form = Form::new(io::stdin().lock(), io::stdout());
    let session = app::run(&mut form, &predictor, store.as_mut())?;

    println!("👋 {} prediction(s) this session.", session.history().len());
    Ok(())
}
