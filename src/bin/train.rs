use anyhow::Result;

use diabetes_risk::config::AppConfig;
use diabetes_risk::record::Feature;
use diabetes_risk::training::{self, TrainingOptions};

fn main() -> Result<()> {
    diabetes_risk::init_tracing();
    let cfg = AppConfig::load()?;

    println!("🧠 Training models on {:?}...", cfg.data_csv);
    let run = training::train_from_csv(
        &cfg.data_csv,
        TrainingOptions {
            kind: cfg.classifier,
            test_ratio: cfg.test_ratio,
            seed: cfg.seed,
        },
    )?;

    println!(
        "Rows: {} train / {} test",
        run.train_rows, run.test_rows
    );
    println!("Imputation medians:");
    for feature in Feature::ZERO_AS_MISSING {
        if let Some(m) = run.medians.get(feature) {
            println!("{:>16}: {m:.3}", feature.column());
        }
    }

    for (kind, report) in &run.reports {
        let marker = if *kind == cfg.classifier { " (selected)" } else { "" };
        println!("\n=== {kind}{marker} ===");
        print!("{report}");
    }

    run.predictor.save(&cfg.model_path, &cfg.scaler_path)?;
    if let Some(report) = run.report(cfg.classifier) {
        println!("✅ {} accuracy: {:.2}%", cfg.classifier, report.accuracy * 100.0);
    }
    Ok(())
}
