//! Command-line entry point for the crop recommendation service
//!
//! Subcommands:
//! - `train`   - fit a new pipeline from a training CSV and save the artifact
//! - `predict` - load an artifact and predict for one set of readings
//! - `info`    - print the loaded artifact's metrics and crops
//! - `serve`   - run the HTTP prediction service

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crop_recommender::data::SoilSample;
use crop_recommender::models::{GbmParams, ModelTrainer, TrainingOptions};
use crop_recommender::serve::{self, AppState, ModelHandle, RetrainConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Crop recommendation from soil and climate readings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a pipeline and save the artifact
    Train {
        /// Training CSV with N,P,K,temperature,humidity,ph,rainfall,label
        #[arg(short, long)]
        data: PathBuf,

        /// Directory the artifact is written to
        #[arg(short, long, default_value = "models")]
        out_dir: PathBuf,

        /// Held-out fraction for evaluation
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        /// Seed for the train/test shuffle
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Number of boosting rounds
        #[arg(long, default_value = "100")]
        n_estimators: usize,

        /// Learning rate
        #[arg(long, default_value = "0.1")]
        learning_rate: f64,

        /// Maximum tree depth
        #[arg(long, default_value = "6")]
        max_depth: usize,
    },

    /// Predict the best crop for one set of readings
    Predict {
        /// Artifact directory written by `train`
        #[arg(short, long, default_value = "models")]
        model_dir: PathBuf,

        #[arg(long)]
        n: f64,
        #[arg(long)]
        p: f64,
        #[arg(long)]
        k: f64,
        #[arg(long)]
        temperature: f64,
        #[arg(long)]
        humidity: f64,
        #[arg(long)]
        ph: f64,
        #[arg(long)]
        rainfall: f64,
    },

    /// Show metrics and supported crops of a saved artifact
    Info {
        #[arg(short, long, default_value = "models")]
        model_dir: PathBuf,
    },

    /// Run the HTTP prediction service
    Serve {
        #[arg(short, long, default_value = "models")]
        model_dir: PathBuf,

        /// Training CSV used by the retrain endpoint
        #[arg(short, long, default_value = "data/crop_recommendation.csv")]
        data: PathBuf,

        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value = "8000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crop_recommender=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            data,
            out_dir,
            test_size,
            seed,
            n_estimators,
            learning_rate,
            max_depth,
        } => {
            let options = TrainingOptions {
                test_size,
                seed,
                params: GbmParams {
                    n_estimators,
                    learning_rate,
                    max_depth,
                    ..GbmParams::default()
                },
            };

            let mut trainer = ModelTrainer::new();
            let report = trainer
                .train(&data, &options)
                .context("training failed")?;
            trainer.save(&out_dir).context("saving artifact failed")?;

            println!("\n=== Training Results ===\n");
            println!("Train accuracy: {:.4}", report.metrics.train_accuracy);
            println!("Test accuracy:  {:.4}", report.metrics.test_accuracy);
            println!(
                "Samples:        {} train / {} test",
                report.metrics.train_samples, report.metrics.test_samples
            );
            println!(
                "Features:       {}  Crops: {}",
                report.metrics.feature_count, report.metrics.class_count
            );

            println!("\n=== Per-Crop Report ===\n");
            println!(
                "{:<16} {:>9} {:>9} {:>9} {:>8}",
                "crop", "precision", "recall", "f1", "support"
            );
            for (crop, metrics) in &report.class_report {
                println!(
                    "{:<16} {:>9.3} {:>9.3} {:>9.3} {:>8}",
                    crop, metrics.precision, metrics.recall, metrics.f1_score, metrics.support
                );
            }

            println!("\n=== Feature Importances ===\n");
            let mut importance = trainer.feature_importance()?;
            importance.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            for (name, score) in &importance {
                let bar = "#".repeat((score * 50.0).round() as usize);
                println!("{name:<24} {score:.4} {bar}");
            }

            println!("\nArtifact saved to {}", out_dir.display());
        }

        Command::Predict {
            model_dir,
            n,
            p,
            k,
            temperature,
            humidity,
            ph,
            rainfall,
        } => {
            let trainer = ModelTrainer::load(&model_dir).context("loading artifact failed")?;

            let sample = SoilSample {
                nitrogen: n,
                phosphorus: p,
                potassium: k,
                temperature,
                humidity,
                ph,
                rainfall,
            };

            let prediction = trainer.predict(&sample)?;

            println!(
                "\nRecommended crop: {} ({:.1}% confidence)\n",
                prediction.crop,
                prediction.confidence * 100.0
            );

            let mut ranked: Vec<_> = prediction.probabilities.iter().collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
            for (crop, probability) in ranked.iter().take(5) {
                println!("  {crop:<16} {:.4}", probability);
            }
        }

        Command::Info { model_dir } => {
            let trainer = ModelTrainer::load(&model_dir).context("loading artifact failed")?;

            println!("\nSupported crops ({}):", trainer.processor().num_crops());
            for crop in trainer.processor().all_crops() {
                println!("  {crop}");
            }

            match trainer.metrics() {
                Some(metrics) => {
                    println!("\nTrain accuracy: {:.4}", metrics.train_accuracy);
                    println!("Test accuracy:  {:.4}", metrics.test_accuracy);
                    println!(
                        "Trained on {} samples, evaluated on {}",
                        metrics.train_samples, metrics.test_samples
                    );
                }
                None => println!("\nNo metrics stored with this artifact"),
            }
        }

        Command::Serve {
            model_dir,
            data,
            host,
            port,
        } => {
            let handle = match ModelTrainer::load(&model_dir) {
                Ok(trainer) => {
                    info!("Model loaded successfully");
                    ModelHandle::new(trainer)
                }
                Err(err) => {
                    warn!("Failed to load model: {err}; serving without a model");
                    ModelHandle::empty()
                }
            };

            let state = AppState {
                handle,
                retrain: RetrainConfig {
                    data_path: data,
                    artifact_dir: model_dir,
                    options: TrainingOptions::default(),
                },
            };

            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .context("invalid host/port")?;

            serve::run(addr, state).await.context("server failed")?;
        }
    }

    Ok(())
}
