//! Quality-Sim - cement quality simulation client
//!
//! Command-line front end for the strength prediction backend.
//!
//! # Usage
//!
//! ```bash
//! # Readiness, metrics and a preview of the training data
//! quality-sim status
//!
//! # Train on a dataset
//! quality-sim train plant_history.csv
//!
//! # What-if prediction
//! quality-sim predict --set kiln_temp=1465 --set blaine=3600 --target 4.2
//! ```
//!
//! # Environment Variables
//!
//! - `QUALITY_API_BASE_URL`: Backend base URL (default: http://localhost:8000)
//! - `QUALITY_SIM_CONFIG`: Path to a TOML config file
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use quality_sim::config::ClientConfig;
use quality_sim::report::{self, AnalyticsReport};
use quality_sim::{DatasetUpload, ErrorBanner, FeatureKey, Session};

#[derive(Parser, Debug)]
#[command(name = "quality-sim")]
#[command(about = "Cement quality simulation and strength prediction client")]
#[command(version)]
struct CliArgs {
    /// Override the backend base URL (e.g. http://localhost:8000)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Show model readiness, metrics and a preview of the training data
    Status,

    /// List simulation features with their slider bounds
    Features,

    /// Upload a CSV dataset and train the model
    Train {
        /// Path to the CSV file
        csv: PathBuf,
    },

    /// Run a what-if prediction
    Predict {
        /// Feature override, repeatable (e.g. --set kiln_temp=1465)
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
        overrides: Vec<(FeatureKey, f64)>,

        /// Target strength in MPa
        #[arg(long)]
        target: Option<f64>,

        /// Snap overrides to the configured slider range and step
        #[arg(long)]
        snap: bool,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_override(raw: &str) -> Result<(FeatureKey, f64), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key: FeatureKey = key.parse().map_err(|e| format!("{e}"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    if !value.is_finite() {
        return Err(format!("'{value}' is not a finite number"));
    }
    Ok((key, value))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let mut config = ClientConfig::load();
    if let Some(url) = &args.base_url {
        config.apply_base_url_override(url);
    }
    config.validate().context("Invalid client configuration")?;

    let mut session = Session::from_config(&config).context("Failed to build backend client")?;

    tokio::select! {
        result = run(&mut session, args.command) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling outstanding requests");
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(session: &mut Session, command: SubCommand) -> Result<()> {
    session.activate();
    session.settle().await;

    match command {
        SubCommand::Status => {
            print_overview(session);
        }

        SubCommand::Features => {
            println!("{}", report::format_features(&session.state().slider_config));
        }

        SubCommand::Train { csv } => {
            let upload = DatasetUpload::from_path(&csv)
                .await
                .with_context(|| format!("Failed to read dataset {}", csv.display()))?;
            info!(file = %upload.file_name, bytes = upload.bytes.len(), "Uploading dataset");

            let trained = session.train(upload).await;
            if let Some(message) = &session.state().last_training_message {
                println!("{message}");
            }
            print_overview(session);
            trained.context("Training did not complete")?;
        }

        SubCommand::Predict { overrides, target, snap, json } => {
            for (key, value) in overrides {
                if snap {
                    let applied = session.set_feature_from_slider(key, value);
                    if applied != value {
                        info!(feature = %key, requested = value, applied, "Override snapped to slider");
                    }
                } else {
                    session.set_feature(key, value);
                }
            }
            if target.is_some() {
                session.set_target_strength(target);
            }

            let predicted = session.predict().await.map(|_| ());
            if json {
                print_json_report(session)?;
            } else {
                print_prediction(session);
            }
            predicted.context("Prediction did not complete")?;
        }
    }

    session.shutdown().await;
    Ok(())
}

fn print_overview(session: &Session) {
    let state = session.state();
    println!("{}", report::format_status(session.status(), state.error));
    println!("{}", report::format_metrics(state.metrics.as_ref()));
    println!(
        "{}",
        report::format_sample_rows(&state.sample_rows, &state.features, &state.target_column)
    );
}

fn print_prediction(session: &mut Session) {
    println!("{}", report::format_status(session.status(), session.state().error));
    println!("Lime saturation factor: {:.4}", session.model().lsf());

    let Some(prediction) = session.state().prediction.as_ref() else {
        return;
    };
    println!("{}", report::format_prediction(prediction));

    let impact = session.impact_ranking();
    let trend = session.trend_series();
    let comparison = session.feature_comparison();
    println!("{}", report::format_impacts(&impact));
    println!("{}", report::format_trend(&trend));
    println!("{}", report::format_comparison(&comparison));
}

fn print_json_report(session: &mut Session) -> Result<()> {
    let impact = session.impact_ranking();
    let trend = session.trend_series();
    let comparison = session.feature_comparison();
    let payload = session.model().snapshot_for_submission();
    let state = session.state();

    let report = AnalyticsReport {
        status: session.status(),
        error: state.error,
        error_message: state.error.map(ErrorBanner::message),
        payload: &payload,
        prediction: state.prediction.as_ref(),
        metrics: state.metrics.as_ref(),
        impact,
        trend,
        comparison,
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}
