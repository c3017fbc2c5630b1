use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;

use hotel_classifiers::pipeline::DEFAULT_ARTIFACT_FILE;
use hotel_classifiers::TrainedPipeline;
use hotel_cli::server::{self, resolve_port, PredictResponse};
use hotel_cli::training::input::TrainConfig;
use hotel_cli::training::trainer;
use hotel_cli::ui;
use hotel_cli::util::read_record;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("HOTEL_LOG", "error,hotel=info"))
        .init();

    let matches = Command::new("hotel")
        .version(clap::crate_version!())
        .about("Hotel booking cancellation classifier: train, serve and query")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train the cancellation model and write the artifact")
                .arg(
                    Arg::new("config")
                        .help("Training configuration file (JSON). Defaults apply when omitted.")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("train_data")
                        .short('d')
                        .long("train_data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the bookings CSV. Overrides the training data file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output_file")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "File path the trained model artifact will be written to. \
                             Overrides the path specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("skip_grid_search")
                        .long("skip-grid-search")
                        .help("Persist the baseline model without hyper-parameter search.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no_report")
                        .long("no-report")
                        .help("Disable HTML report generation.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve predictions over HTTP (POST /predict)")
                .arg(
                    Arg::new("model_path")
                        .short('m')
                        .long("model")
                        .help("Path to the trained model artifact")
                        .default_value(DEFAULT_ARTIFACT_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .help("Port to listen on. Overrides PORT (default 5000).")
                        .value_parser(clap::value_parser!(u16)),
                ),
        )
        .subcommand(
            Command::new("ui")
                .about("Serve the booking form that queries the prediction service")
                .arg(
                    Arg::new("api_url")
                        .long("api-url")
                        .help("Base URL of the prediction service")
                        .default_value("http://127.0.0.1:5000")
                        .value_hint(ValueHint::Url),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .help("Port for the form UI")
                        .default_value("8501")
                        .value_parser(clap::value_parser!(u16)),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Classify one booking record (JSON object) without starting a server")
                .arg(
                    Arg::new("model_path")
                        .short('m')
                        .long("model")
                        .help("Path to the trained model artifact")
                        .default_value(DEFAULT_ARTIFACT_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("record")
                        .help("Path to a JSON file holding one booking record")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("serve", sub_m)) => handle_serve(sub_m),
        Some(("ui", sub_m)) => handle_ui(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path = matches.get_one::<PathBuf>("config");
    match config_path {
        Some(path) => log::info!("[Hotel::Train] Training from config: {:?}", path),
        None => eprintln!("[Hotel::Train] No config file provided; using defaults."),
    }

    let config = TrainConfig::from_arguments(config_path, matches)?;
    if config_path.is_none() {
        let json = serde_json::to_string_pretty(&config).unwrap_or_default();
        println!("{}", json);
    }

    match trainer::run_training(&config) {
        Ok(summary) => {
            log::info!(
                "[Hotel::Train] Wrote {:?} ({}, held-out accuracy {:.4}, baseline {:.4})",
                summary.artifact,
                summary.final_params,
                summary.final_accuracy,
                summary.baseline_accuracy
            );
            if let Some(report) = &summary.report {
                log::info!("[Hotel::Train] Report: {:?}", report);
            }
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start the async runtime")
}

fn handle_serve(matches: &ArgMatches) -> Result<()> {
    let model_path: &PathBuf = matches
        .get_one("model_path")
        .context("--model is required")?;
    let port = resolve_port(matches.get_one::<u16>("port").copied())?;

    if let Err(e) = runtime()?.block_on(server::serve(model_path, port)) {
        log::error!("Server failed: {:#}", e);
        std::process::exit(1)
    }
    Ok(())
}

fn handle_ui(matches: &ArgMatches) -> Result<()> {
    let api_url: &String = matches.get_one("api_url").context("--api-url is required")?;
    let port: u16 = *matches.get_one("port").context("--port is required")?;

    if let Err(e) = runtime()?.block_on(ui::serve(api_url, port)) {
        log::error!("UI failed: {:#}", e);
        std::process::exit(1)
    }
    Ok(())
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let model_path: &PathBuf = matches
        .get_one("model_path")
        .context("--model is required")?;
    let record_path: &PathBuf = matches.get_one("record").context("record is required")?;

    let result = TrainedPipeline::load(model_path)
        .with_context(|| format!("Failed to load model artifact: {:?}", model_path))
        .and_then(|pipeline| {
            let record = read_record(record_path)?;
            Ok(pipeline.predict_record(&record)?)
        });

    match result {
        Ok(prediction) => {
            println!("{}", serde_json::to_string(&PredictResponse::from(prediction))?);
            Ok(())
        }
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
