use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use hotel_classifiers::config::ModelConfig;
use hotel_classifiers::data_handling::{LEAKAGE_COLUMNS, TARGET_COLUMN};
use hotel_classifiers::grid_search::ParamGrid;
use hotel_classifiers::pipeline::DEFAULT_ARTIFACT_FILE;

use crate::util::validate_csv_file;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub train_data: String,
    pub output_file: String,
    pub target_column: String,
    /// Columns removed before training because they leak the outcome.
    pub drop_columns: Vec<String>,
    pub test_fraction: f64,
    /// Seed for the train/test split. The model carries its own seed.
    pub seed: u64,
    pub model: ModelConfig,
    pub grid: ParamGrid,
    pub cv: usize,
    pub skip_grid_search: bool,
    pub report: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            train_data: String::from("hotel_bookings.csv"),
            output_file: String::from(DEFAULT_ARTIFACT_FILE),
            target_column: String::from(TARGET_COLUMN),
            drop_columns: LEAKAGE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            test_fraction: 0.2,
            seed: 42,
            model: ModelConfig::default(),
            grid: ParamGrid::default(),
            cv: 5,
            skip_grid_search: false,
            report: true,
        }
    }
}

impl TrainConfig {
    pub fn load(config_path: &PathBuf) -> Result<Self> {
        let config_json = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
        serde_json::from_str(&config_json)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))
    }

    /// Load the optional config file and apply CLI overrides on top.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => TrainConfig::load(path)?,
            None => TrainConfig::default(),
        };

        if let Some(train_data) = matches.get_one::<String>("train_data") {
            config.train_data = train_data.clone();
        }
        if let Some(output_file) = matches.get_one::<String>("output_file") {
            config.output_file = output_file.clone();
        }
        if matches.get_flag("skip_grid_search") {
            config.skip_grid_search = true;
        }
        if matches.get_flag("no_report") {
            config.report = false;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_csv_file(&self.train_data)?;
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            anyhow::bail!(
                "test_fraction must be between 0 and 1, got {}",
                self.test_fraction
            );
        }
        if !self.skip_grid_search {
            if self.cv < 2 {
                anyhow::bail!("cv must be at least 2, got {}", self.cv);
            }
            if self.grid.is_empty() {
                anyhow::bail!("grid has an empty axis");
            }
        }
        if self.output_file.trim().is_empty() {
            anyhow::bail!("output_file must not be empty");
        }
        Ok(())
    }
}
