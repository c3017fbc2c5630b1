use std::path::PathBuf;

use anyhow::{Context, Result};

use hotel_classifiers::config::{ForestParams, ModelConfig};
use hotel_classifiers::data_handling::{read_bookings_csv, stratified_split, RawTable};
use hotel_classifiers::grid_search::GridSearch;
use hotel_classifiers::pipeline::Evaluation;
use hotel_classifiers::report::{ModelEvaluation, TrainingReport};
use hotel_classifiers::TrainedPipeline;

use crate::training::input::TrainConfig;
use crate::util::report_path;

/// What a finished training run produced.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub artifact: PathBuf,
    pub report: Option<PathBuf>,
    pub baseline_accuracy: f64,
    pub final_params: ForestParams,
    pub final_accuracy: f64,
}

fn log_evaluation(label: &str, evaluation: &Evaluation) {
    let auc = evaluation
        .roc_auc
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "n/a".to_string());
    log::info!(
        "{}: accuracy {:.4}, ROC AUC {}",
        label,
        evaluation.report.accuracy,
        auc
    );
    println!("{} classification report:\n{}", label, evaluation.report);
}

pub fn run_training(config: &TrainConfig) -> Result<TrainingSummary> {
    config.validate()?;

    let mut table = read_bookings_csv(&config.train_data)
        .with_context(|| format!("Failed to load training data: {}", config.train_data))?;
    table.log_input_data_summary();

    let drop: Vec<&str> = config.drop_columns.iter().map(String::as_str).collect();
    table.drop_columns(&drop);

    let (features, labels) = table
        .split_target(&config.target_column)
        .context("Failed to extract target column")?;
    let n_positive = labels.iter().filter(|&&y| y == 1).count();
    log::info!(
        "Target '{}': {} positive / {} negative",
        config.target_column,
        n_positive,
        labels.len() - n_positive
    );

    let (train_idx, test_idx) = stratified_split(&labels, config.test_fraction, config.seed)
        .context("Failed to split training data")?;
    let train = features.select_rows(&train_idx);
    let test = features.select_rows(&test_idx);
    let y_train: Vec<u8> = train_idx.iter().map(|&i| labels[i]).collect();
    let y_test: Vec<u8> = test_idx.iter().map(|&i| labels[i]).collect();
    log::info!(
        "Split {} rows into {} train / {} test",
        labels.len(),
        train.nrows(),
        test.nrows()
    );

    let baseline = fit(&train, &y_train, config, &config.model)?;
    let baseline_eval = baseline.evaluate(&test, &y_test)?;
    log_evaluation("Baseline", &baseline_eval);
    let baseline_params = config.model.model_type.params();

    let (final_pipeline, final_eval, grid_result) = if config.skip_grid_search {
        log::info!("Grid search skipped; persisting the baseline model");
        (baseline, baseline_eval.clone(), None)
    } else {
        let search = GridSearch::new(config.grid.clone(), config.cv, config.model.clone());
        let result = search.run(&train, &y_train).context("Grid search failed")?;
        log::info!(
            "Best parameters: {} (mean CV accuracy {:.4})",
            result.best_params,
            result.best_score
        );

        let tuned_config = config.model.with_params(result.best_params);
        let tuned = fit(&train, &y_train, config, &tuned_config)?;
        let tuned_eval = tuned.evaluate(&test, &y_test)?;
        log_evaluation("Tuned", &tuned_eval);
        (tuned, tuned_eval, Some(result))
    };

    let artifact = PathBuf::from(&config.output_file);
    final_pipeline
        .save(&artifact)
        .with_context(|| format!("Failed to save model artifact: {:?}", artifact))?;

    let report = if config.report {
        let path = report_path(&artifact);
        let tuned = grid_result.as_ref().map(|result| ModelEvaluation {
            label: "Tuned model".to_string(),
            params: result.best_params,
            evaluation: final_eval.clone(),
        });
        TrainingReport {
            title: "Hotel booking cancellation model".to_string(),
            data_file: config.train_data.clone(),
            artifact_file: config.output_file.clone(),
            n_train: train.nrows(),
            n_test: test.nrows(),
            n_features: final_pipeline.preprocessor.n_features(),
            baseline: ModelEvaluation {
                label: "Baseline model".to_string(),
                params: baseline_params,
                evaluation: baseline_eval.clone(),
            },
            tuned,
            grid_search: grid_result,
        }
        .save(&path)?;
        Some(path)
    } else {
        None
    };

    Ok(TrainingSummary {
        artifact,
        report,
        baseline_accuracy: baseline_eval.report.accuracy,
        final_params: final_pipeline.model_config.model_type.params(),
        final_accuracy: final_eval.report.accuracy,
    })
}

fn fit(
    table: &RawTable,
    labels: &[u8],
    config: &TrainConfig,
    model: &ModelConfig,
) -> Result<TrainedPipeline> {
    TrainedPipeline::fit(
        table,
        labels,
        model,
        &config.target_column,
        &config.drop_columns,
    )
    .with_context(|| format!("Failed to fit {}", model.model_type.params()))
}
