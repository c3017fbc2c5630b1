use std::path::Path;

use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::config::ForestParams;
use crate::grid_search::GridSearchResult;
use crate::pipeline::Evaluation;
use crate::report::plots::{plot_grid_scores, plot_roc_curve};
use crate::stats::ClassMetrics;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Held-out evaluation of one fitted configuration.
#[derive(Debug, Clone)]
pub struct ModelEvaluation {
    pub label: String,
    pub params: ForestParams,
    pub evaluation: Evaluation,
}

/// Everything the training command knows about a run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub title: String,
    pub data_file: String,
    pub artifact_file: String,
    pub n_train: usize,
    pub n_test: usize,
    pub n_features: usize,
    pub baseline: ModelEvaluation,
    pub tuned: Option<ModelEvaluation>,
    pub grid_search: Option<GridSearchResult>,
}

fn metrics_row(name: &str, m: &ClassMetrics) -> Markup {
    html! {
        tr {
            td { (name) }
            td { (format!("{:.4}", m.precision)) }
            td { (format!("{:.4}", m.recall)) }
            td { (format!("{:.4}", m.f1)) }
            td { (m.support) }
        }
    }
}

fn evaluation_section(model: &ModelEvaluation, div_id: &str) -> Markup {
    let eval = &model.evaluation;
    let report = &eval.report;
    let cm = &report.confusion;
    let auc = eval
        .roc_auc
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "n/a".to_string());
    let roc = plot_roc_curve(&eval.roc_curve, eval.roc_auc, &format!("{} ROC", model.label));

    html! {
        section {
            h2 { (model.label) }
            p { "Parameters: " code { (model.params.to_string()) } }
            p {
                "Accuracy: " strong { (format!("{:.4}", report.accuracy)) }
                " | ROC AUC: " strong { (auc) }
            }
            table {
                thead { tr { th { "class" } th { "precision" } th { "recall" } th { "f1-score" } th { "support" } } }
                tbody {
                    (metrics_row("0 (not canceled)", &report.classes[0]))
                    (metrics_row("1 (canceled)", &report.classes[1]))
                    (metrics_row("macro avg", &report.macro_avg))
                    (metrics_row("weighted avg", &report.weighted_avg))
                }
            }
            h3 { "Confusion matrix" }
            table {
                thead { tr { th {} th { "predicted 0" } th { "predicted 1" } } }
                tbody {
                    tr { th { "actual 0" } td { (cm.tn) } td { (cm.fp) } }
                    tr { th { "actual 1" } td { (cm.fn_) } td { (cm.tp) } }
                }
            }
            (PreEscaped(roc.to_inline_html(Some(div_id))))
        }
    }
}

fn grid_section(result: &GridSearchResult) -> Markup {
    let mut ranked: Vec<_> = result.candidates.iter().collect();
    ranked.sort_by(|a, b| b.mean_score.total_cmp(&a.mean_score));
    let plot = plot_grid_scores(result, "Grid search: mean cross-validation accuracy");

    html! {
        section {
            h2 { "Grid search" }
            p {
                "Best parameters: " code { (result.best_params.to_string()) }
                " (mean CV accuracy " (format!("{:.4}", result.best_score)) ")"
            }
            table {
                thead { tr { th { "rank" } th { "parameters" } th { "mean" } th { "std" } th { "folds" } } }
                tbody {
                    @for (rank, c) in ranked.iter().enumerate() {
                        tr {
                            td { (rank + 1) }
                            td { (c.params.to_string()) }
                            td { (format!("{:.4}", c.mean_score)) }
                            td { (format!("{:.4}", c.std_score)) }
                            td {
                                (c.fold_scores.iter().map(|s| format!("{:.4}", s)).collect::<Vec<_>>().join(", "))
                            }
                        }
                    }
                }
            }
            (PreEscaped(plot.to_inline_html(Some("grid-scores"))))
        }
    }
}

impl TrainingReport {
    pub fn render(&self) -> Markup {
        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style {
                        "body { font-family: sans-serif; margin: 2em; } \
                         table { border-collapse: collapse; margin-bottom: 1em; } \
                         th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: right; }"
                    }
                }
                body {
                    h1 { (self.title) }
                    ul {
                        li { "Training data: " code { (self.data_file) } }
                        li { "Artifact: " code { (self.artifact_file) } }
                        li { "Rows: " (self.n_train) " train / " (self.n_test) " held out" }
                        li { "Encoded features: " (self.n_features) }
                        li { "Generated: " (generated) }
                    }
                    (evaluation_section(&self.baseline, "roc-baseline"))
                    @if let Some(grid) = &self.grid_search {
                        (grid_section(grid))
                    }
                    @if let Some(tuned) = &self.tuned {
                        (evaluation_section(tuned, "roc-tuned"))
                    }
                }
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.render().into_string())
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        log::info!("Wrote training report to {}", path.display());
        Ok(())
    }
}
