use plotly::common::{DashType, Line, Mode};
use plotly::layout::{Axis, Layout};
use plotly::{Bar, Plot, Scatter};

use crate::grid_search::GridSearchResult;

/// ROC curve of held-out predictions with the chance diagonal.
pub fn plot_roc_curve(points: &[(f64, f64)], auc: Option<f64>, title: &str) -> Plot {
    let (fpr, tpr): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
    let name = match auc {
        Some(auc) => format!("ROC (AUC = {:.4})", auc),
        None => "ROC".to_string(),
    };

    let curve = Scatter::new(fpr, tpr).mode(Mode::Lines).name(&name);
    let chance = Scatter::new(vec![0.0, 1.0], vec![0.0, 1.0])
        .mode(Mode::Lines)
        .name("Chance")
        .line(Line::new().color("grey").dash(DashType::Dash));

    let mut plot = Plot::new();
    plot.add_trace(curve);
    plot.add_trace(chance);
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("False positive rate"))
            .y_axis(Axis::new().title("True positive rate")),
    );
    plot
}

/// Mean cross-validation accuracy of every grid search candidate.
pub fn plot_grid_scores(result: &GridSearchResult, title: &str) -> Plot {
    let labels: Vec<String> = result
        .candidates
        .iter()
        .map(|c| c.params.to_string())
        .collect();
    let means: Vec<f64> = result.candidates.iter().map(|c| c.mean_score).collect();

    let mut plot = Plot::new();
    plot.add_trace(Bar::new(labels, means).name("Mean CV accuracy"));
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Candidate"))
            .y_axis(Axis::new().title("Accuracy")),
    );
    plot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roc_plot_has_curve_and_diagonal() {
        let plot = plot_roc_curve(&[(0.0, 0.0), (0.5, 1.0), (1.0, 1.0)], Some(0.75), "ROC");
        let json = plot.to_json();
        assert!(json.contains("AUC = 0.7500"));
        assert!(json.contains("Chance"));
    }
}
