//! Evaluation metrics for binary classification.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Fraction of predictions equal to the true label.
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "labels and predictions must have the same length"
    );
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(a, b)| a == b).count();
    correct as f64 / y_true.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn new(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut cm = ConfusionMatrix::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (0, 0) => cm.tn += 1,
                (0, _) => cm.fp += 1,
                (_, 0) => cm.fn_ += 1,
                _ => cm.tp += 1,
            }
        }
        cm
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassMetrics {
    fn from_counts(tp: usize, fp: usize, fn_: usize) -> Self {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        ClassMetrics {
            precision,
            recall,
            f1,
            support: tp + fn_,
        }
    }
}

/// Per-class precision, recall and F1, with macro and weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Index 0 is "not canceled", index 1 is "canceled".
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    pub fn new(y_true: &[u8], y_pred: &[u8]) -> Self {
        let cm = ConfusionMatrix::new(y_true, y_pred);
        let negative = ClassMetrics::from_counts(cm.tn, cm.fn_, cm.fp);
        let positive = ClassMetrics::from_counts(cm.tp, cm.fp, cm.fn_);
        let total = negative.support + positive.support;

        let classes = [negative, positive];
        ClassificationReport {
            classes,
            accuracy: accuracy(y_true, y_pred),
            macro_avg: weighted_average(&classes, [1.0, 1.0], total),
            weighted_avg: weighted_average(
                &classes,
                [negative.support as f64, positive.support as f64],
                total,
            ),
            confusion: cm,
        }
    }
}

fn weighted_average(
    classes: &[ClassMetrics; 2],
    weights: [f64; 2],
    support: usize,
) -> ClassMetrics {
    let w_sum = weights[0] + weights[1];
    let avg = |a: f64, b: f64| {
        if w_sum == 0.0 {
            0.0
        } else {
            (a * weights[0] + b * weights[1]) / w_sum
        }
    };
    let [c0, c1] = classes;
    ClassMetrics {
        precision: avg(c0.precision, c1.precision),
        recall: avg(c0.recall, c1.recall),
        f1: avg(c0.f1, c1.f1),
        support,
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = |f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics| {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )
        };
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        row(f, "0", &self.classes[0])?;
        row(f, "1", &self.classes[1])?;
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        row(f, "macro avg", &self.macro_avg)?;
        row(f, "weighted avg", &self.weighted_avg)
    }
}

/// Area under the ROC curve via the Mann-Whitney U statistic, with average
/// ranks for tied scores. `None` when only one class is present.
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> Option<f64> {
    assert_eq!(
        y_true.len(),
        scores.len(),
        "labels and scores must have the same length"
    );
    let n_pos = y_true.iter().filter(|&&y| y == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; tied block [start, end) shares the mean rank.
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let pos_in_block = order[start..end].iter().filter(|&&i| y_true[i] == 1).count();
        rank_sum_pos += avg_rank * pos_in_block as f64;
        start = end;
    }

    let n_pos_f = n_pos as f64;
    let u = rank_sum_pos - n_pos_f * (n_pos_f + 1.0) / 2.0;
    Some(u / (n_pos_f * n_neg as f64))
}

/// ROC curve points `(false positive rate, true positive rate)`, one per
/// distinct score threshold, starting at (0, 0).
pub fn roc_curve(y_true: &[u8], scores: &[f64]) -> Vec<(f64, f64)> {
    let n_pos = y_true.iter().filter(|&&y| y == 1).count();
    let n_neg = y_true.len() - n_pos;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points = vec![(0.0, 0.0)];
    let (mut tp, mut fp) = (0usize, 0usize);
    for (k, &i) in order.iter().enumerate() {
        if y_true[i] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_threshold = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_threshold {
            points.push((ratio(fp, n_neg), ratio(tp, n_pos)));
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_counts_matches() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn classification_report_per_class() {
        let y_true = [0, 0, 0, 1, 1];
        let y_pred = [0, 0, 1, 1, 0];
        let report = ClassificationReport::new(&y_true, &y_pred);

        assert_eq!(
            report.confusion,
            ConfusionMatrix {
                tn: 2,
                fp: 1,
                fn_: 1,
                tp: 1
            }
        );
        let neg = report.classes[0];
        assert!((neg.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((neg.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(neg.support, 3);

        let pos = report.classes[1];
        assert!((pos.precision - 0.5).abs() < 1e-12);
        assert!((pos.recall - 0.5).abs() < 1e-12);
        assert_eq!(pos.support, 2);

        assert!((report.macro_avg.f1 - (2.0 / 3.0 + 0.5) / 2.0).abs() < 1e-12);
        assert!((report.weighted_avg.recall - 0.6).abs() < 1e-12);
        assert!(report.to_string().contains("weighted avg"));
    }

    #[test]
    fn zero_division_yields_zero() {
        let report = ClassificationReport::new(&[0, 0], &[0, 0]);
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
    }

    #[test]
    fn roc_auc_perfect_and_inverted() {
        let y = [0, 0, 1, 1];
        assert_eq!(roc_auc(&y, &[0.1, 0.2, 0.8, 0.9]), Some(1.0));
        assert_eq!(roc_auc(&y, &[0.9, 0.8, 0.2, 0.1]), Some(0.0));
        assert_eq!(roc_auc(&y, &[0.5, 0.5, 0.5, 0.5]), Some(0.5));
        assert_eq!(roc_auc(&[1, 1], &[0.1, 0.2]), None);
    }

    #[test]
    fn roc_auc_with_partial_ties() {
        // Pairs (pos, neg): (0.5 vs 0.1) win, (0.5 vs 0.5) tie, (0.9 vs both) win.
        let auc = roc_auc(&[0, 0, 1, 1], &[0.1, 0.5, 0.5, 0.9]).unwrap();
        assert!((auc - 0.875).abs() < 1e-12);
    }

    #[test]
    fn roc_curve_endpoints() {
        let points = roc_curve(&[0, 1, 0, 1], &[0.2, 0.9, 0.4, 0.6]);
        assert_eq!(points.first(), Some(&(0.0, 0.0)));
        assert_eq!(points.last(), Some(&(1.0, 1.0)));
    }
}
