//! CART decision tree with Gini impurity, used as the forest's base learner.
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Leaf {
        label: u8,
    },
    /// Rows with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Number of non-constant features to evaluate per node.
    pub max_features: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Pending {
    node: usize,
    depth: usize,
    samples: Vec<usize>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(pos: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    let p = pos / total;
    2.0 * p * (1.0 - p)
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `samples` (duplicates allowed, as
    /// produced by bootstrap sampling).
    pub fn fit(
        x: &Array2<f64>,
        y: &[u8],
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> DecisionTree {
        let mut nodes = vec![Node::Leaf { label: 0 }];
        let mut stack = vec![Pending {
            node: 0,
            depth: 0,
            samples,
        }];
        let mut features: Vec<usize> = (0..x.ncols()).collect();

        while let Some(Pending {
            node,
            depth,
            samples,
        }) = stack.pop()
        {
            let n = samples.len();
            let pos = samples.iter().filter(|&&i| y[i] == 1).count();
            let label = u8::from(2 * pos > n);

            let depth_reached = params.max_depth.map_or(false, |d| depth >= d);
            let pure = pos == 0 || pos == n;
            if depth_reached || pure || n < params.min_samples_split.max(2) {
                nodes[node] = Node::Leaf { label };
                continue;
            }

            features.shuffle(rng);
            let Some(best) = find_split(x, y, &samples, &features, params.max_features) else {
                nodes[node] = Node::Leaf { label };
                continue;
            };
            log::trace!(
                "depth {}: split feature {} at {:.4} (impurity {:.4})",
                depth,
                best.feature,
                best.threshold,
                best.impurity
            );

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .into_iter()
                .partition(|&i| x[[i, best.feature]] <= best.threshold);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { label });
            nodes.push(Node::Leaf { label });
            nodes[node] = Node::Split {
                feature: best.feature,
                threshold: best.threshold,
                left,
                right,
            };

            stack.push(Pending {
                node: right,
                depth: depth + 1,
                samples: right_samples,
            });
            stack.push(Pending {
                node: left,
                depth: depth + 1,
                samples: left_samples,
            });
        }

        DecisionTree { nodes }
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> u8 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { label } => return *label,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Node::Split { left, right, .. } = &self.nodes[idx] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        max_depth
    }
}

/// Visit features in the (already shuffled) order until `max_features`
/// non-constant ones have been evaluated, keeping the lowest weighted Gini.
fn find_split(
    x: &Array2<f64>,
    y: &[u8],
    samples: &[usize],
    features: &[usize],
    max_features: usize,
) -> Option<BestSplit> {
    let n = samples.len() as f64;
    let total_pos = samples.iter().filter(|&&i| y[i] == 1).count() as f64;
    let mut best: Option<BestSplit> = None;
    let mut visited = 0;
    let mut column: Vec<(f64, u8)> = Vec::with_capacity(samples.len());

    for &feature in features {
        if visited >= max_features {
            break;
        }

        column.clear();
        column.extend(samples.iter().map(|&i| (x[[i, feature]], y[i])));
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (first, last) = (column[0].0, column[column.len() - 1].0);
        if first == last {
            continue;
        }
        visited += 1;

        let mut left_pos = 0.0;
        for k in 0..column.len() - 1 {
            left_pos += f64::from(column[k].1);
            let (value, next) = (column[k].0, column[k + 1].0);
            if value == next {
                continue;
            }

            let n_left = (k + 1) as f64;
            let n_right = n - n_left;
            let impurity = (n_left * gini(left_pos, n_left)
                + n_right * gini(total_pos - left_pos, n_right))
                / n;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = (value + next) / 2.0;
                if threshold == next {
                    threshold = value;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            max_features: 2,
        }
    }

    #[test]
    fn learns_a_threshold() {
        let x = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let y = [0, 0, 1, 1];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::fit(&x, &y, (0..4).collect(), &params(), &mut rng);

        for (i, &label) in y.iter().enumerate() {
            assert_eq!(tree.predict_row(x.row(i)), label);
        }
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_nodes(), 3);
    }

    #[test]
    fn max_depth_zero_is_a_single_leaf() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = [1, 1, 0];
        let mut rng = StdRng::seed_from_u64(0);
        let p = TreeParams {
            max_depth: Some(0),
            ..params()
        };
        let tree = DecisionTree::fit(&x, &y, (0..3).collect(), &p, &mut rng);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_row(x.row(2)), 1);
    }

    #[test]
    fn constant_features_give_a_leaf() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = [0, 1, 1];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::fit(&x, &y, (0..3).collect(), &params(), &mut rng);
        assert_eq!(tree.n_nodes(), 1);
    }

    #[test]
    fn fits_xor_with_enough_depth() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = [0, 1, 1, 0];
        let mut rng = StdRng::seed_from_u64(3);
        let tree = DecisionTree::fit(&x, &y, (0..4).collect(), &params(), &mut rng);
        for (i, &label) in y.iter().enumerate() {
            assert_eq!(tree.predict_row(x.row(i)), label);
        }
    }
}
