//! CART classification tree with Gini impurity.
//!
//! Nodes live in a flat arena; the root is node 0. A sample goes left when
//! its feature value is `<= threshold`.

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// A tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        class: usize,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        samples: usize,
    },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Non-constant features examined per split.
    pub max_features: usize,
}

/// A fitted decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

/// Training matrix: feature rows plus encoded class labels.
#[derive(Debug, Clone, Copy)]
pub struct TrainingSet<'a> {
    pub x: &'a [Vec<f64>],
    pub y: &'a [usize],
    pub n_classes: usize,
}

impl TrainingSet<'_> {
    pub fn n_features(&self) -> usize {
        self.x.first().map_or(0, Vec::len)
    }
}

impl DecisionTree {
    /// Grow a tree on `sample` (row indices, duplicates allowed).
    ///
    /// Returns the tree and its impurity decrease per feature, normalized to
    /// sum to 1 (all zeros when the tree never split).
    pub fn fit(
        data: TrainingSet<'_>,
        sample: Vec<usize>,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> (Self, Vec<f64>) {
        let mut builder = Builder {
            data,
            params,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; data.n_features()],
        };
        builder.grow(sample, 0);

        let mut importances = builder.importances;
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        (Self { nodes: builder.nodes }, importances)
    }

    /// Class index predicted for one feature row.
    pub fn predict_row(&self, row: &[f64]) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { class, .. } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
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

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

/// Gini impurity of a class histogram.
pub fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Most common class; ties go to the lowest index.
pub fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

struct Candidate {
    feature: usize,
    threshold: f64,
    /// Weighted impurity decrease, in sample units.
    gain: f64,
}

struct Builder<'a, 'r> {
    data: TrainingSet<'a>,
    params: TreeParams,
    rng: &'r mut StdRng,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl Builder<'_, '_> {
    fn class_counts(&self, sample: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.data.n_classes];
        for &i in sample {
            counts[self.data.y[i]] += 1;
        }
        counts
    }

    fn grow(&mut self, sample: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&sample);
        let n = sample.len();
        let idx = self.nodes.len();
        let leaf = Node::Leaf {
            class: majority(&counts),
            samples: n,
        };

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let too_deep = self.params.max_depth.is_some_and(|d| depth >= d);
        if pure || too_deep || n < self.params.min_samples_split {
            self.nodes.push(leaf);
            return idx;
        }

        let Some(best) = self.best_split(&sample, &counts) else {
            self.nodes.push(leaf);
            return idx;
        };

        self.importances[best.feature] += best.gain;
        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| self.data.x[i][best.feature] <= best.threshold);

        // placeholder, patched once both children exist
        self.nodes.push(leaf);
        let left_idx = self.grow(left, depth + 1);
        let right_idx = self.grow(right, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: left_idx,
            right: right_idx,
            samples: n,
        };
        idx
    }

    /// Best split over random features until `max_features` non-constant
    /// ones have been examined.
    fn best_split(&mut self, sample: &[usize], counts: &[usize]) -> Option<Candidate> {
        let n = sample.len();
        let parent = gini(counts, n) * n as f64;

        let mut features: Vec<usize> = (0..self.data.n_features()).collect();
        features.shuffle(&mut *self.rng);

        let mut best: Option<Candidate> = None;
        let mut examined = 0;
        let mut values: Vec<(f64, usize)> = Vec::with_capacity(n);
        for feature in features {
            if examined >= self.params.max_features {
                break;
            }
            values.clear();
            values.extend(sample.iter().map(|&i| (self.data.x[i][feature], self.data.y[i])));
            values.sort_by(|a, b| a.0.total_cmp(&b.0));
            if values[0].0 == values[n - 1].0 {
                continue;
            }
            examined += 1;

            let mut left = vec![0usize; self.data.n_classes];
            let mut right = counts.to_vec();
            for pos in 0..n - 1 {
                let (value, class) = values[pos];
                left[class] += 1;
                right[class] -= 1;
                let next = values[pos + 1].0;
                if value == next {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = n - n_left;
                let child = gini(&left, n_left) * n_left as f64 + gini(&right, n_right) * n_right as f64;
                let gain = parent - child;
                if best.as_ref().is_none_or(|b| gain > b.gain + 1e-12) {
                    let mut threshold = value + (next - value) / 2.0;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(Candidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best.map(|b| Candidate {
            gain: b.gain.max(0.0),
            ..b
        })
    }
}

/// Bootstrap sample of `n` row indices drawn with replacement.
pub fn bootstrap(n: usize, rng: &mut StdRng) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}
