//! Random forest classifier
//!
//! CART trees grown on bootstrap samples with Gini impurity, a random subset
//! of features tried at each split, and "balanced" class weights so that each
//! class contributes equally to the training loss regardless of its size.
//! Training is sequential; one seed fixes every tree.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

const EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Features tried per split; `None` means floor(sqrt(n_features))
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 300,
            max_depth: 6,
            min_samples_split: 2,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        proba: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted tree stored as a flat node arena; children always follow
/// their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba } => return proba,
                Node::Split { feature, threshold, left, right } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Structural check for trees loaded from disk
    fn is_well_formed(&self, n_features: usize, n_classes: usize) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(idx, node)| match node {
                Node::Leaf { proba } => proba.len() == n_classes,
                Node::Split { feature, threshold, left, right } => {
                    *feature < n_features
                        && threshold.is_finite()
                        && *left > idx
                        && *right > idx
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                }
            })
    }
}

/// Balanced class weights: n_samples / (n_present_classes * class_count).
/// Classes absent from `y` get weight 0.
pub fn balanced_class_weights(y: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0usize; n_classes];
    for &label in y {
        counts[label] += 1;
    }
    let present = counts.iter().filter(|c| **c > 0).count().max(1);
    counts
        .iter()
        .map(|&c| {
            if c == 0 {
                0.0
            } else {
                y.len() as f64 / (present as f64 * c as f64)
            }
        })
        .collect()
}

fn gini(dist: &[f64], total: f64) -> f64 {
    if total <= EPSILON {
        return 0.0;
    }
    1.0 - dist.iter().map(|w| (w / total).powi(2)).sum::<f64>()
}

struct Split {
    feature: usize,
    threshold: f64,
    improvement: f64,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    max_depth: usize,
    min_samples_split: usize,
    max_features: usize,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl<'a> TreeBuilder<'a> {
    fn class_distribution(&self, samples: &[(usize, f64)]) -> Vec<f64> {
        let mut dist = vec![0.0; self.n_classes];
        for &(i, w) in samples {
            dist[self.y[i]] += w;
        }
        dist
    }

    fn grow(&mut self, samples: Vec<(usize, f64)>, depth: usize, rng: &mut StdRng) -> usize {
        let dist = self.class_distribution(&samples);
        let total: f64 = dist.iter().sum();
        let impurity = gini(&dist, total);

        let proba = if total > EPSILON {
            dist.iter().map(|w| w / total).collect()
        } else {
            vec![1.0 / self.n_classes as f64; self.n_classes]
        };
        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf { proba });

        if depth >= self.max_depth || samples.len() < self.min_samples_split || impurity <= EPSILON {
            return node_id;
        }
        let Some(split) = self.best_split(&samples, &dist, total, impurity, rng) else {
            return node_id;
        };

        self.importances[split.feature] += split.improvement;
        let (left, right): (Vec<(usize, f64)>, Vec<(usize, f64)>) = samples
            .into_iter()
            .partition(|(i, _)| self.x[*i][split.feature] <= split.threshold);

        let left = self.grow(left, depth + 1, rng);
        let right = self.grow(right, depth + 1, rng);
        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    /// Best Gini split over a random feature subset. Constant features do not
    /// count toward `max_features`, so the search keeps drawing until enough
    /// usable features were tried or none are left.
    fn best_split(
        &self,
        samples: &[(usize, f64)],
        parent: &[f64],
        total: f64,
        impurity: f64,
        rng: &mut StdRng,
    ) -> Option<Split> {
        let n_features = self.x[samples[0].0].len();
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);

        let mut best: Option<Split> = None;
        let mut tried = 0;
        for feature in features {
            if tried >= self.max_features {
                break;
            }
            let mut order = samples.to_vec();
            order.sort_by(|a, b| self.x[a.0][feature].total_cmp(&self.x[b.0][feature]));

            let lowest = self.x[order[0].0][feature];
            let highest = self.x[order[order.len() - 1].0][feature];
            if highest <= lowest {
                continue;
            }
            tried += 1;

            let mut left = vec![0.0; self.n_classes];
            let mut left_total = 0.0;
            for k in 0..order.len() - 1 {
                let (i, w) = order[k];
                left[self.y[i]] += w;
                left_total += w;

                let value = self.x[i][feature];
                let next = self.x[order[k + 1].0][feature];
                if next <= value {
                    continue;
                }

                let right: Vec<f64> = parent.iter().zip(&left).map(|(p, l)| (p - l).max(0.0)).collect();
                let right_total = (total - left_total).max(0.0);
                let improvement =
                    total * impurity - left_total * gini(&left, left_total) - right_total * gini(&right, right_total);

                if best.as_ref().map_or(true, |b| improvement > b.improvement) {
                    let mut threshold = value + (next - value) / 2.0;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(Split { feature, threshold, improvement });
                }
            }
        }
        best
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    /// Fit on a dense feature matrix and class ids in `0..n_classes`
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize, params: ForestParams) -> Result<Self> {
        if x.is_empty() || x.len() != y.len() || n_classes == 0 {
            return Err(PipelineError::EmptyDataset);
        }
        let n = x.len();
        let n_features = x[0].len();
        let max_features = params
            .max_features
            .unwrap_or_else(|| ((n_features as f64).sqrt() as usize).max(1))
            .clamp(1, n_features.max(1));
        let class_weights = balanced_class_weights(y, n_classes);

        let mut master = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);
        let mut importances = vec![0.0; n_features];

        for _ in 0..params.n_trees {
            let mut rng = StdRng::seed_from_u64(master.gen());

            let mut counts = vec![0usize; n];
            for _ in 0..n {
                counts[rng.gen_range(0..n)] += 1;
            }
            let samples: Vec<(usize, f64)> = counts
                .iter()
                .enumerate()
                .filter(|(_, c)| **c > 0)
                .map(|(i, c)| (i, *c as f64 * class_weights[y[i]]))
                .collect();

            let mut builder = TreeBuilder {
                x,
                y,
                n_classes,
                max_depth: params.max_depth,
                min_samples_split: params.min_samples_split.max(2),
                max_features,
                nodes: Vec::new(),
                importances: vec![0.0; n_features],
            };
            builder.grow(samples, 0, &mut rng);

            let tree_total: f64 = builder.importances.iter().sum();
            if tree_total > EPSILON {
                for (acc, imp) in importances.iter_mut().zip(&builder.importances) {
                    *acc += imp / tree_total;
                }
            }
            trees.push(DecisionTree { nodes: builder.nodes });
        }

        let total: f64 = importances.iter().sum();
        if total > EPSILON {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        Ok(Self {
            params,
            n_features,
            n_classes,
            trees,
            feature_importances: importances,
        })
    }

    /// Mean class probabilities across trees
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(row)) {
                *acc += p;
            }
        }
        let n = self.trees.len().max(1) as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        proba
    }

    /// Most probable class id; ties go to the lower id
    pub fn predict(&self, row: &[f64]) -> usize {
        let proba = self.predict_proba(row);
        let mut best = 0;
        for (idx, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = idx;
            }
        }
        best
    }

    /// Mean decrease in impurity per feature, summing to 1
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_well_formed(&self) -> bool {
        !self.trees.is_empty()
            && self.feature_importances.len() == self.n_features
            && self.trees.iter().all(|t| t.is_well_formed(self.n_features, self.n_classes))
    }
}
