// src/classifier/ensemble.rs

use std::path::Path;

use serde::Deserialize;

use super::{Classifier, NUM_CLASSES, NUM_FEATURES};
use crate::error::AppError;

/// One node of a regression tree, stored in a flat array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Samples with `x[feature] < threshold` go to `left`, all others to `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    /// Class whose score this tree contributes to.
    pub class: usize,
    pub nodes: Vec<Node>,
}

impl Tree {
    fn evaluate(&self, features: &[f64; NUM_FEATURES]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { leaf } => return *leaf,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

fn default_base_score() -> f64 {
    0.5
}

/// Gradient-boosted multi-class tree ensemble exported as JSON.
///
/// Each class accumulates `base_score` plus the leaf values its trees reach;
/// the predicted class is the arg-max (lowest index wins ties).
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    pub num_class: usize,
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    /// Reads and validates a model file. Called once at startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::InternalServerError(format!(
                "failed to read model {}: {}",
                path.display(),
                e
            ))
        })?;
        let model = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            trees = model.trees.len(),
            "Difficulty model loaded"
        );
        Ok(model)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let model: TreeEnsemble = serde_json::from_str(raw)
            .map_err(|e| AppError::InternalServerError(format!("invalid model json: {}", e)))?;
        model.validate()?;
        Ok(model)
    }

    /// Rejects models that could index out of bounds, loop, or emit a code
    /// outside the label table.
    fn validate(&self) -> Result<(), AppError> {
        let invalid = |msg: String| -> Result<(), AppError> {
            Err(AppError::InternalServerError(format!("invalid model: {}", msg)))
        };

        if self.num_class != NUM_CLASSES {
            return invalid(format!(
                "num_class is {}, expected {}",
                self.num_class, NUM_CLASSES
            ));
        }

        let mut trees_per_class = [0usize; NUM_CLASSES];
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.class >= NUM_CLASSES {
                return invalid(format!("tree {} targets class {}", t, tree.class));
            }
            if tree.nodes.is_empty() {
                return invalid(format!("tree {} has no nodes", t));
            }
            trees_per_class[tree.class] += 1;

            for (i, node) in tree.nodes.iter().enumerate() {
                if let Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } = node
                {
                    if *feature >= NUM_FEATURES {
                        return invalid(format!("tree {} node {} uses feature {}", t, i, feature));
                    }
                    if !threshold.is_finite() {
                        return invalid(format!("tree {} node {} has a non-finite threshold", t, i));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= tree.nodes.len() {
                            return invalid(format!(
                                "tree {} node {} points to invalid child {}",
                                t, i, child
                            ));
                        }
                    }
                }
            }
        }

        if let Some(class) = trees_per_class.iter().position(|&n| n == 0) {
            return invalid(format!("class {} has no trees", class));
        }

        Ok(())
    }
}

impl Classifier for TreeEnsemble {
    fn predict_class(&self, features: &[f64; NUM_FEATURES]) -> usize {
        let mut scores = vec![self.base_score; self.num_class];
        for tree in &self.trees {
            scores[tree.class] += tree.evaluate(features);
        }

        let mut best = 0;
        for (class, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = class;
            }
        }
        best
    }
}
