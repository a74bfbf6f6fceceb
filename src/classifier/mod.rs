// src/classifier/mod.rs

pub mod ensemble;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::prediction::PredictionRequest};

pub use ensemble::TreeEnsemble;

/// Number of classes the label table covers.
pub const NUM_CLASSES: usize = 3;

/// Number of input features: correct, avgTime, retries.
pub const NUM_FEATURES: usize = 3;

/// Difficulty recommended for the learner's next questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLabel {
    Easy,
    Medium,
    Hard,
}

impl DifficultyLabel {
    /// Fixed mapping from the classifier's class index.
    /// Codes outside `{0, 1, 2}` are a classifier defect.
    pub fn from_code(code: usize) -> Result<Self, AppError> {
        match code {
            0 => Ok(DifficultyLabel::Easy),
            1 => Ok(DifficultyLabel::Medium),
            2 => Ok(DifficultyLabel::Hard),
            other => Err(AppError::InternalServerError(format!(
                "classifier produced out-of-range class code {}",
                other
            ))),
        }
    }

    /// Next harder level, saturating at `Hard`.
    pub fn step_up(self) -> Self {
        match self {
            DifficultyLabel::Easy => DifficultyLabel::Medium,
            DifficultyLabel::Medium | DifficultyLabel::Hard => DifficultyLabel::Hard,
        }
    }
}

impl fmt::Display for DifficultyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLabel::Easy => write!(f, "easy"),
            DifficultyLabel::Medium => write!(f, "medium"),
            DifficultyLabel::Hard => write!(f, "hard"),
        }
    }
}

/// A pre-trained model returning its most likely class index for a feature vector.
///
/// Implementations are loaded once and shared read-only across requests.
pub trait Classifier: Send + Sync {
    fn predict_class(&self, features: &[f64; NUM_FEATURES]) -> usize;
}

/// A classifier that always answers with the same class code.
/// Handy for wiring tests and local smoke runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier(pub usize);

impl Classifier for FixedClassifier {
    fn predict_class(&self, _features: &[f64; NUM_FEATURES]) -> usize {
        self.0
    }
}

/// Runs one inference and maps the class code through the label table.
pub fn predict(
    classifier: &dyn Classifier,
    req: &PredictionRequest,
) -> Result<DifficultyLabel, AppError> {
    let code = classifier.predict_class(&req.features());
    DifficultyLabel::from_code(code).inspect_err(|_| {
        tracing::error!(
            code,
            correct = req.correct,
            avg_time = req.avg_time,
            retries = req.retries,
            "Classifier defect: class code outside the label table"
        );
    })
}
