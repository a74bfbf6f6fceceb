// src/models/prediction.rs

use serde::{Deserialize, Serialize};

use crate::{classifier::DifficultyLabel, models::question::Subject};

/// Body of `POST /predict`.
/// Only type coercion is applied: negative counts fail to deserialize.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct PredictionRequest {
    pub correct: u32,
    #[serde(rename = "avgTime")]
    pub avg_time: f64,
    pub retries: u32,
}

impl PredictionRequest {
    /// Feature vector in the order the model was trained on.
    pub fn features(&self) -> [f64; 3] {
        [self.correct as f64, self.avg_time, self.retries as f64]
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub difficulty: DifficultyLabel,
}

/// Returned by the session recommendation endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecommendationResponse {
    /// Difficulty to use for the next quiz on this subject.
    pub difficulty: DifficultyLabel,
    /// Raw classifier output for this attempt's performance.
    pub predicted: DifficultyLabel,
    pub performance: PredictionRequest,
}

/// One subject's entry in the session history.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SubjectHistory {
    pub subject: Subject,
    #[serde(flatten)]
    pub performance: PredictionRequest,
    pub difficulty: DifficultyLabel,
}
