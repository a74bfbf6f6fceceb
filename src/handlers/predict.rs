// src/handlers/predict.rs

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    classifier::{self, Classifier},
    error::AppError,
    models::prediction::{PredictionRequest, PredictionResponse},
    utils::extract::JsonBody,
};

/// Plain-text banner on `GET /`.
pub async fn banner() -> &'static str {
    "This is the adaptive model API!"
}

/// Classifies the learner's next difficulty from recent performance.
///
/// One synchronous inference per call; nothing is cached or stored.
pub async fn predict_difficulty(
    State(model): State<Arc<dyn Classifier>>,
    JsonBody(req): JsonBody<PredictionRequest>,
) -> Result<Json<PredictionResponse>, AppError> {
    let difficulty = classifier::predict(model.as_ref(), &req)?;

    tracing::debug!(
        correct = req.correct,
        avg_time = req.avg_time,
        retries = req.retries,
        %difficulty,
        "Difficulty predicted"
    );

    Ok(Json(PredictionResponse { difficulty }))
}
