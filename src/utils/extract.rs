// src/utils/extract.rs

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A wrapper around `axum::Json<T>` that rejects with `AppError::InvalidRequest`
/// instead of axum's default plain-text 415/422 responses.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(rejection_to_app_error(rejection)),
        }
    }
}

fn rejection_to_app_error(rejection: JsonRejection) -> AppError {
    let message = rejection.body_text();
    match &rejection {
        JsonRejection::JsonDataError(_) => {
            tracing::warn!(error = %message, "JSON body has missing or mistyped fields");
        }
        JsonRejection::JsonSyntaxError(_) => {
            tracing::warn!(error = %message, "JSON body is not valid JSON");
        }
        JsonRejection::MissingJsonContentType(_) => {
            tracing::warn!(error = %message, "Missing or invalid JSON Content-Type");
        }
        _ => {
            tracing::warn!(error = %message, "Unexpected JSON body rejection");
        }
    }
    AppError::InvalidRequest(message)
}
