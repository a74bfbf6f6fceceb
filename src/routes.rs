// src/routes.rs

use axum::{
    Router,
    http::{Method, header},
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{predict, quiz},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Classifier endpoints (`/`, `/predict`) at the root.
/// * Quiz session endpoints under `/api`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    // Any origin may call the service; no credentials are involved.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let session_routes = Router::new()
        .route("/api/sessions", post(quiz::create_session))
        .route(
            "/api/sessions/{id}",
            get(quiz::get_session).delete(quiz::delete_session),
        )
        .route("/api/sessions/{id}/subject", post(quiz::select_subject))
        .route("/api/sessions/{id}/parameters", put(quiz::set_parameters))
        .route("/api/sessions/{id}/start", post(quiz::start_quiz))
        .route("/api/sessions/{id}/answer", post(quiz::submit_answer))
        .route("/api/sessions/{id}/next", post(quiz::next_question))
        .route("/api/sessions/{id}/retry", post(quiz::retry_quiz))
        .route("/api/sessions/{id}/home", post(quiz::go_home))
        .route(
            "/api/sessions/{id}/recommendation",
            post(quiz::recommend_difficulty),
        )
        .route("/api/sessions/{id}/history", get(quiz::get_history));

    Router::new()
        .route("/", get(predict::banner))
        .route("/predict", post(predict::predict_difficulty))
        .route("/api/subjects", get(quiz::list_subjects))
        .merge(session_routes)
        // Global Middleware (outermost first)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
