// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;

use adaptive_quiz::classifier::TreeEnsemble;
use adaptive_quiz::config::Config;
use adaptive_quiz::quiz::QuestionBank;
use adaptive_quiz::routes;
use adaptive_quiz::state::AppState;
use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // The model is read-only for the lifetime of the process; no model, no service.
    let model = match TreeEnsemble::load(&config.model_path) {
        Ok(model) => model,
        Err(e) => {
            tracing::error!("Failed to load difficulty model: {}", e);
            std::process::exit(1);
        }
    };

    let bank = match QuestionBank::load(&config) {
        Ok(bank) => bank,
        Err(e) => {
            tracing::error!("Failed to load question datasets: {}", e);
            std::process::exit(1);
        }
    };

    // Create AppState
    let state = AppState::new(&config, Arc::new(model), Arc::new(bank));

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}
