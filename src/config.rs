// src/config.rs

use std::env;

use chrono::Duration;
use dotenvy::dotenv;

/// Default number of questions offered on the parameter form.
pub const DEFAULT_NUM_QUESTIONS: u32 = 10;
/// Default seconds per question offered on the parameter form.
pub const DEFAULT_TIME_PER_QUESTION_SECONDS: u32 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub model_path: String,
    pub math_dataset_path: String,
    pub science_dataset_path: String,
    pub session_idle_timeout: Duration,
    pub log_dir: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let port = env::var("PORT")
            .ok()
            .map(|v| v.parse().expect("PORT must be a valid port number"))
            .unwrap_or(5001);

        let model_path = env::var("MODEL_PATH")
            .unwrap_or_else(|_| "model/difficulty_model.json".to_string());

        let math_dataset_path = env::var("MATH_DATASET_PATH")
            .unwrap_or_else(|_| "data/math_qa.jsonl".to_string());

        let science_dataset_path = env::var("SCIENCE_DATASET_PATH")
            .unwrap_or_else(|_| "data/arc_easy.jsonl".to_string());

        let session_idle_timeout = env::var("SESSION_IDLE_MINUTES")
            .ok()
            .map(|v| {
                parse_idle_minutes(&v)
                    .expect("SESSION_IDLE_MINUTES must be a positive number of minutes")
            })
            .unwrap_or_else(|| Duration::minutes(120));

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            port,
            model_path,
            math_dataset_path,
            science_dataset_path,
            session_idle_timeout,
            log_dir,
            rust_log,
        }
    }
}

/// `None` unless `value` is a positive minute count chrono can represent.
fn parse_idle_minutes(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|minutes| *minutes > 0)
        .and_then(Duration::try_minutes)
}
