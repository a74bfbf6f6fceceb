// tests/session_tests.rs

use std::sync::Arc;

use adaptive_quiz::{
    classifier::FixedClassifier,
    config::Config,
    models::question::{QuestionRecord, Subject},
    quiz::QuestionBank,
    routes,
    state::AppState,
};
use serde_json::{Value, json};

const RIGHT: &str = "right";
const WRONG: &str = "wrong";

/// Mathematics questions whose answer is always `RIGHT`; no Science questions.
fn math_only_bank() -> QuestionBank {
    let records = (1..=5).map(|i| {
        QuestionRecord::new(
            format!("Math question {}", i),
            vec![WRONG.to_string(), RIGHT.to_string()],
            RIGHT.to_string(),
            Subject::Mathematics,
        )
        .expect("valid record")
    });
    QuestionBank::from_records(records)
}

async fn spawn_app() -> String {
    let config = Config {
        port: 0,
        model_path: String::new(),
        math_dataset_path: String::new(),
        science_dataset_path: String::new(),
        session_idle_timeout: chrono::Duration::minutes(60),
        log_dir: "logs".to_string(),
        rust_log: "error".to_string(),
    };
    let state = AppState::new(
        &config,
        Arc::new(FixedClassifier(1)),
        Arc::new(math_only_bank()),
    );
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

struct Api {
    client: reqwest::Client,
    address: String,
}

impl Api {
    async fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            address: spawn_app().await,
        }
    }

    async fn post(&self, path: &str, body: Option<Value>) -> (u16, Value) {
        let mut req = self.client.post(format!("{}{}", self.address, path));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await.expect("request failed");
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn put(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .put(format!("{}{}", self.address, path))
            .json(&body)
            .send()
            .await
            .expect("request failed");
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self
            .client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("request failed");
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    /// Creates a Mathematics session and starts it with the given parameters.
    async fn started_session(&self, num_questions: u32, seconds: u32) -> String {
        let (status, view) = self
            .post("/api/sessions", Some(json!({ "subject": "Mathematics" })))
            .await;
        assert_eq!(status, 201);
        let id = view["id"].as_str().unwrap().to_string();

        let (status, _) = self
            .put(
                &format!("/api/sessions/{}/parameters", id),
                json!({ "num_questions": num_questions, "time_per_question_seconds": seconds }),
            )
            .await;
        assert_eq!(status, 200);

        let (status, view) = self.post(&format!("/api/sessions/{}/start", id), None).await;
        assert_eq!(status, 200);
        assert_eq!(view["phase"], "question_active");
        id
    }

    async fn answer(&self, id: &str, choice: &str) -> (u16, Value) {
        self.post(
            &format!("/api/sessions/{}/answer", id),
            Some(json!({ "choice": choice })),
        )
        .await
    }
}

#[tokio::test]
async fn full_quiz_flow_scores_and_streaks() {
    let api = Api::new().await;

    // Home -> parameter setup
    let (status, view) = api.post("/api/sessions", Some(json!({}))).await;
    assert_eq!(status, 201);
    assert_eq!(view["phase"], "home");
    let id = view["id"].as_str().unwrap().to_string();

    let (status, view) = api
        .post(
            &format!("/api/sessions/{}/subject", id),
            Some(json!({ "subject": "Mathematics" })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(view["phase"], "parameter_setup");
    assert_eq!(view["suggested_parameters"]["num_questions"], 10);
    assert_eq!(view["suggested_parameters"]["time_per_question_seconds"], 30);

    api.put(
        &format!("/api/sessions/{}/parameters", id),
        json!({ "num_questions": 3, "time_per_question_seconds": 30 }),
    )
    .await;

    let (_, view) = api.post(&format!("/api/sessions/{}/start", id), None).await;
    assert_eq!(view["quiz_started"], true);
    assert_eq!(view["question_number"], 1);
    assert!(view["question"]["options"].is_array());
    assert!(view["question"].get("answer").is_none());
    assert!(view["time_left"].as_u64().unwrap() <= 30);

    let mut last = Value::Null;
    for choice in [RIGHT, WRONG, RIGHT] {
        let (status, view) = api.answer(&id, choice).await;
        assert_eq!(status, 200);
        assert_eq!(view["phase"], "question_locked");
        assert_eq!(view["feedback"]["correct_answer"], RIGHT);

        let (status, view) = api.post(&format!("/api/sessions/{}/next", id), None).await;
        assert_eq!(status, 200);
        last = view;
    }

    assert_eq!(last["phase"], "results");
    assert_eq!(last["score"], 2);
    assert_eq!(last["total_attempts"], 3);
    assert_eq!(last["streak"], 1);
    assert_eq!(last["results"]["score"], 2);
    assert_eq!(last["results"]["num_questions"], 3);
}

#[tokio::test]
async fn double_submit_does_not_change_score() {
    let api = Api::new().await;
    let id = api.started_session(2, 30).await;

    let (_, first) = api.answer(&id, RIGHT).await;
    assert_eq!(first["feedback"]["outcome"], "correct");

    let (status, second) = api.answer(&id, RIGHT).await;
    assert_eq!(status, 200);
    assert_eq!(second["score"], 1);
    assert_eq!(second["total_attempts"], 1);
    assert_eq!(second["streak"], 1);
    assert_eq!(second["questions_asked"], 1);
}

#[tokio::test]
async fn retry_resets_counters_and_keeps_parameters() {
    let api = Api::new().await;
    let id = api.started_session(1, 45).await;

    api.answer(&id, RIGHT).await;
    let (_, view) = api.post(&format!("/api/sessions/{}/next", id), None).await;
    assert_eq!(view["phase"], "results");

    let (status, view) = api.post(&format!("/api/sessions/{}/retry", id), None).await;
    assert_eq!(status, 200);
    assert_eq!(view["phase"], "question_active");
    assert_eq!(view["score"], 0);
    assert_eq!(view["total_attempts"], 0);
    assert_eq!(view["streak"], 0);
    assert_eq!(view["questions_asked"], 0);
    assert_eq!(view["completed"], false);
    assert_eq!(view["subject"], "Mathematics");
    assert_eq!(view["num_questions"], 1);
    assert_eq!(view["time_per_question_seconds"], 45);
}

#[tokio::test]
async fn recommendation_steps_up_on_later_attempts() {
    let api = Api::new().await;
    let id = api.started_session(1, 30).await;

    api.answer(&id, RIGHT).await;
    api.post(&format!("/api/sessions/{}/next", id), None).await;

    let (status, rec) = api
        .post(&format!("/api/sessions/{}/recommendation", id), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(rec["predicted"], "medium");
    assert_eq!(rec["difficulty"], "medium");
    assert_eq!(rec["performance"]["correct"], 1);
    assert_eq!(rec["performance"]["retries"], 0);

    api.post(&format!("/api/sessions/{}/retry", id), None).await;
    api.answer(&id, WRONG).await;
    api.post(&format!("/api/sessions/{}/next", id), None).await;

    let (_, rec) = api
        .post(&format!("/api/sessions/{}/recommendation", id), None)
        .await;
    assert_eq!(rec["difficulty"], "hard");
    assert_eq!(rec["performance"]["retries"], 1);
}

#[tokio::test]
async fn repeated_recommendation_on_one_results_page_is_stable() {
    let api = Api::new().await;
    let id = api.started_session(1, 30).await;
    api.answer(&id, RIGHT).await;
    api.post(&format!("/api/sessions/{}/next", id), None).await;

    let (_, history) = api.get(&format!("/api/sessions/{}/history", id)).await;
    assert_eq!(history, json!([]));

    for _ in 0..3 {
        let (status, rec) = api
            .post(&format!("/api/sessions/{}/recommendation", id), None)
            .await;
        assert_eq!(status, 200);
        assert_eq!(rec["difficulty"], "medium");
    }

    let (status, history) = api.get(&format!("/api/sessions/{}/history", id)).await;
    assert_eq!(status, 200);
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["subject"], "Mathematics");
    assert_eq!(entries[0]["correct"], 1);
    assert_eq!(entries[0]["retries"], 0);
    assert_eq!(entries[0]["difficulty"], "medium");
    assert!(entries[0]["avgTime"].is_number());
}

#[tokio::test]
async fn history_of_unknown_session_is_not_found() {
    let api = Api::new().await;
    let (status, body) = api
        .get("/api/sessions/00000000-0000-0000-0000-000000000000/history")
        .await;
    assert_eq!(status, 404);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn recommendation_requires_results_page() {
    let api = Api::new().await;
    let id = api.started_session(2, 30).await;

    let (status, body) = api
        .post(&format!("/api/sessions/{}/recommendation", id), None)
        .await;
    assert_eq!(status, 409);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn go_home_abandons_the_attempt() {
    let api = Api::new().await;
    let id = api.started_session(5, 30).await;
    api.answer(&id, RIGHT).await;

    let (status, view) = api.post(&format!("/api/sessions/{}/home", id), None).await;
    assert_eq!(status, 200);
    assert_eq!(view["phase"], "home");
    assert_eq!(view["subject"], Value::Null);
    assert_eq!(view["score"], 0);
    assert_eq!(view["quiz_started"], false);
}

#[tokio::test]
async fn empty_subject_pool_blocks_start() {
    let api = Api::new().await;
    let (_, view) = api
        .post("/api/sessions", Some(json!({ "subject": "Science" })))
        .await;
    let id = view["id"].as_str().unwrap().to_string();

    api.put(
        &format!("/api/sessions/{}/parameters", id),
        json!({ "num_questions": 5, "time_per_question_seconds": 10 }),
    )
    .await;

    let (status, body) = api.post(&format!("/api/sessions/{}/start", id), None).await;
    assert_eq!(status, 503);
    assert!(body["error"].as_str().unwrap().contains("Science"));

    let (_, view) = api.get(&format!("/api/sessions/{}", id)).await;
    assert_eq!(view["phase"], "parameter_setup");
}

#[tokio::test]
async fn invalid_input_and_transitions_are_rejected() {
    let api = Api::new().await;
    let (_, view) = api
        .post("/api/sessions", Some(json!({ "subject": "Mathematics" })))
        .await;
    let id = view["id"].as_str().unwrap().to_string();

    // Out-of-range parameters
    let (status, _) = api
        .put(
            &format!("/api/sessions/{}/parameters", id),
            json!({ "num_questions": 21, "time_per_question_seconds": 30 }),
        )
        .await;
    assert_eq!(status, 400);

    // Start before parameters
    let (status, _) = api.post(&format!("/api/sessions/{}/start", id), None).await;
    assert_eq!(status, 409);

    // Answer before the quiz started
    let (status, _) = api.answer(&id, RIGHT).await;
    assert_eq!(status, 409);

    // Choice that is not an option
    let started = api.started_session(2, 30).await;
    let (status, _) = api.answer(&started, "maybe").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn unknown_and_deleted_sessions_are_not_found() {
    let api = Api::new().await;

    let (status, _) = api
        .get("/api/sessions/00000000-0000-0000-0000-000000000000")
        .await;
    assert_eq!(status, 404);

    let id = api.started_session(1, 30).await;
    let resp = api
        .client
        .delete(format!("{}/api/sessions/{}", api.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let (status, _) = api.get(&format!("/api/sessions/{}", id)).await;
    assert_eq!(status, 404);
}
