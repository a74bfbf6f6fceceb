// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    classifier::Classifier,
    error::AppError,
    models::{
        prediction::SubjectHistory,
        question::{Subject, SubjectSummary},
        session::{
            CreateSessionRequest, QuizParameters, SelectSubjectRequest, SessionView,
            SubmitAnswerRequest,
        },
    },
    quiz::{QuestionSource, QuizSession, SessionStore},
    utils::extract::JsonBody,
};

/// Lists the subjects and how many questions each pool holds.
pub async fn list_subjects(
    State(questions): State<Arc<dyn QuestionSource>>,
) -> Json<Vec<SubjectSummary>> {
    let summaries = Subject::ALL
        .iter()
        .map(|&subject| SubjectSummary {
            subject,
            available_questions: questions.available(subject),
        })
        .collect();
    Json(summaries)
}

/// Creates a session on the home page, or directly on setup when a subject is given.
pub async fn create_session(
    State(store): State<SessionStore>,
    JsonBody(req): JsonBody<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let mut session = QuizSession::new();
    if let Some(subject) = req.subject {
        session.select_subject(subject)?;
    }

    let id = store.create(session, now).await;
    let view = store
        .update(id, now, |s| Ok(SessionView::build(id, s, now)))
        .await?;

    tracing::info!(%id, subject = ?req.subject, "Quiz session created");
    Ok((StatusCode::CREATED, Json(view)))
}

/// Returns the current view. Polling here drives the question timer.
pub async fn get_session(
    State(store): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let now = Utc::now();
    let view = store
        .update(id, now, |s| {
            s.tick(now);
            Ok(SessionView::build(id, s, now))
        })
        .await?;
    Ok(Json(view))
}

pub async fn delete_session(
    State(store): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    store.remove(id).await?;
    tracing::info!(%id, "Quiz session discarded");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn select_subject(
    State(store): State<SessionStore>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<SelectSubjectRequest>,
) -> Result<Json<SessionView>, AppError> {
    let now = Utc::now();
    let view = store
        .update(id, now, |s| {
            s.select_subject(req.subject)?;
            Ok(SessionView::build(id, s, now))
        })
        .await?;
    Ok(Json(view))
}

pub async fn set_parameters(
    State(store): State<SessionStore>,
    Path(id): Path<Uuid>,
    JsonBody(params): JsonBody<QuizParameters>,
) -> Result<Json<SessionView>, AppError> {
    let now = Utc::now();
    let view = store
        .update(id, now, |s| {
            s.set_parameters(params)?;
            Ok(SessionView::build(id, s, now))
        })
        .await?;
    Ok(Json(view))
}

/// Starts the quiz and draws the first question.
pub async fn start_quiz(
    State(store): State<SessionStore>,
    State(questions): State<Arc<dyn QuestionSource>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let now = Utc::now();
    let view = store
        .update(id, now, |s| {
            if let Err(e) = s.start(questions.as_ref(), now) {
                if matches!(e, AppError::NoQuestionsAvailable(_)) {
                    tracing::warn!(%id, subject = ?s.subject(), "Quiz start blocked: empty question pool");
                }
                return Err(e);
            }
            Ok(SessionView::build(id, s, now))
        })
        .await?;

    tracing::info!(%id, subject = ?view.subject, num_questions = ?view.num_questions, "Quiz started");
    Ok(Json(view))
}

/// Submits an answer for the current question.
///
/// Submitting to a locked question is ignored and returns the unchanged view.
pub async fn submit_answer(
    State(store): State<SessionStore>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<SubmitAnswerRequest>,
) -> Result<Json<SessionView>, AppError> {
    req.validate()?;

    let now = Utc::now();
    let view = store
        .update(id, now, |s| {
            match s.submit_answer(&req.choice, now)? {
                Some(outcome) => {
                    tracing::debug!(%id, ?outcome, score = s.score(), streak = s.streak(), "Answer recorded")
                }
                None => tracing::debug!(%id, "Answer ignored: question already locked"),
            }
            Ok(SessionView::build(id, s, now))
        })
        .await?;
    Ok(Json(view))
}

pub async fn next_question(
    State(store): State<SessionStore>,
    State(questions): State<Arc<dyn QuestionSource>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let now = Utc::now();
    let view = store
        .update(id, now, |s| {
            s.next(questions.as_ref())?;
            Ok(SessionView::build(id, s, now))
        })
        .await?;
    Ok(Json(view))
}

/// "Try Again" from the results page.
pub async fn retry_quiz(
    State(store): State<SessionStore>,
    State(questions): State<Arc<dyn QuestionSource>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let now = Utc::now();
    let view = store
        .update(id, now, |s| {
            s.retry(questions.as_ref())?;
            Ok(SessionView::build(id, s, now))
        })
        .await?;
    tracing::info!(%id, "Quiz restarted");
    Ok(Json(view))
}

pub async fn go_home(
    State(store): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let now = Utc::now();
    let view = store
        .update(id, now, |s| {
            s.go_home();
            Ok(SessionView::build(id, s, now))
        })
        .await?;
    Ok(Json(view))
}

/// Feeds the finished attempt to the classifier and records the next difficulty.
pub async fn recommend_difficulty(
    State(store): State<SessionStore>,
    State(model): State<Arc<dyn Classifier>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let recommendation = store
        .update(id, now, |s| s.recommend(model.as_ref()))
        .await?;

    tracing::info!(
        %id,
        difficulty = %recommendation.difficulty,
        predicted = %recommendation.predicted,
        "Difficulty recommended"
    );
    Ok(Json(recommendation))
}

/// Last performance and recommended difficulty for each subject played.
pub async fn get_history(
    State(store): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SubjectHistory>>, AppError> {
    let history = store.update(id, Utc::now(), |s| Ok(s.history())).await?;
    Ok(Json(history))
}
