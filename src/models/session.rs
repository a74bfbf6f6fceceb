// src/models/session.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{DEFAULT_NUM_QUESTIONS, DEFAULT_TIME_PER_QUESTION_SECONDS},
    models::question::{PublicQuestion, Subject},
    quiz::session::{AnswerOutcome, Phase, QuizSession},
};

/// Quiz length and per-question time limit chosen on the setup page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuizParameters {
    #[validate(range(min = 1, max = 20, message = "num_questions must be between 1 and 20."))]
    pub num_questions: u32,
    #[validate(range(
        min = 1,
        max = 60,
        message = "time_per_question_seconds must be between 1 and 60."
    ))]
    pub time_per_question_seconds: u32,
}

impl Default for QuizParameters {
    fn default() -> Self {
        Self {
            num_questions: DEFAULT_NUM_QUESTIONS,
            time_per_question_seconds: DEFAULT_TIME_PER_QUESTION_SECONDS,
        }
    }
}

/// DTO for creating a session. Supplying a subject selects it immediately.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub subject: Option<Subject>,
}

#[derive(Debug, Deserialize)]
pub struct SelectSubjectRequest {
    pub subject: Subject,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(min = 1, max = 1000))]
    pub choice: String,
}

/// Shown once the current question is locked.
#[derive(Debug, Serialize)]
pub struct Feedback {
    pub outcome: AnswerOutcome,
    pub correct_answer: String,
}

/// Final summary on the results page.
#[derive(Debug, Serialize)]
pub struct ResultsView {
    pub score: u32,
    pub num_questions: u32,
    pub total_attempts: u32,
    pub streak: u32,
    pub average_answer_seconds: f64,
    pub retries: u32,
}

/// Everything a rendering layer needs to draw the current page.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub phase: Phase,
    pub subject: Option<Subject>,
    pub num_questions: Option<u32>,
    pub time_per_question_seconds: Option<u32>,
    /// Form defaults, only while on the setup page.
    pub suggested_parameters: Option<QuizParameters>,
    pub question_number: Option<u32>,
    pub question: Option<PublicQuestion>,
    pub time_left: Option<u32>,
    pub score: u32,
    pub total_attempts: u32,
    pub streak: u32,
    pub questions_asked: u32,
    pub completed: bool,
    pub quiz_started: bool,
    pub feedback: Option<Feedback>,
    pub streak_message: Option<String>,
    pub results: Option<ResultsView>,
}

fn streak_message(streak: u32) -> Option<String> {
    match streak {
        0 | 1 => None,
        2 => Some("Good start! 2 correct answers in a row.".to_string()),
        n => Some(format!("Streak: {} correct answers in a row! Keep going!", n)),
    }
}

impl SessionView {
    /// Read-only projection; callers tick the timer first.
    pub fn build(id: Uuid, session: &QuizSession, now: chrono::DateTime<chrono::Utc>) -> Self {
        let phase = session.phase();
        let in_question = matches!(phase, Phase::QuestionActive | Phase::QuestionLocked);
        let parameters = session.parameters();

        let question_number = match phase {
            Phase::QuestionActive => Some(session.questions_asked() + 1),
            Phase::QuestionLocked => Some(session.questions_asked().max(1)),
            _ => None,
        };

        let feedback = match (phase, session.last_outcome(), session.current_question()) {
            (Phase::QuestionLocked, Some(outcome), Some(q)) => Some(Feedback {
                outcome,
                correct_answer: q.answer.clone(),
            }),
            _ => None,
        };

        let results = match (phase, parameters) {
            (Phase::Results, Some(p)) => Some(ResultsView {
                score: session.score(),
                num_questions: p.num_questions,
                total_attempts: session.total_attempts(),
                streak: session.streak(),
                average_answer_seconds: session.average_answer_seconds(),
                retries: session.retries(),
            }),
            _ => None,
        };

        SessionView {
            id,
            phase,
            subject: session.subject(),
            num_questions: parameters.map(|p| p.num_questions),
            time_per_question_seconds: parameters.map(|p| p.time_per_question_seconds),
            suggested_parameters: (phase == Phase::ParameterSetup)
                .then(|| parameters.unwrap_or_default()),
            question_number,
            question: if in_question {
                session.current_question().map(PublicQuestion::from)
            } else {
                None
            },
            time_left: session.time_left(now),
            score: session.score(),
            total_attempts: session.total_attempts(),
            streak: session.streak(),
            questions_asked: session.questions_asked(),
            completed: session.completed(),
            quiz_started: session.quiz_started(),
            feedback,
            streak_message: if in_question || phase == Phase::Results {
                streak_message(session.streak())
            } else {
                None
            },
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_enforce_ranges() {
        let ok = QuizParameters {
            num_questions: 20,
            time_per_question_seconds: 1,
        };
        assert!(ok.validate().is_ok());

        let too_many = QuizParameters {
            num_questions: 21,
            time_per_question_seconds: 30,
        };
        assert!(too_many.validate().is_err());

        let zero_time = QuizParameters {
            num_questions: 5,
            time_per_question_seconds: 0,
        };
        assert!(zero_time.validate().is_err());
    }

    #[test]
    fn test_streak_messages() {
        assert_eq!(streak_message(1), None);
        assert!(streak_message(2).unwrap().starts_with("Good start"));
        assert!(streak_message(4).unwrap().contains("4 correct answers"));
    }
}
