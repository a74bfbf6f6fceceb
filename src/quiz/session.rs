// src/quiz/session.rs

use std::{collections::HashMap, fmt};

use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::Validate;

use super::QuestionSource;
use crate::{
    classifier::{self, Classifier},
    error::AppError,
    models::{
        prediction::{PredictionRequest, RecommendationResponse, SubjectHistory},
        question::{QuestionRecord, Subject},
        session::QuizParameters,
    },
};

/// Page the session is currently on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Home,
    ParameterSetup,
    QuestionActive,
    QuestionLocked,
    Results,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Home => "home",
            Phase::ParameterSetup => "parameter_setup",
            Phase::QuestionActive => "question_active",
            Phase::QuestionLocked => "question_locked",
            Phase::Results => "results",
        };
        f.write_str(name)
    }
}

/// How the current question was locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    /// The timer ran out before an answer was submitted.
    TimedOut,
}

/// Mutable state of one learner's quiz attempt.
///
/// Every transition takes `now` explicitly and either fully applies or leaves the
/// session untouched. Invariants:
/// * `score <= total_attempts <= questions_asked + 1`
/// * `streak` is the length of the trailing run of correct answers
/// * `completed` is true iff the current question no longer accepts input
#[derive(Debug, Clone)]
pub struct QuizSession {
    phase: Phase,
    subject: Option<Subject>,
    parameters: Option<QuizParameters>,
    current_question: Option<QuestionRecord>,
    start_time: Option<DateTime<Utc>>,
    score: u32,
    total_attempts: u32,
    streak: u32,
    questions_asked: u32,
    completed: bool,
    quiz_started: bool,
    last_outcome: Option<AnswerOutcome>,
    /// Seconds spent on each locked question of the current attempt.
    question_times: Vec<f64>,
    /// "Try Again" count since the subject was selected.
    retries: u32,
    /// Attempts begun by `start` or `retry`; never reset.
    attempts_started: u32,
    /// Survives `go_home`; belongs to the learner rather than one attempt.
    recommendations: HashMap<Subject, Recommendation>,
}

/// Last recommendation for a subject and the attempt it was made for.
#[derive(Debug, Clone, Copy)]
struct Recommendation {
    attempt: u32,
    response: RecommendationResponse,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Home,
            subject: None,
            parameters: None,
            current_question: None,
            start_time: None,
            score: 0,
            total_attempts: 0,
            streak: 0,
            questions_asked: 0,
            completed: false,
            quiz_started: false,
            last_outcome: None,
            question_times: Vec::new(),
            retries: 0,
            attempts_started: 0,
            recommendations: HashMap::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn subject(&self) -> Option<Subject> {
        self.subject
    }

    pub fn parameters(&self) -> Option<QuizParameters> {
        self.parameters
    }

    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.current_question.as_ref()
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn questions_asked(&self) -> u32 {
        self.questions_asked
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn quiz_started(&self) -> bool {
        self.quiz_started
    }

    pub fn last_outcome(&self) -> Option<AnswerOutcome> {
        self.last_outcome
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Latest performance and recommended difficulty per subject.
    pub fn history(&self) -> Vec<SubjectHistory> {
        Subject::ALL
            .iter()
            .filter_map(|subject| {
                self.recommendations.get(subject).map(|r| SubjectHistory {
                    subject: *subject,
                    performance: r.response.performance,
                    difficulty: r.response.difficulty,
                })
            })
            .collect()
    }

    /// Mean seconds per locked question, 0 when nothing was locked yet.
    pub fn average_answer_seconds(&self) -> f64 {
        if self.question_times.is_empty() {
            return 0.0;
        }
        self.question_times.iter().sum::<f64>() / self.question_times.len() as f64
    }

    fn require_phase(&self, allowed: &[Phase], action: &str) -> Result<(), AppError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(AppError::Conflict(format!(
                "Cannot {} while the session is in the {} phase",
                action, self.phase
            )))
        }
    }

    fn require_subject(&self) -> Result<Subject, AppError> {
        self.subject
            .ok_or_else(|| AppError::Conflict("No subject selected".to_string()))
    }

    fn require_parameters(&self) -> Result<QuizParameters, AppError> {
        self.parameters.ok_or_else(|| {
            AppError::Conflict("Set the quiz parameters before starting".to_string())
        })
    }

    fn active_question(&self) -> Result<&QuestionRecord, AppError> {
        self.current_question.as_ref().ok_or_else(|| {
            AppError::InternalServerError("active question missing from session".to_string())
        })
    }

    fn reset_attempt(&mut self) {
        self.current_question = None;
        self.start_time = None;
        self.score = 0;
        self.total_attempts = 0;
        self.streak = 0;
        self.questions_asked = 0;
        self.completed = false;
        self.last_outcome = None;
        self.question_times.clear();
    }

    /// HOME -> PARAMETER_SETUP.
    pub fn select_subject(&mut self, subject: Subject) -> Result<(), AppError> {
        self.require_phase(&[Phase::Home], "select a subject")?;
        self.subject = Some(subject);
        self.parameters = None;
        self.quiz_started = false;
        self.retries = 0;
        self.phase = Phase::ParameterSetup;
        Ok(())
    }

    pub fn set_parameters(&mut self, parameters: QuizParameters) -> Result<(), AppError> {
        self.require_phase(&[Phase::ParameterSetup], "set quiz parameters")?;
        parameters.validate()?;
        self.parameters = Some(parameters);
        Ok(())
    }

    /// PARAMETER_SETUP -> QUESTION_ACTIVE.
    ///
    /// An empty pool fails with `NoQuestionsAvailable` and keeps the session on setup.
    pub fn start(&mut self, source: &dyn QuestionSource, now: DateTime<Utc>) -> Result<(), AppError> {
        self.require_phase(&[Phase::ParameterSetup], "start the quiz")?;
        let subject = self.require_subject()?;
        self.require_parameters()?;
        let question = source.draw(subject)?;

        self.reset_attempt();
        self.attempts_started += 1;
        self.current_question = Some(question);
        self.start_time = Some(now);
        self.quiz_started = true;
        self.phase = Phase::QuestionActive;
        Ok(())
    }

    /// Seconds left on the current question, `None` outside the question loop.
    pub fn time_left(&self, now: DateTime<Utc>) -> Option<u32> {
        if !matches!(self.phase, Phase::QuestionActive | Phase::QuestionLocked) {
            return None;
        }
        let limit = self.parameters?.time_per_question_seconds;
        let Some(start) = self.start_time else {
            return Some(limit);
        };
        let elapsed = (now - start).num_seconds().max(0);
        Some((i64::from(limit) - elapsed).max(0) as u32)
    }

    /// Polls the question timer, restarting it if it was reset by `next`.
    /// Locks the question as timed out once no time is left.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<u32> {
        if self.phase == Phase::QuestionActive && self.start_time.is_none() {
            self.start_time = Some(now);
        }
        let left = self.time_left(now)?;
        if left == 0 && self.phase == Phase::QuestionActive && !self.completed {
            tracing::debug!(questions_asked = self.questions_asked, "Question timed out");
            self.lock_question(AnswerOutcome::TimedOut, now);
        }
        Some(left)
    }

    fn seconds_on_question(&self, now: DateTime<Utc>) -> f64 {
        let Some(start) = self.start_time else {
            return 0.0;
        };
        let secs = (now - start).num_milliseconds().max(0) as f64 / 1000.0;
        match self.parameters {
            Some(p) => secs.min(f64::from(p.time_per_question_seconds)),
            None => secs,
        }
    }

    /// A timeout counts as an unanswered, incorrect attempt.
    fn lock_question(&mut self, outcome: AnswerOutcome, now: DateTime<Utc>) {
        self.total_attempts += 1;
        match outcome {
            AnswerOutcome::Correct => {
                self.score += 1;
                self.streak += 1;
            }
            AnswerOutcome::Incorrect | AnswerOutcome::TimedOut => self.streak = 0,
        }
        self.questions_asked += 1;
        self.completed = true;
        self.last_outcome = Some(outcome);
        let spent = self.seconds_on_question(now);
        self.question_times.push(spent);
        self.phase = Phase::QuestionLocked;
    }

    /// QUESTION_ACTIVE -> QUESTION_LOCKED.
    ///
    /// Returns `Ok(None)` without touching any counter when the question is already
    /// locked, including when the timer expired just before the answer arrived.
    pub fn submit_answer(
        &mut self,
        choice: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AnswerOutcome>, AppError> {
        self.require_phase(
            &[Phase::QuestionActive, Phase::QuestionLocked],
            "submit an answer",
        )?;
        // Reject unknown choices before the tick can restart the timer.
        let expired = self.time_left(now) == Some(0);
        if !self.completed && !expired && !self.active_question()?.has_option(choice) {
            return Err(AppError::InvalidRequest(format!(
                "'{}' is not one of the options",
                choice
            )));
        }

        self.tick(now);
        if self.completed {
            return Ok(None);
        }

        let question = self.active_question()?;
        let outcome = if choice == question.answer {
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect
        };

        self.lock_question(outcome, now);
        Ok(Some(outcome))
    }

    /// QUESTION_LOCKED -> QUESTION_ACTIVE, or RESULTS once every question was asked.
    pub fn next(&mut self, source: &dyn QuestionSource) -> Result<(), AppError> {
        self.require_phase(&[Phase::QuestionLocked], "move to the next question")?;
        let parameters = self.require_parameters()?;

        if self.questions_asked >= parameters.num_questions {
            self.phase = Phase::Results;
            return Ok(());
        }

        let question = source.draw(self.require_subject()?)?;
        self.current_question = Some(question);
        self.completed = false;
        self.start_time = None;
        self.last_outcome = None;
        self.phase = Phase::QuestionActive;
        Ok(())
    }

    /// RESULTS -> QUESTION_ACTIVE with counters zeroed; subject and parameters kept.
    pub fn retry(&mut self, source: &dyn QuestionSource) -> Result<(), AppError> {
        self.require_phase(&[Phase::Results], "retry the quiz")?;
        let question = source.draw(self.require_subject()?)?;

        self.reset_attempt();
        self.attempts_started += 1;
        self.current_question = Some(question);
        self.retries += 1;
        self.phase = Phase::QuestionActive;
        Ok(())
    }

    /// Any phase -> HOME, abandoning the current attempt.
    pub fn go_home(&mut self) {
        self.reset_attempt();
        self.subject = None;
        self.parameters = None;
        self.quiz_started = false;
        self.retries = 0;
        self.phase = Phase::Home;
    }

    /// Performance features of the finished attempt, in classifier input form.
    pub fn performance(&self) -> PredictionRequest {
        PredictionRequest {
            correct: self.score,
            avg_time: self.average_answer_seconds(),
            retries: self.retries,
        }
    }

    /// Difficulty for the next quiz on this subject.
    ///
    /// The first recommendation for a subject comes from the classifier; each later
    /// attempt steps up from the previous recommendation. Asking again for the same
    /// attempt returns the stored recommendation.
    pub fn recommend(
        &mut self,
        model: &dyn Classifier,
    ) -> Result<RecommendationResponse, AppError> {
        self.require_phase(&[Phase::Results], "request a recommendation")?;
        let subject = self.require_subject()?;
        let previous = self.recommendations.get(&subject).copied();
        if let Some(previous) = previous.filter(|r| r.attempt == self.attempts_started) {
            return Ok(previous.response);
        }

        let performance = self.performance();
        let predicted = classifier::predict(model, &performance)?;
        let difficulty = match previous {
            Some(previous) => previous.response.difficulty.step_up(),
            None => predicted,
        };
        let response = RecommendationResponse {
            difficulty,
            predicted,
            performance,
        };
        self.recommendations.insert(
            subject,
            Recommendation {
                attempt: self.attempts_started,
                response,
            },
        );
        Ok(response)
    }
}
