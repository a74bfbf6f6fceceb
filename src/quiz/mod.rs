// src/quiz/mod.rs

pub mod bank;
pub mod session;
pub mod store;

use crate::{
    error::AppError,
    models::question::{QuestionRecord, Subject},
};

pub use bank::QuestionBank;
pub use session::QuizSession;
pub use store::SessionStore;

/// Supplies questions to the session state machine.
pub trait QuestionSource: Send + Sync {
    /// Returns a uniformly random record whose topic is `subject`.
    fn draw(&self, subject: Subject) -> Result<QuestionRecord, AppError>;

    /// Number of questions that can be drawn for `subject`.
    fn available(&self, subject: Subject) -> usize;
}
