// src/models/question.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Academic domain a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    Mathematics,
    Science,
}

impl Subject {
    pub const ALL: [Subject; 2] = [Subject::Mathematics, Subject::Science];
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Mathematics => write!(f, "Mathematics"),
            Subject::Science => write!(f, "Science"),
        }
    }
}

/// A normalized multiple-choice question.
/// Immutable once loaded into the question bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// The text content of the question.
    pub question: String,

    /// Ordered list of options as displayed to the learner.
    pub options: Vec<String>,

    /// The correct answer. Always equal to one element of `options`.
    pub answer: String,

    pub topic: Subject,
}

impl QuestionRecord {
    /// Builds a record, rejecting shapes the quiz cannot serve.
    pub fn new(
        question: String,
        options: Vec<String>,
        answer: String,
        topic: Subject,
    ) -> Option<Self> {
        if question.trim().is_empty() || options.len() < 2 || !options.contains(&answer) {
            return None;
        }
        Some(Self {
            question,
            options,
            answer,
            topic,
        })
    }

    pub fn has_option(&self, choice: &str) -> bool {
        self.options.iter().any(|o| o == choice)
    }
}

/// DTO for sending a question to the client (excludes the answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub topic: Subject,
}

impl From<&QuestionRecord> for PublicQuestion {
    fn from(q: &QuestionRecord) -> Self {
        PublicQuestion {
            question: q.question.clone(),
            options: q.options.clone(),
            topic: q.topic,
        }
    }
}

/// Pool size per subject, for the home page.
#[derive(Debug, Serialize)]
pub struct SubjectSummary {
    pub subject: Subject,
    pub available_questions: usize,
}
