// src/quiz/bank.rs

use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::LazyLock,
};

use rand::seq::SliceRandom;
use regex::Regex;
use serde::{Deserialize, de::DeserializeOwned};

use super::QuestionSource;
use crate::{
    config::Config,
    error::AppError,
    models::question::{QuestionRecord, Subject},
};

/// Matches the `a )` style markers that prefix each MathQA option.
/// Anchored to the start or a comma so parenthesised math inside an option is left alone.
static MATH_OPTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|,)\s*\[?'?([a-e])\s*\)\s*").expect("valid regex"));

/// Row of the MathQA word-problem dataset.
#[derive(Debug, Deserialize)]
struct MathQaRow {
    #[serde(rename = "Problem")]
    problem: String,
    options: String,
    correct: String,
}

#[derive(Debug, Deserialize)]
struct ArcChoices {
    text: Vec<String>,
    label: Vec<String>,
}

/// Row of the ARC science multiple-choice dataset.
#[derive(Debug, Deserialize)]
struct ArcRow {
    question: String,
    choices: ArcChoices,
    #[serde(rename = "answerKey")]
    answer_key: String,
}

/// Splits `"a ) 38 , b ) 27.675 , c ) 30"` into `[("a", "38"), ("b", "27.675"), ("c", "30")]`.
fn split_math_options(raw: &str) -> Vec<(String, String)> {
    let markers: Vec<_> = MATH_OPTION_MARKER.captures_iter(raw).collect();
    let mut options = Vec::with_capacity(markers.len());

    for (i, caps) in markers.iter().enumerate() {
        let (Some(whole), Some(letter)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(raw.len());
        let text = raw[whole.end()..end]
            .trim()
            .trim_end_matches([']', '\''])
            .trim();
        options.push((letter.as_str().to_string(), text.to_string()));
    }

    options
}

fn normalize_math(row: MathQaRow) -> Option<QuestionRecord> {
    let lettered = split_math_options(&row.options);
    let correct = row.correct.trim().to_lowercase();
    let answer = lettered
        .iter()
        .find(|(letter, _)| *letter == correct)
        .map(|(_, text)| text.clone())?;
    let options = lettered.into_iter().map(|(_, text)| text).collect();

    QuestionRecord::new(row.problem.trim().to_string(), options, answer, Subject::Mathematics)
}

fn normalize_arc(row: ArcRow) -> Option<QuestionRecord> {
    if row.choices.text.len() != row.choices.label.len() {
        return None;
    }
    let idx = row
        .choices
        .label
        .iter()
        .position(|label| *label == row.answer_key)?;
    let answer = row.choices.text[idx].clone();

    QuestionRecord::new(
        row.question.trim().to_string(),
        row.choices.text,
        answer,
        Subject::Science,
    )
}

/// Reads a JSON Lines dataset, normalizing each row.
///
/// Read failures are returned; rows that cannot be parsed or normalized are skipped
/// with a warning.
fn load_jsonl<R, T>(
    reader: R,
    subject: Subject,
    normalize: fn(T) -> Option<QuestionRecord>,
) -> Result<Vec<QuestionRecord>, AppError>
where
    R: BufRead,
    T: DeserializeOwned,
{
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line).ok().and_then(normalize) {
            Some(record) => records.push(record),
            None => {
                skipped += 1;
                tracing::warn!(%subject, line = line_no + 1, "Skipping dataset row that cannot be normalized");
            }
        }
    }

    tracing::info!(%subject, loaded = records.len(), skipped, "Dataset loaded");
    Ok(records)
}

pub fn load_math_questions<R: BufRead>(reader: R) -> Result<Vec<QuestionRecord>, AppError> {
    load_jsonl(reader, Subject::Mathematics, normalize_math)
}

pub fn load_science_questions<R: BufRead>(reader: R) -> Result<Vec<QuestionRecord>, AppError> {
    load_jsonl(reader, Subject::Science, normalize_arc)
}

fn open_dataset(path: &str) -> Result<BufReader<File>, AppError> {
    let file = File::open(Path::new(path)).map_err(|e| {
        AppError::InternalServerError(format!("failed to open dataset {}: {}", path, e))
    })?;
    Ok(BufReader::new(file))
}

/// In-memory question pools, one per subject.
#[derive(Debug, Default)]
pub struct QuestionBank {
    pools: HashMap<Subject, Vec<QuestionRecord>>,
}

impl QuestionBank {
    pub fn from_records(records: impl IntoIterator<Item = QuestionRecord>) -> Self {
        let mut pools: HashMap<Subject, Vec<QuestionRecord>> = HashMap::new();
        for record in records {
            pools.entry(record.topic).or_default().push(record);
        }
        Self { pools }
    }

    /// Loads both datasets from the configured paths. Called once at startup.
    pub fn load(config: &Config) -> Result<Self, AppError> {
        let mut records = load_math_questions(open_dataset(&config.math_dataset_path)?)?;
        records.extend(load_science_questions(open_dataset(
            &config.science_dataset_path,
        )?)?);

        let bank = Self::from_records(records);
        for subject in Subject::ALL {
            if bank.count(subject) == 0 {
                tracing::warn!(%subject, "Question pool is empty; quizzes for this subject cannot start");
            }
        }
        Ok(bank)
    }

    pub fn count(&self, subject: Subject) -> usize {
        self.pools.get(&subject).map_or(0, Vec::len)
    }
}

impl QuestionSource for QuestionBank {
    fn draw(&self, subject: Subject) -> Result<QuestionRecord, AppError> {
        self.pools
            .get(&subject)
            .and_then(|pool| pool.choose(&mut rand::thread_rng()))
            .cloned()
            .ok_or_else(|| {
                AppError::NoQuestionsAvailable(format!("No questions loaded for {}", subject))
            })
    }

    fn available(&self, subject: Subject) -> usize {
        self.count(subject)
    }
}
