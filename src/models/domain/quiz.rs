use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::domain::question::Question;

static NON_SLUG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]").expect("NON_SLUG_CHARS is a valid regex pattern"));
static DASH_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-+").expect("DASH_RUNS is a valid regex pattern"));

/// A parsed exam dump. Created once at import time and never patched.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizDocument {
    pub name: String,
    pub questions: Vec<Question>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl QuizDocument {
    pub fn new(name: &str, questions: Vec<Question>) -> Self {
        QuizDocument {
            name: name.to_string(),
            questions,
            created_at: super::now(),
        }
    }

    pub fn quiz_id(&self) -> String {
        derive_quiz_id(&self.name, self.created_at)
    }
}

/// Header row of a stored quiz. Chunk rows share its partition but never carry `name`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizMeta {
    pub owner: String,
    pub quiz_id: String,
    pub name: String,
    pub question_count: usize,
    pub chunk_count: usize,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizChunk {
    pub owner: String,
    pub quiz_id: String,
    pub questions: Vec<Question>,
}

pub fn chunk_key(quiz_id: &str, index: usize) -> String {
    format!("{}#chunk#{}", quiz_id, index)
}

/// Slugifies the quiz name and suffixes the creation time in epoch millis.
pub fn derive_quiz_id(name: &str, created_at: DateTime<Utc>) -> String {
    let lowered = name.to_lowercase();
    let slug = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let slug = DASH_RUNS.replace_all(&slug, "-");
    format!("{}-{}", slug, created_at.timestamp_millis())
}
