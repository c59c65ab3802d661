use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Question number to the letters the user selected. A missing key, or an
/// empty set, both mean the question is unanswered.
pub type AnswerMap = BTreeMap<u32, BTreeSet<char>>;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub owner: String,
    pub quiz_id: String,
    pub current_index: usize,
    #[serde(default)]
    pub user_answers: AnswerMap,
    #[serde(default)]
    pub known_questions: BTreeSet<u32>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
}

impl ProgressRecord {
    /// Fresh record for a session that is just starting.
    pub fn started(owner: &str, quiz_id: &str, known_questions: BTreeSet<u32>) -> Self {
        ProgressRecord {
            owner: owner.to_string(),
            quiz_id: quiz_id.to_string(),
            current_index: 0,
            user_answers: AnswerMap::new(),
            known_questions,
            started_at: Some(super::now()),
            completed_at: None,
            score: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn toggle_known(&mut self, number: u32) -> bool {
        if self.known_questions.remove(&number) {
            false
        } else {
            self.known_questions.insert(number);
            true
        }
    }
}
