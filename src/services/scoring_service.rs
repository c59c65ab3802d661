use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::domain::{AnswerMap, Question};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub number: u32,
    pub selected: Vec<char>,
    pub is_correct: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub results: Vec<QuestionResult>,
    pub correct_count: usize,
    pub total: usize,
    pub score: u8,
}

impl Evaluation {
    pub fn wrong_numbers(&self) -> Vec<u32> {
        self.results
            .iter()
            .filter(|r| !r.is_correct)
            .map(|r| r.number)
            .collect()
    }
}

pub struct ScoringService;

impl ScoringService {
    /// A selection is correct when it has the same size as the answer key and
    /// contains every answer letter.
    pub fn is_correct(question: &Question, selected: Option<&BTreeSet<char>>) -> bool {
        let empty = BTreeSet::new();
        let selected = selected.unwrap_or(&empty);

        selected.len() == question.answer.len()
            && question.answer.iter().all(|a| selected.contains(a))
    }

    /// Rounds half away from zero. An empty set scores 0.
    pub fn score(correct_count: usize, total: usize) -> u8 {
        if total == 0 {
            return 0;
        }
        let percent = (correct_count as f64 / total as f64) * 100.0;
        percent.round().clamp(0.0, 100.0) as u8
    }

    pub fn evaluate(questions: &[Question], answers: &AnswerMap) -> Evaluation {
        let results: Vec<QuestionResult> = questions
            .iter()
            .map(|q| {
                let selected = answers.get(&q.number);
                QuestionResult {
                    number: q.number,
                    selected: selected.map(|s| s.iter().copied().collect()).unwrap_or_default(),
                    is_correct: Self::is_correct(q, selected),
                }
            })
            .collect();

        let correct_count = results.iter().filter(|r| r.is_correct).count();
        let total = results.len();

        Evaluation {
            score: Self::score(correct_count, total),
            results,
            correct_count,
            total,
        }
    }

    /// Questions of the working set that were not answered correctly, in
    /// working-set order.
    pub fn wrong_subset(questions: &[Question], answers: &AnswerMap) -> Vec<Question> {
        questions
            .iter()
            .filter(|q| !Self::is_correct(q, answers.get(&q.number)))
            .cloned()
            .collect()
    }
}
