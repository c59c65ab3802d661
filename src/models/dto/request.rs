use std::collections::BTreeSet;

use serde::Deserialize;
use validator::Validate;

use crate::models::domain::{AnswerMap, Question};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImportQuizRequest {
    /// Display name, usually the uploaded file name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    /// Extracted text, one entry per page.
    #[validate(length(min = 1, message = "At least one page is required"))]
    pub pages: Vec<String>,

    /// Original document bytes, base64 encoded. Archived when present.
    pub source_base64: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub file_name: Option<String>,
}

impl ImportQuizRequest {
    /// The quiz name with a trailing `.pdf` extension removed.
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        let stem = name
            .len()
            .checked_sub(4)
            .filter(|&cut| name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pdf"))
            .map(|cut| &name[..cut])
            .unwrap_or(name);
        stem.to_string()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartSessionRequest {
    pub exclude_known: bool,
    pub shuffle_questions: bool,
    pub shuffle_choices: bool,
}

/// A client-side snapshot of session state. The index is checked against
/// the quiz's question count when saved.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProgressRequest {
    pub current_index: usize,
    #[serde(default)]
    pub user_answers: AnswerMap,
    #[serde(default)]
    pub known_questions: BTreeSet<u32>,
}

/// The working set a client is holding, plus its answers. When `questions`
/// is omitted the quiz's stored question order is used.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    #[validate(length(min = 1))]
    pub questions: Option<Vec<Question>>,
    #[serde(default)]
    pub user_answers: AnswerMap,
    #[serde(default)]
    pub known_questions: BTreeSet<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import_request(name: &str) -> ImportQuizRequest {
        ImportQuizRequest {
            name: name.to_string(),
            pages: vec!["NO.1 Q A. x B. y Answer: A".to_string()],
            source_base64: None,
            file_name: None,
        }
    }

    #[test]
    fn display_name_strips_pdf_extension() {
        assert_eq!(import_request("AWS SAA.pdf").display_name(), "AWS SAA");
        assert_eq!(import_request("exam.PDF").display_name(), "exam");
        assert_eq!(import_request("notes.txt").display_name(), "notes.txt");
        assert_eq!(import_request("pdf").display_name(), "pdf");
    }

    #[test]
    fn import_request_requires_pages() {
        let mut request = import_request("exam.pdf");
        assert!(request.validate().is_ok());

        request.pages.clear();
        assert!(request.validate().is_err());
    }

    #[test]
    fn evaluate_request_parses_answer_maps() {
        let request: EvaluateRequest = serde_json::from_str(
            r#"{ "userAnswers": { "1": ["A"], "2": ["B", "C"] }, "knownQuestions": [4] }"#,
        )
        .expect("request should deserialize");

        assert!(request.questions.is_none());
        assert_eq!(request.user_answers[&2], BTreeSet::from(['B', 'C']));
        assert!(request.known_questions.contains(&4));
    }

    #[test]
    fn start_session_defaults_to_plain_order() {
        let request: StartSessionRequest = serde_json::from_str("{}").unwrap();
        assert!(!request.exclude_known && !request.shuffle_questions && !request.shuffle_choices);
    }
}
