use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    models::domain::{ProgressRecord, Question, QuizMeta},
    repositories::StoredQuiz,
    services::scoring_service::Evaluation,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummaryDto {
    pub quiz_id: String,
    pub name: String,
    pub question_count: usize,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl From<QuizMeta> for QuizSummaryDto {
    fn from(meta: QuizMeta) -> Self {
        QuizSummaryDto {
            quiz_id: meta.quiz_id,
            name: meta.name,
            question_count: meta.question_count,
            created_at: meta.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDetailDto {
    #[serde(flatten)]
    pub summary: QuizSummaryDto,
    pub questions: Vec<Question>,
}

impl From<StoredQuiz> for QuizDetailDto {
    fn from(quiz: StoredQuiz) -> Self {
        QuizDetailDto {
            summary: quiz.meta.into(),
            questions: quiz.questions,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportQuizResponse {
    #[serde(flatten)]
    pub summary: QuizSummaryDto,
    pub parsed_blocks: usize,
    pub dropped_blocks: usize,
}

/// Questions a session works through, plus the progress it starts or resumes from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub quiz_id: String,
    pub name: String,
    pub questions: Vec<Question>,
    pub progress: ProgressRecord,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDto {
    pub resumable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownToggleDto {
    pub number: u32,
    pub known: bool,
    pub known_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongAnswerDto {
    pub number: u32,
    pub text: String,
    pub selected: Vec<char>,
    pub answer: Vec<char>,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultDto {
    pub score: u8,
    pub correct_count: usize,
    pub total: usize,
    pub wrong: Vec<WrongAnswerDto>,
}

impl QuizResultDto {
    pub fn from_evaluation(questions: &[Question], evaluation: &Evaluation) -> Self {
        let wrong = questions
            .iter()
            .zip(&evaluation.results)
            .filter(|(_, result)| !result.is_correct)
            .map(|(question, result)| WrongAnswerDto {
                number: question.number,
                text: question.text.clone(),
                selected: result.selected.clone(),
                answer: question.answer.clone(),
                explanation: question.explanation.clone(),
            })
            .collect();

        QuizResultDto {
            score: evaluation.score,
            correct_count: evaluation.correct_count,
            total: evaluation.total,
            wrong,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsDto {
    pub total_users: usize,
    pub total_quizzes: usize,
    pub completed_sessions: usize,
    pub avg_score: u8,
    pub quizzes: Vec<QuizMeta>,
    pub recent_progress: Vec<ProgressRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivityDto {
    pub user_id: String,
    pub quizzes: Vec<QuizMeta>,
    pub progress: Vec<ProgressRecord>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}
