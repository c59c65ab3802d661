use std::{collections::BTreeSet, sync::Arc};

use crate::{
    errors::AppResult,
    models::{
        domain::ProgressRecord,
        dto::response::{AdminStatsDto, UserActivityDto},
    },
    repositories::{ProgressRepository, QuizRepository},
};

const RECENT_PROGRESS_LIMIT: usize = 20;

pub struct AdminService {
    quizzes: Arc<dyn QuizRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl AdminService {
    pub fn new(quizzes: Arc<dyn QuizRepository>, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { quizzes, progress }
    }

    /// Mean of every recorded score, rounded. Records without a score are ignored.
    pub fn average_score(records: &[ProgressRecord]) -> u8 {
        let scores: Vec<f64> = records.iter().filter_map(|r| r.score).map(f64::from).collect();
        if scores.is_empty() {
            return 0;
        }
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        mean.round().clamp(0.0, 100.0) as u8
    }

    pub async fn stats(&self) -> AppResult<AdminStatsDto> {
        let quizzes = self.quizzes.list_all().await?;
        let mut progress = self.progress.list_all().await?;

        let owners: BTreeSet<&str> = quizzes
            .iter()
            .map(|q| q.owner.as_str())
            .chain(progress.iter().map(|p| p.owner.as_str()))
            .collect();
        let total_users = owners.len();

        let completed_sessions = progress.iter().filter(|p| p.is_completed()).count();
        let avg_score = Self::average_score(&progress);

        progress.sort_by_key(|p| std::cmp::Reverse(p.completed_at.or(p.started_at)));
        progress.truncate(RECENT_PROGRESS_LIMIT);

        Ok(AdminStatsDto {
            total_users,
            total_quizzes: quizzes.len(),
            completed_sessions,
            avg_score,
            quizzes,
            recent_progress: progress,
        })
    }

    pub async fn user_activity(&self, user_id: &str) -> AppResult<UserActivityDto> {
        let quizzes = self.quizzes.list_by_owner(user_id).await?;
        let progress = self.progress.list_by_owner(user_id).await?;

        Ok(UserActivityDto {
            user_id: user_id.to_string(),
            quizzes,
            progress,
        })
    }
}
