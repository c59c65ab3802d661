use std::{collections::BTreeSet, sync::Arc};

use rand::Rng;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{now, ProgressRecord, Question, QuizMeta},
        dto::{
            request::{EvaluateRequest, SaveProgressRequest, StartSessionRequest},
            response::{KnownToggleDto, QuizResultDto, ResumeDto, SessionDto},
        },
    },
    repositories::{ProgressRepository, QuizRepository, StoredQuiz},
    services::{randomizer, scoring_service::ScoringService},
};

/// Builds the questions a session works through: known questions removed
/// when asked, then question order and choice order shuffled independently.
pub fn build_working_set<R: Rng + ?Sized>(
    questions: &[Question],
    known: &BTreeSet<u32>,
    options: &StartSessionRequest,
    rng: &mut R,
) -> Vec<Question> {
    let mut working: Vec<Question> = if options.exclude_known {
        questions
            .iter()
            .filter(|q| !known.contains(&q.number))
            .cloned()
            .collect()
    } else {
        questions.to_vec()
    };

    if options.shuffle_questions {
        working = randomizer::shuffle_questions_with(&working, rng);
    }
    if options.shuffle_choices {
        working = working
            .iter()
            .map(|q| randomizer::shuffle_choices_with(q, rng))
            .collect();
    }
    working
}

/// Drives a study session: starting, resuming, answering, finishing and retrying.
pub struct ProgressService {
    quizzes: Arc<dyn QuizRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    pub fn new(quizzes: Arc<dyn QuizRepository>, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { quizzes, progress }
    }

    async fn load_quiz(&self, owner: &str, quiz_id: &str) -> AppResult<StoredQuiz> {
        self.quizzes
            .find_by_id(owner, quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))
    }

    async fn ensure_quiz_exists(&self, owner: &str, quiz_id: &str) -> AppResult<QuizMeta> {
        self.quizzes
            .find_meta(owner, quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))
    }

    async fn known_questions(&self, owner: &str, quiz_id: &str) -> AppResult<BTreeSet<u32>> {
        Ok(self
            .progress
            .find(owner, quiz_id)
            .await?
            .map(|record| record.known_questions)
            .unwrap_or_default())
    }

    /// Starts a fresh session and overwrites any stored progress for the quiz.
    pub async fn start_session(
        &self,
        owner: &str,
        quiz_id: &str,
        options: StartSessionRequest,
    ) -> AppResult<SessionDto> {
        let quiz = self.load_quiz(owner, quiz_id).await?;
        let known = self.known_questions(owner, quiz_id).await?;

        let questions = build_working_set(&quiz.questions, &known, &options, &mut rand::rng());
        if questions.is_empty() {
            return Err(AppError::ValidationError(
                "No questions left to study; every question is marked as known".to_string(),
            ));
        }

        let progress = self
            .progress
            .save(ProgressRecord::started(owner, quiz_id, known))
            .await?;

        log::info!(
            "Started session on '{}' for {} with {} questions",
            quiz_id,
            owner,
            questions.len()
        );

        Ok(SessionDto {
            quiz_id: quiz.meta.quiz_id,
            name: quiz.meta.name,
            questions,
            progress,
        })
    }

    /// Resumes an unfinished session in stored question order. Completed or
    /// absent progress is reported as not resumable.
    pub async fn resume(&self, owner: &str, quiz_id: &str) -> AppResult<ResumeDto> {
        let quiz = self.load_quiz(owner, quiz_id).await?;

        let record = match self.progress.find(owner, quiz_id).await? {
            Some(record) if !record.is_completed() => record,
            _ => {
                return Ok(ResumeDto {
                    resumable: false,
                    session: None,
                })
            }
        };

        let progress = ProgressRecord {
            started_at: record.started_at.or_else(|| Some(now())),
            current_index: record.current_index.min(quiz.questions.len().saturating_sub(1)),
            ..record
        };

        Ok(ResumeDto {
            resumable: true,
            session: Some(SessionDto {
                quiz_id: quiz.meta.quiz_id,
                name: quiz.meta.name,
                questions: quiz.questions,
                progress,
            }),
        })
    }

    pub async fn get_progress(&self, owner: &str, quiz_id: &str) -> AppResult<ProgressRecord> {
        self.progress.find(owner, quiz_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("No progress recorded for quiz '{}'", quiz_id))
        })
    }

    /// Overwrites the stored record with the caller's state. Only the start
    /// time carries over from what was stored.
    pub async fn save_progress(
        &self,
        owner: &str,
        quiz_id: &str,
        request: SaveProgressRequest,
    ) -> AppResult<ProgressRecord> {
        let meta = self.ensure_quiz_exists(owner, quiz_id).await?;
        if request.current_index >= meta.question_count {
            return Err(AppError::ValidationError(format!(
                "Current index {} is past the last of {} questions",
                request.current_index, meta.question_count
            )));
        }

        let started_at = self
            .progress
            .find(owner, quiz_id)
            .await?
            .and_then(|record| record.started_at)
            .or_else(|| Some(now()));

        let record = ProgressRecord {
            owner: owner.to_string(),
            quiz_id: quiz_id.to_string(),
            current_index: request.current_index,
            user_answers: request.user_answers,
            known_questions: request.known_questions,
            started_at,
            completed_at: None,
            score: None,
        };

        self.progress.save(record).await
    }

    pub async fn toggle_known(
        &self,
        owner: &str,
        quiz_id: &str,
        number: u32,
    ) -> AppResult<KnownToggleDto> {
        self.ensure_quiz_exists(owner, quiz_id).await?;

        let mut record = self
            .progress
            .find(owner, quiz_id)
            .await?
            .unwrap_or_else(|| ProgressRecord {
                started_at: None,
                ..ProgressRecord::started(owner, quiz_id, BTreeSet::new())
            });

        let known = record.toggle_known(number);
        let record = self.progress.save(record).await?;

        Ok(KnownToggleDto {
            number,
            known,
            known_count: record.known_questions.len(),
        })
    }

    /// Resolves the working set a request refers to, falling back to the
    /// stored questions when the client did not send one.
    async fn working_set(
        &self,
        owner: &str,
        quiz_id: &str,
        request: &EvaluateRequest,
    ) -> AppResult<Vec<Question>> {
        request.validate()?;

        match &request.questions {
            Some(questions) => {
                self.ensure_quiz_exists(owner, quiz_id).await?;
                if let Some(invalid) = questions.iter().find(|q| !q.is_valid()) {
                    return Err(AppError::ValidationError(format!(
                        "Question {} in the working set is malformed",
                        invalid.number
                    )));
                }
                Ok(questions.clone())
            }
            None => Ok(self.load_quiz(owner, quiz_id).await?.questions),
        }
    }

    /// Scores the working set and marks the session completed.
    pub async fn finish(
        &self,
        owner: &str,
        quiz_id: &str,
        request: EvaluateRequest,
    ) -> AppResult<QuizResultDto> {
        let questions = self.working_set(owner, quiz_id, &request).await?;
        let evaluation = ScoringService::evaluate(&questions, &request.user_answers);

        let started_at = self
            .progress
            .find(owner, quiz_id)
            .await?
            .and_then(|record| record.started_at);

        self.progress
            .save(ProgressRecord {
                owner: owner.to_string(),
                quiz_id: quiz_id.to_string(),
                current_index: 0,
                user_answers: request.user_answers,
                known_questions: request.known_questions,
                started_at,
                completed_at: Some(now()),
                score: Some(evaluation.score),
            })
            .await?;

        log::info!(
            "Finished '{}' for {}: {}/{} correct, score {}",
            quiz_id,
            owner,
            evaluation.correct_count,
            evaluation.total,
            evaluation.score
        );

        Ok(QuizResultDto::from_evaluation(&questions, &evaluation))
    }

    /// Retry all: forgets the stored progress, known questions included.
    pub async fn reset_progress(&self, owner: &str, quiz_id: &str) -> AppResult<()> {
        self.progress.delete(owner, quiz_id).await
    }

    /// Builds a session over the questions answered incorrectly. Nothing is
    /// persisted until the client saves progress for it.
    pub async fn retry_wrong(
        &self,
        owner: &str,
        quiz_id: &str,
        request: EvaluateRequest,
    ) -> AppResult<SessionDto> {
        let questions = self.working_set(owner, quiz_id, &request).await?;
        let wrong = ScoringService::wrong_subset(&questions, &request.user_answers);

        if wrong.is_empty() {
            return Err(AppError::ValidationError(
                "No wrong answers to retry".to_string(),
            ));
        }

        let meta = self.quizzes.find_meta(owner, quiz_id).await?;
        Ok(SessionDto {
            quiz_id: quiz_id.to_string(),
            name: meta.map(|m| m.name).unwrap_or_default(),
            questions: wrong,
            progress: ProgressRecord::started(owner, quiz_id, request.known_questions),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::domain::{question::fixtures::question, AnswerMap, QuizDocument},
        repositories::{ChunkedQuizRepository, InMemoryKeyValueStore, KvProgressRepository},
    };
    use rand::{rngs::StdRng, SeedableRng};

    struct Fixture {
        service: ProgressService,
        progress: Arc<KvProgressRepository>,
        quiz_id: String,
    }

    fn four_questions() -> Vec<Question> {
        vec![
            question(1, &["a", "b", "c", "d"], &['A']),
            question(2, &["a", "b", "c", "d"], &['B', 'C']),
            question(3, &["a", "b", "c", "d"], &['A']),
            question(4, &["a", "b", "c", "d"], &['D']),
        ]
    }

    async fn fixture() -> Fixture {
        let progress = Arc::new(KvProgressRepository::new(Arc::new(
            InMemoryKeyValueStore::new(64 * 1024),
        )));
        let quizzes = Arc::new(ChunkedQuizRepository::new(
            Arc::new(InMemoryKeyValueStore::new(400 * 1024)),
            progress.clone(),
            3,
        ));
        let meta = quizzes
            .save("user-1", &QuizDocument::new("Exam", four_questions()))
            .await
            .expect("seed quiz should save");

        Fixture {
            service: ProgressService::new(quizzes, progress.clone()),
            progress,
            quiz_id: meta.quiz_id,
        }
    }

    fn reference_answers() -> AnswerMap {
        let mut answers = AnswerMap::new();
        answers.insert(1, BTreeSet::from(['A']));
        answers.insert(2, BTreeSet::from(['B']));
        answers.insert(3, BTreeSet::from(['C']));
        answers.insert(4, BTreeSet::from(['D']));
        answers
    }

    fn evaluate_request(answers: AnswerMap) -> EvaluateRequest {
        EvaluateRequest {
            questions: None,
            user_answers: answers,
            known_questions: BTreeSet::new(),
        }
    }

    #[test]
    fn working_set_excludes_known_and_shuffles_deterministically() {
        let options = StartSessionRequest {
            exclude_known: true,
            shuffle_questions: true,
            shuffle_choices: true,
        };
        let known = BTreeSet::from([2]);

        let first = build_working_set(&four_questions(), &known, &options, &mut StdRng::seed_from_u64(5));
        let second = build_working_set(&four_questions(), &known, &options, &mut StdRng::seed_from_u64(5));

        assert_eq!(first, second);
        let mut numbers: Vec<u32> = first.iter().map(|q| q.number).collect();
        numbers.sort();
        assert_eq!(numbers, vec![1, 3, 4]);
    }

    #[test]
    fn working_set_keeps_order_without_options() {
        let working = build_working_set(
            &four_questions(),
            &BTreeSet::from([1, 2]),
            &StartSessionRequest::default(),
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(working, four_questions());
    }

    #[tokio::test]
    async fn start_session_saves_fresh_progress_keeping_known() {
        let f = fixture().await;
        f.service.toggle_known("user-1", &f.quiz_id, 3).await.unwrap();

        let session = f
            .service
            .start_session(
                "user-1",
                &f.quiz_id,
                StartSessionRequest {
                    exclude_known: true,
                    ..Default::default()
                },
            )
            .await
            .expect("session should start");

        let numbers: Vec<u32> = session.questions.iter().map(|q| q.number).collect();
        assert_eq!(numbers, vec![1, 2, 4]);
        assert_eq!(session.progress.current_index, 0);
        assert!(session.progress.started_at.is_some());
        assert!(session.progress.known_questions.contains(&3));

        let stored = f.progress.find("user-1", &f.quiz_id).await.unwrap().unwrap();
        assert!(stored.user_answers.is_empty());
    }

    #[tokio::test]
    async fn start_session_rejects_empty_working_set() {
        let f = fixture().await;
        for n in 1..=4 {
            f.service.toggle_known("user-1", &f.quiz_id, n).await.unwrap();
        }

        let result = f
            .service
            .start_session(
                "user-1",
                &f.quiz_id,
                StartSessionRequest {
                    exclude_known: true,
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn resume_only_offers_unfinished_sessions() {
        let f = fixture().await;

        let nothing = f.service.resume("user-1", &f.quiz_id).await.unwrap();
        assert!(!nothing.resumable);

        f.service
            .save_progress(
                "user-1",
                &f.quiz_id,
                SaveProgressRequest {
                    current_index: 2,
                    user_answers: reference_answers(),
                    known_questions: BTreeSet::new(),
                },
            )
            .await
            .unwrap();

        let resumed = f.service.resume("user-1", &f.quiz_id).await.unwrap();
        let session = resumed.session.expect("session should resume");
        assert_eq!(session.progress.current_index, 2);
        assert_eq!(session.progress.user_answers, reference_answers());

        f.service
            .finish("user-1", &f.quiz_id, evaluate_request(reference_answers()))
            .await
            .unwrap();
        assert!(!f.service.resume("user-1", &f.quiz_id).await.unwrap().resumable);
    }

    #[tokio::test]
    async fn save_rejects_index_past_last_question() {
        let f = fixture().await;

        let result = f
            .service
            .save_progress(
                "user-1",
                &f.quiz_id,
                SaveProgressRequest {
                    current_index: 4,
                    user_answers: AnswerMap::new(),
                    known_questions: BTreeSet::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert!(f.progress.find("user-1", &f.quiz_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resume_fills_in_missing_start_time() {
        let f = fixture().await;
        f.progress
            .save(ProgressRecord {
                started_at: None,
                ..ProgressRecord::started("user-1", &f.quiz_id, BTreeSet::new())
            })
            .await
            .unwrap();

        let session = f.service.resume("user-1", &f.quiz_id).await.unwrap().session.unwrap();
        assert!(session.progress.started_at.is_some());
    }

    #[tokio::test]
    async fn finish_scores_and_persists_completion() {
        let f = fixture().await;
        f.service
            .start_session("user-1", &f.quiz_id, StartSessionRequest::default())
            .await
            .unwrap();

        let result = f
            .service
            .finish("user-1", &f.quiz_id, evaluate_request(reference_answers()))
            .await
            .expect("finish should work");

        assert_eq!(result.score, 50);
        assert_eq!(result.correct_count, 2);
        let wrong: Vec<u32> = result.wrong.iter().map(|w| w.number).collect();
        assert_eq!(wrong, vec![2, 3]);

        let stored = f.service.get_progress("user-1", &f.quiz_id).await.unwrap();
        assert_eq!(stored.score, Some(50));
        assert_eq!(stored.current_index, 0);
        assert!(stored.completed_at.is_some());
        assert!(stored.started_at.is_some());
    }

    #[tokio::test]
    async fn finish_rejects_malformed_working_set() {
        let f = fixture().await;
        let mut broken = question(1, &["a", "b"], &['A']);
        broken.answer = vec!['F'];

        let result = f
            .service
            .finish(
                "user-1",
                &f.quiz_id,
                EvaluateRequest {
                    questions: Some(vec![broken]),
                    user_answers: AnswerMap::new(),
                    known_questions: BTreeSet::new(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn retry_wrong_returns_wrong_subset_without_saving() {
        let f = fixture().await;

        let session = f
            .service
            .retry_wrong("user-1", &f.quiz_id, evaluate_request(reference_answers()))
            .await
            .expect("retry should work");

        let numbers: Vec<u32> = session.questions.iter().map(|q| q.number).collect();
        assert_eq!(numbers, vec![2, 3]);
        assert!(f.progress.find("user-1", &f.quiz_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn retry_wrong_with_perfect_answers_is_rejected() {
        let f = fixture().await;
        let mut answers = reference_answers();
        answers.insert(2, BTreeSet::from(['B', 'C']));
        answers.insert(3, BTreeSet::from(['A']));

        let result = f
            .service
            .retry_wrong("user-1", &f.quiz_id, evaluate_request(answers))
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn toggle_known_flips_and_persists() {
        let f = fixture().await;

        let on = f.service.toggle_known("user-1", &f.quiz_id, 2).await.unwrap();
        assert!(on.known);
        assert_eq!(on.known_count, 1);

        let off = f.service.toggle_known("user-1", &f.quiz_id, 2).await.unwrap();
        assert!(!off.known);
        assert_eq!(off.known_count, 0);
    }

    #[tokio::test]
    async fn reset_progress_clears_the_record() {
        let f = fixture().await;
        f.service
            .start_session("user-1", &f.quiz_id, StartSessionRequest::default())
            .await
            .unwrap();

        f.service.reset_progress("user-1", &f.quiz_id).await.unwrap();
        assert!(matches!(
            f.service.get_progress("user-1", &f.quiz_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn operations_on_unknown_quiz_are_not_found() {
        let f = fixture().await;
        assert!(matches!(
            f.service.start_session("user-1", "ghost", StartSessionRequest::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.toggle_known("user-2", &f.quiz_id, 1).await,
            Err(AppError::NotFound(_))
        ));
    }
}
