use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    errors::AppResult,
    models::domain::{
        quiz::{chunk_key, QuizChunk},
        Question, QuizDocument, QuizMeta,
    },
    repositories::{
        kv_store::{KeyValueStore, QueryFilter},
        progress_repository::ProgressRepository,
    },
};

pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Metadata rows carry `name`; chunk rows sharing the partition never do.
const META_DISCRIMINATOR: &str = "name";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredQuiz {
    pub meta: QuizMeta,
    pub questions: Vec<Question>,
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn save(&self, owner: &str, document: &QuizDocument) -> AppResult<QuizMeta>;
    async fn find_meta(&self, owner: &str, quiz_id: &str) -> AppResult<Option<QuizMeta>>;
    async fn find_by_id(&self, owner: &str, quiz_id: &str) -> AppResult<Option<StoredQuiz>>;
    async fn list_by_owner(&self, owner: &str) -> AppResult<Vec<QuizMeta>>;
    async fn list_all(&self) -> AppResult<Vec<QuizMeta>>;
    /// Returns false when no metadata existed for the quiz.
    async fn delete(&self, owner: &str, quiz_id: &str) -> AppResult<bool>;
}

/// Stores a quiz as one metadata row plus `ceil(n / chunk_size)` chunk rows
/// so that no single item outgrows the store's per-item ceiling.
///
/// Writes and deletes are plain ordered sequences with no transaction:
/// metadata is written before any chunk, and chunks are deleted before the
/// metadata. An interrupted delete can leave orphaned chunk rows behind.
pub struct ChunkedQuizRepository {
    store: Arc<dyn KeyValueStore>,
    progress: Arc<dyn ProgressRepository>,
    chunk_size: usize,
}

impl ChunkedQuizRepository {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        progress: Arc<dyn ProgressRepository>,
        chunk_size: usize,
    ) -> Self {
        Self {
            store,
            progress,
            chunk_size: chunk_size.max(1),
        }
    }

    fn decode_metas(items: Vec<serde_json::Value>) -> Vec<QuizMeta> {
        let mut metas: Vec<QuizMeta> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(meta) => Some(meta),
                Err(err) => {
                    log::warn!("Skipping unreadable quiz metadata: {}", err);
                    None
                }
            })
            .collect();
        metas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        metas
    }
}

#[async_trait]
impl QuizRepository for ChunkedQuizRepository {
    async fn save(&self, owner: &str, document: &QuizDocument) -> AppResult<QuizMeta> {
        let quiz_id = document.quiz_id();
        let chunks: Vec<&[Question]> = document.questions.chunks(self.chunk_size).collect();

        let meta = QuizMeta {
            owner: owner.to_string(),
            quiz_id: quiz_id.clone(),
            name: document.name.clone(),
            question_count: document.questions.len(),
            chunk_count: chunks.len(),
            created_at: document.created_at,
            updated_at: document.created_at,
        };

        self.store
            .put(owner, &quiz_id, serde_json::to_value(&meta)?)
            .await?;

        for (index, questions) in chunks.into_iter().enumerate() {
            let chunk = QuizChunk {
                owner: owner.to_string(),
                quiz_id: chunk_key(&quiz_id, index),
                questions: questions.to_vec(),
            };
            self.store
                .put(owner, &chunk.quiz_id, serde_json::to_value(&chunk)?)
                .await?;
        }

        log::info!(
            "Saved quiz '{}' for {} ({} questions in {} chunks)",
            quiz_id,
            owner,
            meta.question_count,
            meta.chunk_count
        );
        Ok(meta)
    }

    async fn find_meta(&self, owner: &str, quiz_id: &str) -> AppResult<Option<QuizMeta>> {
        match self.store.get(owner, quiz_id).await? {
            Some(item) if QueryFilter::attribute_exists(META_DISCRIMINATOR).matches(&item) => {
                Ok(Some(serde_json::from_value(item)?))
            }
            // A chunk key addresses a chunk row, which is not a quiz.
            Some(_) | None => Ok(None),
        }
    }

    async fn find_by_id(&self, owner: &str, quiz_id: &str) -> AppResult<Option<StoredQuiz>> {
        let Some(meta) = self.find_meta(owner, quiz_id).await? else {
            return Ok(None);
        };

        let mut questions = Vec::with_capacity(meta.question_count);
        for index in 0..meta.chunk_count {
            match self.store.get(owner, &chunk_key(quiz_id, index)).await? {
                Some(item) => {
                    let chunk: QuizChunk = serde_json::from_value(item)?;
                    questions.extend(chunk.questions);
                }
                None => log::warn!(
                    "Quiz '{}' is missing chunk {} of {}; continuing without it",
                    quiz_id,
                    index,
                    meta.chunk_count
                ),
            }
        }

        Ok(Some(StoredQuiz { meta, questions }))
    }

    async fn list_by_owner(&self, owner: &str) -> AppResult<Vec<QuizMeta>> {
        let items = self
            .store
            .query(owner, QueryFilter::attribute_exists(META_DISCRIMINATOR))
            .await?;
        Ok(Self::decode_metas(items))
    }

    async fn list_all(&self) -> AppResult<Vec<QuizMeta>> {
        let items = self
            .store
            .scan(QueryFilter::attribute_exists(META_DISCRIMINATOR))
            .await?;
        Ok(Self::decode_metas(items))
    }

    async fn delete(&self, owner: &str, quiz_id: &str) -> AppResult<bool> {
        let meta = self.find_meta(owner, quiz_id).await?;

        if let Some(meta) = &meta {
            for index in 0..meta.chunk_count {
                self.store.delete(owner, &chunk_key(quiz_id, index)).await?;
            }
            self.store.delete(owner, quiz_id).await?;
        }

        self.progress.delete(owner, quiz_id).await?;

        log::info!("Deleted quiz '{}' for {}", quiz_id, owner);
        Ok(meta.is_some())
    }
}
