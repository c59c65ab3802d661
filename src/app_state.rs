use std::sync::Arc;

use crate::{
    config::{Config, StoreBackend},
    db::Database,
    errors::AppResult,
    parser::PageNormalizer,
    repositories::{
        BlobStore, ChunkedQuizRepository, FsBlobStore, InMemoryKeyValueStore, KeyValueStore,
        KvProgressRepository, MongoKeyValueStore,
    },
    services::{AdminService, ProgressService, QuizService},
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: Arc<QuizService>,
    pub progress_service: Arc<ProgressService>,
    pub admin_service: Arc<AdminService>,
    pub db: Option<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let archive: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(&config.archive_dir));

        match config.store_backend {
            StoreBackend::Memory => {
                log::warn!("Using the in-memory store; data is lost on restart");
                let quizzes = Arc::new(InMemoryKeyValueStore::new(config.store_max_item_bytes));
                let progress = Arc::new(InMemoryKeyValueStore::new(config.store_max_item_bytes));
                Ok(Self::with_stores(config, quizzes, progress, archive, None))
            }
            StoreBackend::Mongo => {
                let db = Database::connect(&config).await?;

                let quizzes = Arc::new(MongoKeyValueStore::new(
                    &db,
                    &config.quizzes_collection,
                    config.store_max_item_bytes,
                ));
                quizzes.ensure_indexes().await?;

                let progress = Arc::new(MongoKeyValueStore::new(
                    &db,
                    &config.progress_collection,
                    config.store_max_item_bytes,
                ));
                progress.ensure_indexes().await?;

                Ok(Self::with_stores(config, quizzes, progress, archive, Some(db)))
            }
        }
    }

    /// Wires the services over already constructed stores.
    pub fn with_stores(
        config: Config,
        quiz_store: Arc<dyn KeyValueStore>,
        progress_store: Arc<dyn KeyValueStore>,
        archive: Arc<dyn BlobStore>,
        db: Option<Database>,
    ) -> Self {
        let progress_repository = Arc::new(KvProgressRepository::new(progress_store));
        let quiz_repository = Arc::new(ChunkedQuizRepository::new(
            quiz_store,
            progress_repository.clone(),
            config.quiz_chunk_size,
        ));

        let quiz_service = Arc::new(QuizService::new(
            quiz_repository.clone(),
            archive,
            PageNormalizer::new(&config.page_header_phrase),
        ));
        let progress_service = Arc::new(ProgressService::new(
            quiz_repository.clone(),
            progress_repository.clone(),
        ));
        let admin_service = Arc::new(AdminService::new(quiz_repository, progress_repository));

        Self {
            quiz_service,
            progress_service,
            admin_service,
            db,
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_cloneable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_memory_backend_needs_no_database() {
        let state = AppState::new(Config::test_config())
            .await
            .expect("in-memory state should build");
        assert!(state.db.is_none());
        assert!(state.quiz_service.list_quizzes("nobody").await.unwrap().is_empty());
    }
}
