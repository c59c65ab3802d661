pub mod blob_store;
pub mod kv_store;
pub mod progress_repository;
pub mod quiz_repository;

pub use blob_store::{BlobStore, FsBlobStore};
pub use kv_store::{InMemoryKeyValueStore, KeyValueStore, MongoKeyValueStore, QueryFilter};
pub use progress_repository::{KvProgressRepository, ProgressRepository};
pub use quiz_repository::{ChunkedQuizRepository, QuizRepository, StoredQuiz};
