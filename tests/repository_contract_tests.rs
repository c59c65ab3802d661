use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use dumpquiz_server::{
    errors::{AppError, AppResult},
    models::domain::{Choice, ProgressRecord, Question, QuizDocument},
    repositories::{
        ChunkedQuizRepository, InMemoryKeyValueStore, KeyValueStore, KvProgressRepository,
        ProgressRepository, QueryFilter, QuizRepository,
    },
};

/// Wraps the in-memory store, recording every mutating call and optionally
/// failing `put` once a number of writes have succeeded.
struct RecordingStore {
    inner: InMemoryKeyValueStore,
    log: Mutex<Vec<String>>,
    fail_after_puts: Option<usize>,
}

impl RecordingStore {
    fn new(fail_after_puts: Option<usize>) -> Self {
        Self {
            inner: InMemoryKeyValueStore::new(400 * 1024),
            log: Mutex::new(Vec::new()),
            fail_after_puts,
        }
    }

    async fn operations(&self) -> Vec<String> {
        self.log.lock().await.clone()
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    fn max_item_bytes(&self) -> usize {
        self.inner.max_item_bytes()
    }

    async fn put(&self, partition_key: &str, sort_key: &str, item: Value) -> AppResult<()> {
        let mut log = self.log.lock().await;
        let puts = log.iter().filter(|op| op.starts_with("put")).count();
        if self.fail_after_puts.is_some_and(|limit| puts >= limit) {
            return Err(AppError::DatabaseError("store unavailable".to_string()));
        }
        log.push(format!("put {}", sort_key));
        drop(log);
        self.inner.put(partition_key, sort_key, item).await
    }

    async fn get(&self, partition_key: &str, sort_key: &str) -> AppResult<Option<Value>> {
        self.inner.get(partition_key, sort_key).await
    }

    async fn query(&self, partition_key: &str, filter: QueryFilter) -> AppResult<Vec<Value>> {
        self.inner.query(partition_key, filter).await
    }

    async fn scan(&self, filter: QueryFilter) -> AppResult<Vec<Value>> {
        self.inner.scan(filter).await
    }

    async fn delete(&self, partition_key: &str, sort_key: &str) -> AppResult<()> {
        self.log.lock().await.push(format!("delete {}", sort_key));
        self.inner.delete(partition_key, sort_key).await
    }
}

fn sample_question(number: u32) -> Question {
    Question {
        number,
        text: format!("Which option is right for question {}?", number),
        choices: vec![
            Choice::new('A', "first"),
            Choice::new('B', "second"),
            Choice::new('C', "third"),
        ],
        answer: vec!['B'],
        explanation: String::new(),
    }
}

fn document(name: &str, count: u32) -> QuizDocument {
    QuizDocument::new(name, (1..=count).map(sample_question).collect())
}

fn progress_repository() -> Arc<KvProgressRepository> {
    Arc::new(KvProgressRepository::new(Arc::new(
        InMemoryKeyValueStore::new(64 * 1024),
    )))
}

#[tokio::test]
async fn test_chunked_round_trip_preserves_order() {
    for (count, chunk_size) in [(1, 50), (49, 50), (50, 50), (51, 50), (120, 50), (10, 3)] {
        let store = Arc::new(InMemoryKeyValueStore::new(400 * 1024));
        let repo = ChunkedQuizRepository::new(store.clone(), progress_repository(), chunk_size);
        let doc = document("Round Trip", count);

        let meta = repo.save("owner-1", &doc).await.expect("save should succeed");
        let expected_chunks = (count as usize).div_ceil(chunk_size);
        assert_eq!(meta.chunk_count, expected_chunks);
        assert_eq!(store.len().await, expected_chunks + 1);

        let stored = repo
            .find_by_id("owner-1", &meta.quiz_id)
            .await
            .expect("read should succeed")
            .expect("quiz should exist");
        assert_eq!(stored.questions, doc.questions);
        assert_eq!(stored.meta, meta);
    }
}

#[tokio::test]
async fn test_write_order_is_metadata_then_ascending_chunks() {
    let store = Arc::new(RecordingStore::new(None));
    let repo = ChunkedQuizRepository::new(store.clone(), progress_repository(), 2);

    let meta = repo.save("owner-1", &document("Ordered", 5)).await.unwrap();

    let id = &meta.quiz_id;
    assert_eq!(
        store.operations().await,
        vec![
            format!("put {}", id),
            format!("put {}#chunk#0", id),
            format!("put {}#chunk#1", id),
            format!("put {}#chunk#2", id),
        ]
    );
}

#[tokio::test]
async fn test_interrupted_write_leaves_partial_quiz_readable() {
    // Metadata and the first chunk land, the second chunk write fails.
    let store = Arc::new(RecordingStore::new(Some(2)));
    let repo = ChunkedQuizRepository::new(store.clone(), progress_repository(), 2);
    let doc = document("Partial", 5);

    let result = repo.save("owner-1", &doc).await;
    assert!(matches!(result, Err(AppError::DatabaseError(_))));

    let quiz_id = doc.quiz_id();
    let stored = repo
        .find_by_id("owner-1", &quiz_id)
        .await
        .unwrap()
        .expect("metadata was written first");
    assert_eq!(stored.meta.chunk_count, 3);
    assert_eq!(stored.questions, doc.questions[..2].to_vec());
}

#[tokio::test]
async fn test_delete_removes_chunks_before_metadata_and_progress() {
    let store = Arc::new(RecordingStore::new(None));
    let progress = progress_repository();
    let repo = ChunkedQuizRepository::new(store.clone(), progress.clone(), 2);

    let meta = repo.save("owner-1", &document("Doomed", 3)).await.unwrap();
    progress
        .save(ProgressRecord::started("owner-1", &meta.quiz_id, BTreeSet::from([1])))
        .await
        .unwrap();

    assert!(repo.delete("owner-1", &meta.quiz_id).await.unwrap());

    let id = &meta.quiz_id;
    let deletes: Vec<String> = store
        .operations()
        .await
        .into_iter()
        .filter(|op| op.starts_with("delete"))
        .collect();
    assert_eq!(
        deletes,
        vec![
            format!("delete {}#chunk#0", id),
            format!("delete {}#chunk#1", id),
            format!("delete {}", id),
        ]
    );
    assert!(repo.find_by_id("owner-1", id).await.unwrap().is_none());
    assert!(progress.find("owner-1", id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_listing_excludes_chunks_and_other_owners() {
    let store = Arc::new(InMemoryKeyValueStore::new(400 * 1024));
    let repo = ChunkedQuizRepository::new(store, progress_repository(), 1);

    repo.save("owner-1", &document("Alpha", 4)).await.unwrap();
    repo.save("owner-1", &document("Beta", 2)).await.unwrap();
    repo.save("owner-2", &document("Gamma", 2)).await.unwrap();

    let listed = repo.list_by_owner("owner-1").await.unwrap();
    let mut names: Vec<&str> = listed.iter().map(|m| m.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Alpha", "Beta"]);
    assert!(listed.iter().all(|m| m.owner == "owner-1"));

    assert_eq!(repo.list_all().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_store_ceiling_rejects_oversized_items() {
    let store = Arc::new(InMemoryKeyValueStore::new(512));
    let repo = ChunkedQuizRepository::new(store.clone(), progress_repository(), 50);

    let result = repo.save("owner-1", &document("Too Big", 20)).await;
    assert!(matches!(result, Err(AppError::PayloadTooLarge(_))));
}
