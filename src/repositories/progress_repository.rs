use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    errors::AppResult,
    models::domain::ProgressRecord,
    repositories::kv_store::{KeyValueStore, QueryFilter},
};

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Full overwrite of the (owner, quiz) record.
    async fn save(&self, record: ProgressRecord) -> AppResult<ProgressRecord>;
    async fn find(&self, owner: &str, quiz_id: &str) -> AppResult<Option<ProgressRecord>>;
    async fn delete(&self, owner: &str, quiz_id: &str) -> AppResult<()>;
    async fn list_by_owner(&self, owner: &str) -> AppResult<Vec<ProgressRecord>>;
    async fn list_all(&self) -> AppResult<Vec<ProgressRecord>>;
}

pub struct KvProgressRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvProgressRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn decode_all(items: Vec<serde_json::Value>) -> Vec<ProgressRecord> {
        items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(err) => {
                    log::warn!("Skipping unreadable progress record: {}", err);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl ProgressRepository for KvProgressRepository {
    async fn save(&self, record: ProgressRecord) -> AppResult<ProgressRecord> {
        let item = serde_json::to_value(&record)?;
        self.store.put(&record.owner, &record.quiz_id, item).await?;
        Ok(record)
    }

    async fn find(&self, owner: &str, quiz_id: &str) -> AppResult<Option<ProgressRecord>> {
        match self.store.get(owner, quiz_id).await? {
            Some(item) => Ok(Some(serde_json::from_value(item)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, owner: &str, quiz_id: &str) -> AppResult<()> {
        self.store.delete(owner, quiz_id).await
    }

    async fn list_by_owner(&self, owner: &str) -> AppResult<Vec<ProgressRecord>> {
        let items = self.store.query(owner, QueryFilter::All).await?;
        Ok(Self::decode_all(items))
    }

    async fn list_all(&self) -> AppResult<Vec<ProgressRecord>> {
        let items = self.store.scan(QueryFilter::All).await?;
        Ok(Self::decode_all(items))
    }
}
