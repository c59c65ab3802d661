use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    options::IndexOptions,
    Collection, IndexModel,
};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    db::Database,
    errors::{AppError, AppResult},
};

const PK_FIELD: &str = "_pk";
const SK_FIELD: &str = "_sk";

/// Narrows a partition query or a table scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryFilter {
    All,
    AttributeExists(String),
}

impl QueryFilter {
    pub fn attribute_exists(name: &str) -> Self {
        QueryFilter::AttributeExists(name.to_string())
    }

    pub fn matches(&self, item: &Value) -> bool {
        match self {
            QueryFilter::All => true,
            QueryFilter::AttributeExists(name) => item.get(name).is_some(),
        }
    }
}

/// A partition/sort keyed document table with a per-item size ceiling.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Largest serialized item, in bytes, that `put` accepts.
    fn max_item_bytes(&self) -> usize;
    async fn put(&self, partition_key: &str, sort_key: &str, item: Value) -> AppResult<()>;
    async fn get(&self, partition_key: &str, sort_key: &str) -> AppResult<Option<Value>>;
    async fn query(&self, partition_key: &str, filter: QueryFilter) -> AppResult<Vec<Value>>;
    async fn scan(&self, filter: QueryFilter) -> AppResult<Vec<Value>>;
    async fn delete(&self, partition_key: &str, sort_key: &str) -> AppResult<()>;
}

fn check_item_size(item: &Value, max_item_bytes: usize) -> AppResult<()> {
    let size = serde_json::to_vec(item)?.len();
    if size > max_item_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "item is {} bytes, store limit is {} bytes",
            size, max_item_bytes
        )));
    }
    Ok(())
}

pub struct InMemoryKeyValueStore {
    items: RwLock<BTreeMap<(String, String), Value>>,
    max_item_bytes: usize,
}

impl InMemoryKeyValueStore {
    pub fn new(max_item_bytes: usize) -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            max_item_bytes,
        }
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    fn max_item_bytes(&self) -> usize {
        self.max_item_bytes
    }

    async fn put(&self, partition_key: &str, sort_key: &str, item: Value) -> AppResult<()> {
        check_item_size(&item, self.max_item_bytes)?;
        let mut items = self.items.write().await;
        items.insert((partition_key.to_string(), sort_key.to_string()), item);
        Ok(())
    }

    async fn get(&self, partition_key: &str, sort_key: &str) -> AppResult<Option<Value>> {
        let items = self.items.read().await;
        Ok(items
            .get(&(partition_key.to_string(), sort_key.to_string()))
            .cloned())
    }

    async fn query(&self, partition_key: &str, filter: QueryFilter) -> AppResult<Vec<Value>> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .filter(|((pk, _), item)| pk == partition_key && filter.matches(item))
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn scan(&self, filter: QueryFilter) -> AppResult<Vec<Value>> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect())
    }

    async fn delete(&self, partition_key: &str, sort_key: &str) -> AppResult<()> {
        let mut items = self.items.write().await;
        items.remove(&(partition_key.to_string(), sort_key.to_string()));
        Ok(())
    }
}

/// One collection per table. Items are stored flat with the keys added as
/// `_pk`/`_sk` fields.
pub struct MongoKeyValueStore {
    collection: Collection<Document>,
    max_item_bytes: usize,
}

impl MongoKeyValueStore {
    pub fn new(db: &Database, collection_name: &str, max_item_bytes: usize) -> Self {
        let collection = db.get_collection(collection_name);
        Self {
            collection,
            max_item_bytes,
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!(
            "Creating indexes for {} collection",
            self.collection.name()
        );

        let key_index = IndexModel::builder()
            .keys(doc! { "_pk": 1, "_sk": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("pk_sk_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(key_index).await?;

        log::info!(
            "Successfully created indexes for {} collection",
            self.collection.name()
        );
        Ok(())
    }

    fn key_filter(partition_key: &str, sort_key: &str) -> Document {
        doc! { "_pk": partition_key, "_sk": sort_key }
    }

    fn filter_document(partition_key: Option<&str>, filter: &QueryFilter) -> Document {
        let mut query = Document::new();
        if let Some(pk) = partition_key {
            query.insert(PK_FIELD, pk);
        }
        if let QueryFilter::AttributeExists(name) = filter {
            query.insert(name.as_str(), doc! { "$exists": true });
        }
        query
    }

    fn into_item(mut document: Document) -> Value {
        document.remove("_id");
        document.remove(PK_FIELD);
        document.remove(SK_FIELD);
        Bson::Document(document).into_relaxed_extjson()
    }
}

#[async_trait]
impl KeyValueStore for MongoKeyValueStore {
    fn max_item_bytes(&self) -> usize {
        self.max_item_bytes
    }

    async fn put(&self, partition_key: &str, sort_key: &str, item: Value) -> AppResult<()> {
        check_item_size(&item, self.max_item_bytes)?;

        let mut document = mongodb::bson::to_document(&item)?;
        document.insert(PK_FIELD, partition_key);
        document.insert(SK_FIELD, sort_key);

        self.collection
            .replace_one(Self::key_filter(partition_key, sort_key), document)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn get(&self, partition_key: &str, sort_key: &str) -> AppResult<Option<Value>> {
        let document = self
            .collection
            .find_one(Self::key_filter(partition_key, sort_key))
            .await?;
        Ok(document.map(Self::into_item))
    }

    async fn query(&self, partition_key: &str, filter: QueryFilter) -> AppResult<Vec<Value>> {
        let documents: Vec<Document> = self
            .collection
            .find(Self::filter_document(Some(partition_key), &filter))
            .sort(doc! { "_sk": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(documents.into_iter().map(Self::into_item).collect())
    }

    async fn scan(&self, filter: QueryFilter) -> AppResult<Vec<Value>> {
        let documents: Vec<Document> = self
            .collection
            .find(Self::filter_document(None, &filter))
            .await?
            .try_collect()
            .await?;
        Ok(documents.into_iter().map(Self::into_item).collect())
    }

    async fn delete(&self, partition_key: &str, sort_key: &str) -> AppResult<()> {
        self.collection
            .delete_one(Self::key_filter(partition_key, sort_key))
            .await?;
        Ok(())
    }
}
