use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};
use std::time::Duration;

use crate::{config::Config, errors::AppResult};

/// Handle on the configured MongoDB database, shared by both store
/// collections and the readiness probe.
#[derive(Clone)]
pub struct Database {
    client: Client,
    db_name: String,
}

/// Applies pool sizing and timeouts from `config` onto parsed client options.
fn apply_pool_settings(options: &mut ClientOptions, config: &Config) {
    let timeout = Duration::from_secs(config.mongo_timeout_secs);

    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
    options.max_pool_size = Some(config.mongo_max_pool_size);
    options.min_pool_size = Some(config.mongo_min_pool_size.min(config.mongo_max_pool_size));
    options.connect_timeout = Some(timeout);
    options.server_selection_timeout = Some(timeout);
    options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut client_options = ClientOptions::parse(&config.mongo_conn_string).await?;
        apply_pool_settings(&mut client_options, config);

        let client = Client::with_options(client_options)?;
        let database = Self {
            client,
            db_name: config.mongo_db_name.clone(),
        };
        database.health_check().await?;

        log::info!(
            "Connected to MongoDB database '{}' (pool {}..{})",
            database.db_name,
            config.mongo_min_pool_size,
            config.mongo_max_pool_size
        );
        Ok(database)
    }

    pub fn get_collection<T>(&self, collection_name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.client
            .database(&self.db_name)
            .collection(collection_name)
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}
