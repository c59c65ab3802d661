use std::env;
use secrecy::SecretString;

use crate::repositories::quiz_repository::DEFAULT_CHUNK_SIZE;

pub const DEFAULT_JWT_SECRET: &str = "dev_secret_key_change_in_production";
pub const DEFAULT_PAGE_HEADER_PHRASE: &str = "IT Certification Guaranteed, The Easy Way!";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => StoreBackend::Memory,
            _ => StoreBackend::Mongo,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub quizzes_collection: String,
    pub progress_collection: String,
    pub mongo_max_pool_size: u32,
    pub mongo_min_pool_size: u32,
    pub mongo_timeout_secs: u64,
    pub store_max_item_bytes: usize,
    pub quiz_chunk_size: usize,
    pub archive_dir: String,
    pub page_header_phrase: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            store_backend: StoreBackend::parse(
                &env::var("STORE_BACKEND").unwrap_or_else(|_| "mongo".to_string()),
            ),
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME").unwrap_or_else(|_| "dumpquiz-local".to_string()),
            quizzes_collection: env::var("QUIZZES_COLLECTION")
                .unwrap_or_else(|_| "quizzes".to_string()),
            progress_collection: env::var("PROGRESS_COLLECTION")
                .unwrap_or_else(|_| "progress".to_string()),
            mongo_max_pool_size: env::var("MONGO_MAX_POOL_SIZE")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(10),
            mongo_min_pool_size: env::var("MONGO_MIN_POOL_SIZE")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(2),
            mongo_timeout_secs: env::var("MONGO_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(5),
            store_max_item_bytes: env::var("STORE_MAX_ITEM_BYTES")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or(400 * 1024),
            quiz_chunk_size: env::var("QUIZ_CHUNK_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            archive_dir: env::var("ARCHIVE_DIR").unwrap_or_else(|_| "./archive".to_string()),
            page_header_phrase: env::var("PAGE_HEADER_PHRASE")
                .unwrap_or_else(|_| DEFAULT_PAGE_HEADER_PHRASE.to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: SecretString::from(
                env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            ),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(24),
        }
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEFAULT_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET is using default value! Set JWT_SECRET environment variable to a secure random string."
            );
        }

        if jwt_secret.len() < 32 {
            panic!(
                "FATAL: JWT_SECRET is too short ({}). Must be at least 32 characters for security.",
                jwt_secret.len()
            );
        }

        if self.quiz_chunk_size == 0 {
            panic!("FATAL: QUIZ_CHUNK_SIZE must be at least 1.");
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "dumpquiz-test".to_string(),
            quizzes_collection: "quizzes".to_string(),
            progress_collection: "progress".to_string(),
            mongo_max_pool_size: 4,
            mongo_min_pool_size: 1,
            mongo_timeout_secs: 2,
            store_max_item_bytes: 400 * 1024,
            quiz_chunk_size: DEFAULT_CHUNK_SIZE,
            archive_dir: std::env::temp_dir()
                .join("dumpquiz-test-archive")
                .to_string_lossy()
                .into_owned(),
            page_header_phrase: DEFAULT_PAGE_HEADER_PHRASE.to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_expiration_hours: 1,
        }
    }
}
