//! Configuration module
//!
//! This module loads service configuration from the environment (and `.env`),
//! covering the HTTP server, document store, blob storage, and upload pipeline.

use std::env;
use std::time::Duration;

use crate::storage_types::{DocumentStoreBackend, StorageBackend};

// Common constants
const SERVER_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_SIZE_MB: usize = 512;
const UPLOAD_LOCK_TIMEOUT_MS: u64 = 2000;
const UPLOAD_TOKEN_TTL_SECS: u64 = 3600;
const URI_CHECK_TIMEOUT_SECS: u64 = 10;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub log_format: String,
    // Document store
    pub document_store: DocumentStoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Blob storage
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    // Upload pipeline
    pub max_upload_size_bytes: usize,
    pub upload_lock_timeout_ms: u64,
    pub upload_token_ttl_secs: u64,
    pub uri_check_enabled: bool,
    pub uri_check_timeout_secs: u64,
    pub uri_allow_private_hosts: bool,
    // If set, only URIs on these domains (or their subdomains) are accepted
    pub url_upload_allowlist: Option<Vec<String>>,
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v.to_lowercase().parse().unwrap_or(default))
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let document_store = env::var("DOCUMENT_STORE")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .parse()?;

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .unwrap_or(SERVER_PORT),
            environment,
            cors_origins,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string())
                .to_lowercase(),
            document_store,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            max_upload_size_bytes: env::var("MAX_UPLOAD_SIZE_MB")
                .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(MAX_UPLOAD_SIZE_MB)
                * 1024
                * 1024,
            upload_lock_timeout_ms: env::var("UPLOAD_LOCK_TIMEOUT_MS")
                .unwrap_or_else(|_| UPLOAD_LOCK_TIMEOUT_MS.to_string())
                .parse()
                .unwrap_or(UPLOAD_LOCK_TIMEOUT_MS),
            upload_token_ttl_secs: env::var("UPLOAD_TOKEN_TTL_SECONDS")
                .unwrap_or_else(|_| UPLOAD_TOKEN_TTL_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_TOKEN_TTL_SECS),
            uri_check_enabled: env_bool("URI_CHECK_ENABLED", true),
            uri_check_timeout_secs: env::var("URI_CHECK_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| URI_CHECK_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(URI_CHECK_TIMEOUT_SECS),
            uri_allow_private_hosts: env_bool("URI_ALLOW_PRIVATE_HOSTS", false),
            url_upload_allowlist: env::var("URL_UPLOAD_ALLOWLIST").ok().map(|s| {
                s.split(',')
                    .map(|domain| domain.trim().to_lowercase())
                    .filter(|domain| !domain.is_empty())
                    .collect()
            }),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.document_store == DocumentStoreBackend::Postgres {
            match self.database_url.as_deref() {
                None => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be set when DOCUMENT_STORE=postgres"
                    ))
                }
                Some(url) if !url.starts_with("postgres://") && !url.starts_with("postgresql://") => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ))
                }
                _ => {}
            }
        }

        if self.storage_backend == StorageBackend::S3
            && (self.s3_bucket.is_none() || self.s3_region.is_none())
        {
            return Err(anyhow::anyhow!(
                "STORAGE_BACKEND=s3 requires S3_BUCKET and S3_REGION (or AWS_REGION)"
            ));
        }

        if self.storage_backend == StorageBackend::Local
            && (self.local_storage_path.is_none() || self.local_storage_base_url.is_none())
        {
            return Err(anyhow::anyhow!(
                "STORAGE_BACKEND=local requires LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL"
            ));
        }

        if self.upload_lock_timeout_ms == 0 {
            return Err(anyhow::anyhow!("UPLOAD_LOCK_TIMEOUT_MS must be greater than 0"));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.is_production() && self.document_store == DocumentStoreBackend::Memory {
            tracing::warn!("DOCUMENT_STORE=memory in production: resources and tokens are not durable");
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }

    pub fn document_store(&self) -> DocumentStoreBackend {
        self.document_store
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage_backend
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.local_storage_base_url.as_deref()
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.max_upload_size_bytes
    }

    pub fn upload_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_lock_timeout_ms)
    }

    pub fn upload_token_ttl(&self) -> Duration {
        Duration::from_secs(self.upload_token_ttl_secs)
    }

    pub fn uri_check_enabled(&self) -> bool {
        self.uri_check_enabled
    }

    pub fn uri_check_timeout(&self) -> Duration {
        Duration::from_secs(self.uri_check_timeout_secs)
    }

    pub fn uri_allow_private_hosts(&self) -> bool {
        self.uri_allow_private_hosts
    }

    pub fn url_upload_allowlist(&self) -> Option<&[String]> {
        self.url_upload_allowlist.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 3000,
            environment: "test".to_string(),
            cors_origins: vec!["*".to_string()],
            log_format: "text".to_string(),
            document_store: DocumentStoreBackend::Memory,
            database_url: None,
            db_max_connections: 5,
            db_timeout_seconds: 5,
            storage_backend: StorageBackend::Local,
            local_storage_path: Some("/tmp/tessera".to_string()),
            local_storage_base_url: Some("http://localhost:3000/files".to_string()),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            max_upload_size_bytes: 1024,
            upload_lock_timeout_ms: 100,
            upload_token_ttl_secs: 60,
            uri_check_enabled: false,
            uri_check_timeout_secs: 1,
            uri_allow_private_hosts: false,
            url_upload_allowlist: None,
        }
    }

    #[test]
    fn test_memory_store_needs_no_database() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let mut config = base_config();
        config.document_store = DocumentStoreBackend::Postgres;
        assert!(config.validate().is_err());

        config.database_url = Some("mysql://nope".to_string());
        assert!(config.validate().is_err());

        config.database_url = Some("postgresql://localhost/tessera".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_s3_requires_bucket_and_region() {
        let mut config = base_config();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());

        config.s3_bucket = Some("media".to_string());
        config.s3_region = Some("us-east-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_lock_timeout_rejected() {
        let mut config = base_config();
        config.upload_lock_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations() {
        let config = base_config();
        assert_eq!(config.upload_lock_timeout(), Duration::from_millis(100));
        assert_eq!(config.upload_token_ttl(), Duration::from_secs(60));
        assert!(!config.is_production());
    }
}
