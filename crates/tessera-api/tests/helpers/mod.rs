#![allow(dead_code)]

use axum_test::TestServer;
use std::sync::Arc;
use tempfile::TempDir;
use tessera_api::constants::api_path;
use tessera_api::setup::routes::setup_routes;
use tessera_api::setup::services::{initialize_services, Stores};
use tessera_api::AppState;
use tessera_core::models::{Resource, ResourceType};
use tessera_core::{Config, DocumentStoreBackend, StorageBackend};
use tessera_storage::LocalStorage;
use uuid::Uuid;

/// Test application over the in-memory stores and a temporary local storage.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// Get the HTTP test client
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub async fn insert(&self, resource: Resource) -> Resource {
        self.state
            .resources
            .insert(&resource)
            .await
            .expect("Failed to insert resource");
        resource
    }

    pub async fn create_resource(&self, resource_type: ResourceType) -> Resource {
        self.insert(Resource::new(resource_type, "test resource")).await
    }

    pub async fn issue_token(&self, resource_id: Uuid) -> String {
        self.state
            .tokens
            .issue(resource_id, self.state.config.upload_token_ttl())
            .await
            .expect("Failed to issue upload token")
    }

    pub async fn stored(&self, resource_id: Uuid) -> Resource {
        self.state
            .resources
            .load(resource_id)
            .await
            .expect("Failed to load resource")
            .expect("Resource missing")
    }

    /// Number of files written to the local storage directory.
    pub fn stored_blob_count(&self) -> usize {
        fn count(dir: &std::path::Path) -> usize {
            std::fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .filter_map(Result::ok)
                        .map(|entry| {
                            let path = entry.path();
                            if path.is_dir() {
                                count(&path)
                            } else {
                                1
                            }
                        })
                        .sum()
                })
                .unwrap_or(0)
        }
        count(self._temp_dir.path())
    }
}

pub fn upload_path(resource_id: impl std::fmt::Display, token: &str) -> String {
    api_path(&format!("/resources/{}/content/{}", resource_id, token))
}

pub fn create_test_config(storage_path: &str) -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        log_format: "text".to_string(),
        document_store: DocumentStoreBackend::Memory,
        database_url: None,
        db_max_connections: 1,
        db_timeout_seconds: 1,
        storage_backend: StorageBackend::Local,
        local_storage_path: Some(storage_path.to_string()),
        local_storage_base_url: Some("http://localhost:3000/files".to_string()),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        max_upload_size_bytes: 1024 * 1024,
        upload_lock_timeout_ms: 100,
        upload_token_ttl_secs: 60,
        uri_check_enabled: false,
        uri_check_timeout_secs: 1,
        uri_allow_private_hosts: false,
        url_upload_allowlist: None,
    }
}

/// Setup a test application with isolated stores
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

pub async fn setup_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_path = temp_dir.path().to_string_lossy().to_string();

    let mut config = create_test_config(&storage_path);
    customize(&mut config);

    let storage = Arc::new(
        LocalStorage::new(
            temp_dir.path(),
            "http://localhost:3000/files".to_string(),
        )
        .await
        .expect("Failed to create local storage"),
    );

    let state = initialize_services(&config, Stores::memory(), storage)
        .expect("Failed to initialize services");
    let router = setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}
