//! In-memory stores
//!
//! Used for tests and for single-process deployments (`DOCUMENT_STORE=memory`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tessera_core::models::Resource;
use tessera_core::AppError;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::store::{ResourceStore, UploadTokenStore};
use super::upload_token::{expiry_from, generate_upload_token, hash_upload_token, verify_token};

#[derive(Clone, Default)]
pub struct MemoryResourceStore {
    resources: Arc<Mutex<HashMap<Uuid, Resource>>>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.resources.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.resources.lock().await.is_empty()
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn load(&self, id: Uuid) -> Result<Option<Resource>, AppError> {
        Ok(self.resources.lock().await.get(&id).cloned())
    }

    async fn persist(&self, resource: &Resource) -> Result<(), AppError> {
        let mut resources = self.resources.lock().await;
        match resources.get_mut(&resource.id) {
            Some(stored) => {
                *stored = resource.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Resource {} not found",
                resource.id
            ))),
        }
    }

    async fn insert(&self, resource: &Resource) -> Result<(), AppError> {
        self.resources
            .lock()
            .await
            .insert(resource.id, resource.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

struct StoredToken {
    hash: String,
    expires_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    tokens: Arc<Mutex<HashMap<Uuid, StoredToken>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a token is currently outstanding for the resource.
    pub async fn has_token(&self, resource_id: Uuid) -> bool {
        self.tokens.lock().await.contains_key(&resource_id)
    }
}

#[async_trait]
impl UploadTokenStore for MemoryTokenStore {
    async fn issue(&self, resource_id: Uuid, ttl: Duration) -> Result<String, AppError> {
        let token = generate_upload_token();
        let stored = StoredToken {
            hash: hash_upload_token(&token),
            expires_at: expiry_from(ttl)?,
        };
        self.tokens.lock().await.insert(resource_id, stored);
        Ok(token)
    }

    async fn consume(&self, resource_id: Uuid, token: &str) -> Result<(), AppError> {
        let stored = self.tokens.lock().await.remove(&resource_id).ok_or_else(|| {
            AppError::Unauthorized("No upload token outstanding for resource".to_string())
        })?;

        verify_token(token, &stored.hash, stored.expires_at)
    }

    async fn invalidate(&self, resource_id: Uuid) -> Result<(), AppError> {
        self.tokens.lock().await.remove(&resource_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::models::ResourceType;

    #[tokio::test]
    async fn test_persist_requires_existing_resource() {
        let store = MemoryResourceStore::new();
        let mut resource = Resource::new(ResourceType::Video, "clip");

        assert!(matches!(
            store.persist(&resource).await,
            Err(AppError::NotFound(_))
        ));

        store.insert(&resource).await.unwrap();
        resource.title = "renamed".to_string();
        store.persist(&resource).await.unwrap();

        let loaded = store.load(resource.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "renamed");
        assert!(store.load(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_is_single_use() {
        let store = MemoryTokenStore::new();
        let id = Uuid::new_v4();
        let token = store.issue(id, Duration::from_secs(60)).await.unwrap();

        assert!(store.consume(id, &token).await.is_ok());
        assert!(matches!(
            store.consume(id, &token).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_token_still_consumes() {
        let store = MemoryTokenStore::new();
        let id = Uuid::new_v4();
        let token = store.issue(id, Duration::from_secs(60)).await.unwrap();

        assert!(store.consume(id, "ut_wrong").await.is_err());
        assert!(!store.has_token(id).await);
        assert!(store.consume(id, &token).await.is_err());
    }

    #[tokio::test]
    async fn test_reissue_replaces_token() {
        let store = MemoryTokenStore::new();
        let id = Uuid::new_v4();
        let first = store.issue(id, Duration::from_secs(60)).await.unwrap();
        let second = store.issue(id, Duration::from_secs(60)).await.unwrap();
        assert_ne!(first, second);

        // The first token no longer matches, and the attempt burns the second one.
        assert!(store.consume(id, &first).await.is_err());
        assert!(store.consume(id, &second).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let store = MemoryTokenStore::new();
        let id = Uuid::new_v4();
        let token = store.issue(id, Duration::ZERO).await.unwrap();
        assert!(store.consume(id, &token).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_consume_single_winner() {
        let store = MemoryTokenStore::new();
        let id = Uuid::new_v4();
        let token = store.issue(id, Duration::from_secs(60)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let token = token.clone();
            handles.push(tokio::spawn(async move { store.consume(id, &token).await }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }
}
