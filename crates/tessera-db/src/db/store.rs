use std::time::Duration;

use async_trait::async_trait;
use tessera_core::models::Resource;
use tessera_core::AppError;
use uuid::Uuid;

/// Document store for resources.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn load(&self, id: Uuid) -> Result<Option<Resource>, AppError>;

    /// Write the whole document in one step. Fails with `NotFound` for unknown ids.
    async fn persist(&self, resource: &Resource) -> Result<(), AppError>;

    /// Create or overwrite a resource document.
    async fn insert(&self, resource: &Resource) -> Result<(), AppError>;

    /// Readiness probe.
    async fn ping(&self) -> Result<(), AppError>;
}

/// One-time upload token store, keyed by resource id.
#[async_trait]
pub trait UploadTokenStore: Send + Sync {
    /// Mint a token for the resource, replacing any outstanding one.
    async fn issue(&self, resource_id: Uuid, ttl: Duration) -> Result<String, AppError>;

    /// Take the stored token and compare it with `token`.
    ///
    /// The stored token is gone after this call whatever the outcome, so two
    /// concurrent uses can never both succeed.
    async fn consume(&self, resource_id: Uuid, token: &str) -> Result<(), AppError>;

    /// Drop any token held for the resource.
    async fn invalidate(&self, resource_id: Uuid) -> Result<(), AppError>;
}
