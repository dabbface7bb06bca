use std::sync::Arc;

use tessera_core::AppError;
use tessera_db::UploadTokenStore;
use uuid::Uuid;

/// Single-use check of upload tokens.
///
/// Every attempt burns the token, whether or not it matched, so a caller must
/// obtain a fresh token before retrying. A successful consume removes the token
/// itself; a failed one invalidates whatever token the resource holds.
#[derive(Clone)]
pub struct TokenGate {
    store: Arc<dyn UploadTokenStore>,
}

impl TokenGate {
    pub fn new(store: Arc<dyn UploadTokenStore>) -> Self {
        Self { store }
    }

    pub async fn consume(&self, resource_id: Uuid, token: &str) -> Result<(), AppError> {
        let Err(e) = self.store.consume(resource_id, token).await else {
            return Ok(());
        };

        tracing::debug!(resource_id = %resource_id, error = %e, "Upload token rejected");
        if let Err(e) = self.store.invalidate(resource_id).await {
            tracing::warn!(resource_id = %resource_id, error = %e, "Failed to invalidate upload token");
        }

        Err(AppError::Unauthorized(
            "Invalid or expired upload token.".to_string(),
        ))
    }
}
