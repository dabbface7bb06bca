use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use subtle::ConstantTimeEq;
use tessera_core::AppError;
use uuid::Uuid;

use super::store::UploadTokenStore;

/// Generate a random upload token (`ut_` followed by 48 hex chars).
pub fn generate_upload_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..24).map(|_| rng.random()).collect();
    format!("ut_{}", hex::encode(random_bytes))
}

/// Hex SHA-256 digest of a token. Only digests are ever stored.
pub fn hash_upload_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Check a presented token against a stored record.
pub(crate) fn verify_token(
    presented: &str,
    stored_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AppError> {
    if expires_at <= Utc::now() {
        return Err(AppError::Unauthorized("Upload token has expired".to_string()));
    }

    let presented_hash = hash_upload_token(presented);
    let matches: bool = presented_hash.len() == stored_hash.len()
        && presented_hash.as_bytes().ct_eq(stored_hash.as_bytes()).into();

    if matches {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Invalid upload token".to_string()))
    }
}

pub(crate) fn expiry_from(ttl: Duration) -> Result<DateTime<Utc>, AppError> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| AppError::InvalidInput(format!("Invalid token lifetime: {}", e)))?;
    Ok(Utc::now() + ttl)
}

/// PostgreSQL-backed upload token store
#[derive(Clone)]
pub struct UploadTokenRepository {
    pool: PgPool,
}

impl UploadTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Remove expired tokens. Returns the number of rows deleted.
    pub async fn cleanup_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM upload_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl UploadTokenStore for UploadTokenRepository {
    async fn issue(&self, resource_id: Uuid, ttl: Duration) -> Result<String, AppError> {
        let token = generate_upload_token();
        let expires_at = expiry_from(ttl)?;

        sqlx::query(
            r#"
            INSERT INTO upload_tokens (resource_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (resource_id)
            DO UPDATE SET token_hash = EXCLUDED.token_hash, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(resource_id)
        .bind(hash_upload_token(&token))
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(resource_id = %resource_id, expires_at = %expires_at, "Upload token issued");

        Ok(token)
    }

    async fn consume(&self, resource_id: Uuid, token: &str) -> Result<(), AppError> {
        // DELETE ... RETURNING hands the row to exactly one caller.
        let row = sqlx::query(
            r#"
            DELETE FROM upload_tokens
            WHERE resource_id = $1
            RETURNING token_hash, expires_at
            "#,
        )
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| {
            AppError::Unauthorized("No upload token outstanding for resource".to_string())
        })?;

        let stored_hash: String = row.try_get("token_hash")?;
        let expires_at: DateTime<Utc> = row.try_get("expires_at")?;

        verify_token(token, &stored_hash, expires_at)
    }

    async fn invalidate(&self, resource_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM upload_tokens WHERE resource_id = $1")
            .bind(resource_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique() {
        let a = generate_upload_token();
        let b = generate_upload_token();
        assert!(a.starts_with("ut_"));
        assert_eq!(a.len(), 3 + 48);
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let hash = hash_upload_token("ut_abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_upload_token("ut_abc"));
        assert_ne!(hash, hash_upload_token("ut_abd"));
    }

    #[test]
    fn test_verify_token() {
        let stored = hash_upload_token("ut_good");
        let later = Utc::now() + chrono::Duration::minutes(5);
        assert!(verify_token("ut_good", &stored, later).is_ok());
        assert!(matches!(
            verify_token("ut_bad", &stored, later),
            Err(AppError::Unauthorized(_))
        ));

        let earlier = Utc::now() - chrono::Duration::seconds(1);
        assert!(matches!(
            verify_token("ut_good", &stored, earlier),
            Err(AppError::Unauthorized(_))
        ));
    }
}
