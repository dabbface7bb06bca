//! Upload orchestrator
//!
//! Drives one upload from start to finish:
//!
//! 1. load the resource (deleted resources short-circuit)
//! 2. reject collections and sequences
//! 3. consume the upload token
//! 4. take the per-resource upload lock and refuse resources being processed
//! 5. resolve the request into content
//! 6. optionally announce and clear the previous content
//! 7. handle the content, validate, persist, announce the modification
//!
//! Nothing is written unless every step succeeds, and the write is a single
//! document update. Blobs stored by a handler are deleted again when the
//! document is rejected or cannot be written.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tessera_core::models::{Resource, ResourceStatus};
use tessera_core::{AppError, ResourceEventPublisher};
use tessera_db::{ResourceStore, UploadTokenStore};
use tessera_storage::Storage;
use uuid::Uuid;

use crate::handler::HandlerChain;
use crate::lock::UploadLocks;
use crate::request::UploadRequest;
use crate::resolver::{ResolveContext, ResolverChain};
use crate::token_gate::TokenGate;
use crate::validation::ResourceValidator;

/// Result of a successful upload call.
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// The resource was soft-deleted; nothing was attempted.
    Deleted(Resource),
    /// Content attached and the resource is ready (`status == normal`).
    Completed(Resource),
    /// Content attached but further processing is expected.
    Accepted(Resource),
}

impl UploadOutcome {
    pub fn resource(&self) -> &Resource {
        match self {
            UploadOutcome::Deleted(r) | UploadOutcome::Completed(r) | UploadOutcome::Accepted(r) => r,
        }
    }

    pub fn into_resource(self) -> Resource {
        match self {
            UploadOutcome::Deleted(r) | UploadOutcome::Completed(r) | UploadOutcome::Accepted(r) => r,
        }
    }
}

pub struct UploadOrchestrator {
    resources: Arc<dyn ResourceStore>,
    token_gate: TokenGate,
    storage: Arc<dyn Storage>,
    events: Arc<dyn ResourceEventPublisher>,
    validator: Arc<dyn ResourceValidator>,
    resolvers: ResolverChain,
    handlers: HandlerChain,
    locks: UploadLocks,
    lock_timeout: Duration,
}

impl UploadOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        tokens: Arc<dyn UploadTokenStore>,
        storage: Arc<dyn Storage>,
        events: Arc<dyn ResourceEventPublisher>,
        validator: Arc<dyn ResourceValidator>,
        resolvers: ResolverChain,
        handlers: HandlerChain,
        locks: UploadLocks,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            resources,
            token_gate: TokenGate::new(tokens),
            storage,
            events,
            validator,
            resolvers,
            handlers,
            locks,
            lock_timeout,
        }
    }

    async fn load(&self, resource_id: Uuid) -> Result<Resource, AppError> {
        self.resources
            .load(resource_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resource {} not found", resource_id)))
    }

    /// Validate, stamp and write the handled resource.
    async fn commit(&self, resource: &mut Resource) -> Result<(), AppError> {
        let errors = self.validator.validate(resource);
        if !errors.is_empty() {
            return Err(AppError::ValidationFailed(errors.join("; ")));
        }

        resource.touch();
        self.resources.persist(resource).await
    }

    /// Delete blobs referenced by `resource` that were not in `kept`.
    async fn discard_new_blobs(&self, resource: &Resource, kept: &HashSet<String>) {
        for key in stored_keys(resource).difference(kept) {
            match self.storage.delete(key).await {
                Ok(()) => {
                    tracing::debug!(resource_id = %resource.id, storage_key = %key, "Discarded stored blob")
                }
                Err(e) => tracing::warn!(
                    resource_id = %resource.id,
                    storage_key = %key,
                    error = %e,
                    "Failed to discard stored blob"
                ),
            }
        }
    }

    #[tracing::instrument(skip(self, token, request), fields(replace = request.replace))]
    pub async fn upload(
        &self,
        resource_id: Uuid,
        token: &str,
        request: UploadRequest,
    ) -> Result<UploadOutcome, AppError> {
        let resource = self.load(resource_id).await?;

        if resource.is_deleted() {
            return Ok(UploadOutcome::Deleted(resource));
        }

        if resource.is_collection() {
            return Err(AppError::BadRequest(
                "Resource of type [collection] cannot contain their own content, they may only contain Relations."
                    .to_string(),
            ));
        }

        if resource.is_sequence() {
            return Err(AppError::BadRequest(
                "Resource sequences cannot contain their own content, they may only contain Relations."
                    .to_string(),
            ));
        }

        self.token_gate.consume(resource_id, token).await?;

        let _lock = self.locks.acquire(resource_id, self.lock_timeout).await?;

        // Another upload may have finished while we waited for the lock.
        let mut resource = self.load(resource_id).await?;

        if resource.status == ResourceStatus::Processing {
            return Err(AppError::Locked(
                "Resource content is currently being processed, try modifying the content later."
                    .to_string(),
            ));
        }

        let mut ctx = ResolveContext::new(&request);
        let resolved = self
            .resolvers
            .resolve(&resource, &mut ctx)
            .await
            .map_err(|e| log_unclassified(resource_id, "resolve", e))?
            .ok_or_else(|| AppError::Unprocessable("Could not resolve valid content.".to_string()))?;

        if ctx.remove_previous_content {
            self.events
                .content_removal_pending(&resource)
                .await
                .map_err(|e| {
                    log_unclassified(
                        resource_id,
                        "content_removal_pending",
                        AppError::from(e.context("Failed to announce content removal")),
                    )
                })?;
            resource.clear_content();
        }

        let kept = stored_keys(&resource);

        let outcome = self
            .handlers
            .handle(&mut resource, &resolved)
            .await
            .map_err(|e| log_unclassified(resource_id, "handle", e))?;

        if !outcome.modified {
            return Err(AppError::Unprocessable(
                "The content was not processed, thus the resource was not modified.".to_string(),
            ));
        }

        if let Err(e) = self.commit(&mut resource).await {
            self.discard_new_blobs(&resource, &kept).await;
            return Err(e);
        }

        if let Err(e) = self.events.resource_modified(&resource).await {
            tracing::warn!(resource_id = %resource_id, error = %e, "Failed to announce resource modification");
        }

        tracing::info!(
            resource_id = %resource_id,
            content_type = %resolved.content_type,
            handler = outcome.handler.unwrap_or("unknown"),
            status = ?resource.status,
            file_count = resource.file_count(),
            "Resource content uploaded"
        );

        Ok(if resource.status == ResourceStatus::Normal {
            UploadOutcome::Completed(resource)
        } else {
            UploadOutcome::Accepted(resource)
        })
    }
}

fn stored_keys(resource: &Resource) -> HashSet<String> {
    resource
        .content
        .iter()
        .flat_map(|content| content.files.iter())
        .filter_map(|file| file.internal_uri.clone())
        .collect()
}

/// Classified (4xx) errors pass through untouched; anything else is logged with its chain.
fn log_unclassified(resource_id: Uuid, stage: &'static str, err: AppError) -> AppError {
    if !err.is_client_error() {
        tracing::error!(
            resource_id = %resource_id,
            stage,
            error = %err.detailed_message(),
            "Upload stage failed"
        );
    }
    err
}
