//! Upload resolver chain
//!
//! Resolvers recognise one submission shape each. They run in order and the first
//! one that returns content ends the chain.

mod file;
mod remote_files;
mod uri;

use std::sync::Arc;

use async_trait::async_trait;
use tessera_core::models::Resource;
use tessera_core::AppError;

use crate::content::ResolvedContent;
use crate::request::{UploadBody, UploadRequest};

pub use file::MultipartFileResolver;
pub use remote_files::RemoteFilesResolver;
pub use uri::UriResolver;

/// Mutable state shared with resolvers while resolving one request.
pub struct ResolveContext<'a> {
    pub request: &'a UploadRequest,
    /// Whether existing content is cleared before handling. Starts as the caller's intent.
    pub remove_previous_content: bool,
}

impl<'a> ResolveContext<'a> {
    pub fn new(request: &'a UploadRequest) -> Self {
        Self {
            request,
            remove_previous_content: request.replace,
        }
    }

    /// Apply a `"replace": bool` key from a JSON body, if present.
    pub(crate) fn apply_replace_override(&mut self) {
        if let Some(replace) = self
            .request
            .body
            .json_object()
            .and_then(|body| body.get("replace"))
            .and_then(|v| v.as_bool())
        {
            self.remove_previous_content = replace;
        }
    }
}

#[async_trait]
pub trait UploadResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the request is not in this resolver's format.
    async fn try_resolve(
        &self,
        resource: &Resource,
        ctx: &mut ResolveContext<'_>,
    ) -> Result<Option<ResolvedContent>, AppError>;
}

#[derive(Clone)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn UploadResolver>>,
}

impl Default for ResolverChain {
    /// File uploads, then remote-file manifests, then URIs.
    fn default() -> Self {
        Self::new(vec![
            Arc::new(MultipartFileResolver),
            Arc::new(RemoteFilesResolver),
            Arc::new(UriResolver),
        ])
    }
}

impl ResolverChain {
    pub fn new(resolvers: Vec<Arc<dyn UploadResolver>>) -> Self {
        Self { resolvers }
    }

    pub fn push(mut self, resolver: Arc<dyn UploadResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub async fn resolve(
        &self,
        resource: &Resource,
        ctx: &mut ResolveContext<'_>,
    ) -> Result<Option<ResolvedContent>, AppError> {
        if let UploadBody::Invalid(rejection) = &ctx.request.body {
            return Err(rejection.to_error());
        }

        for resolver in &self.resolvers {
            if let Some(content) = resolver.try_resolve(resource, ctx).await? {
                tracing::debug!(
                    resource_id = %resource.id,
                    resolver = resolver.name(),
                    content_type = %content.content_type,
                    "Upload resolved"
                );
                return Ok(Some(content));
            }
        }
        Ok(None)
    }
}
