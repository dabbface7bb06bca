//! Content handler chain
//!
//! Handlers apply resolved content to a resource. The first handler that reports
//! a modification ends the chain.

mod file;
mod http_uri;
mod provider_uri;
mod remote_files;

use std::sync::Arc;

use async_trait::async_trait;
use tessera_core::models::Resource;
use tessera_core::AppError;
use tessera_storage::Storage;

use crate::attributes::AttributeValidatorRegistry;
use crate::content::ResolvedContent;

pub use file::FileContentHandler;
pub use http_uri::{HttpUriHandler, UriCheckOptions};
pub use provider_uri::ProviderUriHandler;
pub use remote_files::RemoteFilesHandler;

#[async_trait]
pub trait ContentHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Apply `content` to `resource`. `Ok(false)` means this handler does not apply.
    async fn try_handle(
        &self,
        resource: &mut Resource,
        content: &ResolvedContent,
    ) -> Result<bool, AppError>;
}

/// Result of running the handler chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleOutcome {
    pub modified: bool,
    pub handler: Option<&'static str>,
}

#[derive(Clone)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn ContentHandler>>,
}

impl HandlerChain {
    pub fn new(handlers: Vec<Arc<dyn ContentHandler>>) -> Self {
        Self { handlers }
    }

    /// File storage, provider URIs, http(s) URIs, then remote-file manifests.
    pub fn standard(
        storage: Arc<dyn Storage>,
        uri_options: UriCheckOptions,
        attributes: AttributeValidatorRegistry,
    ) -> Result<Self, AppError> {
        Ok(Self::new(vec![
            Arc::new(FileContentHandler::new(storage)),
            Arc::new(ProviderUriHandler),
            Arc::new(HttpUriHandler::new(uri_options)?),
            Arc::new(RemoteFilesHandler::new(attributes)),
        ]))
    }

    pub fn push(mut self, handler: Arc<dyn ContentHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub async fn handle(
        &self,
        resource: &mut Resource,
        content: &ResolvedContent,
    ) -> Result<HandleOutcome, AppError> {
        for handler in &self.handlers {
            if handler.try_handle(resource, content).await? {
                tracing::debug!(
                    resource_id = %resource.id,
                    handler = handler.name(),
                    content_type = %content.content_type,
                    file_count = resource.file_count(),
                    "Content handled"
                );
                return Ok(HandleOutcome {
                    modified: true,
                    handler: Some(handler.name()),
                });
            }
        }

        Ok(HandleOutcome {
            modified: false,
            handler: None,
        })
    }
}

/// Extension for a stored file: from the original filename, else from the mime type.
pub(crate) fn file_extension(filename: Option<&str>, mime: &str) -> String {
    let from_name = filename
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name
        .or_else(|| {
            mime_guess::get_mime_extensions_str(mime)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| "bin".to_string())
}
