use std::sync::Arc;

use async_trait::async_trait;
use tessera_core::models::{FileDescriptor, Resource, ResourceStatus};
use tessera_core::AppError;
use tessera_storage::Storage;
use uuid::Uuid;

use super::{file_extension, ContentHandler};
use crate::content::{ContentData, ResolvedContent, CONTENT_TYPE_FILE};

/// Stores uploaded files and attaches them as the original representation.
///
/// The resource moves to `awaiting_processing`; transcoding happens elsewhere.
pub struct FileContentHandler {
    storage: Arc<dyn Storage>,
}

impl FileContentHandler {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ContentHandler for FileContentHandler {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn try_handle(
        &self,
        resource: &mut Resource,
        content: &ResolvedContent,
    ) -> Result<bool, AppError> {
        let ContentData::File(file) = &content.data else {
            return Ok(false);
        };
        if !content.is(CONTENT_TYPE_FILE) {
            return Ok(false);
        }

        let mime = file
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .map(String::from)
            .unwrap_or_else(|| {
                file.filename
                    .as_deref()
                    .map(|name| mime_guess::from_path(name).first_or_octet_stream())
                    .unwrap_or(mime_guess::mime::APPLICATION_OCTET_STREAM)
                    .essence_str()
                    .to_string()
            });

        let extension = file_extension(file.filename.as_deref(), &mime);
        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);

        let (storage_key, storage_url) = self
            .storage
            .upload(resource.id, &stored_name, &mime, file.data.clone())
            .await?;

        let mut descriptor = FileDescriptor::original(storage_url, mime);
        descriptor.internal_uri = Some(storage_key);
        descriptor.bytes = Some(file.len() as u64);

        resource.content_mut().files.push(descriptor);
        resource.status = ResourceStatus::AwaitingProcessing;

        Ok(true)
    }
}
