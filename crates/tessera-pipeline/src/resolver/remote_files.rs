use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tessera_core::models::{FileDescriptor, Resource};
use tessera_core::AppError;

use super::{ResolveContext, UploadResolver};
use crate::content::{ContentData, ResolvedContent, CONTENT_TYPE_REMOTE_FILES};

/// JSON body `{"remoteFiles": [FileDescriptor, ...]}`.
pub struct RemoteFilesResolver;

#[async_trait]
impl UploadResolver for RemoteFilesResolver {
    fn name(&self) -> &'static str {
        "remote_files"
    }

    async fn try_resolve(
        &self,
        _resource: &Resource,
        ctx: &mut ResolveContext<'_>,
    ) -> Result<Option<ResolvedContent>, AppError> {
        let Some(manifest) = ctx
            .request
            .body
            .json_object()
            .and_then(|body| body.get("remoteFiles"))
        else {
            return Ok(None);
        };

        let JsonValue::Array(entries) = manifest else {
            return Err(AppError::BadRequest(
                "remoteFiles must be an array of file descriptors.".to_string(),
            ));
        };

        if entries.is_empty() {
            return Err(AppError::Unprocessable(
                "remoteFiles must contain at least one file descriptor.".to_string(),
            ));
        }

        let files = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                serde_json::from_value::<FileDescriptor>(entry.clone()).map_err(|e| {
                    AppError::BadRequest(format!(
                        "remoteFiles[{}] is not a valid file descriptor: {}",
                        index, e
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        ctx.apply_replace_override();

        Ok(Some(ResolvedContent::new(
            CONTENT_TYPE_REMOTE_FILES,
            ContentData::RemoteFiles(files),
        )))
    }
}
