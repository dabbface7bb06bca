use async_trait::async_trait;
use tessera_core::models::Resource;
use tessera_core::AppError;

use super::{ResolveContext, UploadResolver};
use crate::content::{ContentData, ResolvedContent, CONTENT_TYPE_FILE};
use crate::request::UploadBody;

/// Multipart body with a `file` part.
pub struct MultipartFileResolver;

#[async_trait]
impl UploadResolver for MultipartFileResolver {
    fn name(&self) -> &'static str {
        "multipart_file"
    }

    async fn try_resolve(
        &self,
        _resource: &Resource,
        ctx: &mut ResolveContext<'_>,
    ) -> Result<Option<ResolvedContent>, AppError> {
        let UploadBody::Multipart {
            file: Some(file), ..
        } = &ctx.request.body
        else {
            return Ok(None);
        };

        if file.is_empty() {
            return Err(AppError::Unprocessable(
                "The uploaded file is empty.".to_string(),
            ));
        }

        Ok(Some(ResolvedContent::new(
            CONTENT_TYPE_FILE,
            ContentData::File(file.clone()),
        )))
    }
}
