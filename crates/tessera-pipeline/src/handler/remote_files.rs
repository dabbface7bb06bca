use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tessera_core::models::{Resource, ResourceStatus};
use tessera_core::AppError;

use super::ContentHandler;
use crate::attributes::AttributeValidatorRegistry;
use crate::content::{ContentData, ResolvedContent, CONTENT_TYPE_REMOTE_FILES};

/// Attaches a manifest of already-hosted files, verbatim and in submitted order.
pub struct RemoteFilesHandler {
    attributes: AttributeValidatorRegistry,
}

impl RemoteFilesHandler {
    pub fn new(attributes: AttributeValidatorRegistry) -> Self {
        Self { attributes }
    }
}

#[async_trait]
impl ContentHandler for RemoteFilesHandler {
    fn name(&self) -> &'static str {
        "remote_files"
    }

    async fn try_handle(
        &self,
        resource: &mut Resource,
        content: &ResolvedContent,
    ) -> Result<bool, AppError> {
        let ContentData::RemoteFiles(files) = &content.data else {
            return Ok(false);
        };
        if !content.is(CONTENT_TYPE_REMOTE_FILES) {
            return Ok(false);
        }

        let errors: Vec<String> = files
            .iter()
            .enumerate()
            .flat_map(|(index, file)| {
                let attributes = JsonValue::Object(file.attributes.clone());
                self.attributes
                    .validate(file.schema_mime(), &attributes)
                    .into_iter()
                    .map(move |e| format!("remoteFiles[{}].attributes.{}", index, e))
            })
            .collect();

        if !errors.is_empty() {
            return Err(AppError::Unprocessable(errors.join("; ")));
        }

        resource.content_mut().files.extend(files.iter().cloned());
        resource.status = ResourceStatus::Normal;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessera_core::models::{FileDescriptor, ResourceType};

    fn manifest(value: JsonValue) -> ResolvedContent {
        let files: Vec<FileDescriptor> = serde_json::from_value(value).unwrap();
        ResolvedContent::new(CONTENT_TYPE_REMOTE_FILES, ContentData::RemoteFiles(files))
    }

    #[tokio::test]
    async fn test_appends_in_order() {
        let handler = RemoteFilesHandler::new(AttributeValidatorRegistry::default());
        let mut resource = Resource::new(ResourceType::Video, "clip");
        resource
            .content_mut()
            .files
            .push(FileDescriptor::original("http://x/old.mp4", "video/mp4"));

        let content = manifest(json!([
            {"downloadUri": "http://x/a.mp4", "mime": "video/mp4", "mimeType": "video/mp4",
             "representation": "transcoding", "quality": 2, "bytes": 10,
             "attributes": {"duration": 300, "frameSize": {"width": 1280, "height": 720}}},
            {"downloadUri": "http://x/b.mp3", "mime": "audio/mpeg", "attributes": {"bitrate": 128}}
        ]));

        assert!(handler.try_handle(&mut resource, &content).await.unwrap());
        let files = &resource.content.as_ref().unwrap().files;
        assert_eq!(files.len(), 3);
        assert_eq!(files[1].download_uri.as_deref(), Some("http://x/a.mp4"));
        assert_eq!(files[1].representation, "transcoding");
        assert_eq!(files[2].download_uri.as_deref(), Some("http://x/b.mp3"));
        assert_eq!(resource.status, ResourceStatus::Normal);
    }

    #[tokio::test]
    async fn test_attribute_errors_name_index_and_field() {
        let handler = RemoteFilesHandler::new(AttributeValidatorRegistry::default());
        let mut resource = Resource::new(ResourceType::Video, "clip");

        let content = manifest(json!([
            {"downloadUri": "http://x/a.mp4", "mime": "video/mp4", "attributes": {"duration": 1}},
            {"downloadUri": "http://x/b.mp4", "mime": "video/mp4", "attributes": {"frameRate": -2}}
        ]));

        let err = handler.try_handle(&mut resource, &content).await.unwrap_err();
        match err {
            AppError::Unprocessable(message) => {
                assert_eq!(
                    message,
                    "remoteFiles[1].attributes.frameRate: must be greater than 0"
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(resource.file_count(), 0);
    }
}
