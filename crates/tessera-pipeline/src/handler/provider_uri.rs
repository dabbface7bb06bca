use async_trait::async_trait;
use tessera_core::models::{FileDescriptor, Resource, ResourceStatus};
use tessera_core::AppError;

use super::ContentHandler;
use crate::content::{ContentData, ResolvedContent, CONTENT_TYPE_URI};

/// Canonical watch URL for a provider-scheme URI such as `youtube://<id>`.
fn canonical_url(scheme: &str, id: &str) -> Option<String> {
    match scheme {
        "youtube" => Some(format!("https://www.youtube.com/watch?v={}", id)),
        "vimeo" => Some(format!("https://vimeo.com/{}", id)),
        _ => None,
    }
}

fn is_valid_video_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Attaches videos hosted by an external provider (`youtube://`, `vimeo://`).
pub struct ProviderUriHandler;

#[async_trait]
impl ContentHandler for ProviderUriHandler {
    fn name(&self) -> &'static str {
        "provider_uri"
    }

    async fn try_handle(
        &self,
        resource: &mut Resource,
        content: &ResolvedContent,
    ) -> Result<bool, AppError> {
        let ContentData::Uri(uri) = &content.data else {
            return Ok(false);
        };
        if !content.is(CONTENT_TYPE_URI) {
            return Ok(false);
        }

        let id = uri.opaque_part();
        let Some(url) = canonical_url(&uri.scheme, id) else {
            return Ok(false);
        };

        if !is_valid_video_id(id) {
            return Err(AppError::BadRequest(format!(
                "'{}' is not a valid {} video id.",
                id, uri.scheme
            )));
        }

        let descriptor = FileDescriptor::original(url, format!("video/x-{}", uri.scheme));
        resource.content_mut().files.push(descriptor);
        resource.status = ResourceStatus::Normal;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::UriReference;
    use tessera_core::models::ResourceType;

    fn uri_content(raw: &str) -> ResolvedContent {
        ResolvedContent::new(
            CONTENT_TYPE_URI,
            ContentData::Uri(UriReference::parse(raw).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_youtube_uri() {
        let mut resource = Resource::new(ResourceType::Video, "talk");
        let handled = ProviderUriHandler
            .try_handle(&mut resource, &uri_content("youtube://dQw4w9WgXcQ"))
            .await
            .unwrap();

        assert!(handled);
        assert_eq!(resource.status, ResourceStatus::Normal);
        let file = &resource.content.as_ref().unwrap().files[0];
        assert_eq!(
            file.download_uri.as_deref(),
            Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        );
        assert_eq!(file.mime, "video/x-youtube");
    }

    #[tokio::test]
    async fn test_unknown_scheme_not_handled() {
        let mut resource = Resource::new(ResourceType::Video, "talk");
        assert!(!ProviderUriHandler
            .try_handle(&mut resource, &uri_content("dailymotion://x7tgad0"))
            .await
            .unwrap());
        assert!(!ProviderUriHandler
            .try_handle(&mut resource, &uri_content("https://x/a.mp4"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_bad_id_rejected() {
        let mut resource = Resource::new(ResourceType::Video, "talk");
        let result = ProviderUriHandler
            .try_handle(&mut resource, &uri_content("vimeo://12.ab"))
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(resource.file_count(), 0);
    }
}
