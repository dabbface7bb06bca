use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tessera_core::models::Resource;
use tessera_core::AppError;

use super::{ResolveContext, UploadResolver};
use crate::content::{ContentData, ResolvedContent, UriReference, CONTENT_TYPE_URI};
use crate::request::UploadBody;

/// A single URI: JSON `{"uri": ...}`, a form/multipart `uri` field, or a plain-text body.
pub struct UriResolver;

impl UriResolver {
    fn raw_uri(body: &UploadBody) -> Result<Option<String>, AppError> {
        if let Some(value) = body.json_object().and_then(|b| b.get("uri")) {
            return match value {
                JsonValue::String(s) if !s.trim().is_empty() => Ok(Some(s.clone())),
                _ => Err(AppError::BadRequest(
                    "uri must be a non-empty string.".to_string(),
                )),
            };
        }

        if let Some(field) = body.field("uri") {
            return Ok(Some(field.to_string()).filter(|s| !s.trim().is_empty()));
        }

        if let UploadBody::Text(text) = body {
            let text = text.trim();
            // A plain-text body counts only when it is a single token.
            if !text.is_empty() && !text.contains(char::is_whitespace) {
                return Ok(Some(text.to_string()));
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl UploadResolver for UriResolver {
    fn name(&self) -> &'static str {
        "uri"
    }

    async fn try_resolve(
        &self,
        _resource: &Resource,
        ctx: &mut ResolveContext<'_>,
    ) -> Result<Option<ResolvedContent>, AppError> {
        let Some(raw) = Self::raw_uri(&ctx.request.body)? else {
            return Ok(None);
        };

        let uri = UriReference::parse(&raw)?;
        ctx.apply_replace_override();

        Ok(Some(ResolvedContent::new(
            CONTENT_TYPE_URI,
            ContentData::Uri(uri),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::UploadRequest;
    use serde_json::json;
    use std::collections::HashMap;
    use tessera_core::models::ResourceType;

    async fn resolve(body: UploadBody) -> Result<Option<ResolvedContent>, AppError> {
        let resource = Resource::new(ResourceType::Video, "clip");
        let request = UploadRequest::new(true, body);
        let mut ctx = ResolveContext::new(&request);
        UriResolver.try_resolve(&resource, &mut ctx).await
    }

    fn uri_of(resolved: ResolvedContent) -> UriReference {
        match resolved.data {
            ContentData::Uri(uri) => uri,
            other => panic!("expected uri, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_json_uri() {
        let resolved = resolve(UploadBody::Json(json!({"uri": "http://x/video.wmv"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(uri_of(resolved).raw, "http://x/video.wmv");
    }

    #[tokio::test]
    async fn test_form_field_and_text_body() {
        let mut fields = HashMap::new();
        fields.insert("uri".to_string(), "youtube://abc123".to_string());
        let resolved = resolve(UploadBody::Form(fields)).await.unwrap().unwrap();
        assert_eq!(uri_of(resolved).scheme, "youtube");

        let resolved = resolve(UploadBody::Text("https://x/a.mp3\n".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(uri_of(resolved).raw, "https://x/a.mp3");
    }

    #[tokio::test]
    async fn test_prose_text_is_not_a_uri() {
        assert!(resolve(UploadBody::Text("hello there".to_string()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_invalid_uri_is_bad_request() {
        assert!(matches!(
            resolve(UploadBody::Json(json!({"uri": 42}))).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            resolve(UploadBody::Json(json!({"uri": "no scheme here"}))).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
