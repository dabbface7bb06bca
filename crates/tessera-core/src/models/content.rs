use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use validator::{Validate, ValidationError};

/// Ordered content attached to a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ContentCollection {
    #[validate(nested)]
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

/// One stored or referenced representation of a resource's media.
///
/// Remote-file manifests deserialize straight into this type and are kept
/// exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_location"))]
pub struct FileDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_uri: Option<String>,
    /// Storage key for files held by this service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_uri: Option<String>,
    #[validate(length(min = 1, max = 255, message = "mime must be 1-255 characters"))]
    pub mime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "mimeType must be 1-255 characters"))]
    pub mime_type: Option<String>,
    #[serde(default = "default_representation")]
    pub representation: String,
    #[validate(range(min = 0, message = "quality must not be negative"))]
    #[serde(default)]
    pub quality: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub attributes: Map<String, JsonValue>,
}

fn default_representation() -> String {
    "original".to_string()
}

fn validate_location(file: &FileDescriptor) -> Result<(), ValidationError> {
    let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    if has(&file.download_uri) || has(&file.internal_uri) {
        Ok(())
    } else {
        let mut err = ValidationError::new("missing_location");
        err.message = Some("file needs a downloadUri or internalUri".into());
        Err(err)
    }
}

impl FileDescriptor {
    /// Original-quality descriptor pointing at a downloadable URI.
    pub fn original(download_uri: impl Into<String>, mime: impl Into<String>) -> Self {
        let mime = mime.into();
        Self {
            download_uri: Some(download_uri.into()),
            internal_uri: None,
            mime_type: Some(mime.clone()),
            mime,
            representation: default_representation(),
            quality: 1,
            bytes: None,
            attributes: Map::new(),
        }
    }

    /// The mime type used to pick an attribute schema: `mimeType`, falling back to `mime`.
    pub fn schema_mime(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(&self.mime)
    }
}
