//! Values passed from the resolver chain to the handler chain.

use serde_json::Value as JsonValue;
use tessera_core::models::FileDescriptor;
use tessera_core::AppError;

use crate::request::UploadedFile;

pub const CONTENT_TYPE_FILE: &str = "file";
pub const CONTENT_TYPE_URI: &str = "uri";
pub const CONTENT_TYPE_REMOTE_FILES: &str = "remote_files";

#[derive(Debug, Clone)]
pub enum ContentData {
    File(UploadedFile),
    Uri(UriReference),
    RemoteFiles(Vec<FileDescriptor>),
    /// Payload of a resolver outside the built-in set.
    Other(JsonValue),
}

/// Output of the resolver chain: a content type tag plus its normalized data.
#[derive(Debug, Clone)]
pub struct ResolvedContent {
    pub content_type: String,
    pub data: ContentData,
}

impl ResolvedContent {
    pub fn new(content_type: impl Into<String>, data: ContentData) -> Self {
        Self {
            content_type: content_type.into(),
            data,
        }
    }

    pub fn is(&self, content_type: &str) -> bool {
        self.content_type == content_type
    }
}

/// A URI submitted as content, e.g. `https://cdn.example.com/a.mp4` or `youtube://<id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriReference {
    pub raw: String,
    pub scheme: String,
}

impl UriReference {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        let parsed = reqwest::Url::parse(raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid uri '{}': {}", raw, e)))?;

        Ok(Self {
            raw: raw.to_string(),
            scheme: parsed.scheme().to_lowercase(),
        })
    }

    pub fn is_http(&self) -> bool {
        self.scheme == "http" || self.scheme == "https"
    }

    /// Everything after `scheme://`, without surrounding slashes.
    pub fn opaque_part(&self) -> &str {
        let rest = match self.raw.find("://") {
            Some(idx) => &self.raw[idx + 3..],
            None => self.raw.split_once(':').map_or("", |(_, rest)| rest),
        };
        rest.trim_matches('/')
    }
}
