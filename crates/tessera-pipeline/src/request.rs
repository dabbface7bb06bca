//! Transport-neutral view of an upload request.

use std::collections::HashMap;

use bytes::Bytes;
use serde_json::Value as JsonValue;
use tessera_core::AppError;

/// A file received in a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Why a request body could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyRejection {
    Malformed(String),
    TooLarge(String),
}

impl BodyRejection {
    pub fn to_error(&self) -> AppError {
        match self {
            BodyRejection::Malformed(reason) => {
                AppError::BadRequest(format!("Invalid request body: {}", reason))
            }
            BodyRejection::TooLarge(reason) => AppError::PayloadTooLarge(reason.clone()),
        }
    }
}

/// Request body, already decoded according to its `Content-Type`.
///
/// A body that failed to decode is carried as [`UploadBody::Invalid`] and
/// reported once the upload token has been spent.
#[derive(Debug, Clone, Default)]
pub enum UploadBody {
    Multipart {
        file: Option<UploadedFile>,
        fields: HashMap<String, String>,
    },
    Json(JsonValue),
    Form(HashMap<String, String>),
    Text(String),
    Invalid(BodyRejection),
    #[default]
    Empty,
}

impl UploadBody {
    /// Look up a plain text field from a form or multipart body.
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            UploadBody::Multipart { fields, .. } | UploadBody::Form(fields) => {
                fields.get(name).map(String::as_str)
            }
            _ => None,
        }
    }

    /// The JSON object body, if that is what was sent.
    pub fn json_object(&self) -> Option<&serde_json::Map<String, JsonValue>> {
        match self {
            UploadBody::Json(JsonValue::Object(map)) => Some(map),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Caller's intent to replace existing content. Resolvers may override it.
    pub replace: bool,
    pub body: UploadBody,
}

impl UploadRequest {
    pub fn new(replace: bool, body: UploadBody) -> Self {
        Self { replace, body }
    }

    /// Interpret the `replace` query parameter: only the exact string `true`
    /// (or an absent parameter) means replace.
    pub fn replace_from_query(value: Option<&str>) -> bool {
        value.map_or(true, |v| v == "true")
    }
}
