//! Upload body extraction
//!
//! Decodes the request body into an [`UploadBody`] according to its
//! `Content-Type`. Unknown or missing content types yield an empty body, which
//! the resolver chain later rejects. Bodies that fail to decode are passed on
//! as [`UploadBody::Invalid`] so the upload pipeline reports them after the
//! token check.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form,
};
use bytes::Bytes;
use tessera_pipeline::{BodyRejection, UploadBody, UploadedFile};

/// Name of the multipart part carrying the uploaded file.
const FILE_FIELD: &str = "file";

/// Extractor for the upload body.
#[derive(Debug)]
pub struct UploadPayload(pub UploadBody);

fn rejection(status: StatusCode, body_text: String) -> BodyRejection {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        BodyRejection::TooLarge(body_text)
    } else {
        BodyRejection::Malformed(body_text)
    }
}

/// Media type without parameters, lowercased.
fn media_type(request: &Request) -> Option<String> {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

fn is_json(media_type: &str) -> bool {
    media_type == "application/json" || media_type.ends_with("+json")
}

impl<S> FromRequest<S> for UploadPayload
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = match decode(req, state).await {
            Ok(body) => body,
            Err(rejection) => {
                tracing::debug!(rejection = ?rejection, "Upload body could not be decoded");
                UploadBody::Invalid(rejection)
            }
        };
        Ok(UploadPayload(body))
    }
}

async fn decode<S>(req: Request, state: &S) -> Result<UploadBody, BodyRejection>
where
    S: Send + Sync,
{
    let Some(media_type) = media_type(&req) else {
        return Ok(UploadBody::Empty);
    };

    let body = match media_type.as_str() {
        "multipart/form-data" => {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            read_multipart(multipart).await?
        }
        t if is_json(t) => {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                UploadBody::Empty
            } else {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| BodyRejection::Malformed(format!("Invalid JSON body: {}", e)))?;
                UploadBody::Json(value)
            }
        }
        "application/x-www-form-urlencoded" => {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            UploadBody::Form(fields)
        }
        "text/plain" => {
            let text = String::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            UploadBody::Text(text)
        }
        other => {
            tracing::debug!(content_type = other, "Unsupported upload content type");
            UploadBody::Empty
        }
    };

    Ok(body)
}

/// Collect the `file` part and any text fields. Later duplicates win.
async fn read_multipart(mut multipart: Multipart) -> Result<UploadBody, BodyRejection> {
    let mut file = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejection(e.status(), e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == FILE_FIELD {
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            file = Some(UploadedFile {
                filename,
                content_type,
                data,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            fields.insert(name, value);
        }
    }

    Ok(UploadBody::Multipart { file, fields })
}
