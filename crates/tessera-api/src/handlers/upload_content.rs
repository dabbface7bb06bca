//! Resource content upload endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tessera_core::models::Resource;
use tessera_core::AppError;
use tessera_pipeline::{UploadOutcome, UploadRequest};
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::handlers::extract::UploadPayload;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub replace: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub resource: Resource,
}

/// `POST /api/v1/resources/{id}/content/{token}?replace=true|false`
///
/// 200 when the resource is ready, 202 when processing follows, 410 for a
/// deleted resource.
pub async fn upload_content(
    State(state): State<Arc<AppState>>,
    Path((id, token)): Path<(String, String)>,
    Query(query): Query<UploadQuery>,
    UploadPayload(payload): UploadPayload,
) -> Result<impl IntoResponse, HttpAppError> {
    // A malformed id can never name a resource.
    let resource_id = Uuid::parse_str(&id)
        .map_err(|_| AppError::NotFound(format!("Resource {} not found", id)))?;

    let request = UploadRequest::new(
        UploadRequest::replace_from_query(query.replace.as_deref()),
        payload,
    );

    let outcome = state
        .orchestrator
        .upload(resource_id, &token, request)
        .await?;

    let status = match outcome {
        UploadOutcome::Deleted(_) => StatusCode::GONE,
        UploadOutcome::Completed(_) => StatusCode::OK,
        UploadOutcome::Accepted(_) => StatusCode::ACCEPTED,
    };

    Ok((
        status,
        Json(ResourceResponse {
            resource: outcome.into_resource(),
        }),
    ))
}
