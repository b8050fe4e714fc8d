//! Saved group handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use mediadex_core::{GroupError, MediaGroup};

use super::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveGroupBody {
    pub member_ids: Vec<String>,
}

/// PUT /api/v1/groups/{name}
///
/// Create a group or merge member ids into an existing one.
pub async fn save_group(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<SaveGroupBody>,
) -> Result<Json<MediaGroup>, (StatusCode, Json<ErrorResponse>)> {
    match state.groups().save(&name, &body.member_ids) {
        Ok(group) => Ok(Json(group)),
        Err(e @ GroupError::Empty) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// GET /api/v1/groups/{name}
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<MediaGroup>, (StatusCode, Json<ErrorResponse>)> {
    match state.groups().get(&name) {
        Ok(Some(group)) => Ok(Json(group)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No group named {name}"),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// DELETE /api/v1/groups/{name}
pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    match state.groups().delete(&name) {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No group named {name}"),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
