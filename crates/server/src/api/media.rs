//! Media ingest and search handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use mediadex_core::{
    group, EpisodeGroup, IngestError, IngestOutcome, IngestRequest, MediaRecord, SearchError,
    SearchPage, SearchRequest, ShardName,
};

use super::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub result: &'static str,
    pub compact_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard: Option<ShardName>,
}

/// POST /api/v1/media
///
/// Ingest one media item; the router decides which shard stores it.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), (StatusCode, Json<ErrorResponse>)> {
    match state.router().ingest(body).await {
        Ok(IngestOutcome::Inserted { shard, compact_id }) => Ok((
            StatusCode::CREATED,
            Json(IngestResponse {
                result: "inserted",
                compact_id,
                shard: Some(shard),
            }),
        )),
        Ok(IngestOutcome::Duplicate { compact_id }) => Ok((
            StatusCode::OK,
            Json(IngestResponse {
                result: "duplicate",
                compact_id,
                shard: None,
            }),
        )),
        Err(e @ IngestError::MalformedReference(_)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
        Err(e @ IngestError::Store(_)) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// GET /api/v1/media/{id}
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MediaRecord>, (StatusCode, Json<ErrorResponse>)> {
    match state.search().get(&id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No record with id {id}"),
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

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    pub query: String,
    #[serde(default)]
    pub media_type: Option<String>,
    /// Falls back to the configured page size when absent.
    #[serde(default)]
    pub max_results: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

fn to_search_request(state: &AppState, body: SearchBody) -> SearchRequest {
    let mut request = SearchRequest::new(body.query)
        .with_max_results(
            body.max_results
                .unwrap_or(state.config().search.max_results),
        )
        .with_offset(body.offset.unwrap_or(0));
    if let Some(media_type) = body.media_type {
        request = request.with_media_type(media_type);
    }
    request
}

/// POST /api/v1/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchBody>,
) -> Result<Json<SearchPage>, (StatusCode, Json<ErrorResponse>)> {
    let request = to_search_request(&state, body);
    match state.search().search(&request).await {
        Ok(page) => Ok(Json(page)),
        Err(e @ SearchError::Unavailable) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

#[derive(Debug, Serialize)]
pub struct GroupedSearchResponse {
    pub groups: Vec<EpisodeGroup>,
    pub next_offset: u64,
    pub total: u64,
    pub partial: bool,
}

/// POST /api/v1/search/grouped
///
/// Search, then bucket the page into episodes.
pub async fn search_grouped(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchBody>,
) -> Result<Json<GroupedSearchResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request = to_search_request(&state, body);
    match state.search().search(&request).await {
        Ok(page) => Ok(Json(GroupedSearchResponse {
            groups: group(page.records),
            next_offset: page.next_offset,
            total: page.total,
            partial: page.partial,
        })),
        Err(e @ SearchError::Unavailable) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
