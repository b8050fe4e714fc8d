//! Common test utilities for in-process API testing.
//!
//! Builds the full router over in-memory shards and drives it with
//! `tower::ServiceExt::oneshot`, no sockets involved.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use mediadex_core::{
    metrics, Config, FederatedSearch, GroupStore, Shard, ShardName, SizeMonitor, SqliteGroupStore,
    SqliteShard, WriteRouter,
};
use mediadex_server::api::create_router;
use mediadex_server::state::AppState;

/// In-process server over in-memory shards.
pub struct TestFixture {
    pub router: Router,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        let config = Config::default();

        let primary: Arc<dyn Shard> =
            Arc::new(SqliteShard::in_memory(ShardName::Primary).expect("primary shard"));
        let secondary: Arc<dyn Shard> =
            Arc::new(SqliteShard::in_memory(ShardName::Secondary).expect("secondary shard"));
        let groups: Arc<dyn GroupStore> =
            Arc::new(SqliteGroupStore::in_memory().expect("group store"));

        let monitor = Arc::new(SizeMonitor::new(
            config.routing.size_cache_ttl(),
            config.routing.migration_threshold_bytes(),
        ));
        let write_router = WriteRouter::new(Arc::clone(&primary), Arc::clone(&secondary), monitor);
        let search = FederatedSearch::new(
            Arc::clone(&primary),
            Arc::clone(&secondary),
            Arc::clone(&groups),
            config.search.use_caption_filter,
        );

        let registry = prometheus::Registry::new();
        metrics::register_metrics(&registry).expect("register metrics");

        let state = Arc::new(AppState::new(
            config,
            write_router,
            search,
            groups,
            registry,
        ));

        Self {
            router: create_router(state),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.send(
            Request::put(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request should not fail at the transport level");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };

        TestResponse { status, body }
    }
}

/// Build a valid provider token for test media items.
pub fn provider_token(media_id: i64) -> String {
    let fields = mediadex_core::PackedMediaRef {
        media_kind: 5,
        location: 1,
        media_id,
        access_hash: media_id.wrapping_mul(31),
    };
    mediadex_core::encode_provider_token(&fields, format!("ref-{media_id}").as_bytes())
}
