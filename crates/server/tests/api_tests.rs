//! In-process API tests over in-memory shards.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{provider_token, TestFixture};

async fn ingest(fixture: &TestFixture, media_id: i64, name: &str) -> serde_json::Value {
    let response = fixture
        .post(
            "/api/v1/media",
            json!({
                "provider_token": provider_token(media_id),
                "name": name,
                "size_bytes": 1024,
                "media_type": "video",
            }),
        )
        .await;
    assert!(
        response.status == StatusCode::CREATED || response.status == StatusCode::OK,
        "unexpected ingest status {}: {:?}",
        response.status,
        response.body
    );
    response.body
}

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_endpoint_shows_defaults() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/config").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["routing"]["migration_threshold_mb"], 450);
    assert_eq!(response.body["search"]["max_results"], 10);
}

#[tokio::test]
async fn test_ingest_then_duplicate() {
    let fixture = TestFixture::new();

    let first = fixture
        .post(
            "/api/v1/media",
            json!({
                "provider_token": provider_token(7),
                "name": "Show S01E01.mkv",
                "size_bytes": 2048,
            }),
        )
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["result"], "inserted");
    assert_eq!(first.body["shard"], "primary");
    let compact_id = first.body["compact_id"].as_str().unwrap().to_string();

    let second = fixture
        .post(
            "/api/v1/media",
            json!({
                "provider_token": provider_token(7),
                "name": "Show S01E01.mkv",
                "size_bytes": 2048,
            }),
        )
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["result"], "duplicate");
    assert_eq!(second.body["compact_id"], compact_id.as_str());
}

#[tokio::test]
async fn test_ingest_malformed_token_is_bad_request() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/api/v1/media",
            json!({
                "provider_token": "??? definitely not base64 ???",
                "name": "whatever.mkv",
                "size_bytes": 1,
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_record_by_id() {
    let fixture = TestFixture::new();
    let body = ingest(&fixture, 1, "Findable.mkv").await;
    let compact_id = body["compact_id"].as_str().unwrap();

    let found = fixture.get(&format!("/api/v1/media/{compact_id}")).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["name"], "Findable.mkv");

    let missing = fixture.get("/api/v1/media/does-not-exist").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_round_trip() {
    let fixture = TestFixture::new();
    ingest(&fixture, 1, "Loki.S01E01.mkv").await;
    ingest(&fixture, 2, "Loki.S01E02.mkv").await;
    ingest(&fixture, 3, "Unrelated Movie.mkv").await;

    let response = fixture
        .post("/api/v1/search", json!({"query": "loki"}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 2);
    assert_eq!(response.body["records"].as_array().unwrap().len(), 2);
    assert_eq!(response.body["next_offset"], 0);
    assert_eq!(response.body["partial"], false);
}

#[tokio::test]
async fn test_search_empty_query_returns_everything() {
    let fixture = TestFixture::new();
    for i in 0..3 {
        ingest(&fixture, i, &format!("File{i}.mkv")).await;
    }

    let response = fixture.post("/api/v1/search", json!({"query": ""})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 3);
}

#[tokio::test]
async fn test_grouped_search() {
    let fixture = TestFixture::new();
    ingest(&fixture, 1, "Show S01E02 1080p.mkv").await;
    ingest(&fixture, 2, "Show.S01E02.720p.mkv").await;
    ingest(&fixture, 3, "Show S01E01.mkv").await;

    let response = fixture
        .post("/api/v1/search/grouped", json!({"query": "show"}))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let groups = response.body["groups"].as_array().unwrap();
    assert_eq!(groups[0]["key"], "S01 E01");
    assert_eq!(groups[1]["key"], "S01 E02");
    assert_eq!(groups[1]["records"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_group_crud_and_group_search() {
    let fixture = TestFixture::new();
    let ep1 = ingest(&fixture, 1, "Loki.S01E01.mkv").await["compact_id"]
        .as_str()
        .unwrap()
        .to_string();
    let ep2 = ingest(&fixture, 2, "Loki.S01E02.mkv").await["compact_id"]
        .as_str()
        .unwrap()
        .to_string();

    // Create
    let saved = fixture
        .put(
            "/api/v1/groups/Loki%20S01",
            json!({"member_ids": [ep1.clone(), ep2.clone()]}),
        )
        .await;
    assert_eq!(saved.status, StatusCode::OK);
    assert_eq!(saved.body["member_ids"].as_array().unwrap().len(), 2);

    // Fetch
    let fetched = fixture.get("/api/v1/groups/Loki%20S01").await;
    assert_eq!(fetched.status, StatusCode::OK);

    // A search for the group name returns its members in order
    let search = fixture
        .post("/api/v1/search", json!({"query": "Loki S01"}))
        .await;
    assert_eq!(search.status, StatusCode::OK);
    let records = search.body["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["compact_id"], ep1.as_str());

    // Delete
    let deleted = fixture.delete("/api/v1/groups/Loki%20S01").await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let gone = fixture.get("/api/v1/groups/Loki%20S01").await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_save_group_with_no_members_is_bad_request() {
    let fixture = TestFixture::new();
    let response = fixture
        .put("/api/v1/groups/Empty", json!({"member_ids": []}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    ingest(&fixture, 1, "Counted.mkv").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
}
