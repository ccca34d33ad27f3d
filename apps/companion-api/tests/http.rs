use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::Value;
use tower::util::ServiceExt;

use companion_api::{routes, state::AppState};
use companion_config::Config;
use companion_testkit::{TEST_API_KEY, TestArtifacts, sample_chunks};

async fn app_with(config: Config) -> Router {
	let state = AppState::new(config).await.expect("Failed to initialize app state.");

	routes::router(state)
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = app.clone().oneshot(request).await.expect("Failed to call router.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = if body.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&body).expect("Failed to parse response.")
	};

	(status, json)
}

fn get(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request.")
}

fn send_json(method: &str, uri: &str, payload: &Value, api_key: Option<&str>) -> Request<Body> {
	let mut builder =
		Request::builder().method(method).uri(uri).header("content-type", "application/json");

	if let Some(key) = api_key {
		builder = builder.header(routes::HEADER_API_KEY, key);
	}

	builder.body(Body::from(payload.to_string())).expect("Failed to build request.")
}

fn post(uri: &str, api_key: Option<&str>) -> Request<Body> {
	let mut builder = Request::builder().method("POST").uri(uri);

	if let Some(key) = api_key {
		builder = builder.header(routes::HEADER_API_KEY, key);
	}

	builder.body(Body::empty()).expect("Failed to build request.")
}

#[tokio::test]
async fn health_reports_corpus_sizes() {
	let artifacts = TestArtifacts::sample().expect("Failed to write artifacts.");
	let app = app_with(artifacts.config()).await;
	let (status, json) = call(&app, get("/v1/health")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["status"], "ok");
	assert_eq!(json["chunks"], 6);
	assert_eq!(json["protocols"], 5);
}

#[tokio::test]
async fn search_returns_items_in_the_contract_shape() {
	let artifacts = TestArtifacts::sample().expect("Failed to write artifacts.");
	let app = app_with(artifacts.config()).await;
	let (status, json) = call(&app, get("/v1/search?q=caffeine%20energy&mode=bm25&limit=2")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["mode"], "bm25");
	assert_eq!(json["items"][0]["chunk_id"], "ep_light__0002");

	let item = json["items"][0].as_object().expect("Expected an item object.");

	for key in [
		"chunk_id",
		"episode_id",
		"episode_title",
		"chunk_index",
		"title_sent",
		"why_sent",
		"snippet",
		"score",
	] {
		assert!(item.contains_key(key), "Missing {key}.");
	}

	let (status, json) = call(&app, get("/v1/search?q=sleep&mode=vector")).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "VALIDATION_ERROR");
	assert_eq!(json["fields"][0], "$.mode");

	let (status, json) = call(&app, get("/v1/search?mode=tfidf")).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["fields"][0], "$.q");

	let (status, _) = call(&app, get("/v1/search?q=sleep&limit=many")).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recommend_accepts_repeated_tags() {
	let artifacts = TestArtifacts::sample().expect("Failed to write artifacts.");
	let app = app_with(artifacts.config()).await;
	let (status, json) = call(&app, get("/v1/recommend?tags=focus&tags%5B%5D=energy&topk=3")).await;

	assert_eq!(status, StatusCode::OK);

	let items = json["items"].as_array().expect("Expected items.");
	let reasons = json["reasons"].as_array().expect("Expected reasons.");

	assert_eq!(items.len(), 3);
	assert_eq!(reasons.len(), 3);

	let (status, json) = call(&app, get("/v1/recommend")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["items"].as_array().map(Vec::len), Some(6));
}

#[tokio::test]
async fn next_is_idempotent_per_day() {
	let artifacts = TestArtifacts::sample().expect("Failed to write artifacts.");
	let app = app_with(artifacts.config()).await;
	let (status, first) = call(&app, get("/v1/next?user_id=u1&goals=sleep")).await;

	assert_eq!(status, StatusCode::OK);
	assert!(first["copy"]["title"].is_string());
	assert!(first["source"]["episode_id"].is_string());

	let (_, second) = call(&app, get("/v1/next?user_id=u1&goals%5B%5D=energy")).await;

	assert_eq!(first["date"], second["date"]);
	assert_eq!(first["protocol_slug"], second["protocol_slug"]);
	assert_eq!(first["variant"], second["variant"]);

	let (status, json) = call(&app, get("/v1/next")).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["fields"][0], "$.user_id");
}

#[tokio::test]
async fn next_without_protocols_is_unavailable() {
	let artifacts = TestArtifacts::new(&sample_chunks(), &[]).expect("Failed to write artifacts.");
	let app = app_with(artifacts.config()).await;
	let (status, json) = call(&app, get("/v1/next?user_id=u1")).await;

	assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(json["error_code"], "UNAVAILABLE");
}

#[tokio::test]
async fn explain_finds_chunks_by_episode_position() {
	let artifacts = TestArtifacts::sample().expect("Failed to write artifacts.");
	let app = app_with(artifacts.config()).await;
	let (status, json) = call(&app, get("/v1/explain?episode_id=ep_cold&chunk_index=0")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["episode_id"], "ep_cold");
	assert_eq!(json["excerpts"].as_array().map(Vec::len), Some(2));

	let (status, json) = call(&app, get("/v1/explain?episode_id=ep_cold&chunk_index=4")).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(json["error_code"], "NOT_FOUND");
}

#[tokio::test]
async fn events_validate_kind_and_body() {
	let artifacts = TestArtifacts::sample().expect("Failed to write artifacts.");
	let app = app_with(artifacts.config()).await;
	let payload = serde_json::json!({
		"user_id": "u1",
		"event": "completed",
		"protocol_slug": "cold-plunge",
		"ts": "2026-03-01T07:00:00Z"
	});
	let (status, json) = call(&app, send_json("POST", "/v1/events", &payload, None)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["status"], "ok");

	let payload = serde_json::json!({ "user_id": "u1", "event": "share" });
	let (status, json) = call(&app, send_json("POST", "/v1/events", &payload, None)).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_EVENT");

	let payload = serde_json::json!({ "user_id": "u1", "event": "like", "ts": "yesterday" });
	let (status, json) = call(&app, send_json("POST", "/v1/events", &payload, None)).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn protected_writes_require_the_api_key() {
	let artifacts = TestArtifacts::sample().expect("Failed to write artifacts.");
	let mut config = artifacts.config();

	config.security.protect_writes = true;

	let app = app_with(config).await;
	let payload = serde_json::json!({ "user_id": "u1", "event": "like" });
	let (status, json) = call(&app, send_json("POST", "/v1/events", &payload, None)).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(json["error_code"], "UNAUTHORIZED");

	let (status, _) =
		call(&app, send_json("POST", "/v1/events", &payload, Some(TEST_API_KEY))).await;

	assert_eq!(status, StatusCode::OK);

	let patch = serde_json::json!({ "user_id": "u1", "goals": ["Focus"] });
	let (status, _) = call(&app, send_json("PATCH", "/v1/users/u1", &patch, Some("wrong"))).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profiles_are_read_and_patched() {
	let artifacts = TestArtifacts::sample().expect("Failed to write artifacts.");
	let app = app_with(artifacts.config()).await;
	let (status, json) = call(&app, get("/v1/users/u7")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["user_id"], "u7");
	assert_eq!(json["goals"], serde_json::json!([]));

	let patch = serde_json::json!({ "user_id": "u7", "tags": ["Sleep", "sleep"] });
	let (status, json) = call(&app, send_json("PATCH", "/v1/users/u7", &patch, None)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["tags"], serde_json::json!(["sleep"]));

	let patch = serde_json::json!({ "user_id": "someone-else" });
	let (status, json) = call(&app, send_json("PATCH", "/v1/users/u7", &patch, None)).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn refresh_requires_the_key_and_keeps_the_index_on_failure() {
	let artifacts = TestArtifacts::sample().expect("Failed to write artifacts.");
	let app = app_with(artifacts.config()).await;
	let (status, _) = call(&app, post("/v1/admin/refresh", None)).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);

	let (status, json) = call(&app, post("/v1/admin/refresh", Some(TEST_API_KEY))).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["status"], "reloaded");
	assert_eq!(json["chunks"], 6);

	artifacts.write_raw_chunks("{\"chunk_id\": 1}\n").expect("Failed to corrupt artifacts.");

	let (status, json) = call(&app, post("/v1/admin/refresh", Some(TEST_API_KEY))).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(json["error_code"], "INDEX_BUILD_ERROR");

	let (_, json) = call(&app, get("/v1/health")).await;

	assert_eq!(json["chunks"], 6);
}

#[tokio::test]
async fn refresh_is_refused_without_a_configured_key() {
	let artifacts = TestArtifacts::sample().expect("Failed to write artifacts.");
	let mut config = artifacts.config();

	config.security.api_key = None;

	let app = app_with(config).await;
	let (status, json) = call(&app, post("/v1/admin/refresh", Some(TEST_API_KEY))).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(json["error_code"], "UNAUTHORIZED");
}
