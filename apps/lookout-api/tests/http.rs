use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::Value;
use tower::util::ServiceExt;

use lookout_api::{routes, state::AppState};
use lookout_config::{Config, Pages, SavedSearches, Service, Storage, StorageBackend};
use lookout_storage::{KeyValueStore, MemoryStore, ScopedStorage};

fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			backend: StorageBackend::Memory,
			root: None,
			namespace: "alerting".to_string(),
		},
		saved_searches: SavedSearches { enabled: true },
		pages: Pages::default(),
	}
}

fn test_app() -> (Router, Arc<MemoryStore>) {
	let backend = Arc::new(MemoryStore::new());
	let storage = ScopedStorage::new(backend.clone(), "alerting");
	let state = AppState::with_storage(&test_config(), storage);

	(routes::router(state), backend)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
	let builder = Request::builder().method(method).uri(uri);
	let request = match body {
		Some(body) => builder
			.header("content-type", "application/json")
			.body(Body::from(body.to_string()))
			.expect("Failed to build request."),
		None => builder.body(Body::empty()).expect("Failed to build request."),
	};
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

#[tokio::test]
async fn health_ok() {
	let (app, _) = test_app();
	let (status, _) = send(&app, "GET", "/health", None).await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn saves_lists_and_persists_triage_searches() {
	let (app, backend) = test_app();
	let (status, saved) = send(
		&app,
		"POST",
		"/v1/pages/triage/saved-searches",
		Some(serde_json::json!({ "name": "By team", "query": "var-groupBy=team" })),
	)
	.await;

	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(saved["name"], "By team");
	assert_eq!(saved["isDefault"], false);

	let (status, listed) = send(&app, "GET", "/v1/pages/triage/saved-searches", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(listed.as_array().map(Vec::len), Some(1));

	let stored = backend
		.get_item("alerting", "triageSavedSearches")
		.await
		.expect("Failed to read backend.")
		.expect("Triage collection must be stored.");

	assert!(stored.contains("By team"));
	assert_eq!(
		backend.get_item("alerting", "savedSearches").await.expect("Failed to read backend."),
		None
	);
}

#[tokio::test]
async fn duplicate_name_is_unprocessable() {
	let (app, _) = test_app();
	let payload = serde_json::json!({ "name": "Mine", "query": "search=owner%3Ame" });

	send(&app, "POST", "/v1/pages/rule-list/saved-searches", Some(payload)).await;

	let (status, body) = send(
		&app,
		"POST",
		"/v1/pages/rule-list/saved-searches",
		Some(serde_json::json!({ "name": "MINE", "query": "" })),
	)
	.await;

	assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(body["error_code"], "VALIDATION_ERROR");
	assert_eq!(body["fields"][0], "name");
}

#[tokio::test]
async fn default_rename_apply_and_delete() {
	let (app, _) = test_app();
	let (_, first) = send(
		&app,
		"POST",
		"/v1/pages/rule-list/saved-searches",
		Some(serde_json::json!({ "name": "zeta", "query": "search=state%3Afiring" })),
	)
	.await;
	let (_, second) = send(
		&app,
		"POST",
		"/v1/pages/rule-list/saved-searches",
		Some(serde_json::json!({ "name": "alpha", "query": "" })),
	)
	.await;
	let first_id = first["id"].as_str().expect("Saved search must have an id.").to_string();
	let second_id = second["id"].as_str().expect("Saved search must have an id.").to_string();
	let (status, listed) = send(
		&app,
		"PUT",
		"/v1/pages/rule-list/default",
		Some(serde_json::json!({ "id": first_id })),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(listed[0]["id"], first_id.as_str());
	assert_eq!(listed[0]["isDefault"], true);
	assert_eq!(listed[1]["name"], "alpha");

	let (status, renamed) = send(
		&app,
		"PATCH",
		&format!("/v1/pages/rule-list/saved-searches/{first_id}"),
		Some(serde_json::json!({ "name": "Firing" })),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(renamed["name"], "Firing");

	let (status, applied) =
		send(&app, "POST", &format!("/v1/pages/rule-list/saved-searches/{first_id}/apply"), None)
			.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(applied["location"], "/alerting/list?search=state%3Afiring");

	let (status, _) =
		send(&app, "DELETE", &format!("/v1/pages/rule-list/saved-searches/{second_id}"), None)
			.await;

	assert_eq!(status, StatusCode::NO_CONTENT);

	let (_, listed) = send(&app, "GET", "/v1/pages/rule-list/saved-searches", None).await;

	assert_eq!(listed.as_array().map(Vec::len), Some(1));

	let (status, cleared) =
		send(&app, "PUT", "/v1/pages/rule-list/default", Some(serde_json::json!({ "id": null })))
			.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(cleared[0]["isDefault"], false);
}

#[tokio::test]
async fn unknown_ids_and_pages_are_not_found() {
	let (app, _) = test_app();
	let (status, body) = send(&app, "GET", "/v1/pages/dashboards/saved-searches", None).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error_code"], "UNKNOWN_PAGE");

	let (status, body) =
		send(&app, "POST", "/v1/pages/triage/saved-searches/missing/apply", None).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error_code"], "NOT_FOUND");
}

#[tokio::test]
async fn serializes_and_parses_triage_state() {
	let (app, _) = test_app();
	let (status, body) = send(
		&app,
		"POST",
		"/v1/triage/serialize",
		Some(serde_json::json!({
			"timeRange": { "from": "now-1h", "to": "now" },
			"filters": ["a|=|b"],
			"groupBy": ["sev"]
		})),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["query"], "var-filters=a%7C%3D%7Cb&var-groupBy=sev&from=now-1h&to=now");

	let (status, body) = send(
		&app,
		"GET",
		"/v1/triage/parse?query=var-filters%3Da%257C%253D%257Cb%26var-groupBy%3Dsev",
		None,
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["state"]["filters"][0], "a|=|b");
	assert_eq!(body["state"]["groupBy"][0], "sev");
	assert_eq!(body["state"]["timeRange"]["from"], "now-4h");
	assert_eq!(body["parsed_filters"][0]["key"], "a");
	assert_eq!(body["parsed_filters"][0]["value"], "b");
}
