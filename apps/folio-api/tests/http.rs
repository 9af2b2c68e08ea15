use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use folio_api::{routes, state::AppState};
use folio_config::{Config, Discovery, Postgres, Service, Storage};
use folio_service::{FolioService, MemoryStore, Stores};

fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			request_timeout_ms: 1_000,
		},
		storage: Storage {
			postgres: Postgres {
				dsn: "postgres://postgres@127.0.0.1:5432/folio".to_string(),
				pool_max_conns: 1,
			},
		},
		discovery: Discovery::default(),
	}
}

fn app() -> Router {
	let service =
		FolioService::with_stores(test_config(), Stores::memory(Arc::new(MemoryStore::new())));

	routes::router(AppState::from_service(service))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
	let request = Request::builder().method(method).uri(uri);
	let request = match body {
		Some(body) => request
			.header("content-type", "application/json")
			.body(Body::from(body.to_string()))
			.expect("Failed to build request."),
		None => request.body(Body::empty()).expect("Failed to build request."),
	};
	let response = app.clone().oneshot(request).await.expect("Failed to call router.");
	let status = response.status();
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let value = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).expect("Response body is not JSON.")
	};

	(status, value)
}

fn id_of(value: &Value, field: &str) -> String {
	value[field].as_str().expect("Missing id field.").to_string()
}

async fn create_category(app: &Router, name: &str, parent_id: Option<&str>) -> String {
	let (status, body) =
		send(app, "POST", "/v1/categories", Some(json!({ "name": name, "parent_id": parent_id })))
			.await;

	assert_eq!(status, StatusCode::CREATED);

	id_of(&body, "category_id")
}

async fn publish(app: &Router, category_id: &str, title: &str, body: &str) -> String {
	let (status, created) = send(
		app,
		"POST",
		"/v1/contents",
		Some(json!({
			"title": title,
			"body": body,
			"author_id": "8c5b1b7e-3f5e-4a7e-9d0a-6f1f2f4b9a11",
			"category_id": category_id,
			"status": "published",
		})),
	)
	.await;

	assert_eq!(status, StatusCode::CREATED);
	assert!(created["published_at"].is_string());

	id_of(&created, "content_id")
}

#[tokio::test]
async fn health_is_ok() {
	let (status, _) = send(&app(), "GET", "/health", None).await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn search_and_trending_reflect_views() {
	let app = app();
	let category_id = create_category(&app, "Programming", None).await;
	let basics = publish(&app, &category_id, "Go Basics", "Syntax tour.").await;
	let advanced = publish(&app, &category_id, "Advanced Go", "Assumes go basics.").await;

	for _ in 0..3 {
		let (status, _) = send(&app, "POST", &format!("/v1/contents/{advanced}/views"), None).await;

		assert_eq!(status, StatusCode::OK);
	}

	let (status, found) = send(&app, "GET", "/v1/contents/search?keyword=go%20basics", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(found["items"][0]["content_id"], json!(basics));
	assert_eq!(found["limit"], json!(10));

	let (status, hot) = send(&app, "GET", "/v1/contents/trending?limit=500", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(hot["limit"], json!(50));
	assert_eq!(hot["items"][0]["content_id"], json!(advanced));
	assert_eq!(hot["items"][0]["view_count"], json!(3));
}

#[tokio::test]
async fn list_reports_total_and_clamped_page() {
	let app = app();
	let category_id = create_category(&app, "News", None).await;

	for index in 0..3 {
		publish(&app, &category_id, &format!("Item {index}"), "").await;
	}

	let (status, page) = send(
		&app,
		"GET",
		&format!("/v1/contents?category_id={category_id}&limit=2&sort=title&order=asc"),
		None,
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(page["total"], json!(3));
	assert_eq!(page["items"].as_array().map(Vec::len), Some(2));
	assert_eq!(page["items"][0]["title"], json!("Item 0"));
}

#[tokio::test]
async fn malformed_identifiers_are_bad_requests() {
	let app = app();

	for uri in ["/v1/contents?author_id=nope", "/v1/contents?category_id=", "/v1/contents/not-a-uuid"] {
		let (status, body) = send(&app, "GET", uri, None).await;

		assert_eq!(status, StatusCode::BAD_REQUEST, "uri {uri}");
		assert_eq!(body["error_code"], json!("invalid_request"), "uri {uri}");
	}
}

#[tokio::test]
async fn malformed_page_counts_fall_back_to_defaults() {
	let app = app();
	let (status, page) = send(&app, "GET", "/v1/contents?limit=ten&offset=x", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(page["limit"], json!(10));
	assert_eq!(page["offset"], json!(0));

	let (status, page) =
		send(&app, "GET", "/v1/contents/search?keyword=rust&limit=&offset=-4", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(page["limit"], json!(10));
	assert_eq!(page["offset"], json!(0));

	let (status, hot) = send(&app, "GET", "/v1/contents/trending?limit=1.5", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(hot["limit"], json!(10));
}

#[tokio::test]
async fn missing_content_is_not_found() {
	let (status, body) =
		send(&app(), "GET", "/v1/contents/5d3c7a52-0a7b-4d3e-8f0e-2b8f9f1d6c01", None).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error_code"], json!("not_found"));
}

#[tokio::test]
async fn category_cycles_are_reported_and_refused() {
	let app = app();
	let a = create_category(&app, "A", None).await;
	let b = create_category(&app, "B", Some(&a)).await;
	let c = create_category(&app, "C", Some(&b)).await;
	let (status, check) =
		send(&app, "GET", &format!("/v1/categories/{a}/cycle-check?parent_id={c}"), None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(check["would_create_cycle"], json!(true));

	let (status, check) =
		send(&app, "GET", &format!("/v1/categories/{c}/cycle-check?parent_id={a}"), None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(check["would_create_cycle"], json!(false));

	let (status, body) =
		send(&app, "PATCH", &format!("/v1/categories/{a}"), Some(json!({ "parent_id": c }))).await;

	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["error_code"], json!("conflict"));

	let (status, body) =
		send(&app, "PATCH", &format!("/v1/categories/{c}"), Some(json!({ "parent_id": null })))
			.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["parent_id"], Value::Null);
}

#[tokio::test]
async fn content_lifecycle_round_trip() {
	let app = app();
	let category_id = create_category(&app, "Drafts", None).await;
	let (status, created) = send(
		&app,
		"POST",
		"/v1/contents",
		Some(json!({
			"title": "Plan",
			"author_id": "8c5b1b7e-3f5e-4a7e-9d0a-6f1f2f4b9a11",
			"category_id": category_id,
		})),
	)
	.await;

	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(created["status"], json!("draft"));
	assert_eq!(created["published_at"], Value::Null);

	let content_id = id_of(&created, "content_id");
	let (status, updated) = send(
		&app,
		"PATCH",
		&format!("/v1/contents/{content_id}"),
		Some(json!({ "status": "published" })),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert!(updated["published_at"].is_string());

	let (status, _) = send(&app, "DELETE", &format!("/v1/categories/{category_id}"), None).await;

	assert_eq!(status, StatusCode::CONFLICT);

	let (status, _) = send(&app, "DELETE", &format!("/v1/contents/{content_id}"), None).await;

	assert_eq!(status, StatusCode::NO_CONTENT);

	let (status, _) = send(&app, "DELETE", &format!("/v1/categories/{category_id}"), None).await;

	assert_eq!(status, StatusCode::NO_CONTENT);
}
