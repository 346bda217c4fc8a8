use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use serial_test::serial;

use super::{bearer, TestServer};
use crate::api::middleware::auth::TOKEN_CHECK_HEADER;

#[serial]
#[tokio::test]
async fn test_serial_health() {
	let server = TestServer::start().await;

	let res = server.get("/health/").send().await.expect("failed to get health");
	assert_eq!(res.status(), StatusCode::OK);
	assert!(res.headers().get(TOKEN_CHECK_HEADER).is_none());
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body, json!({ "status": "ok" }));

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_not_found_and_method_not_allowed() {
	let server = TestServer::start().await;

	let res = server.get("/nothing/here/").send().await.expect("failed to send");
	assert_eq!(res.status(), StatusCode::NOT_FOUND);
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["success"], false);

	// ids that are not ulids never reach the store
	let res = server.get("/album/not-an-id/").send().await.expect("failed to send");
	assert_eq!(res.status(), StatusCode::NOT_FOUND);

	let res = server.post("/health/").send().await.expect("failed to send");
	assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
	let allow = res
		.headers()
		.get(header::ALLOW)
		.and_then(|value| value.to_str().ok())
		.expect("missing allow header");
	assert!(allow.contains("GET"), "{allow}");

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_time_partial() {
	let server = TestServer::start().await;

	let res = server.get("/time/").send().await.expect("failed to send");
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["message"], "HTMX requests only");

	let res = server
		.get("/time/")
		.header("HX-Request", "true")
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(
		res.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
		Some("text/html; charset=utf-8")
	);
	assert_eq!(
		res.headers().get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
		Some("no-store")
	);
	let body = res.text().await.expect("failed to read body");
	assert!(body.starts_with(r#"<time id="server-time" datetime=""#), "{body}");
	assert!(body.ends_with("</time>"), "{body}");

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_invalid_token() {
	let server = TestServer::start().await;
	let alice = server.user("alice", false).await;

	let (name, value) = bearer("garbage");
	let res = server.get("/health/").header(name, value).send().await.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(
		res.headers().get(TOKEN_CHECK_HEADER).and_then(|v| v.to_str().ok()),
		Some("failed")
	);

	// anonymous pages still render, error responses carry the header too
	let res = server
		.get("/album/new/")
		.header(header::COOKIE, "gallery_session=garbage")
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);
	assert_eq!(
		res.headers().get(TOKEN_CHECK_HEADER).and_then(|v| v.to_str().ok()),
		Some("failed")
	);

	let token = server.token(&alice).await;
	let (name, value) = bearer(&token);
	let res = server.get("/").header(name, value).send().await.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);
	assert!(res.headers().get(TOKEN_CHECK_HEADER).is_none());
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["user"]["username"], "alice");

	server.shutdown().await;
}
