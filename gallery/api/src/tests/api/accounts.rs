use reqwest::{header, StatusCode};
use serde_json::Value;
use serial_test::serial;

use super::{location, TestServer};
use crate::api::accounts::{session_lifetime, INVALID_LOGIN};
use crate::api::middleware::auth::TOKEN_CHECK_HEADER;
use crate::tests::global::memory_config;

fn session_cookie(res: &reqwest::Response) -> Option<String> {
	res.headers()
		.get_all(header::SET_COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.find(|value| value.starts_with("gallery_session="))
		.map(str::to_string)
}

#[serial]
#[tokio::test]
async fn test_serial_login_logout() {
	let server = TestServer::start().await;
	server.user("alice", false).await;

	let res = server
		.get("/accounts/login/?next=/dashboard/")
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["next"], "/dashboard/");
	assert!(body["user"].is_null());

	let res = server
		.post("/accounts/login/?next=/dashboard/")
		.form(&[("username", "alice"), ("password", "password")])
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);
	assert_eq!(location(&res), Some("/dashboard/"));

	let cookie = session_cookie(&res).expect("session cookie should be set");
	assert!(cookie.contains("HttpOnly"), "{cookie}");
	let token = cookie
		.split(';')
		.next()
		.and_then(|pair| pair.split_once('='))
		.map(|(_, value)| value.to_string())
		.expect("cookie has a value");

	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["message"], "Logged in successfully!");

	let cookie = format!("gallery_session={token}");
	let res = server
		.get("/dashboard/")
		.header(header::COOKIE, &cookie)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);

	let res = server
		.post("/accounts/logout/")
		.header(header::COOKIE, &cookie)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);
	assert_eq!(location(&res), Some("/"));
	let cleared = session_cookie(&res).expect("session cookie should be cleared");
	assert!(cleared.contains("Max-Age=0"), "{cleared}");

	// the session is gone even though the token is still well formed
	let res = server
		.get("/dashboard/")
		.header(header::COOKIE, &cookie)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);
	assert_eq!(
		res.headers().get(TOKEN_CHECK_HEADER).and_then(|v| v.to_str().ok()),
		Some("failed")
	);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_login_rejected() {
	let server = TestServer::start().await;
	server.user("alice", false).await;

	let res = server
		.post("/accounts/login/")
		.form(&[("username", "alice"), ("password", "wrong")])
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);
	assert!(session_cookie(&res).is_none());
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["errors"]["__all__"][0], INVALID_LOGIN);

	let res = server
		.post("/accounts/login/")
		.form(&[("username", ""), ("password", "")])
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);
	let body: Value = res.json().await.expect("failed to read body");
	assert!(body["errors"]["username"].is_array());
	assert!(body["errors"]["password"].is_array());

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_login_ignores_foreign_next() {
	let server = TestServer::start().await;
	server.user("alice", false).await;

	let res = server
		.post("/accounts/login/?next=//evil.example/")
		.form(&[("username", "alice"), ("password", "password"), ("next", "https://evil.example/")])
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);
	assert_eq!(location(&res), Some("/"));

	server.shutdown().await;
}

#[test]
fn test_session_lifetime() {
	assert_eq!(session_lifetime(3600), Some(chrono::Duration::hours(1)));
	assert_eq!(session_lifetime(0), Some(chrono::Duration::zero()));

	// larger than chrono can represent
	assert_eq!(session_lifetime(u64::MAX), None);
	// representable, but the expiry would overflow the date range
	assert_eq!(session_lifetime((i64::MAX / 1000) as u64), None);
}

#[serial]
#[tokio::test]
async fn test_serial_login_oversized_session_ttl() {
	let mut config = memory_config();
	config.jwt.session_ttl = u64::MAX;

	let server = TestServer::start_with(config).await;
	server.user("alice", false).await;

	let res = server
		.post("/accounts/login/")
		.form(&[("username", "alice"), ("password", "password")])
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert!(session_cookie(&res).is_none());

	// the server keeps serving
	let res = server.get("/health/").send().await.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);

	server.shutdown().await;
}
