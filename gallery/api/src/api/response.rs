use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode, Uri};
use serde::Serialize;
use serde_json::json;
use utils::make_response;

use super::Body;

/// The cookie carrying the session token.
pub const SESSION_COOKIE: &str = "gallery_session";

pub fn json(status: StatusCode, value: &impl Serialize) -> Response<Body> {
	match serde_json::to_string(value) {
		Ok(body) => make_response!(status, body),
		Err(err) => {
			tracing::error!(error = %err, "failed to serialize response");
			make_response!(
				StatusCode::INTERNAL_SERVER_ERROR,
				json!({ "success": false, "message": "failed to serialize response" })
			)
		}
	}
}

pub fn ok(value: &impl Serialize) -> Response<Body> {
	json(StatusCode::OK, value)
}

/// A `302` to `location` that reports the outcome of a mutation.
pub fn redirect(location: &str, message: &str) -> Response<Body> {
	found(location, json!({ "success": true, "message": message }))
}

pub fn login_redirect(login_url: &str, next: &Uri) -> Response<Body> {
	let next = next.path_and_query().map(|p| p.as_str()).unwrap_or("/");
	let query = url::form_urlencoded::Serializer::new(String::new())
		.append_pair("next", next)
		.finish();

	found(
		&format!("{login_url}?{query}"),
		json!({ "success": false, "message": "login required" }),
	)
}

fn found(location: &str, body: serde_json::Value) -> Response<Body> {
	let mut res = make_response!(StatusCode::FOUND, body);

	match HeaderValue::from_str(location) {
		Ok(location) => {
			res.headers_mut().insert(header::LOCATION, location);
		}
		Err(err) => tracing::error!(location, error = %err, "invalid redirect location"),
	}

	res
}

/// Only site relative paths are followed after a login.
pub fn is_local_path(path: &str) -> bool {
	path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}

pub fn set_session_cookie(res: &mut Response<Body>, token: &str) {
	set_cookie(res, &format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/"));
}

pub fn clear_session_cookie(res: &mut Response<Body>) {
	set_cookie(res, &format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0"));
}

fn set_cookie(res: &mut Response<Body>, cookie: &str) {
	match HeaderValue::from_str(cookie) {
		Ok(cookie) => {
			res.headers_mut().append(header::SET_COOKIE, cookie);
		}
		Err(err) => tracing::error!(error = %err, "invalid cookie"),
	}
}
