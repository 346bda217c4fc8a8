use std::sync::Arc;

use chrono::Utc;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{header, Request, Response, StatusCode};
use utils::http::ext::ResultExt;
use utils::http::router::builder::RouterBuilder;
use utils::http::RouteError;

use super::error::{ApiError, Result};
use super::Body;
use crate::global::GalleryGlobal;

pub fn routes<G: GalleryGlobal>(_: &Arc<G>) -> RouterBuilder<Incoming, RouteError<ApiError>> {
	RouterBuilder::new().get("/time/", time)
}

fn is_htmx<B>(req: &Request<B>) -> bool {
	req.headers()
		.get("hx-request")
		.and_then(|value| value.to_str().ok())
		.is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

/// The current server time as an HTML fragment for partial page refreshes.
async fn time(req: Request<Incoming>) -> Result<Response<Body>> {
	if !is_htmx(&req) {
		return Err((StatusCode::BAD_REQUEST, "HTMX requests only").into());
	}

	let now = Utc::now();
	let fragment = format!(
		r#"<time id="server-time" datetime="{}">{}</time>"#,
		now.to_rfc3339(),
		now.format("%Y-%m-%d %H:%M:%S UTC")
	);

	Response::builder()
		.status(StatusCode::OK)
		.header(header::CONTENT_TYPE, "text/html; charset=utf-8")
		.header(header::CACHE_CONTROL, "no-store")
		.body(Full::from(fragment))
		.map_ignore_err_route("failed to build response")
}
