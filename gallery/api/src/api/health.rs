use std::sync::Arc;

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use utils::http::router::builder::RouterBuilder;
use utils::http::RouteError;
use utils::make_response;

use super::error::{ApiError, Result};
use super::Body;
use crate::global::GalleryGlobal;

pub fn routes<G: GalleryGlobal>(_: &Arc<G>) -> RouterBuilder<Incoming, RouteError<ApiError>> {
	RouterBuilder::new().get("/health/", health)
}

async fn health(_: Request<Incoming>) -> Result<Response<Body>> {
	Ok(make_response!(StatusCode::OK, json!({ "status": "ok" })))
}
