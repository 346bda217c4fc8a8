use std::sync::Arc;

use hyper::body::Incoming;
use hyper::header::{self, HeaderValue};
use hyper::Request;
use utils::http::router::ext::RequestExt as _;
use utils::http::router::middleware::Middleware;
use utils::http::router::types::NextFn;
use utils::http::RouteError;

use super::response_headers::RequestExt as _;
use crate::api::auth::AuthData;
use crate::api::error::ApiError;
use crate::api::ext::RequestExt as _;
use crate::api::request_context::RequestContext;
use crate::api::response::SESSION_COOKIE;
use crate::global::GalleryGlobal;

pub const TOKEN_CHECK_HEADER: &str = "x-auth-token-check-status";

/// Resolves the session token, if any, once per request. A bad token never
/// fails the request, it is served as anonymous with the check header set.
pub fn auth_middleware<G: GalleryGlobal>(_: &Arc<G>) -> impl Middleware<Incoming, RouteError<ApiError>> {
	|mut req: Request<Incoming>, next: NextFn<Incoming, RouteError<ApiError>>| async move {
		let context = RequestContext::default();
		req.provide(context.clone());

		let Some(token) = session_token(&req) else {
			return next(req).await;
		};

		let global = req.get_global::<G>()?;

		match AuthData::from_token(&global, &token).await {
			Ok(data) => context.set_auth(data).await,
			Err(err) => {
				tracing::debug!(error = %err, "rejected session token");
				req.set_response_header(TOKEN_CHECK_HEADER, HeaderValue::from_static("failed"));
			}
		}

		next(req).await
	}
}

/// The bearer token wins over the session cookie.
fn session_token<B>(req: &Request<B>) -> Option<String> {
	let bearer = req
		.headers()
		.get(header::AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "));

	if let Some(token) = bearer {
		return Some(token.trim().to_string());
	}

	req.headers()
		.get_all(header::COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
		.map(|(_, value)| value.to_string())
}
