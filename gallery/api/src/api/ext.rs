use std::sync::{Arc, Weak};

use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::{header, Request, StatusCode};
use ulid::Ulid;
use utils::http::ext::OptionExt;
use utils::http::router::ext::RequestExt as _;
use utils::http::RouteError;

use super::error::{ApiError, Result};
use super::request_context::RequestContext;
use crate::forms::FormData;

/// Room for field names, boundaries and text fields on top of the file.
const FORM_OVERHEAD: usize = 64 * 1024;

pub trait RequestExt {
	fn get_global<G: Send + Sync + 'static>(&self) -> Result<Arc<G>>;

	fn context(&self) -> Result<RequestContext>;

	/// A ULID path parameter. Anything unparsable is a `404`, like an id
	/// that does not exist.
	fn id_param(&self, name: &str) -> Result<Ulid>;
}

impl<B> RequestExt for Request<B> {
	fn get_global<G: Send + Sync + 'static>(&self) -> Result<Arc<G>> {
		self.extensions()
			.get::<Weak<G>>()
			.and_then(Weak::upgrade)
			.map_err_route("failed to upgrade global state")
	}

	fn context(&self) -> Result<RequestContext> {
		self.data::<RequestContext>().cloned().map_err_route("missing request context")
	}

	fn id_param(&self, name: &str) -> Result<Ulid> {
		self.param(name)
			.and_then(|id| Ulid::from_string(id).ok())
			.map_err_route((StatusCode::NOT_FOUND, "not found"))
	}
}

/// Reads and parses a url-encoded or multipart submission. The body may
/// carry at most `max_upload_size` bytes of file plus the form around it.
pub async fn read_form(req: Request<Incoming>, max_upload_size: usize) -> Result<FormData> {
	let content_type = req
		.headers()
		.get(header::CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.unwrap_or_default()
		.to_string();

	let body = match Limited::new(req.into_body(), max_upload_size.saturating_add(FORM_OVERHEAD))
		.collect()
		.await
	{
		Ok(body) => body.to_bytes(),
		Err(err) => {
			return Err(match err.downcast::<hyper::Error>() {
				Ok(err) => RouteError::from((StatusCode::BAD_REQUEST, "failed to read request body", ApiError::Body(*err))),
				Err(_) => RouteError::from((StatusCode::PAYLOAD_TOO_LARGE, "request body is too large")),
			});
		}
	};

	Ok(FormData::parse(&content_type, body, max_upload_size as u64).await?)
}
