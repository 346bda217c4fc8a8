use std::sync::{Arc, Mutex, PoisonError};

use hyper::body::Incoming;
use hyper::header::IntoHeaderName;
use hyper::Request;
use utils::http::router::ext::RequestExt as _;
use utils::http::router::middleware::Middleware;
use utils::http::router::types::NextFn;
use utils::http::RouteError;

use crate::api::error::ApiError;
use crate::global::GalleryGlobal;

/// Headers a handler or an inner middleware wants on the response, applied
/// to error responses as well.
#[derive(Clone)]
pub struct ResponseHeadersMiddleware(pub Arc<Mutex<hyper::HeaderMap>>);

impl Default for ResponseHeadersMiddleware {
	fn default() -> Self {
		Self(Arc::new(Mutex::new(hyper::HeaderMap::new())))
	}
}

pub fn response_headers_middleware<G: GalleryGlobal>(_: &Arc<G>) -> impl Middleware<Incoming, RouteError<ApiError>> {
	|mut req: Request<Incoming>, next: NextFn<Incoming, RouteError<ApiError>>| async move {
		let headers = ResponseHeadersMiddleware::default();
		req.provide(headers.clone());

		let mut result = next(req).await;

		let target = match &mut result {
			Ok(res) => res.headers_mut(),
			Err(err) => err.headers_mut(),
		};

		let headers = headers.0.lock().unwrap_or_else(PoisonError::into_inner);
		headers.iter().for_each(|(k, v)| {
			target.insert(k, v.clone());
		});
		drop(headers);

		result
	}
}

pub trait RequestExt {
	fn set_response_header<K, V>(&self, key: K, value: V)
	where
		K: IntoHeaderName,
		V: Into<hyper::header::HeaderValue>;
}

impl<B> RequestExt for Request<B> {
	fn set_response_header<K, V>(&self, key: K, value: V)
	where
		K: IntoHeaderName,
		V: Into<hyper::header::HeaderValue>,
	{
		let Some(headers) = self.data::<ResponseHeadersMiddleware>() else {
			return;
		};

		let mut headers = headers.0.lock().unwrap_or_else(PoisonError::into_inner);
		headers.insert(key, value.into());
	}
}
