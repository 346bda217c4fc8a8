use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use self::builder::RouterBuilder;
use self::error::RouterError;
use self::middleware::Middleware;
use self::types::{Endpoint, NextFn, NextFut, RouteEntry, RouteParams};
use super::Body;
use crate::make_response;

pub mod builder;
pub mod error;
pub mod ext;
pub mod middleware;
pub mod types;

/// Routes are keyed by path. A path that exists but has no handler for the
/// request method answers `405` with an `Allow` header.
pub struct Router<I, E> {
	tree: path_tree::PathTree<usize>,
	endpoints: Vec<Endpoint>,
	routes: Vec<RouteEntry<I, E>>,
	middlewares: Vec<Arc<dyn Middleware<I, E>>>,
	not_found: Option<RouteEntry<I, E>>,
}

impl<I: Send + 'static, E: Send + 'static> Router<I, E> {
	pub fn builder() -> RouterBuilder<I, E> {
		RouterBuilder::new()
	}

	pub async fn handle(&self, mut req: hyper::Request<I>) -> Result<hyper::Response<Body>, RouterError<E>> {
		let path = req.uri().path().to_string();

		let entry = match self.tree.find(&path) {
			Some((idx, matched)) => {
				let endpoint = &self.endpoints[*idx];
				let Some(route) = endpoint.resolve(req.method()) else {
					return Ok(method_not_allowed(endpoint));
				};

				req.extensions_mut().insert(RouteParams(
					matched
						.params_iter()
						.map(|(k, v)| (k.to_owned(), v.to_owned()))
						.collect(),
				));

				&self.routes[route]
			}
			None => self.not_found.as_ref().ok_or(RouterError::NotFound)?,
		};

		let handler = entry.handler.clone();
		let next: NextFn<I, E> = Box::new(move |req| handler(req));

		entry
			.middleware
			.iter()
			.rev()
			.map(|i| self.middlewares[*i].clone())
			.fold(next, |next, middleware| {
				Box::new(move |req| Box::pin(async move { middleware.handle(req, next).await }) as NextFut<E>) as NextFn<I, E>
			})(req)
		.await
		.map_err(RouterError::Unhandled)
	}
}

fn method_not_allowed(endpoint: &Endpoint) -> hyper::Response<Body> {
	let mut res = make_response!(
		hyper::StatusCode::METHOD_NOT_ALLOWED,
		serde_json::json!({ "message": "method not allowed", "success": false })
	);

	if let Ok(allow) = hyper::header::HeaderValue::from_str(&endpoint.allowed()) {
		res.headers_mut().insert(hyper::header::ALLOW, allow);
	}

	res
}

impl<I, E> Debug for Router<I, E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Router").field("endpoints", &self.endpoints).finish()
	}
}
