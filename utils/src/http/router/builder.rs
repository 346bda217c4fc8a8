use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use super::middleware::Middleware;
use super::types::{Endpoint, NextFn, NextFut, RouteEntry, RouteHandler};
use super::Router;
use crate::http::Body;

#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Clone, Copy)]
enum MiddlewareKind {
	Data,
	Error,
	Generic,
}

enum RouterItem<I, E> {
	Route(Option<hyper::Method>, RouteHandler<I, E>),
	Scope(RouterBuilder<I, E>),
}

pub struct RouterBuilder<I, E> {
	tree: Vec<(String, RouterItem<I, E>)>,
	middlewares: Vec<(Arc<dyn Middleware<I, E>>, MiddlewareKind)>,
	not_found: Option<RouteHandler<I, E>>,
}

impl<I: Send + 'static, E: Send + 'static> Default for RouterBuilder<I, E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<I: Send + 'static, E: Send + 'static> RouterBuilder<I, E> {
	pub fn new() -> Self {
		Self {
			tree: Vec::new(),
			middlewares: Vec::new(),
			not_found: None,
		}
	}

	pub fn middleware(mut self, middleware: impl Middleware<I, E>) -> Self {
		self.middlewares.push((Arc::new(middleware), MiddlewareKind::Generic));
		self
	}

	/// Makes `data` available to every handler below this point through
	/// [`RequestExt::data`](super::ext::RequestExt::data).
	pub fn data<T: Clone + Send + Sync + 'static>(mut self, data: T) -> Self {
		self.middlewares.push((
			Arc::new(move |mut req: hyper::Request<I>, next: NextFn<I, E>| {
				req.extensions_mut().insert(data.clone());
				next(req)
			}),
			MiddlewareKind::Data,
		));

		self
	}

	/// Turns every error produced below this point into a response.
	pub fn error_handler<F: Future<Output = hyper::Response<Body>> + Send + 'static>(
		mut self,
		handler: impl Fn(hyper::Request<()>, E) -> F + Send + Sync + 'static,
	) -> Self {
		let handler = Arc::new(handler);
		self.middlewares.push((
			Arc::new(move |req: hyper::Request<I>, next: NextFn<I, E>| {
				let handler = handler.clone();
				async move {
					let (parts, body) = req.into_parts();

					match next(hyper::Request::from_parts(parts.clone(), body)).await {
						Ok(res) => Ok(res),
						Err(err) => Ok(handler(hyper::Request::from_parts(parts, ()), err).await),
					}
				}
			}),
			MiddlewareKind::Error,
		));

		self
	}

	pub fn get<F: Future<Output = Result<hyper::Response<Body>, E>> + Send + 'static>(
		self,
		path: &str,
		handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
	) -> Self {
		self.route(Some(hyper::Method::GET), path, handler)
	}

	pub fn post<F: Future<Output = Result<hyper::Response<Body>, E>> + Send + 'static>(
		self,
		path: &str,
		handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
	) -> Self {
		self.route(Some(hyper::Method::POST), path, handler)
	}

	/// Matches every method not registered explicitly for `path`.
	pub fn any<F: Future<Output = Result<hyper::Response<Body>, E>> + Send + 'static>(
		self,
		path: &str,
		handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
	) -> Self {
		self.route(None, path, handler)
	}

	pub fn route<F: Future<Output = Result<hyper::Response<Body>, E>> + Send + 'static>(
		mut self,
		method: Option<hyper::Method>,
		path: &str,
		handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
	) -> Self {
		self.tree.push((
			path.to_string(),
			RouterItem::Route(method, Arc::new(move |req| Box::pin(handler(req)) as NextFut<E>)),
		));
		self
	}

	pub fn scope(mut self, prefix: &str, builder: RouterBuilder<I, E>) -> Self {
		self.tree.push((prefix.to_string(), RouterItem::Scope(builder)));
		self
	}

	/// Handles requests whose path matches no route. It runs behind the
	/// middleware of the root builder.
	pub fn not_found<F: Future<Output = Result<hyper::Response<Body>, E>> + Send + 'static>(
		mut self,
		handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
	) -> Self {
		self.not_found = Some(Arc::new(move |req| Box::pin(handler(req)) as NextFut<E>));
		self
	}

	pub fn build(mut self) -> Router<I, E> {
		let mut router = Router {
			tree: path_tree::PathTree::new(),
			endpoints: Vec::new(),
			routes: Vec::new(),
			middlewares: Vec::new(),
			not_found: None,
		};

		let not_found = self.not_found.take();
		let mut paths = HashMap::new();
		let root_middleware = self.flatten("", &[], &mut router, &mut paths);

		router.not_found = not_found.map(|handler| RouteEntry {
			handler,
			middleware: root_middleware,
		});

		// the returned route id is unused, lookups resolve to `idx`
		for (path, idx) in paths {
			let _ = router.tree.insert(&path, idx);
		}

		router
	}

	fn flatten(
		mut self,
		prefix: &str,
		parent: &[usize],
		router: &mut Router<I, E>,
		paths: &mut HashMap<String, usize>,
	) -> Vec<usize> {
		self.middlewares.sort_by_key(|(_, kind)| *kind);

		let mut middleware = parent.to_vec();
		for (m, _) in self.middlewares {
			middleware.push(router.middlewares.len());
			router.middlewares.push(m);
		}

		for (path, item) in self.tree {
			let path = join_path(prefix, &path);
			match item {
				RouterItem::Route(method, handler) => {
					let route = router.routes.len();
					router.routes.push(RouteEntry {
						handler,
						middleware: middleware.clone(),
					});

					let idx = *paths.entry(path).or_insert_with(|| {
						router.endpoints.push(Endpoint::default());
						router.endpoints.len() - 1
					});

					let endpoint = &mut router.endpoints[idx];
					match method {
						Some(method) => endpoint.methods.push((method, route)),
						None => endpoint.any = Some(route),
					}
				}
				RouterItem::Scope(builder) => {
					builder.flatten(&path, &middleware, router, paths);
				}
			}
		}

		middleware
	}
}

fn join_path(prefix: &str, path: &str) -> String {
	let prefix = prefix.trim_end_matches('/');
	let path = path.trim_start_matches('/');

	if path.is_empty() && !prefix.is_empty() {
		return prefix.to_string();
	}

	format!("{prefix}/{path}")
}
