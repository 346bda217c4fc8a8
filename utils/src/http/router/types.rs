use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::super::Body;

/// Parameters captured by the matched route pattern, in pattern order.
#[derive(Debug, Clone, Default)]
pub struct RouteParams(pub Box<[(String, String)]>);

pub type NextFut<E> = Pin<Box<dyn Future<Output = Result<hyper::Response<Body>, E>> + Send + 'static>>;

pub type NextFn<I, E> = Box<dyn FnOnce(hyper::Request<I>) -> NextFut<E> + Send + 'static>;

pub(crate) type RouteHandler<I, E> = Arc<dyn Fn(hyper::Request<I>) -> NextFut<E> + Send + Sync + 'static>;

#[derive(Debug, Default)]
pub(crate) struct Endpoint {
	pub methods: Vec<(hyper::Method, usize)>,
	pub any: Option<usize>,
}

impl Endpoint {
	pub fn resolve(&self, method: &hyper::Method) -> Option<usize> {
		self.methods
			.iter()
			.find(|(m, _)| m == method)
			.map(|(_, idx)| *idx)
			.or_else(|| {
				// HEAD falls back to the GET handler
				if method == hyper::Method::HEAD {
					self.methods
						.iter()
						.find(|(m, _)| m == hyper::Method::GET)
						.map(|(_, idx)| *idx)
				} else {
					None
				}
			})
			.or(self.any)
	}

	pub fn allowed(&self) -> String {
		self.methods.iter().map(|(m, _)| m.as_str()).collect::<Vec<_>>().join(", ")
	}
}

pub(crate) struct RouteEntry<I, E> {
	pub handler: RouteHandler<I, E>,
	pub middleware: Vec<usize>,
}
