use std::future::Future;

use super::types::{NextFn, NextFut};
use crate::http::Body;

/// Wraps the rest of the chain. Implemented for every
/// `Fn(Request, NextFn) -> impl Future<Output = Result<Response, E>>`.
pub trait Middleware<I, E>: Send + Sync + 'static {
	fn handle(&self, req: hyper::Request<I>, next: NextFn<I, E>) -> NextFut<E>;
}

impl<I, E, F, Fut> Middleware<I, E> for F
where
	I: Send + 'static,
	E: Send + 'static,
	F: Fn(hyper::Request<I>, NextFn<I, E>) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<hyper::Response<Body>, E>> + Send + 'static,
{
	fn handle(&self, req: hyper::Request<I>, next: NextFn<I, E>) -> NextFut<E> {
		Box::pin(self(req, next))
	}
}
