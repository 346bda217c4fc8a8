#[derive(Debug, thiserror::Error)]
pub enum RouterError<E> {
	#[error("no route matched the request")]
	NotFound,
	#[error("unhandled error: {0:?}")]
	Unhandled(E),
}
