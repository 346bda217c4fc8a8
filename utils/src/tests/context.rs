use std::time::Duration;

use crate::context::Context;
use crate::prelude::FutureTimeout;

#[tokio::test]
async fn test_context_cancel() {
	let (ctx, handler) = Context::new();

	let handle = tokio::spawn(async move {
		ctx.done().await;
		assert!(ctx.is_done());
	});

	handler
		.cancel()
		.timeout(Duration::from_millis(300))
		.await
		.expect("task should be cancelled");
	handle
		.timeout(Duration::from_millis(300))
		.await
		.expect("task should be cancelled")
		.expect("panic in task");
}

#[tokio::test]
async fn test_context_waits_for_clones() {
	let (ctx, handler) = Context::new();
	let clone = ctx.clone();
	drop(ctx);

	let (tx, rx) = tokio::sync::oneshot::channel();
	let handle = tokio::spawn(async move {
		clone.done().await;
		// hold the scope open a little after cancellation
		tokio::time::sleep(Duration::from_millis(50)).await;
		tx.send(()).expect("receiver dropped");
	});

	handler
		.cancel()
		.timeout(Duration::from_millis(500))
		.await
		.expect("handler should finish once every context is dropped");

	rx.await.expect("task finished before the handler returned");
	handle.await.expect("panic in task");
}

#[tokio::test]
async fn test_context_not_done() {
	let (ctx, _handler) = Context::new();

	assert!(!ctx.is_done());
	assert!(ctx.done().timeout(Duration::from_millis(50)).await.is_err());
}
