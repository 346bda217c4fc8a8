use std::fmt::{Debug, Formatter};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A cancellation scope shared by every long running task of a process.
///
/// Each clone keeps the scope alive. [`Handler::cancel`] signals all clones
/// and then waits until every one of them has been dropped, which is how the
/// binary knows that in-flight work has wound down.
#[derive(Clone)]
pub struct Context {
	token: CancellationToken,
	_alive: mpsc::Sender<()>,
}

pub struct Handler {
	token: CancellationToken,
	alive: mpsc::Receiver<()>,
}

impl Context {
	#[must_use]
	pub fn new() -> (Self, Handler) {
		let token = CancellationToken::new();
		let (sender, receiver) = mpsc::channel(1);

		(
			Self {
				token: token.clone(),
				_alive: sender,
			},
			Handler { token, alive: receiver },
		)
	}

	/// Resolves once the scope has been cancelled.
	pub async fn done(&self) {
		self.token.cancelled().await
	}

	pub fn is_done(&self) -> bool {
		self.token.is_cancelled()
	}
}

impl Debug for Context {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Context").field("done", &self.is_done()).finish()
	}
}

impl Handler {
	/// Waits for every context to be dropped without cancelling them.
	pub async fn done(&mut self) {
		while self.alive.recv().await.is_some() {}
	}

	/// Cancels every context and waits for all of them to be dropped.
	pub async fn cancel(mut self) {
		self.token.cancel();
		self.done().await;
	}
}
