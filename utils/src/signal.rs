use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

/// Fans several unix signals into a single receiver.
pub struct SignalHandler {
	sender: mpsc::Sender<SignalKind>,
	receiver: mpsc::Receiver<SignalKind>,
}

impl Default for SignalHandler {
	fn default() -> Self {
		let (sender, receiver) = mpsc::channel(1);
		Self { sender, receiver }
	}
}

impl SignalHandler {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_signal(self, kind: SignalKind) -> std::io::Result<Self> {
		let mut stream = signal(kind)?;

		let sender = self.sender.clone();
		tokio::spawn(async move {
			while stream.recv().await.is_some() {
				if sender.send(kind).await.is_err() {
					break;
				}
			}
		});

		Ok(self)
	}

	pub async fn recv(&mut self) -> Option<SignalKind> {
		self.receiver.recv().await
	}
}
