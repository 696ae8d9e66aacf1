use tokio::sync::mpsc;

/// Backpressure bound used on both sides of the transport: a subscription's
/// input buffer and each publisher client's output buffer never hold more
/// than this many messages.
pub(crate) const MESSAGE_BACKLOG: usize = 10;

/// A bounded mpsc pair with a compile-time backlog.
pub(crate) struct Channel<T, const BACKLOG: usize = { MESSAGE_BACKLOG }> {
	sender: mpsc::Sender<T>,
	receiver: mpsc::Receiver<T>,
}

impl<T, const BACKLOG: usize> Default for Channel<T, BACKLOG> {
	fn default() -> Self {
		let (sender, receiver) = mpsc::channel(BACKLOG);
		Self { sender, receiver }
	}
}

impl<T, const BACKLOG: usize> Channel<T, BACKLOG> {
	pub(crate) fn split(self) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
		(self.sender, self.receiver)
	}
}
