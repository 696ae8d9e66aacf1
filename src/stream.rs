use {
	core::{
		pin::Pin,
		task::{Context, Poll},
	},
	futures::{
		Stream,
		StreamExt,
		stream::{self, BoxStream},
	},
	tokio::sync::mpsc,
};

/// A lazy, finite-or-infinite sequence of messages of type `T`.
///
/// Notes:
///
/// - Streams are single-consumer and non-restartable. Consuming the head
///   hands the element out exactly once; an exhausted stream keeps
///   returning `None`.
/// - Evaluating the head of a channel-backed stream suspends until the
///   producing side enqueues the next element. Subscriptions hand out
///   channel-backed instances fed by the topic's bounded input buffer.
/// - Combinators are element-wise and never buffer on their own.
pub struct MessageStream<T> {
	inner: BoxStream<'static, T>,
}

impl<T: Send + 'static> MessageStream<T> {
	/// Wraps any stream of messages.
	pub fn from_stream(stream: impl Stream<Item = T> + Send + 'static) -> Self {
		Self {
			inner: stream.boxed(),
		}
	}

	/// A finite stream over the items of an iterator.
	pub fn from_iter<I>(items: I) -> Self
	where
		I: IntoIterator<Item = T>,
		I::IntoIter: Send + 'static,
	{
		Self::from_stream(stream::iter(items))
	}

	/// A stream draining a bounded channel. The head suspends while the
	/// channel is empty and the stream ends once every sender is gone.
	pub fn from_channel(receiver: mpsc::Receiver<T>) -> Self {
		Self::from_stream(stream::unfold(receiver, |mut receiver| async move {
			receiver.recv().await.map(|item| (item, receiver))
		}))
	}

	/// Consumes the head of the stream.
	pub async fn next(&mut self) -> Option<T> {
		self.inner.next().await
	}

	/// Element-wise transformation.
	pub fn map<U, F>(self, f: F) -> MessageStream<U>
	where
		U: Send + 'static,
		F: FnMut(T) -> U + Send + 'static,
	{
		MessageStream {
			inner: self.inner.map(f).boxed(),
		}
	}
}

impl<T, F> MessageStream<F>
where
	T: Send + 'static,
	F: Future<Output = T> + Send + 'static,
{
	/// Lifts a stream of deferred messages into a stream of messages by
	/// awaiting each element as it is consumed.
	pub fn force(self) -> MessageStream<T> {
		MessageStream {
			inner: self.inner.then(|deferred| deferred).boxed(),
		}
	}
}

impl<T> Stream for MessageStream<T> {
	type Item = T;

	fn poll_next(
		self: Pin<&mut Self>,
		cx: &mut Context<'_>,
	) -> Poll<Option<Self::Item>> {
		self.get_mut().inner.poll_next_unpin(cx)
	}
}
