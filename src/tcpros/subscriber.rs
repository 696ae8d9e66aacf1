use {
	super::{header::ConnectionHeader, link::Link},
	crate::{
		error::Error,
		message::Message,
		naming::{PeerUri, TopicName},
		stream::MessageStream,
	},
	chrono::{DateTime, Utc},
	futures::stream,
	serde::Serialize,
	std::{
		collections::HashMap,
		io,
		sync::{Arc, Mutex},
	},
	tokio::{sync::mpsc, task::JoinHandle},
	tokio_util::sync::CancellationToken,
	tracing::{debug, warn},
};

/// Per-publisher receive counters for one subscription.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReceiveStats {
	pub bytes: u64,
	pub messages: u64,
	pub last_seen: Option<DateTime<Utc>>,
}

pub(crate) type SourceStats = Arc<Mutex<HashMap<PeerUri, ReceiveStats>>>;

/// Connects to a single publisher, negotiates the connection header for
/// `T` and returns the lazy stream of decoded messages.
///
/// The stream ends on clean EOF; a socket or decode failure also ends it
/// after logging, since either is fatal to this connection only.
pub async fn subscribe_stream<T: Message>(
	caller_id: &str,
	topic: &TopicName,
	uri: &PeerUri,
) -> Result<MessageStream<T>, Error> {
	let link = negotiate::<T>(caller_id, topic, uri).await?;
	Ok(decode_stream(link))
}

async fn negotiate<T: Message>(
	caller_id: &str,
	topic: &TopicName,
	uri: &PeerUri,
) -> Result<Link, Error> {
	let mut link = Link::connect(uri).await?;

	let request = ConnectionHeader::for_subscription::<T>(caller_id, topic);
	link.send(request.encode()).await?;

	let Some(frame) = link.recv().await? else {
		return Err(Error::Io(io::Error::new(
			io::ErrorKind::UnexpectedEof,
			"connection closed during negotiation",
		)));
	};

	let reply = ConnectionHeader::parse(&frame)?;
	reply.validate(&T::type_name(), &T::md5sum())?;

	Ok(link)
}

fn decode_stream<T: Message>(link: Link) -> MessageStream<T> {
	MessageStream::from_stream(stream::unfold(link, |mut link| async move {
		match link.recv().await {
			Ok(Some(frame)) => match T::decode(&frame) {
				Ok(message) => Some((message, link)),
				Err(error) => {
					warn!(
						peer = %link.peer_addr(),
						%error,
						"closing source on decode failure",
					);
					None
				}
			},
			Ok(None) => None,
			Err(error) => {
				debug!(peer = %link.peer_addr(), %error, "source connection lost");
				None
			}
		}
	}))
}

/// Spawns the reader task for one publisher URI.
///
/// Every decoded message is enqueued into the subscription's bounded input
/// buffer; a full buffer suspends the reader, which is what slows a fast
/// publisher down to the consumer's pace. The task exits on negotiation
/// failure, socket error, decode failure, clean EOF or cancellation.
pub(crate) fn add_source<T: Message>(
	caller_id: String,
	topic: TopicName,
	uri: PeerUri,
	buffer: mpsc::Sender<T>,
	stats: SourceStats,
	cancel: CancellationToken,
) -> JoinHandle<()> {
	stats
		.lock()
		.expect("lock poisoned")
		.entry(uri.clone())
		.or_default();

	tokio::spawn(async move {
		let connect = negotiate::<T>(&caller_id, &topic, &uri);
		let mut link = tokio::select! {
			_ = cancel.cancelled() => return,
			result = connect => match result {
				Ok(link) => link,
				Err(error) => {
					warn!(
						topic = %topic,
						peer = %uri,
						%error,
						"failed to connect to publisher",
					);
					return;
				}
			},
		};

		debug!(topic = %topic, peer = %uri, "connected to publisher");

		loop {
			tokio::select! {
				_ = cancel.cancelled() => break,
				frame = link.recv() => match frame {
					Ok(Some(frame)) => {
						let message = match T::decode(&frame) {
							Ok(message) => message,
							Err(error) => {
								warn!(
									topic = %topic,
									peer = %uri,
									%error,
									"dropping publisher on decode failure",
								);
								break;
							}
						};

						{
							let mut stats = stats.lock().expect("lock poisoned");
							let entry = stats.entry(uri.clone()).or_default();
							entry.messages += 1;
							entry.bytes += frame.len() as u64;
							entry.last_seen = Some(Utc::now());
						}

						// Suspends while the consumer's buffer is full.
						if buffer.send(message).await.is_err() {
							break;
						}
					}
					Ok(None) => {
						debug!(
							topic = %topic,
							peer = %uri,
							"publisher closed the connection",
						);
						break;
					}
					Err(error) => {
						debug!(
							topic = %topic,
							peer = %uri,
							%error,
							"publisher connection lost",
						);
						break;
					}
				},
			}
		}
	})
}
