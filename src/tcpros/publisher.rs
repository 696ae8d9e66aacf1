use {
	super::{header::ConnectionHeader, link::Link},
	crate::{
		channel::Channel,
		config::Config,
		error::Error,
		message::Message,
		naming::TopicName,
		stream::MessageStream,
	},
	bytes::Bytes,
	serde::Serialize,
	std::{
		io,
		net::SocketAddr,
		sync::{Arc, Mutex},
	},
	tokio::{
		net::{TcpListener, TcpSocket, TcpStream},
		sync::mpsc::{self, error::TrySendError},
		task::JoinHandle,
	},
	tokio_util::sync::{CancellationToken, DropGuard},
	tracing::{debug, info, warn},
};

/// Per-client send counters for one publication.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SendStats {
	pub bytes: u64,
	pub messages: u64,
	pub dropped: u64,
}

struct ClientEntry {
	peer: SocketAddr,
	caller_id: Option<String>,
	buffer: mpsc::Sender<Bytes>,
	stats: Arc<Mutex<SendStats>>,
	writer: JoinHandle<()>,
}

type Roster = Arc<Mutex<Vec<ClientEntry>>>;

/// Handle to one topic's publisher server.
///
/// Notes:
///
/// - The accept loop admits subscribers after negotiating on the freshly
///   accepted client socket; a rejected client loses only its own socket.
/// - Each admitted client gets a bounded buffer of encoded payloads and a
///   writer task draining it into the socket.
/// - The pump pulls the publication's stream, encodes each message once
///   and enqueues the bytes to every live client. A full client buffer
///   drops the message for that client only, so one stalled subscriber
///   never starves the rest; the drop is visible in that client's stats.
/// - Dropping the handle cancels all of it.
pub(crate) struct PublisherHandle {
	port: u16,
	clients: Roster,
	cancel: CancellationToken,
	accept: JoinHandle<()>,
	pump: JoinHandle<()>,
	_abort: DropGuard,
}

impl PublisherHandle {
	pub(crate) const fn port(&self) -> u16 {
		self.port
	}

	pub(crate) fn client_stats(
		&self,
	) -> Vec<(SocketAddr, Option<String>, SendStats)> {
		self.clients
			.lock()
			.expect("lock poisoned")
			.iter()
			.map(|client| {
				(
					client.peer,
					client.caller_id.clone(),
					client.stats.lock().expect("lock poisoned").clone(),
				)
			})
			.collect()
	}

	/// Tears the publication down: the accept loop, the pump, every
	/// writer task and the listening socket.
	pub(crate) async fn shutdown(self) {
		self.cancel.cancel();
		let _ = self.accept.await;
		let _ = self.pump.await;

		let writers: Vec<JoinHandle<()>> = self
			.clients
			.lock()
			.expect("lock poisoned")
			.drain(..)
			.map(|client| client.writer)
			.collect();
		for writer in writers {
			let _ = writer.await;
		}
	}
}

/// Binds an OS-assigned port for a topic and spawns its accept and pump
/// tasks.
pub(crate) async fn run_server<T: Message>(
	caller_id: &str,
	topic: &TopicName,
	stream: MessageStream<T>,
	config: &Config,
	cancel: CancellationToken,
) -> Result<PublisherHandle, Error> {
	let listener = bind(config)?;
	let port = listener.local_addr()?.port();
	let clients: Roster = Arc::default();

	info!(topic = %topic, port, "topic server listening");

	let accept = tokio::spawn(accept_loop::<T>(
		listener,
		caller_id.to_owned(),
		topic.clone(),
		Arc::clone(&clients),
		cancel.clone(),
	));
	let pump = tokio::spawn(pump_loop(
		topic.clone(),
		stream,
		Arc::clone(&clients),
		cancel.clone(),
	));

	Ok(PublisherHandle {
		port,
		clients,
		_abort: cancel.clone().drop_guard(),
		cancel,
		accept,
		pump,
	})
}

fn bind(config: &Config) -> Result<TcpListener, Error> {
	let addr: SocketAddr = format!("{}:0", config.bind_host)
		.parse()
		.map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

	let socket = if addr.is_ipv4() {
		TcpSocket::new_v4()?
	} else {
		TcpSocket::new_v6()?
	};
	socket.bind(addr)?;

	Ok(socket.listen(config.listen_backlog)?)
}

async fn accept_loop<T: Message>(
	listener: TcpListener,
	caller_id: String,
	topic: TopicName,
	clients: Roster,
	cancel: CancellationToken,
) {
	loop {
		tokio::select! {
			_ = cancel.cancelled() => break,
			accepted = listener.accept() => match accepted {
				Ok((socket, peer)) => {
					debug!(topic = %topic, %peer, "incoming subscriber connection");
					tokio::spawn(admit::<T>(
						socket,
						caller_id.clone(),
						topic.clone(),
						Arc::clone(&clients),
						cancel.clone(),
					));
				}
				Err(error) => {
					warn!(topic = %topic, %error, "accept failed");
				}
			},
		}
	}
}

/// Publisher-side negotiation, always on the accepted client socket. A
/// rejected client costs that socket only; the accept loop keeps serving
/// the rest.
async fn admit<T: Message>(
	socket: TcpStream,
	caller_id: String,
	topic: TopicName,
	clients: Roster,
	cancel: CancellationToken,
) {
	let peer = match socket.peer_addr() {
		Ok(peer) => peer,
		Err(error) => {
			debug!(topic = %topic, %error, "client gone before negotiation");
			return;
		}
	};

	let negotiated = tokio::select! {
		_ = cancel.cancelled() => return,
		result = negotiate_client::<T>(socket, &caller_id) => result,
	};
	let (link, request) = match negotiated {
		Ok(negotiated) => negotiated,
		Err(error) => {
			warn!(topic = %topic, %peer, %error, "rejected subscriber");
			return;
		}
	};

	info!(
		topic = %topic,
		%peer,
		caller_id = request.caller_id().unwrap_or("<unknown>"),
		requested = request.topic().unwrap_or("<none>"),
		"subscriber connected",
	);

	let (buffer, outbox) = Channel::<Bytes>::default().split();
	let writer = tokio::spawn(write_loop(link, outbox, cancel));

	clients.lock().expect("lock poisoned").push(ClientEntry {
		peer,
		caller_id: request.caller_id().map(str::to_owned),
		buffer,
		stats: Arc::default(),
		writer,
	});
}

async fn negotiate_client<T: Message>(
	socket: TcpStream,
	caller_id: &str,
) -> Result<(Link, ConnectionHeader), Error> {
	let mut link = Link::from_stream(socket)?;

	let Some(frame) = link.recv().await? else {
		return Err(Error::Io(io::Error::new(
			io::ErrorKind::UnexpectedEof,
			"connection closed during negotiation",
		)));
	};

	let request = ConnectionHeader::parse(&frame)?;
	request.validate(&T::type_name(), &T::md5sum())?;

	let reply = ConnectionHeader::for_publication::<T>(caller_id);
	link.send(reply.encode()).await?;

	Ok((link, request))
}

async fn write_loop(
	mut link: Link,
	mut outbox: mpsc::Receiver<Bytes>,
	cancel: CancellationToken,
) {
	loop {
		tokio::select! {
			_ = cancel.cancelled() => break,
			payload = outbox.recv() => match payload {
				Some(payload) => {
					if let Err(error) = link.send(payload).await {
						debug!(
							peer = %link.peer_addr(),
							%error,
							"subscriber connection lost",
						);
						break;
					}
				}
				None => break,
			},
		}
	}
}

async fn pump_loop<T: Message>(
	topic: TopicName,
	mut stream: MessageStream<T>,
	clients: Roster,
	cancel: CancellationToken,
) {
	loop {
		let message = tokio::select! {
			_ = cancel.cancelled() => break,
			message = stream.next() => message,
		};
		let Some(message) = message else {
			debug!(topic = %topic, "publication stream exhausted");
			break;
		};

		let payload = match message.encode() {
			Ok(payload) => payload,
			Err(error) => {
				warn!(topic = %topic, %error, "failed to encode message");
				break;
			}
		};

		let mut clients = clients.lock().expect("lock poisoned");
		clients.retain(|client| !client.buffer.is_closed());
		for client in clients.iter() {
			match client.buffer.try_send(payload.clone()) {
				Ok(()) => {
					let mut stats = client.stats.lock().expect("lock poisoned");
					stats.messages += 1;
					stats.bytes += payload.len() as u64;
				}
				Err(TrySendError::Full(_)) => {
					client.stats.lock().expect("lock poisoned").dropped += 1;
				}
				Err(TrySendError::Closed(_)) => {}
			}
		}
	}
}
