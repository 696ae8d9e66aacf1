use {
	crate::{
		message::Message,
		naming::{PeerUri, TopicName},
		tcpros::{
			SendStats,
			publisher::PublisherHandle,
			subscriber::{self, ReceiveStats, SourceStats},
		},
	},
	serde::Serialize,
	std::{
		collections::HashSet,
		sync::{Arc, Mutex},
	},
	tokio::{sync::mpsc, task::JoinHandle},
	tokio_util::sync::CancellationToken,
};

type ConnectFn = Box<dyn Fn(PeerUri) -> JoinHandle<()> + Send + Sync>;

/// Subscriber-side bookkeeping for one topic.
///
/// The message type is erased at this level: the typed sender into the
/// topic's bounded input buffer lives inside the boxed connect closure,
/// which is all the registry needs to spawn reader tasks for new peers.
pub(crate) struct Subscription {
	type_name: String,
	known: Mutex<HashSet<PeerUri>>,
	stats: SourceStats,
	connect: ConnectFn,
}

impl Subscription {
	pub(crate) fn new<T: Message>(
		caller_id: String,
		topic: TopicName,
		buffer: mpsc::Sender<T>,
		cancel: CancellationToken,
	) -> Self {
		let stats: SourceStats = Arc::default();
		let connect: ConnectFn = {
			let stats = Arc::clone(&stats);
			Box::new(move |uri| {
				subscriber::add_source::<T>(
					caller_id.clone(),
					topic.clone(),
					uri,
					buffer.clone(),
					Arc::clone(&stats),
					cancel.clone(),
				)
			})
		};

		Self {
			type_name: T::type_name(),
			known: Mutex::new(HashSet::new()),
			stats,
			connect,
		}
	}

	/// Additive reconciliation against a publisher list announced by the
	/// master: previously unseen URIs get a reader task, known ones are
	/// left untouched even when the list omits them. The known-set update
	/// is one critical section, so concurrent announcements never
	/// double-connect a URI. Returns the number of readers spawned.
	pub(crate) fn apply_publisher_update(
		&self,
		publishers: impl IntoIterator<Item = PeerUri>,
	) -> usize {
		let fresh: Vec<PeerUri> = {
			let mut known = self.known.lock().expect("lock poisoned");
			publishers
				.into_iter()
				.filter(|uri| known.insert(uri.clone()))
				.collect()
		};

		for uri in &fresh {
			(self.connect)(uri.clone());
		}
		fresh.len()
	}

	pub(crate) fn snapshot(&self, topic: &TopicName) -> SubscriptionSnapshot {
		let mut publishers: Vec<PeerStats> = self
			.stats
			.lock()
			.expect("lock poisoned")
			.iter()
			.map(|(uri, stats)| PeerStats {
				uri: uri.clone(),
				stats: stats.clone(),
			})
			.collect();
		publishers.sort_by(|a, b| a.uri.cmp(&b.uri));

		SubscriptionSnapshot {
			topic: topic.clone(),
			type_name: self.type_name.clone(),
			publishers,
		}
	}
}

/// Publisher-side bookkeeping for one topic.
pub(crate) struct Publication {
	type_name: String,
	server: PublisherHandle,
}

impl Publication {
	pub(crate) fn new<T: Message>(server: PublisherHandle) -> Self {
		Self {
			type_name: T::type_name(),
			server,
		}
	}

	pub(crate) const fn port(&self) -> u16 {
		self.server.port()
	}

	pub(crate) fn snapshot(&self, topic: &TopicName) -> PublicationSnapshot {
		let mut subscribers: Vec<ClientStats> = self
			.server
			.client_stats()
			.into_iter()
			.map(|(peer, caller_id, stats)| ClientStats {
				peer: peer.to_string(),
				caller_id,
				stats,
			})
			.collect();
		subscribers.sort_by(|a, b| a.peer.cmp(&b.peer));

		PublicationSnapshot {
			topic: topic.clone(),
			type_name: self.type_name.clone(),
			port: self.port(),
			subscribers,
		}
	}

	pub(crate) async fn shutdown(self) {
		self.server.shutdown().await;
	}
}

/// One subscription's state as reported to the RPC layer.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionSnapshot {
	pub topic: TopicName,
	pub type_name: String,
	pub publishers: Vec<PeerStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeerStats {
	pub uri: PeerUri,
	pub stats: ReceiveStats,
}

/// One publication's state as reported to the RPC layer.
#[derive(Debug, Clone, Serialize)]
pub struct PublicationSnapshot {
	pub topic: TopicName,
	pub type_name: String,
	pub port: u16,
	pub subscribers: Vec<ClientStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientStats {
	pub peer: String,
	pub caller_id: Option<String>,
	pub stats: SendStats,
}
