//! The node: per-topic registry, user-facing subscribe/advertise API and
//! the driver that runs a node until shutdown.

use {
	crate::{
		channel::Channel,
		config::Config,
		error::Error,
		message::Message,
		naming::TopicName,
		stream::MessageStream,
		tcpros::publisher,
	},
	registry::{Publication, Subscription},
	std::{
		collections::{HashMap, hash_map::Entry},
		sync::{Arc, Mutex},
	},
	tokio_util::sync::CancellationToken,
};

pub(crate) mod registry;
mod slave;

pub use {
	registry::{
		ClientStats,
		PeerStats,
		PublicationSnapshot,
		SubscriptionSnapshot,
	},
	slave::Slave,
};

/// A handle to one node of the federation.
///
/// Cheap to clone; all clones share the same topic registry. User code
/// subscribes and advertises through this handle and passes [`Node::slave`]
/// to the external RPC layer that talks to the master.
#[derive(Clone)]
pub struct Node {
	inner: Arc<NodeInner>,
}

pub(crate) struct NodeInner {
	pub(crate) name: String,
	pub(crate) config: Config,
	pub(crate) subscriptions: Mutex<HashMap<TopicName, Subscription>>,
	pub(crate) publications: Mutex<HashMap<TopicName, Publication>>,
	pub(crate) shutdown: CancellationToken,
}

impl Node {
	pub fn new(name: impl Into<String>) -> Self {
		Self::with_config(name, Config::default())
	}

	pub fn with_config(name: impl Into<String>, config: Config) -> Self {
		Self {
			inner: Arc::new(NodeInner {
				name: name.into(),
				config,
				subscriptions: Mutex::default(),
				publications: Mutex::default(),
				shutdown: CancellationToken::new(),
			}),
		}
	}

	pub fn name(&self) -> &str {
		&self.inner.name
	}

	pub fn master_uri(&self) -> &str {
		&self.inner.config.master_uri
	}

	/// Returns the facade consumed by the external RPC layer.
	pub fn slave(&self) -> Slave {
		Slave::new(Arc::clone(&self.inner))
	}

	/// Creates the subscription for `topic` and returns its message
	/// stream. Fails if the topic is already subscribed.
	///
	/// The stream starts yielding once the RPC layer announces publishers
	/// through [`Slave::publisher_update`]; until then its head simply
	/// stays pending.
	pub fn subscribe<T: Message>(
		&self,
		topic: impl Into<TopicName>,
	) -> Result<MessageStream<T>, Error> {
		let topic = topic.into();
		let mut subscriptions =
			self.inner.subscriptions.lock().expect("lock poisoned");

		match subscriptions.entry(topic.clone()) {
			Entry::Occupied(_) => Err(Error::DuplicateSubscription(topic)),
			Entry::Vacant(entry) => {
				let (buffer, inbox) = Channel::<T>::default().split();
				entry.insert(Subscription::new::<T>(
					self.inner.name.clone(),
					topic,
					buffer,
					self.inner.shutdown.child_token(),
				));
				Ok(MessageStream::from_channel(inbox))
			}
		}
	}

	/// Advertises `topic`, publishing every message `stream` yields.
	/// Fails if the topic is already advertised.
	///
	/// The topic's server and pump start immediately; subscribers that
	/// connect later receive the suffix of the stream from their join
	/// point on.
	pub async fn advertise<T: Message>(
		&self,
		topic: impl Into<TopicName>,
		stream: MessageStream<T>,
	) -> Result<(), Error> {
		let topic = topic.into();
		if self
			.inner
			.publications
			.lock()
			.expect("lock poisoned")
			.contains_key(&topic)
		{
			return Err(Error::DuplicateAdvertise(topic));
		}

		let server = publisher::run_server::<T>(
			&self.inner.name,
			&topic,
			stream,
			&self.inner.config,
			self.inner.shutdown.child_token(),
		)
		.await?;

		let server = {
			let mut publications =
				self.inner.publications.lock().expect("lock poisoned");
			match publications.entry(topic.clone()) {
				Entry::Occupied(_) => server,
				Entry::Vacant(entry) => {
					entry.insert(Publication::new::<T>(server));
					return Ok(());
				}
			}
		};

		// A concurrent advertise won the topic; discard the extra server.
		server.shutdown().await;
		Err(Error::DuplicateAdvertise(topic))
	}

	/// Advertises a stream of deferred messages, forcing each element as
	/// the pump consumes it.
	pub async fn advertise_deferred<T, F>(
		&self,
		topic: impl Into<TopicName>,
		stream: MessageStream<F>,
	) -> Result<(), Error>
	where
		T: Message,
		F: Future<Output = T> + Send + 'static,
	{
		self.advertise(topic, stream.force()).await
	}

	/// Resolves once shutdown has been requested.
	pub async fn terminated(&self) {
		self.inner.shutdown.cancelled().await;
	}

	/// Tears every publication and subscription down. Reader and writer
	/// tasks observe cancellation as their sockets close; messages still
	/// sitting in bounded buffers are discarded.
	pub async fn shutdown(&self) {
		self.inner.shutdown.cancel();

		let publications: Vec<(TopicName, Publication)> = self
			.inner
			.publications
			.lock()
			.expect("lock poisoned")
			.drain()
			.collect();
		for (topic, publication) in publications {
			tracing::debug!(topic = %topic, "closing publication");
			publication.shutdown().await;
		}

		self.inner
			.subscriptions
			.lock()
			.expect("lock poisoned")
			.clear();
	}
}

/// Builds a node, runs `user_program` against it, then parks until
/// [`Slave::shutdown`] is invoked and finally tears the registry down.
///
/// The program issues subscribe/advertise calls, hands [`Node::slave`] to
/// the RPC layer and may spawn its own consumer tasks before returning.
pub async fn run_node<P, F>(
	name: impl Into<String>,
	user_program: P,
) -> Result<(), Error>
where
	P: FnOnce(Node) -> F,
	F: Future<Output = Result<(), Error>>,
{
	let node = Node::new(name);
	tracing::info!(node = %node.name(), "node starting");

	user_program(node.clone()).await?;

	node.terminated().await;
	node.shutdown().await;
	tracing::info!(node = %node.name(), "node stopped");
	Ok(())
}
