use {
	super::{
		NodeInner,
		registry::{Publication, PublicationSnapshot, SubscriptionSnapshot},
	},
	crate::naming::{PeerUri, TopicName},
	std::sync::Arc,
};

/// The facade the external master/slave XML-RPC layer drives.
///
/// The RPC layer registers the node's topics with the master, serves
/// slave-API requests out of the snapshots, and forwards the master's
/// `publisherUpdate` calls into [`Slave::publisher_update`]. Cloning is
/// cheap; all clones address the same node.
#[derive(Clone)]
pub struct Slave {
	node: Arc<NodeInner>,
}

impl Slave {
	pub(super) fn new(node: Arc<NodeInner>) -> Self {
		Self { node }
	}

	pub fn master_uri(&self) -> String {
		self.node.config.master_uri.clone()
	}

	pub fn snapshot_subscriptions(&self) -> Vec<SubscriptionSnapshot> {
		let subscriptions =
			self.node.subscriptions.lock().expect("lock poisoned");
		let mut snapshots: Vec<SubscriptionSnapshot> = subscriptions
			.iter()
			.map(|(topic, subscription)| subscription.snapshot(topic))
			.collect();
		snapshots.sort_by(|a, b| a.topic.cmp(&b.topic));
		snapshots
	}

	pub fn snapshot_publications(&self) -> Vec<PublicationSnapshot> {
		let publications =
			self.node.publications.lock().expect("lock poisoned");
		let mut snapshots: Vec<PublicationSnapshot> = publications
			.iter()
			.map(|(topic, publication)| publication.snapshot(topic))
			.collect();
		snapshots.sort_by(|a, b| a.topic.cmp(&b.topic));
		snapshots
	}

	/// The master's announcement of the current publisher set for `topic`.
	///
	/// Unknown topics are ignored. Reconciliation is additive: every
	/// previously unseen URI gets a reader task, and URIs the list omits
	/// stay connected (readers are only torn down with the node). Returns
	/// the number of readers spawned, so a repeated announcement returns 0.
	///
	/// Must be called from within the node's runtime, since it spawns the
	/// reader tasks.
	pub fn publisher_update(
		&self,
		topic: impl Into<TopicName>,
		publishers: impl IntoIterator<Item = PeerUri>,
	) -> usize {
		let topic = topic.into();
		let subscriptions =
			self.node.subscriptions.lock().expect("lock poisoned");
		let Some(subscription) = subscriptions.get(&topic) else {
			tracing::debug!(
				topic = %topic,
				"publisher update for unknown topic ignored",
			);
			return 0;
		};

		let spawned = subscription.apply_publisher_update(publishers);
		if spawned > 0 {
			tracing::info!(topic = %topic, spawned, "connecting to new publishers");
		}
		spawned
	}

	/// The port `topic`'s server listens on, if this node publishes it.
	pub fn topic_port(&self, topic: impl Into<TopicName>) -> Option<u16> {
		let topic = topic.into();
		self.node
			.publications
			.lock()
			.expect("lock poisoned")
			.get(&topic)
			.map(Publication::port)
	}

	/// Requests node shutdown. [`super::run_node`] observes the request
	/// and tears the registry down.
	pub fn shutdown(&self) {
		self.node.shutdown.cancel();
	}
}
