#![allow(unused)]

mod time;
mod tracing;

pub use time::*;

use roslink::{PeerUri, Slave};

/// Loopback URI for a port taken from [`Slave::topic_port`].
pub fn local_uri(port: u16) -> PeerUri {
	PeerUri::new("127.0.0.1", port)
}

/// Polls a publisher's snapshots until `topic` reports at least `count`
/// connected subscribers. Wrap in a timeout at the call site.
pub async fn wait_for_subscribers(slave: &Slave, topic: &str, count: usize) {
	loop {
		let connected = slave
			.snapshot_publications()
			.iter()
			.find(|publication| publication.topic.as_str() == topic)
			.map(|publication| publication.subscribers.len())
			.unwrap_or(0);
		if connected >= count {
			return;
		}
		tokio::time::sleep(millis(10)).await;
	}
}
