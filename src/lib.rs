//! Client-side runtime of a ROS-compatible publish/subscribe node.
//!
//! A node advertises named topics on which it streams typed messages and
//! subscribes to topics published by peer nodes. Peer discovery is driven
//! from outside: the master's slave-API layer feeds publisher URIs into the
//! node through the [`Slave`] facade, and the node maintains one TCPROS
//! connection per peer publisher.

mod channel;
mod config;
mod error;
mod message;
mod naming;
mod node;
mod stream;

pub mod tcpros;

pub use {
	config::{Config, ConfigBuilder, ConfigBuilderError},
	error::Error,
	message::Message,
	naming::{PeerUri, TopicName},
	node::{
		ClientStats,
		Node,
		PeerStats,
		PublicationSnapshot,
		Slave,
		SubscriptionSnapshot,
		run_node,
	},
	stream::MessageStream,
};

pub mod prelude {
	pub use super::{
		Config,
		Error,
		Message,
		MessageStream,
		Node,
		PeerUri,
		Slave,
		TopicName,
		run_node,
	};
}
