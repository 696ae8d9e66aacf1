use crate::{naming::TopicName, tcpros::HeaderError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("topic {0} already has a subscription on this node")]
	DuplicateSubscription(TopicName),

	#[error("topic {0} already has a publication on this node")]
	DuplicateAdvertise(TopicName),

	#[error("i/o error: {0}")]
	Io(#[from] std::io::Error),

	#[error("connection negotiation failed: {0}")]
	Negotiation(#[from] HeaderError),
}
