//! The TCPROS transport.
//!
//! Every connection between a subscriber and a publisher starts with one
//! [`ConnectionHeader`] exchanged in each direction: the subscriber
//! announces its caller id, the topic it wants and the expected message
//! type, the publisher answers with its own identity and type. Both sides
//! verify that `type` and `md5sum` agree before any message flows; a
//! disagreement tears that connection down and leaves the rest of the node
//! untouched.
//!
//! After the handshake each direction is a plain sequence of frames: a
//! uint32 little-endian length prefix followed by that many payload bytes
//! (see [`Link`]).

mod error;
mod header;
mod link;

pub(crate) mod publisher;
pub(crate) mod subscriber;

pub use {
	error::HeaderError,
	header::ConnectionHeader,
	link::Link,
	publisher::SendStats,
	subscriber::{ReceiveStats, subscribe_stream},
};
