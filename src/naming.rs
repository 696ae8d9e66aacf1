use {
	core::fmt,
	derive_more::{Deref, Display, Into},
	serde::{Deserialize, Serialize},
};

/// Name of a topic within the federation.
///
/// Topic names are non-empty and conventionally rooted at `/`; constructing
/// one from a bare string normalizes it to the rooted form.
#[derive(
	Debug,
	Clone,
	PartialEq,
	Eq,
	PartialOrd,
	Ord,
	Hash,
	Serialize,
	Deserialize,
	Deref,
	Display,
	Into,
)]
pub struct TopicName(String);

impl TopicName {
	pub fn new(name: impl Into<String>) -> Self {
		let name = name.into();
		if name.starts_with('/') {
			Self(name)
		} else {
			Self(format!("/{name}"))
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for TopicName {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

impl From<String> for TopicName {
	fn from(name: String) -> Self {
		Self::new(name)
	}
}

/// Endpoint of a peer publisher, formatted `host:port`.
#[derive(
	Debug,
	Clone,
	PartialEq,
	Eq,
	PartialOrd,
	Ord,
	Hash,
	Serialize,
	Deserialize,
	Deref,
	Display,
	Into,
)]
pub struct PeerUri(String);

impl PeerUri {
	pub fn new(host: impl fmt::Display, port: u16) -> Self {
		Self(format!("{host}:{port}"))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn port(&self) -> Option<u16> {
		self.0.rsplit_once(':')?.1.parse().ok()
	}
}

impl From<&str> for PeerUri {
	fn from(uri: &str) -> Self {
		Self(uri.into())
	}
}

impl From<String> for PeerUri {
	fn from(uri: String) -> Self {
		Self(uri)
	}
}
