use {
	super::error::HeaderError,
	crate::{message::Message, naming::TopicName},
	bytes::{BufMut, Bytes, BytesMut},
	std::collections::BTreeMap,
};

pub const CALLER_ID: &str = "callerid";
pub const TOPIC: &str = "topic";
pub const TYPE: &str = "type";
pub const MD5SUM: &str = "md5sum";

/// The key/value block each side sends exactly once at connection setup.
///
/// On the wire the block is a single frame whose payload concatenates
/// `field=value` records, each prefixed with its own uint32-LE length.
/// Unknown fields are preserved and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionHeader {
	fields: BTreeMap<String, String>,
}

impl ConnectionHeader {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_field(
		mut self,
		key: impl Into<String>,
		value: impl Into<String>,
	) -> Self {
		self.fields.insert(key.into(), value.into());
		self
	}

	/// The header a subscriber sends when connecting to a publisher.
	pub fn for_subscription<T: Message>(
		caller_id: &str,
		topic: &TopicName,
	) -> Self {
		Self::new()
			.with_field(CALLER_ID, caller_id)
			.with_field(TOPIC, topic.as_str())
			.with_field(TYPE, T::type_name())
			.with_field(MD5SUM, T::md5sum())
	}

	/// The header a publisher answers with after admitting a subscriber.
	pub fn for_publication<T: Message>(caller_id: &str) -> Self {
		Self::new()
			.with_field(CALLER_ID, caller_id)
			.with_field(TYPE, T::type_name())
			.with_field(MD5SUM, T::md5sum())
	}

	pub fn field(&self, key: &str) -> Option<&str> {
		self.fields.get(key).map(String::as_str)
	}

	pub fn caller_id(&self) -> Option<&str> {
		self.field(CALLER_ID)
	}

	pub fn topic(&self) -> Option<&str> {
		self.field(TOPIC)
	}

	pub fn type_name(&self) -> Option<&str> {
		self.field(TYPE)
	}

	pub fn md5sum(&self) -> Option<&str> {
		self.field(MD5SUM)
	}

	/// Encodes the record block. The outer length prefix is added by the
	/// link's framing.
	pub fn encode(&self) -> Bytes {
		let mut buf = BytesMut::new();
		for (key, value) in &self.fields {
			buf.put_u32_le((key.len() + 1 + value.len()) as u32);
			buf.put_slice(key.as_bytes());
			buf.put_u8(b'=');
			buf.put_slice(value.as_bytes());
		}
		buf.freeze()
	}

	pub fn parse(mut payload: &[u8]) -> Result<Self, HeaderError> {
		let mut fields = BTreeMap::new();
		while !payload.is_empty() {
			if payload.len() < 4 {
				return Err(HeaderError::Truncated);
			}
			let record_len = u32::from_le_bytes([
				payload[0], payload[1], payload[2], payload[3],
			]) as usize;
			let rest = &payload[4..];
			if rest.len() < record_len {
				return Err(HeaderError::Truncated);
			}

			let record = std::str::from_utf8(&rest[..record_len])
				.map_err(|_| HeaderError::NotUtf8)?;
			let (key, value) = record
				.split_once('=')
				.ok_or_else(|| HeaderError::MissingSeparator(record.to_owned()))?;
			fields.insert(key.to_owned(), value.to_owned());

			payload = &rest[record_len..];
		}
		Ok(Self { fields })
	}

	/// Checks the peer's `type` and `md5sum` against the local expectation.
	pub fn validate(
		&self,
		expected_type: &str,
		expected_md5: &str,
	) -> Result<(), HeaderError> {
		let type_name =
			self.type_name().ok_or(HeaderError::MissingField(TYPE))?;
		if type_name != expected_type {
			return Err(HeaderError::TypeMismatch {
				expected: expected_type.into(),
				found: type_name.into(),
			});
		}

		let md5sum = self.md5sum().ok_or(HeaderError::MissingField(MD5SUM))?;
		if md5sum != expected_md5 {
			return Err(HeaderError::Md5Mismatch {
				expected: expected_md5.into(),
				found: md5sum.into(),
			});
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn records_are_length_prefixed_little_endian() {
		let encoded = ConnectionHeader::new().with_field("a", "b").encode();
		assert_eq!(&encoded[..], &[3, 0, 0, 0, b'a', b'=', b'b']);
	}

	#[test]
	fn blocks_round_trip() {
		let header = ConnectionHeader::new()
			.with_field(CALLER_ID, "/talker")
			.with_field(TOPIC, "/chat")
			.with_field(TYPE, "std_msgs/String")
			.with_field(MD5SUM, "992ce8a1687cec8c8bd883ec73ca41d1")
			.with_field("tcp_nodelay", "1");

		let parsed = ConnectionHeader::parse(&header.encode()).unwrap();
		assert_eq!(parsed, header);
		assert_eq!(parsed.field("tcp_nodelay"), Some("1"));
	}

	#[test]
	fn truncated_blocks_are_rejected() {
		let encoded = ConnectionHeader::new().with_field("a", "b").encode();
		assert_eq!(
			ConnectionHeader::parse(&encoded[..encoded.len() - 1]),
			Err(HeaderError::Truncated),
		);
		assert_eq!(
			ConnectionHeader::parse(&[1, 0, 0]),
			Err(HeaderError::Truncated),
		);
	}

	#[test]
	fn records_need_a_separator() {
		let mut bad = BytesMut::new();
		bad.put_u32_le(3);
		bad.put_slice(b"abc");
		assert_eq!(
			ConnectionHeader::parse(&bad),
			Err(HeaderError::MissingSeparator("abc".into())),
		);
	}

	#[test]
	fn validation_requires_agreement() {
		let header = ConnectionHeader::new()
			.with_field(TYPE, "std_msgs/String")
			.with_field(MD5SUM, "aaaa");

		assert!(header.validate("std_msgs/String", "aaaa").is_ok());
		assert!(matches!(
			header.validate("std_msgs/Int32", "aaaa"),
			Err(HeaderError::TypeMismatch { .. }),
		));
		assert!(matches!(
			header.validate("std_msgs/String", "bbbb"),
			Err(HeaderError::Md5Mismatch { .. }),
		));
		assert!(matches!(
			ConnectionHeader::new().validate("std_msgs/String", "aaaa"),
			Err(HeaderError::MissingField(_)),
		));
	}
}
