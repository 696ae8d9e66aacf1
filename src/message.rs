use {
	bytes::Bytes,
	serde::{Serialize, de::DeserializeOwned},
};

/// Implemented by every type that can travel over a topic.
///
/// The blanket impl gives zero-friction coverage for any serializable rust
/// type: the type name and md5 signature are derived from the rust type
/// path, and payloads are encoded with MessagePack. Generated ROS message
/// types supply their IDL-derived names, signatures and binary codecs
/// through the same surface.
pub trait Message: Serialize + DeserializeOwned + Send + Sync + 'static {
	/// Human-readable message type name exchanged during negotiation.
	fn type_name() -> String {
		core::any::type_name::<Self>().into()
	}

	/// MD5 signature of the message schema exchanged during negotiation.
	fn md5sum() -> String {
		format!("{:x}", md5::compute(Self::type_name()))
	}

	/// Encodes one message payload. Framing is added by the transport.
	fn encode(&self) -> Result<Bytes, rmp_serde::encode::Error> {
		rmp_serde::to_vec(self).map(Bytes::from)
	}

	/// Decodes one message payload.
	fn decode(payload: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
		rmp_serde::from_slice(payload)
	}
}

impl<T> Message for T where T: Serialize + DeserializeOwned + Send + Sync + 'static
{}

#[cfg(test)]
mod tests {
	use {super::*, serde::Deserialize};

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Pose {
		x: f64,
		y: f64,
	}

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Twist {
		linear: f64,
		angular: f64,
	}

	#[test]
	fn payloads_round_trip() {
		let pose = Pose { x: 1.25, y: -3.0 };
		let decoded = Pose::decode(&Pose::encode(&pose).unwrap()).unwrap();
		assert_eq!(decoded, pose);
	}

	#[test]
	fn distinct_types_have_distinct_signatures() {
		assert_ne!(Pose::type_name(), Twist::type_name());
		assert_ne!(Pose::md5sum(), Twist::md5sum());
	}
}
