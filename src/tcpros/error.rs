#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
	#[error("truncated header record")]
	Truncated,

	#[error("header record is not valid utf-8")]
	NotUtf8,

	#[error("header record has no '=' separator: {0:?}")]
	MissingSeparator(String),

	#[error("required header field is missing: {0}")]
	MissingField(&'static str),

	#[error("message type mismatch: expected {expected}, peer sent {found}")]
	TypeMismatch { expected: String, found: String },

	#[error("md5 signature mismatch: expected {expected}, peer sent {found}")]
	Md5Mismatch { expected: String, found: String },
}
