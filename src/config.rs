use derive_builder::Builder;

/// Configuration options for a node.
#[derive(Builder, Clone, Debug)]
#[builder(pattern = "owned", setter(prefix = "with"))]
#[builder_struct_attr(doc(hidden))]
pub struct Config {
	/// URI of the master coordinating the federation. Registration itself
	/// is performed by the external RPC layer; the node only reports this
	/// value back through its slave facade.
	#[builder(default = "String::new()")]
	pub master_uri: String,

	/// Host address per-topic servers bind to.
	#[builder(default = "\"0.0.0.0\".into()")]
	pub bind_host: String,

	/// Listen backlog for per-topic servers.
	#[builder(default = "5")]
	pub listen_backlog: u32,
}

impl Config {
	/// Creates a new config builder with default values.
	pub fn builder() -> ConfigBuilder {
		ConfigBuilder::default()
	}
}

impl Default for Config {
	fn default() -> Self {
		Self::builder().build().expect("all fields have defaults")
	}
}
