use {
	crate::naming::PeerUri,
	bytes::{Bytes, BytesMut},
	futures::{SinkExt, StreamExt},
	std::{io, net::SocketAddr},
	tokio::net::TcpStream,
	tokio_util::codec::{Framed, LengthDelimitedCodec},
};

/// A framed TCPROS connection to one peer.
///
/// Notes:
///
/// - This is where the framing semantics live. Every frame in either
///   direction is a uint32 length prefix in little-endian byte order
///   followed by that many payload bytes; [`Framed`] with a little-endian
///   [`LengthDelimitedCodec`] handles both directions.
/// - The unit of transfer is [`Bytes`]. Header blocks and message payloads
///   use the same framing.
pub struct Link {
	peer: SocketAddr,
	stream: Framed<TcpStream, LengthDelimitedCodec>,
}

fn codec() -> LengthDelimitedCodec {
	LengthDelimitedCodec::builder()
		.length_field_type::<u32>()
		.little_endian()
		.new_codec()
}

impl Link {
	/// Opens an outgoing connection to a peer publisher.
	pub async fn connect(uri: &PeerUri) -> io::Result<Self> {
		let socket = TcpStream::connect(uri.as_str()).await?;
		Self::from_stream(socket)
	}

	/// Wraps a freshly accepted socket.
	pub fn from_stream(socket: TcpStream) -> io::Result<Self> {
		let peer = socket.peer_addr()?;
		Ok(Self {
			peer,
			stream: Framed::new(socket, codec()),
		})
	}

	pub const fn peer_addr(&self) -> SocketAddr {
		self.peer
	}

	/// Sends one framed payload.
	pub async fn send(&mut self, payload: Bytes) -> io::Result<()> {
		self.stream.send(payload).await
	}

	/// Receives the next framed payload, or `None` on clean end of stream.
	pub async fn recv(&mut self) -> io::Result<Option<BytesMut>> {
		self.stream.next().await.transpose()
	}
}
