use crate::error::Error;
use crate::frame::OpCode;

/// The interface a WebSocket application implements against this crate's
/// connection protocol, modeled on Twisted's `WebSocketsProtocol`: the
/// connection drives it with lifecycle and frame events, and the
/// application talks back over the [`Sender`] it's handed at
/// `connection_made`.
///
/// `frame_received` only ever sees `Text`, `Binary`, or `Continue` opcodes
/// with their `fin` bit — PING is answered automatically before the
/// application is invoked, PONG is discarded, and CLOSE ends the
/// connection. The application never has to handle control frames itself.
pub trait ApplicationProtocol: Send {
    fn connection_made(&mut self, _sender: Sender) {}

    fn frame_received(&mut self, sender: &Sender, opcode: OpCode, payload: &[u8], fin: bool);

    fn connection_lost(&mut self, _reason: Option<Error>) {}
}

/// Handed to the application at `connection_made` and passed into every
/// `frame_received` call so it can write back without owning the
/// transport. Cloning a `Sender` is cheap; the underlying writer is
/// shared across clones via the connection's `Arc<Mutex<_>>`, matching the
/// teacher's writer-sharing pattern for PING replies versus
/// application-initiated sends.
#[derive(Clone)]
pub struct Sender {
    inner: tokio::sync::mpsc::UnboundedSender<OutboundFrame>,
}

/// An outbound frame queued by the application, picked up by the
/// connection's write half.
pub struct OutboundFrame {
    pub opcode: OpCode,
    pub payload: Vec<u8>,
    pub fin: bool,
}

impl ApplicationProtocol for Box<dyn ApplicationProtocol> {
    fn connection_made(&mut self, sender: Sender) {
        (**self).connection_made(sender)
    }

    fn frame_received(&mut self, sender: &Sender, opcode: OpCode, payload: &[u8], fin: bool) {
        (**self).frame_received(sender, opcode, payload, fin)
    }

    fn connection_lost(&mut self, reason: Option<Error>) {
        (**self).connection_lost(reason)
    }
}

/// Produces one [`ApplicationProtocol`] instance per accepted connection,
/// in the spirit of Twisted's `Factory.buildProtocol`. Returning `None`
/// means the factory declines the connection — the handshake is rejected
/// with a `502 Bad Gateway`, mirroring Twisted's `buildProtocol` returning
/// `None` in `test_renderNoProtocol`. Any
/// `Fn() -> Option<Box<dyn ApplicationProtocol>>` implements this
/// automatically.
pub trait ProtocolFactory: Send + Sync {
    fn build(&self) -> Option<Box<dyn ApplicationProtocol>>;
}

impl<F> ProtocolFactory for F
where
    F: Fn() -> Option<Box<dyn ApplicationProtocol>> + Send + Sync,
{
    fn build(&self) -> Option<Box<dyn ApplicationProtocol>> {
        self()
    }
}

impl Sender {
    pub fn new(inner: tokio::sync::mpsc::UnboundedSender<OutboundFrame>) -> Self {
        Self { inner }
    }

    pub fn send_text(&self, text: impl Into<String>) {
        self.send_frame(OpCode::Text, text.into().into_bytes(), true);
    }

    pub fn send_binary(&self, payload: impl Into<Vec<u8>>) {
        self.send_frame(OpCode::Binary, payload.into(), true);
    }

    pub fn send_frame(&self, opcode: OpCode, payload: Vec<u8>, fin: bool) {
        let _ = self.inner.send(OutboundFrame { opcode, payload, fin });
    }
}
