use crate::application::{ApplicationProtocol, OutboundFrame, Sender};
use crate::builder::build_frame;
use crate::config::WebSocketConfig;
use crate::error::Error;
use crate::frame::{decode_close_payload, Frame, OpCode, DEFAULT_CLOSE_CODE, DEFAULT_CLOSE_REASON};
use crate::parser::FrameParser;
use crate::stream::SocketFlowStream;
use bytes::BytesMut;
use log::{error, info};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    Open,
    Closing,
    Closed,
}

/// Drives one accepted connection after the handshake has completed: reads
/// bytes off the transport, feeds them through the frame parser, and
/// dispatches decoded frames either to internal protocol handling (PING,
/// PONG, CLOSE) or to the application. One of these runs per connection as
/// its own `tokio::spawn`ed task, a single-threaded cooperative loop in the
/// style of Twisted's reactor-driven protocols rather than a
/// thread-per-connection model.
pub struct Connection<A: ApplicationProtocol> {
    read_half: ReadHalf<SocketFlowStream>,
    write_half: Arc<Mutex<WriteHalf<SocketFlowStream>>>,
    buf: BytesMut,
    parser: FrameParser,
    state: ConnState,
    app: A,
    outbound_rx: mpsc::UnboundedReceiver<OutboundFrame>,
    sender: Sender,
}

impl<A: ApplicationProtocol> Connection<A> {
    /// `leftover` is whatever bytes the HTTP layer had already read past
    /// the handshake's terminating blank line — a client that doesn't wait
    /// for the `101` response before sending frames. It seeds the parser
    /// buffer so those bytes aren't lost.
    pub fn new(
        stream: SocketFlowStream,
        config: WebSocketConfig,
        mut app: A,
        leftover: BytesMut,
    ) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        let (tx, outbound_rx) = mpsc::unbounded_channel();
        let sender = Sender::new(tx);
        app.connection_made(sender.clone());

        Self {
            read_half,
            write_half: Arc::new(Mutex::new(write_half)),
            buf: leftover,
            parser: FrameParser::new(true, config.max_frame_size),
            state: ConnState::Open,
            app,
            outbound_rx,
            sender,
        }
    }

    /// Runs the connection to completion: concurrently pumps inbound bytes
    /// through the parser and outbound application frames onto the wire,
    /// until the peer closes, a parse error is fatal, or the transport
    /// drops.
    pub async fn run(mut self) {
        if !self.buf.is_empty() && self.handle_incoming().await {
            self.close_transport().await;
            self.app.connection_lost(None);
            return;
        }

        let mut read_buf = [0u8; 4096];
        loop {
            tokio::select! {
                result = self.read_half.read(&mut read_buf) => {
                    match result {
                        Ok(0) => break,
                        Ok(n) => {
                            self.buf.extend_from_slice(&read_buf[..n]);
                            if self.handle_incoming().await {
                                break;
                            }
                        }
                        Err(err) => {
                            error!("Connection read error: {err}");
                            break;
                        }
                    }
                }
                Some(outbound) = self.outbound_rx.recv() => {
                    if self.state == ConnState::Open {
                        let _ = self.write_frame(outbound.opcode, &outbound.payload, outbound.fin).await;
                    }
                }
            }

            if self.state == ConnState::Closed {
                break;
            }
        }

        self.close_transport().await;
        self.app.connection_lost(None);
    }

    /// Parses and dispatches every complete frame now sitting in the
    /// buffer. Returns `true` if the connection should stop.
    async fn handle_incoming(&mut self) -> bool {
        let frames = match self.parser.parse(&mut self.buf) {
            Ok(frames) => frames,
            Err(err) => {
                error!("Closing connection after parse error: {err}");
                self.close_transport().await;
                return true;
            }
        };

        for frame in frames {
            if self.dispatch(frame).await {
                return true;
            }
        }
        false
    }

    async fn dispatch(&mut self, frame: Frame) -> bool {
        match frame.opcode {
            OpCode::Ping => {
                let _ = self.write_frame(OpCode::Pong, &frame.payload, true).await;
                false
            }
            OpCode::Pong => false,
            OpCode::Close => {
                let (code, reason) = decode_close_payload(&frame.payload)
                    .unwrap_or_else(|_| (DEFAULT_CLOSE_CODE, DEFAULT_CLOSE_REASON.to_string()));
                info!("Closing connection: '{reason}' ({code})");
                self.state = ConnState::Closing;
                self.close_transport().await;
                true
            }
            OpCode::Text | OpCode::Binary | OpCode::Continue => {
                self.app
                    .frame_received(&self.sender, frame.opcode, &frame.payload, frame.fin);
                false
            }
        }
    }

    async fn write_frame(&self, opcode: OpCode, payload: &[u8], fin: bool) -> Result<(), Error> {
        let bytes = build_frame(opcode, payload, fin, None);
        let mut write_half = self.write_half.lock().await;
        write_half.write_all(&bytes).await?;
        Ok(())
    }

    async fn close_transport(&mut self) {
        if self.state == ConnState::Closed {
            return;
        }
        self.state = ConnState::Closed;
        let mut write_half = self.write_half.lock().await;
        let _ = write_half.shutdown().await;
    }
}
