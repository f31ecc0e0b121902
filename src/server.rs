use crate::application::ProtocolFactory;
use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::error::Error;
use crate::handshake;
use crate::request::HandshakeRequest;
use crate::stream::SocketFlowStream;
use bytes::BytesMut;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_rustls::{TlsAcceptor, TlsStream};

const MAX_HANDSHAKE_SIZE: usize = 16 * 1024;
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Binds a listener on `port` and runs the accept loop until the process
/// is torn down: each connection is handshaken and, once upgraded, handed
/// to a fresh `ApplicationProtocol` built by `factory`, all on its own
/// spawned task.
pub async fn start_server(
    port: u16,
    config: ServerConfig,
    factory: Arc<dyn ProtocolFactory>,
) -> Result<(), Error> {
    let listener = TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!("Listening on 0.0.0.0:{port}");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                error!("Failed to accept connection: {err}");
                continue;
            }
        };

        let config = config.clone();
        let factory = factory.clone();

        tokio::spawn(async move {
            let socket_stream = if let Some(tls_config) = config.tls_config.clone() {
                let acceptor = TlsAcceptor::from(tls_config);
                match acceptor.accept(stream).await {
                    Ok(tls_stream) => SocketFlowStream::Secure(TlsStream::from(tls_stream)),
                    Err(err) => {
                        warn!("TLS handshake with {peer} failed: {err}");
                        return;
                    }
                }
            } else {
                SocketFlowStream::Plain(stream)
            };

            if let Err(err) = handle_connection(socket_stream, config, factory.as_ref()).await {
                warn!("Handshake with {peer} failed: {err}");
            }
        });
    }
}

/// Validates the opening handshake over `stream`, writes the response,
/// and — on success — hijacks the transport into a [`Connection`] that
/// runs until the WebSocket closes. `stream` is never handed back to an
/// HTTP layer: RFC 6455's opening handshake is a one-way upgrade.
async fn handle_connection(
    mut stream: SocketFlowStream,
    config: ServerConfig,
    factory: &dyn ProtocolFactory,
) -> Result<(), Error> {
    let (request, leftover) = read_handshake_request(&mut stream).await?;

    let validated = match handshake::validate(&request, None) {
        Ok(validated) => validated,
        Err(err) => {
            let response = handshake::rejection_response(&err);
            stream.write_all(response.as_bytes()).await?;
            return Err(err);
        }
    };

    let app = match factory.build() {
        Some(app) => app,
        None => {
            let response = handshake::rejection_response(&Error::NoApplicationProtocol);
            stream.write_all(response.as_bytes()).await?;
            return Err(Error::NoApplicationProtocol);
        }
    };

    let response =
        handshake::switching_protocols_response(&validated.accept, validated.protocol.as_deref());
    stream.write_all(response.as_bytes()).await?;

    let web_socket_config = config.web_socket_config.unwrap_or_default();
    let connection = Connection::new(stream, web_socket_config, app, leftover);
    connection.run().await;
    Ok(())
}

/// Accumulates bytes off `stream` until a full HTTP request line and
/// header block have arrived, returning the parsed request plus whatever
/// bytes came after the terminating blank line.
async fn read_handshake_request(
    stream: &mut SocketFlowStream,
) -> Result<(HandshakeRequest, BytesMut), Error> {
    let mut buf = BytesMut::with_capacity(4096);
    let mut chunk = [0u8; 1024];

    loop {
        if let Some((request, consumed)) = HandshakeRequest::parse(&buf)? {
            let leftover = buf.split_off(consumed);
            return Ok((request, leftover));
        }

        if buf.len() >= MAX_HANDSHAKE_SIZE {
            return Err(Error::MalformedHttpRequest);
        }

        let n = timeout(HANDSHAKE_TIMEOUT, stream.read(&mut chunk))
            .await
            .map_err(|_| Error::MalformedHttpRequest)??;
        if n == 0 {
            return Err(Error::MalformedHttpRequest);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}
