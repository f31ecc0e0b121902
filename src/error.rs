use std::io;
use std::string::FromUtf8Error;
use thiserror::Error;

/// Every failure mode this crate can produce, from wire-level framing
/// violations through handshake rejections to the I/O underneath.
///
/// Framing errors (`ReservedFlag`, `UnknownOpcode`, `MaskingViolation`,
/// `InvalidPayloadLength`, the control-frame shape violations) are always
/// fatal to the connection they occur on: the connection protocol logs them
/// and tears down the transport, it never forwards them to the application.
/// Handshake errors are not fatal to anything but the one request; the HTTP
/// server that owns the transport stays alive and sends a 4xx/5xx response.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("{source}")]
    FromUtf8Error {
        #[from]
        source: FromUtf8Error,
    },

    #[error("channel communication error")]
    CommunicationError,

    // Framing errors
    #[error("Reserved flag in frame ({0})")]
    ReservedFlag(u8),

    #[error("Unknown opcode {0} in frame")]
    UnknownOpcode(u8),

    #[error("Masking violation: server received an unmasked frame")]
    MaskingViolation,

    #[error("Control frames must not be fragmented")]
    ControlFramesFragmented,

    #[error("Control frame with invalid payload size, can't be greater than 125")]
    ControlFramePayloadSize,

    #[error("Close frame payload length of 1 is invalid: the close code alone takes two bytes")]
    InvalidClosePayload,

    #[error("Payload length's top bit must be zero")]
    InvalidPayloadLength,

    #[error("Max frame size reached")]
    MaxFrameSize,

    #[error("Max message size reached")]
    MaxMessageSize,

    // Fragmentation errors
    #[error("Invalid frame while there is a fragmented message in progress")]
    InvalidFrameFragmentation,

    #[error("Incoming fragmented message but there is one already in progress")]
    FragmentedInProgress,

    #[error("Invalid continuation frame: no fragmented message to continue")]
    InvalidContinuationFrame,

    // Handshake errors
    #[error("Invalid handshake request method, expected GET")]
    InvalidMethod,

    #[error("Connection: Upgrade header missing or malformed in the request")]
    NoConnectionHeaderPresent,

    #[error("Upgrade: websocket header missing in the request")]
    NoUpgradeHeaderPresent,

    #[error("Sec-WebSocket-Key header missing in the request")]
    NoSecWebsocketKey,

    #[error("Sec-WebSocket-Version must be 13")]
    UnsupportedVersion,

    #[error("No subprotocol offered by the client was acceptable")]
    NoProtocol,

    #[error("Application protocol factory did not yield a protocol")]
    NoApplicationProtocol,

    #[error("Incomplete or malformed HTTP request")]
    MalformedHttpRequest,

    #[error("HTTP parse error: {source}")]
    HttpParseError {
        #[from]
        source: httparse::Error,
    },
}
