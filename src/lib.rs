//! Server-side WebSocket protocol core, built on top of Tokio.
//!
//! This crate implements the server half of [RFC 6455](https://datatracker.ietf.org/doc/html/rfc6455):
//! a streaming frame codec, an opening-handshake validator and upgrader, and
//! a per-connection protocol state machine that dispatches decoded frames
//! to an [`application::ApplicationProtocol`] implementation. It does not
//! implement the client side of the protocol, extensions such as
//! permessage-deflate, or outbound message fragmentation — see each
//! module's docs for the exact boundary.

pub mod application;
pub mod builder;
pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod handshake;
mod mask;
pub mod parser;
pub mod request;
pub mod server;
pub mod stream;
