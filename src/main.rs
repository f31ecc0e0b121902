use socket_flow::application::{ApplicationProtocol, Sender};
use socket_flow::config::ServerConfig;
use socket_flow::frame::OpCode;
use socket_flow::server::start_server;
use std::sync::Arc;

/// Echoes every Text/Binary frame it receives back to the sender, and logs
/// connection lifecycle events. A minimal, runnable demonstration of
/// `ApplicationProtocol` — see `demos/` for larger examples.
struct Echo;

impl ApplicationProtocol for Echo {
    fn connection_made(&mut self, _sender: Sender) {
        log::info!("connection opened");
    }

    fn frame_received(&mut self, sender: &Sender, opcode: OpCode, payload: &[u8], fin: bool) {
        if opcode == OpCode::Continue {
            return;
        }
        sender.send_frame(opcode, payload.to_vec(), fin);
    }

    fn connection_lost(&mut self, _reason: Option<socket_flow::error::Error>) {
        log::info!("connection closed");
    }
}

#[tokio::main]
async fn main() -> Result<(), socket_flow::error::Error> {
    env_logger::init();
    start_server(
        9000,
        ServerConfig::default(),
        Arc::new(|| Some(Box::new(Echo) as Box<dyn ApplicationProtocol>)),
    )
    .await
}
