use log::{error, info};
use socket_flow::application::{ApplicationProtocol, Sender};
use socket_flow::config::ServerConfig;
use socket_flow::frame::OpCode;
use socket_flow::server::start_server;
use std::sync::Arc;

struct Echo;

impl ApplicationProtocol for Echo {
    fn connection_made(&mut self, _sender: Sender) {
        info!("new connection");
    }

    fn frame_received(&mut self, sender: &Sender, opcode: OpCode, payload: &[u8], fin: bool) {
        if opcode == OpCode::Continue {
            return;
        }
        sender.send_frame(opcode, payload.to_vec(), fin);
    }

    fn connection_lost(&mut self, _reason: Option<socket_flow::error::Error>) {
        info!("connection closed");
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let port: u16 = 9000;
    info!("Server started on 0.0.0.0:{port}");
    if let Err(err) = start_server(
        port,
        ServerConfig::default(),
        Arc::new(|| Some(Box::new(Echo) as Box<dyn ApplicationProtocol>)),
    )
    .await
    {
        error!("Could not start the server: {err}");
    }
}
