use log::{error, info};
use pki_types::{CertificateDer, PrivateKeyDer};
use rustls_pemfile::{certs, private_key};
use socket_flow::application::{ApplicationProtocol, Sender};
use socket_flow::config::ServerConfig;
use socket_flow::frame::OpCode;
use socket_flow::server::start_server;
use std::fs::File;
use std::io::{self, BufReader, ErrorKind};
use std::path::Path;
use std::sync::Arc;

struct Echo;

impl ApplicationProtocol for Echo {
    fn frame_received(&mut self, sender: &Sender, opcode: OpCode, payload: &[u8], fin: bool) {
        if opcode == OpCode::Continue {
            return;
        }
        sender.send_frame(opcode, payload.to_vec(), fin);
    }
}

fn load_certs(path: &Path) -> io::Result<Vec<CertificateDer<'static>>> {
    certs(&mut BufReader::new(File::open(path)?)).collect()
}

fn load_key(path: &Path) -> io::Result<PrivateKeyDer<'static>> {
    private_key(&mut BufReader::new(File::open(path)?))?
        .ok_or_else(|| io::Error::new(ErrorKind::Other, "no private key found"))
}

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let certs = load_certs(Path::new("server.crt"))?;
    let key = load_key(Path::new("server.key"))?;

    let tls_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|err| io::Error::new(ErrorKind::InvalidInput, err))?;

    let config = ServerConfig {
        web_socket_config: None,
        tls_config: Some(Arc::new(tls_config)),
    };

    let port: u16 = 9002;
    info!("Server started on 0.0.0.0:{port}");
    if let Err(err) =
        start_server(
            port,
            config,
            Arc::new(|| Some(Box::new(Echo) as Box<dyn ApplicationProtocol>)),
        )
        .await
    {
        error!("Could not start the server: {err}");
    }

    Ok(())
}
