//! WebSocket echo server.
//!
//! Run with: cargo run --example echo_server [addr]
//! Then connect with: cargo run --example client
//!
//! Every data frame is sent back as a binary frame. Set `RUST_LOG=tinyws=debug`
//! to watch the session state changes.

use std::error::Error;

use tinyws::{Config, Event, FramedSession};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info};

const ADDR: &str = "127.0.0.1:9001";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let addr = std::env::args().nth(1).unwrap_or_else(|| ADDR.to_string());
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "echo server listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "new connection");

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream).await {
                error!(%peer, error = %e, "connection error");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream) -> tinyws::Result<()> {
    stream.set_nodelay(true)?;
    let mut ws = FramedSession::server(stream, Config::default());

    while let Some(event) = ws.next_event().await? {
        match event {
            Event::Opened => {
                info!(path = ws.session().path(), "handshake complete");
            }
            Event::Data(frame) => {
                info!(opcode = %frame.opcode, len = frame.payload().len(), "echoing");
                ws.send_binary(frame.payload()).await?;
            }
            Event::Closed { code, reason } => {
                info!(code = code.map(|c| c.as_u16()), %reason, "peer closed");
            }
        }
    }

    info!("session ended");
    Ok(())
}
