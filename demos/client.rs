//! WebSocket client.
//!
//! Run the echo server first: cargo run --example echo_server
//! Then run: cargo run --example client [addr] [payload]
//!
//! Sends the payload once the handshake completes, prints the echo, and
//! closes with status 1000.

use std::error::Error;

use tinyws::{CloseCode, Config, Event, FramedSession};
use tokio::net::TcpStream;
use tracing::info;

const SERVER_ADDR: &str = "127.0.0.1:9001";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| SERVER_ADDR.to_string());
    let payload = args.next().unwrap_or_else(|| "Hello, WebSocket!".to_string());

    info!(%addr, "connecting");
    let stream = TcpStream::connect(&addr).await?;
    let mut ws = FramedSession::client(stream, Config::default());
    ws.connect("/", &addr, None).await?;

    while let Some(event) = ws.next_event().await? {
        match event {
            Event::Opened => {
                info!("handshake complete, sending {} bytes", payload.len());
                ws.send_text(&payload).await?;
            }
            Event::Data(frame) => {
                println!("{}", String::from_utf8_lossy(frame.payload()));
                ws.close(CloseCode::Normal, "byebye").await?;
            }
            Event::Closed { code, reason } => {
                info!(code = code.map(|c| c.as_u16()), %reason, "close confirmed");
            }
        }
    }

    info!("done");
    Ok(())
}
