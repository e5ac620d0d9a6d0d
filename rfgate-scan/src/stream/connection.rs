//! Reader WebSocket connection

use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::error::{ScanError, ScanResult};

/// Open reader socket
pub type ReaderSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// `wss://<host>/ws?token=<token>` with the token URL-encoded
pub fn reader_url(host: &str, token: &str) -> ScanResult<Url> {
    Url::parse_with_params(&format!("wss://{}/ws", host), &[("token", token)])
        .map_err(|e| ScanError::Transport(format!("invalid reader address {}: {}", host, e)))
}

/// Connect to the reader event stream
pub async fn connect_reader(host: &str, token: &str) -> ScanResult<ReaderSocket> {
    let url = reader_url(host, token)?;

    info!(host = %host, "Opening reader stream");
    let (socket, response) = connect_async(url.as_str())
        .await
        .map_err(|e| ScanError::Transport(format!("connect to {} failed: {}", host, e)))?;

    debug!(host = %host, status = %response.status(), "Reader stream opened");
    Ok(socket)
}
