//! WebSocket implementation of the push transport.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use visadesk_core::config::RealtimeConfig;
use visadesk_core::error::AppError;

use super::transport::{PushChannel, PushFrame, PushTransport, SessionIdentity};
use crate::error::TransportError;
use crate::message::types::RawPushEvent;
use crate::message::validator::validate_frame;

/// Characters escaped in a query value: everything outside the RFC 3986
/// unreserved set.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Opens push channels over WebSocket.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    /// Create a transport for `url` (`ws://` or `wss://`).
    pub fn new(url: impl Into<String>) -> Result<Self, AppError> {
        let url = url.into();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(AppError::configuration(format!(
                "realtime.push_url must be a ws:// or wss:// URL, got '{url}'"
            )));
        }
        Ok(Self { url })
    }

    /// Create a transport from the realtime configuration section.
    pub fn from_config(config: &RealtimeConfig) -> Result<Self, AppError> {
        Self::new(config.push_url.clone())
    }

    /// Push endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Endpoint URL with the `userId` query parameter appended.
    pub fn handshake_url(&self, identity: &SessionIdentity) -> String {
        if identity.user_id.is_empty() {
            return self.url.clone();
        }
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!(
            "{}{separator}userId={}",
            self.url,
            utf8_percent_encode(&identity.user_id, QUERY_VALUE)
        )
    }
}

#[async_trait]
impl PushTransport for WebSocketTransport {
    async fn open(&self, identity: &SessionIdentity) -> Result<Box<dyn PushChannel>, TransportError> {
        let mut request = self
            .handshake_url(identity)
            .into_client_request()
            .map_err(|e| TransportError::Handshake(e.to_string()))?;

        let headers = request.headers_mut();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", identity.token))
            .map_err(|_| TransportError::Handshake("session token is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        let (stream, response) = connect_async(request)
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;
        debug!(url = %self.url, status = %response.status(), "WebSocket handshake complete");

        Ok(Box::new(WebSocketChannel { stream }))
    }
}

struct WebSocketChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushChannel for WebSocketChannel {
    async fn next_frame(&mut self) -> Option<Result<PushFrame, TransportError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(TransportError::Closed(e.to_string()))),
            };

            return match message {
                Message::Text(text) => Some(Ok(decode_frame(text.as_str()))),
                Message::Binary(bytes) => Some(Ok(match std::str::from_utf8(&bytes) {
                    Ok(text) => decode_frame(text),
                    Err(_) => PushFrame::Invalid("binary frame is not UTF-8".to_string()),
                })),
                Message::Ping(_) | Message::Pong(_) => Some(Ok(PushFrame::Keepalive)),
                Message::Close(frame) => {
                    debug!(?frame, "Server closed the push connection");
                    None
                }
                Message::Frame(_) => continue,
            };
        }
    }

    async fn send_keepalive(&mut self) -> Result<(), TransportError> {
        self.stream
            .send(Message::Ping(Default::default()))
            .await
            .map_err(|e| TransportError::Closed(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// Decode a text frame. Application-level `ping`/`pong` frames count as
/// keepalives.
pub fn decode_frame(text: &str) -> PushFrame {
    if let Err(e) = validate_frame(text) {
        return PushFrame::Invalid(e.to_string());
    }
    match serde_json::from_str::<RawPushEvent>(text) {
        Ok(event) if matches!(event.event.as_str(), "ping" | "pong" | "heartbeat") => {
            PushFrame::Keepalive
        }
        Ok(event) => PushFrame::Event(event),
        Err(e) => PushFrame::Invalid(format!("undecodable frame: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_websocket_url() {
        assert!(WebSocketTransport::new("http://portal.example.com").is_err());
        assert!(WebSocketTransport::new("wss://portal.example.com/ws").is_ok());
    }

    #[test]
    fn test_handshake_url_carries_user_id() {
        let transport = WebSocketTransport::new("ws://localhost:8080/ws").expect("valid");
        let identity = SessionIdentity::new("jane doe@x", "t");
        assert_eq!(
            transport.handshake_url(&identity),
            "ws://localhost:8080/ws?userId=jane%20doe%40x"
        );

        let transport = WebSocketTransport::new("ws://h/ws?v=2").expect("valid");
        assert_eq!(
            transport.handshake_url(&SessionIdentity::new("u1", "t")),
            "ws://h/ws?v=2&userId=u1"
        );
    }

    #[test]
    fn test_handshake_url_escapes_reserved_and_non_ascii() {
        let transport = WebSocketTransport::new("wss://portal.example.com/ws").expect("valid");
        let identity = SessionIdentity::new("ana-maría_1.0~&role=admin", "t");
        assert_eq!(
            transport.handshake_url(&identity),
            "wss://portal.example.com/ws?userId=ana-mar%C3%ADa_1.0~%26role%3Dadmin"
        );
        assert_eq!(
            transport.handshake_url(&SessionIdentity::new("", "t")),
            "wss://portal.example.com/ws"
        );
    }

    #[test]
    fn test_decode_frame() {
        let frame = decode_frame(r#"{"event":"notification:deleted","data":{"id":"n1"}}"#);
        assert_eq!(
            frame,
            PushFrame::Event(RawPushEvent::new(
                "notification:deleted",
                serde_json::json!({ "id": "n1" })
            ))
        );
        assert_eq!(decode_frame(r#"{"event":"ping"}"#), PushFrame::Keepalive);
        assert!(matches!(decode_frame("not json"), PushFrame::Invalid(_)));
        assert!(matches!(decode_frame(""), PushFrame::Invalid(_)));
    }
}
