//! Transport seam between the connection manager and the wire.

use std::fmt;

use async_trait::async_trait;

use visadesk_core::config::SessionConfig;

use crate::error::TransportError;
use crate::message::types::RawPushEvent;

/// Identity of the signed-in user, carried by the push handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Portal user identifier.
    pub user_id: String,
    /// Bearer token for the session.
    pub token: String,
}

impl SessionIdentity {
    /// Create an identity.
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }
}

impl From<&SessionConfig> for SessionIdentity {
    fn from(config: &SessionConfig) -> Self {
        Self::new(config.user_id.clone(), config.token.clone())
    }
}

impl fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// One frame read from an open push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PushFrame {
    /// A notification event.
    Event(RawPushEvent),
    /// Ping, pong or any other liveness signal without a payload.
    Keepalive,
    /// A frame that could not be decoded into an event.
    Invalid(String),
}

/// An open push connection.
#[async_trait]
pub trait PushChannel: Send {
    /// Next frame, or `None` once the server closed the connection.
    async fn next_frame(&mut self) -> Option<Result<PushFrame, TransportError>>;

    /// Send a client keepalive ping.
    async fn send_keepalive(&mut self) -> Result<(), TransportError>;

    /// Close the connection. Errors are ignored.
    async fn close(&mut self);
}

/// Opens push channels for a session.
#[async_trait]
pub trait PushTransport: Send + Sync + fmt::Debug + 'static {
    /// Perform the handshake for `identity`.
    async fn open(&self, identity: &SessionIdentity) -> Result<Box<dyn PushChannel>, TransportError>;
}
