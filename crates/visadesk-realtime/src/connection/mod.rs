//! Push connection management: lifecycle, reconnect backoff, heartbeat, transport.

pub mod backoff;
pub mod heartbeat;
pub mod manager;
pub mod state;
pub mod transport;
pub mod websocket;

pub use backoff::ReconnectPolicy;
pub use manager::ConnectionManager;
pub use state::{ConnectionPhase, ConnectionState};
