//! # visadesk-realtime
//!
//! Client-side notification engine for VisaDesk. Provides:
//!
//! - A single persistent push connection with exponential-backoff
//!   reconnection and heartbeat staleness detection
//! - Validation and dispatch of `notification:new|updated|deleted` events
//! - An in-memory notification store with idempotent, delete-wins merges
//! - REST polling fallback while the push connection is degraded
//! - Optimistic mark-read / mark-all-read / delete with rollback
//! - Sound/desktop alerts gated by persisted delivery preferences

pub mod connection;
pub mod engine;
pub mod error;
pub mod message;
pub mod metrics;
pub mod mutation;
pub mod notification;
pub mod observer;
pub mod poller;

pub use connection::manager::ConnectionManager;
pub use connection::state::{ConnectionPhase, ConnectionState};
pub use connection::transport::{PushChannel, PushFrame, PushTransport, SessionIdentity};
pub use connection::websocket::WebSocketTransport;
pub use engine::NotificationEngine;
pub use error::{MutationError, TransportError, ValidationError};
pub use mutation::gateway::MutationGateway;
pub use notification::alert::{AlertChannels, AlertSink, LogAlertSink};
pub use notification::dispatcher::EventDispatcher;
pub use notification::preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use notification::store::{ApplyOutcome, MergeOp, NotificationStore, StoreChange, StoreSnapshot};
pub use observer::{ListenerRegistry, Subscription};
pub use poller::{FallbackPoller, PollerState};
