//! Sound and desktop alerts for newly arrived notifications.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use visadesk_entity::{DeliveryPreferences, Notification};

use super::store::{NotificationStore, StoreChange};

/// Channels an alert should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertChannels {
    /// Play a sound.
    pub sound: bool,
    /// Show a desktop alert.
    pub desktop: bool,
}

impl AlertChannels {
    /// Channels enabled by `preferences`, or `None` when all are off.
    pub fn from_preferences(preferences: &DeliveryPreferences) -> Option<Self> {
        preferences.any_enabled().then_some(Self {
            sound: preferences.sound_enabled,
            desktop: preferences.desktop_enabled,
        })
    }
}

/// Presents alerts to the user.
pub trait AlertSink: Send + Sync + std::fmt::Debug + 'static {
    /// Announce `notification` on the given channels.
    fn deliver(&self, notification: &Notification, channels: AlertChannels);
}

/// Alert sink that only emits a log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn deliver(&self, notification: &Notification, channels: AlertChannels) {
        info!(
            notification_id = %notification.id,
            category = %notification.category,
            sound = channels.sound,
            desktop = channels.desktop,
            "New notification: {}",
            notification.message
        );
    }
}

/// Deliver an alert for every unread insert on `changes` until `cancel`
/// fires or the feed closes.
pub async fn run_alerts(
    mut changes: broadcast::Receiver<StoreChange>,
    store: Arc<NotificationStore>,
    sink: Arc<dyn AlertSink>,
    cancel: CancellationToken,
) {
    loop {
        let change = tokio::select! {
            _ = cancel.cancelled() => break,
            change = changes.recv() => change,
        };

        match change {
            Ok(StoreChange::Inserted(notification)) if notification.is_unread() => {
                match AlertChannels::from_preferences(&store.preferences()) {
                    Some(channels) => sink.deliver(&notification, channels),
                    None => debug!(notification_id = %notification.id, "Alerts disabled; skipping"),
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Alert task lagged behind the change feed");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!("Alert task stopped");
}
