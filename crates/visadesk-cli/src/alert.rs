//! Terminal alert sink for `visadesk watch`.

use std::io::Write;

use visadesk_entity::Notification;
use visadesk_realtime::{AlertChannels, AlertSink};

use crate::output;

/// Rings the terminal bell for sound alerts and prints a banner line for
/// desktop alerts.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalAlertSink;

impl AlertSink for TerminalAlertSink {
    fn deliver(&self, notification: &Notification, channels: AlertChannels) {
        let mut stdout = std::io::stdout().lock();
        if channels.sound {
            let _ = write!(stdout, "\x07");
        }
        if channels.desktop {
            let _ = writeln!(stdout, "🔔 {}", output::notification_line(notification));
        }
        let _ = stdout.flush();
    }
}
