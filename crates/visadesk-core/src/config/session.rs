//! Session identity configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Identity of the authenticated user this client acts for.
///
/// The token is issued by the portal's login flow and is usually supplied
/// through `VISADESK__SESSION__TOKEN` rather than written to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// User identifier sent with the push handshake.
    pub user_id: String,
    /// Bearer token for REST calls and the push handshake.
    pub token: String,
}

impl SessionConfig {
    /// Fail early when no session token is configured.
    pub fn require_token(&self) -> Result<(), AppError> {
        if self.token.trim().is_empty() {
            return Err(AppError::configuration(
                "session.token is not set (use VISADESK__SESSION__TOKEN)",
            ));
        }
        Ok(())
    }
}
