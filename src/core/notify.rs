//! Outbound notifications to arbitrary users.
//!
//! Delivery can fail at any time (the user blocked the bot, closed DMs, or left every
//! shared server). Callers use [`notify_best_effort`], which logs failures and reports
//! whether the message went out; it never turns a delivery failure into an error of the
//! data mutation that preceded it.

use crate::{core::UserId, errors::Result};
use std::future::Future;
use tracing::{debug, error};

/// Sends a plain text message to a user by id.
pub trait Notifier: Send + Sync {
    /// Delivers `text` to `user_id`.
    ///
    /// # Errors
    /// Returns `Error::Notification` (or a transport error) when delivery fails.
    fn notify(&self, user_id: UserId, text: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Sends a message and logs instead of failing. Returns `true` if it was delivered.
pub async fn notify_best_effort<N: Notifier>(notifier: &N, user_id: UserId, text: &str) -> bool {
    match notifier.notify(user_id, text).await {
        Ok(()) => {
            debug!("Notified user {user_id}");
            true
        }
        Err(e) => {
            error!("Failed to notify user {user_id}: {e}");
            false
        }
    }
}
