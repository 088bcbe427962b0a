//! Direct-message delivery through the Discord HTTP API.

use crate::{
    core::{UserId, notify::Notifier},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Sends notifications as Discord direct messages.
#[derive(Clone)]
pub struct DiscordNotifier {
    http: Arc<serenity::Http>,
}

impl DiscordNotifier {
    /// Wraps the client's HTTP handle.
    #[must_use]
    pub const fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

impl Notifier for DiscordNotifier {
    async fn notify(&self, user_id: UserId, text: &str) -> Result<()> {
        let target = u64::try_from(user_id)
            .ok()
            .filter(|id| *id != 0)
            .ok_or_else(|| Error::Notification {
                message: format!("{user_id} is not a Discord user id"),
            })?;

        serenity::UserId::new(target)
            .direct_message(self.http.as_ref(), serenity::CreateMessage::new().content(text))
            .await
            .map_err(|e| Error::Notification {
                message: e.to_string(),
            })?;
        Ok(())
    }
}
