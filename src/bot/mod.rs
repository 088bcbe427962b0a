//! Bot layer - Discord-specific interface and command handlers
//!
//! This module wires the shop into poise: slash/prefix commands, the direct-message
//! handler that drives multi-step dialogues, and the Discord implementation of the
//! notification seam. Business rules live in [`crate::core`]; this layer only parses
//! input and renders replies.

/// Discord command implementations (general, shop, wallet, admin)
pub mod commands;
/// Reply text rendering
pub mod format;
/// Discord interaction handlers (autocomplete, direct messages)
pub mod handlers;
/// Direct-message notifier backed by the Discord HTTP client
pub mod notifier;

use crate::{
    config::shop::Config,
    core::{Customer, Shop, UserId, catalog::Catalog, session::SessionStore, wallet},
    errors::{Error, Result},
};
use chrono::Timelike;
use notifier::DiscordNotifier;
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Prefix for text commands such as `!wallet`
pub const COMMAND_PREFIX: &str = "!";

/// Shared data available to all bot commands and event handlers.
pub struct BotData {
    /// Stores, catalog, settings and the outbound notifier
    pub shop: Shop<DiscordNotifier>,
    /// Per-user dialogue state and carts
    pub sessions: SessionStore,
}

impl BotData {
    /// Creates the bot context around a shop with an empty session store.
    #[must_use]
    pub fn new(shop: Shop<DiscordNotifier>) -> Self {
        Self {
            shop,
            sessions: SessionStore::new(),
        }
    }
}

/// Poise context for this bot
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Converts a Discord user id to the stored integer id.
// Snowflakes only use the low 63 bits
#[allow(clippy::cast_possible_wrap)]
#[must_use]
pub fn user_id_of(user: &serenity::User) -> UserId {
    user.id.get() as i64
}

/// The author as a [`Customer`] for journal rows.
#[must_use]
pub fn customer_of(user: &serenity::User) -> Customer<'_> {
    Customer {
        user_id: user_id_of(user),
        username: &user.name,
    }
}

/// Current hour on the operator's clock, used for availability windows.
#[must_use]
pub fn local_hour() -> u32 {
    chrono::Local::now().hour()
}

/// User-facing text for an error returned by a command or dialogue step.
#[must_use]
pub fn describe_error(error: &Error) -> String {
    match error {
        Error::InsufficientFunds { current, required } => format!(
            "❌ Insufficient balance. You have ${current:.2} but this costs ${required:.2}.\n\
             Use `/deposit` to top up your wallet."
        ),
        Error::ProductNotFound { id } => {
            format!("❌ Product `{id}` not found. Use `/categories` to browse the catalog.")
        }
        Error::PurchaseNotFound { id } => format!("❌ Purchase `{id}` not found."),
        Error::PaymentNotFound { id } => format!("❌ Payment `{id}` not found."),
        Error::UnknownPaymentMethod { id } => {
            format!("❌ Unknown payment method `{id}`. Use `/wallet` to see accepted methods.")
        }
        Error::Unavailable {
            product,
            start_hour,
            end_hour,
        } => format!(
            "⏰ {product} can only be bought between {start_hour}:00 and {end_hour}:00."
        ),
        Error::InvalidAmount { .. } => {
            "❌ Invalid amount: must be a number greater than zero.".to_string()
        }
        Error::InvalidFulfillmentId => "❌ The ID must contain digits only.".to_string(),
        Error::PermissionDenied => "⛔ You don't have permission to use this command.".to_string(),
        _ => "⚠️ Something went wrong. Please try again later.".to_string(),
    }
}

/// Whether an error is an expected business outcome rather than a fault.
const fn is_user_error(error: &Error) -> bool {
    matches!(
        error,
        Error::InsufficientFunds { .. }
            | Error::ProductNotFound { .. }
            | Error::PurchaseNotFound { .. }
            | Error::PaymentNotFound { .. }
            | Error::UnknownPaymentMethod { .. }
            | Error::Unavailable { .. }
            | Error::InvalidAmount { .. }
            | Error::InvalidFulfillmentId
            | Error::PermissionDenied
    )
}

/// Logs an error at a level matching its kind.
pub fn log_error(context: &str, error: &Error) {
    if is_user_error(error) {
        debug!("{context}: {error}");
    } else {
        error!("{context}: {error:?}");
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            log_error(&format!("Error in command `{}`", ctx.command().name), &error);
            if let Err(e) = ctx.say(describe_error(&error)).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Stamps the caller's activity before every command, creating their wallet on first use.
async fn record_command_activity(ctx: Context<'_>) {
    let author = ctx.author();
    if let Err(e) =
        wallet::record_activity(&ctx.data().shop.db, user_id_of(author), Some(&author.name)).await
    {
        warn!("Failed to record activity for {}: {e}", author.id);
    }
}

/// Connects to Discord and serves commands until the client stops.
///
/// The shop is assembled once the gateway is ready, since the notifier needs the
/// client's HTTP handle.
#[instrument(skip_all)]
pub async fn run_bot(
    token: String,
    db: DatabaseConnection,
    catalog: Catalog,
    config: Config,
    admin_id: UserId,
) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(COMMAND_PREFIX.to_string()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            pre_command: |ctx| Box::pin(record_command_activity(ctx)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::conversation::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let shop = Shop {
                    db,
                    catalog,
                    config,
                    admin_id,
                    notifier: DiscordNotifier::new(Arc::clone(&ctx.http)),
                };
                Ok(BotData::new(shop))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e:?}"))?;

    Ok(())
}
