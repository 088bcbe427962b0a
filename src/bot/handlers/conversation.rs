//! Direct-message dialogue router.
//!
//! Commands open a dialogue; the user's following direct messages are fed to the step
//! matching their session state. The session lock is held for the whole message, so two
//! messages from one user never interleave.

use crate::{
    bot::{BotData, COMMAND_PREFIX, customer_of, describe_error, log_error, user_id_of},
    core::{
        Customer, Shop,
        admin::{self, BroadcastOutcome},
        checkout::{self, FulfillmentOutcome},
        deposit::{self, AmountOutcome, DepositOutcome},
        notify::Notifier,
        report::format_amount,
        session::{Conversation, Session},
        wallet,
    },
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

/// Poise event hook; only direct messages from humans are handled.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    if let serenity::FullEvent::Message { new_message } = event {
        if new_message.author.bot || new_message.guild_id.is_some() {
            return Ok(());
        }
        // Prefix commands are dispatched by the framework; anything else is dialogue text
        let names = framework.options().commands.iter().flat_map(|command| {
            std::iter::once(command.name.as_str()).chain(command.aliases.iter().map(String::as_str))
        });
        if !is_prefix_command(&new_message.content, names) {
            handle_direct_message(ctx, data, new_message).await?;
        }
    }
    Ok(())
}

/// Whether `text` invokes one of the named commands with [`COMMAND_PREFIX`].
///
/// Text that merely starts with the prefix (`!23`, `!abc-ref`) is not a command.
pub fn is_prefix_command<'a>(text: &str, mut names: impl Iterator<Item = &'a str>) -> bool {
    let Some(rest) = text.trim_start().strip_prefix(COMMAND_PREFIX) else {
        return false;
    };
    let Some(word) = rest.split_whitespace().next() else {
        return false;
    };
    names.any(|name| name.eq_ignore_ascii_case(word))
}

/// Feeds one direct message into the author's open dialogue and sends the reply.
async fn handle_direct_message(
    ctx: &serenity::Context,
    data: &BotData,
    message: &serenity::Message,
) -> Result<()> {
    let author = &message.author;
    let user_id = user_id_of(author);

    if let Err(e) = wallet::record_activity(&data.shop.db, user_id, Some(&author.name)).await {
        warn!("Failed to record activity for {user_id}: {e}");
    }

    let mut session = data.sessions.lock(user_id).await;
    let reply = match advance(&data.shop, &mut session, customer_of(author), &message.content).await {
        Ok(Some(reply)) => reply,
        Ok(None) => return Ok(()),
        Err(e) => {
            log_error(&format!("Dialogue step failed for user {user_id}"), &e);
            describe_error(&e)
        }
    };

    message.channel_id.say(&ctx.http, reply).await?;
    Ok(())
}

/// Runs the dialogue step for the current state. `None` means the message is not
/// dialogue input and gets no reply.
pub async fn advance<N: Notifier>(
    shop: &Shop<N>,
    session: &mut Session,
    customer: Customer<'_>,
    text: &str,
) -> Result<Option<String>> {
    let reply = match session.conversation.clone() {
        Conversation::Idle => {
            debug!("Ignoring message from {} outside a dialogue", customer.user_id);
            return Ok(None);
        }
        Conversation::AwaitingFulfillmentId { product_id } => {
            match checkout::submit_fulfillment_id(shop, session, customer, &product_id, text)
                .await?
            {
                FulfillmentOutcome::Retry => {
                    "❌ The ID must contain digits only. Please send it again, or `/cancel`."
                        .to_string()
                }
                FulfillmentOutcome::Completed(done) => {
                    let mut reply = format!(
                        "✅ Purchase complete!\n\
                         Product: {}\n\
                         Delivering to: {}\n\
                         Paid: {}\n\
                         New balance: {}\n\
                         Purchase ID: `{}`\n\n\
                         Your order will be delivered shortly.",
                        done.purchase.product_name,
                        done.purchase.fulfillment_id,
                        format_amount(done.purchase.price),
                        format_amount(done.new_balance),
                        done.purchase.purchase_id
                    );
                    if !done.admin_notified {
                        reply.push_str(
                            "\n⚠️ We could not alert the operator right away; your order is saved.",
                        );
                    }
                    reply
                }
            }
        }
        Conversation::AwaitingAmount { method } => match deposit::submit_amount(session, &method, text) {
            AmountOutcome::Retry => {
                "❌ Please send a positive number, e.g. `5` or `12.50`, or `/cancel`.".to_string()
            }
            AmountOutcome::Accepted(amount) => format!(
                "Amount: {}\nNow send the transaction reference from your transfer receipt.",
                format_amount(amount)
            ),
        },
        Conversation::AwaitingTransactionRef { method, amount } => {
            match deposit::submit_transaction_ref(shop, session, customer, &method, amount, text)
                .await?
            {
                DepositOutcome::Retry => {
                    "❌ Please send the transaction reference, or `/cancel`.".to_string()
                }
                DepositOutcome::Submitted { payment, .. } => format!(
                    "📨 Your deposit of {} via {} is under review.\n\
                     Reference: `{}`\n\
                     Your wallet will be credited once an administrator confirms it.",
                    format_amount(payment.amount),
                    payment.payment_method,
                    payment.transaction_id
                ),
            }
        }
        Conversation::AwaitingBroadcast => {
            match admin::submit_broadcast(shop, session, customer.user_id, text).await? {
                BroadcastOutcome::Retry => {
                    "❌ The message is empty. Send the text to broadcast, or `/cancel`.".to_string()
                }
                BroadcastOutcome::Delivered(report) => format!(
                    "📣 Broadcast finished.\nSent: {}\nFailed: {}",
                    report.sent, report.failed
                ),
            }
        }
    };

    Ok(Some(reply))
}

/// Reply for a cancelled dialogue.
#[must_use]
pub fn cancel_reply(previous: Option<&Conversation>) -> String {
    match previous {
        None | Some(Conversation::Idle) => "Nothing to cancel.".to_string(),
        Some(Conversation::AwaitingFulfillmentId { .. }) => {
            "🚫 Purchase cancelled. Nothing was charged.".to_string()
        }
        Some(Conversation::AwaitingAmount { .. } | Conversation::AwaitingTransactionRef { .. }) => {
            "🚫 Deposit cancelled. No request was recorded.".to_string()
        }
        Some(Conversation::AwaitingBroadcast) => "🚫 Broadcast cancelled.".to_string(),
    }
}
