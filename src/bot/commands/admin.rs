//! Administrator Discord commands.
//!
//! Permission is checked in the core functions, so a non-administrator gets the
//! permission error reply from the framework error handler.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, format, user_id_of},
        core::{admin, report::format_amount},
        errors::{Error, Result},
    };

    /// Credits a user's wallet after a verified transfer.
    #[poise::command(slash_command, prefix_command)]
    pub async fn confirm_deposit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User ID to credit"] user_id: String,
        #[description = "Amount to credit"] amount: f64,
    ) -> Result<()> {
        let caller = user_id_of(ctx.author());
        admin::ensure_admin(&ctx.data().shop, caller)?;

        let Ok(target) = user_id.trim().parse::<i64>() else {
            ctx.say(format!("❌ `{user_id}` is not a valid user ID.")).await?;
            return Ok(());
        };

        let credit = admin::confirm_deposit(&ctx.data().shop, caller, target, amount).await?;

        let mut reply = format!(
            "✅ Credited {} to user {target}. New balance: {}",
            format_amount(amount),
            format_amount(credit.new_balance)
        );
        if !credit.user_notified {
            reply.push_str("\n⚠️ The user could not be notified.");
        }
        ctx.say(reply).await?;
        Ok(())
    }

    /// Credits a recorded deposit request and marks it confirmed.
    #[poise::command(slash_command, prefix_command)]
    pub async fn confirm_payment(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Payment ID from the deposit notice"] payment_id: String,
    ) -> Result<()> {
        let confirmation =
            admin::confirm_payment(&ctx.data().shop, user_id_of(ctx.author()), payment_id.trim())
                .await?;
        let payment = &confirmation.payment;

        let mut reply = if confirmation.credited {
            format!(
                "✅ Payment `{}` confirmed: credited {} to user {}. New balance: {}",
                payment.payment_id,
                format_amount(payment.amount),
                payment.user_id,
                format_amount(confirmation.new_balance)
            )
        } else {
            format!(
                "ℹ️ Payment `{}` was already confirmed. User {} balance: {}",
                payment.payment_id,
                payment.user_id,
                format_amount(confirmation.new_balance)
            )
        };
        if confirmation.credited && !confirmation.user_notified {
            reply.push_str("\n⚠️ The user could not be notified.");
        }
        ctx.say(reply).await?;
        Ok(())
    }

    /// Marks an order as delivered and tells the buyer.
    #[poise::command(slash_command, prefix_command)]
    pub async fn confirm_shipped(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Purchase ID from the order notice"] purchase_id: String,
    ) -> Result<()> {
        let shipment =
            admin::confirm_shipped(&ctx.data().shop, user_id_of(ctx.author()), purchase_id.trim())
                .await?;
        let record = &shipment.purchase;

        let reply = if shipment.already_shipped {
            format!("ℹ️ Purchase `{}` was already shipped.", record.purchase_id)
        } else if shipment.buyer_notified {
            format!(
                "✅ Purchase `{}` ({}) marked as shipped. The buyer was notified.",
                record.purchase_id, record.product_name
            )
        } else {
            format!(
                "✅ Purchase `{}` ({}) marked as shipped.\n⚠️ The buyer could not be notified.",
                record.purchase_id, record.product_name
            )
        };
        ctx.say(reply).await?;
        Ok(())
    }

    /// Lists deposit requests awaiting review.
    #[poise::command(slash_command, prefix_command)]
    pub async fn pending_payments(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let payments =
            admin::pending_payments(&ctx.data().shop, user_id_of(ctx.author())).await?;

        ctx.say(format::pending_listing(&payments)?).await?;
        Ok(())
    }

    /// Shows user statistics.
    #[poise::command(slash_command, prefix_command)]
    pub async fn stats(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let now = chrono::Local::now().fixed_offset();
        let counts = admin::stats(&ctx.data().shop, user_id_of(ctx.author()), now).await?;

        ctx.say(format!(
            "📊 **Statistics**\n\
             👥 Total users: {}\n\
             🆕 New today: {}\n\
             🟢 Active in the last 24h: {}",
            counts.total_users, counts.new_today, counts.active_24h
        ))
        .await?;
        Ok(())
    }

    /// Sends a message to every user. The text is your next direct message to the bot.
    #[poise::command(slash_command, prefix_command)]
    pub async fn broadcast(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let caller = user_id_of(ctx.author());

        let mut session = data.sessions.lock(caller).await;
        admin::start_broadcast(&data.shop, &mut session, caller)?;
        drop(session);

        ctx.say("📣 Send me the message to broadcast as a direct message, or `/cancel`.")
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
