//! Wallet Discord commands - balance, deposits, order history and `cancel`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, format, handlers::{autocomplete, conversation}, user_id_of},
        core::{deposit, purchase, wallet as ledger},
        errors::{Error, Result},
    };

    /// Shows your balance and the accepted deposit methods.
    #[poise::command(slash_command, prefix_command)]
    pub async fn wallet(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let shop = &ctx.data().shop;
        let balance = ledger::get_balance(&shop.db, user_id_of(ctx.author())).await?;

        ctx.say(format::wallet_summary(balance, &shop.config.payment_methods)?)
            .await?;
        Ok(())
    }

    /// Starts a deposit request.
    ///
    /// Shows where to send the money; the amount and transaction reference are then
    /// answered by direct message.
    #[poise::command(slash_command, prefix_command)]
    pub async fn deposit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Payment method (defaults to the first one)"]
        #[autocomplete = "autocomplete::autocomplete_payment_method"]
        method: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let mut session = data.sessions.lock(user_id_of(ctx.author())).await;

        let method = deposit::start_deposit(&data.shop, &mut session, method.as_deref())?;
        let text = format::deposit_instructions(method)?;
        drop(session);

        ctx.say(text).await?;
        Ok(())
    }

    /// Shows your orders, most recent first.
    #[poise::command(slash_command, prefix_command)]
    pub async fn orders(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let history =
            purchase::get_history(&ctx.data().shop.db, user_id_of(ctx.author())).await?;

        ctx.say(format::order_history(&history)?).await?;
        Ok(())
    }

    /// Aborts the current purchase, deposit or broadcast. Nothing is charged or recorded.
    #[poise::command(slash_command, prefix_command)]
    pub async fn cancel(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let mut session = ctx.data().sessions.lock(user_id_of(ctx.author())).await;
        let previous = session.cancel();
        drop(session);

        ctx.say(conversation::cancel_reply(previous.as_ref()))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
