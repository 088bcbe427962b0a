//! General Discord commands - start, about, ping and help.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, format, user_id_of},
        core::{report::format_amount, wallet},
        errors::{Error, Result},
    };

    /// Greets the user and shows their balance and the main commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn start(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let shop = &ctx.data().shop;
        let balance = wallet::get_balance(&shop.db, user_id_of(ctx.author())).await?;

        let mut text = format!("👋 Welcome to **{}**, {}!\n", shop.config.shop.name, ctx.author().name);
        if !shop.config.shop.welcome.is_empty() {
            text.push_str(&shop.config.shop.welcome);
            text.push('\n');
        }
        text.push_str(&format!(
            "\n💰 Balance: {}\n\n\
             🛍️ `/categories` - browse the shop\n\
             🛒 `/cart` - your cart\n\
             💳 `/deposit` - top up your wallet\n\
             📜 `/orders` - your orders\n\
             ℹ️ `/about` - about the shop\n\
             ❓ `/help` - all commands",
            format_amount(balance)
        ));

        ctx.say(text).await?;
        Ok(())
    }

    /// Shows the shop description and how to reach the operator.
    #[poise::command(slash_command, prefix_command)]
    pub async fn about(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say(format::about_shop(&ctx.data().shop.config.shop)?)
            .await?;
        Ok(())
    }

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let mut help_text = "**ShopBuddy Help**\n\n\
        **Shopping**\n\
        • `/categories` - Lists the catalog categories.\n\
        • `/browse <id>` - Opens a category, server or product.\n\
        • `/buy <product>` - Buys a product with your wallet balance.\n\
        • `/cart_add <product>`, `/cart`, `/cart_buy <product>`, `/cart_clear` - Manage your cart.\n\n\
        **Wallet**\n\
        • `/wallet` - Shows your balance and deposit methods.\n\
        • `/deposit [method]` - Starts a deposit request.\n\
        • `/orders` - Shows your order history.\n\
        • `/cancel` - Aborts the current purchase or deposit.\n\n\
        Purchase and deposit steps are answered by direct message to the bot.\n\n\
        **Utility**\n\
        • `/about` - Shop description and contact details.\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message."
            .to_string();

        if user_id_of(ctx.author()) == ctx.data().shop.admin_id {
            help_text.push_str(
                "\n\n**Administrator**\n\
                • `/confirm_deposit <user_id> <amount>` - Credits a wallet.\n\
                • `/confirm_payment <payment_id>` - Credits a recorded deposit request.\n\
                • `/confirm_shipped <purchase_id>` - Marks an order delivered.\n\
                • `/pending_payments` - Lists deposit requests awaiting review.\n\
                • `/stats` - User statistics.\n\
                • `/broadcast` - Sends your next direct message to every user.",
            );
        }

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
