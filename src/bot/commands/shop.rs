//! Catalog and purchase Discord commands - browsing, `buy` and the cart.
//!
//! Purchases started here continue in direct messages, where the buyer sends the
//! fulfillment ID.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, format, handlers::autocomplete, local_hour, user_id_of},
        core::checkout,
        errors::{Error, Result},
    };

    /// Lists the top-level catalog categories.
    #[poise::command(slash_command, prefix_command)]
    pub async fn categories(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say(format::category_listing(&ctx.data().shop.catalog)?)
            .await?;
        Ok(())
    }

    /// Opens a catalog entry: lists what is inside, or shows product details.
    #[poise::command(slash_command, prefix_command)]
    pub async fn browse(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category, subcategory, server or product id"]
        #[autocomplete = "autocomplete::autocomplete_item_id"]
        item_id: String,
    ) -> Result<()> {
        let catalog = &ctx.data().shop.catalog;

        let Some(item) = catalog.find_by_id(&item_id) else {
            ctx.say(format!(
                "❌ `{item_id}` not found. Use `/categories` to start browsing."
            ))
            .await?;
            return Ok(());
        };

        ctx.say(format::node_listing(catalog, item, local_hour())?)
            .await?;
        Ok(())
    }

    /// Buys a product with your wallet balance.
    ///
    /// Checks availability and balance, then asks for the account ID to deliver to.
    #[poise::command(slash_command, prefix_command)]
    pub async fn buy(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product id"]
        #[autocomplete = "autocomplete::autocomplete_product_id"]
        product_id: String,
    ) -> Result<()> {
        let data = ctx.data();
        let user_id = user_id_of(ctx.author());

        let mut session = data.sessions.lock(user_id).await;
        let prompt =
            checkout::initiate_purchase(&data.shop, &mut session, user_id, &product_id, local_hour())
                .await?;

        ctx.say(format::checkout_prompt(&prompt)).await?;
        Ok(())
    }

    /// Saves a product in your cart.
    #[poise::command(slash_command, prefix_command)]
    pub async fn cart_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product id"]
        #[autocomplete = "autocomplete::autocomplete_product_id"]
        product_id: String,
    ) -> Result<()> {
        let data = ctx.data();
        let mut session = data.sessions.lock(user_id_of(ctx.author())).await;

        let entry =
            checkout::add_to_cart(&data.shop, &mut session, &product_id, local_hour())?.clone();
        let reply = format::cart_added(&entry, session.cart.total());
        drop(session);

        ctx.say(reply).await?;
        Ok(())
    }

    /// Shows your cart.
    #[poise::command(slash_command, prefix_command)]
    pub async fn cart(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let session = ctx.data().sessions.lock(user_id_of(ctx.author())).await;
        let text = format::cart_summary(&session.cart)?;
        drop(session);

        ctx.say(text).await?;
        Ok(())
    }

    /// Buys one product from your cart.
    #[poise::command(slash_command, prefix_command)]
    pub async fn cart_buy(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product id from your cart"]
        #[autocomplete = "autocomplete::autocomplete_product_id"]
        product_id: String,
    ) -> Result<()> {
        let data = ctx.data();
        let user_id = user_id_of(ctx.author());

        let mut session = data.sessions.lock(user_id).await;
        let in_cart = session
            .cart
            .iter()
            .any(|entry| entry.product_id == product_id);
        if !in_cart {
            drop(session);
            ctx.say(format!(
                "❌ `{product_id}` is not in your cart. Use `/cart` to see it."
            ))
            .await?;
            return Ok(());
        }

        let prompt =
            checkout::initiate_purchase(&data.shop, &mut session, user_id, &product_id, local_hour())
                .await?;

        ctx.say(format::checkout_prompt(&prompt)).await?;
        Ok(())
    }

    /// Empties your cart.
    #[poise::command(slash_command, prefix_command)]
    pub async fn cart_clear(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let mut session = ctx.data().sessions.lock(user_id_of(ctx.author())).await;
        session.cart.clear();
        drop(session);

        ctx.say("🗑️ Your cart is now empty.").await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
