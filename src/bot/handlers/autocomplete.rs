//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions come from the in-memory catalog and shop settings, so no database
//! round trip is needed while the user types.

use crate::{bot::BotData, errors::Error};

/// Discord autocomplete limit
const MAX_SUGGESTIONS: usize = 25;

/// Product ids whose id or name contains the partial input.
pub async fn autocomplete_product_id(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let partial_lower = partial.to_lowercase();

    let mut matching: Vec<String> = ctx
        .data()
        .shop
        .catalog
        .products()
        .filter(|product| {
            product.id.to_lowercase().contains(&partial_lower)
                || product.name.to_lowercase().contains(&partial_lower)
        })
        .map(|product| product.id.clone())
        .collect();

    // Sort alphabetically for consistent UX
    matching.sort();
    matching.truncate(MAX_SUGGESTIONS);
    matching
}

/// Any catalog id (category, subcategory, server or product) matching the partial input.
pub async fn autocomplete_item_id(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let catalog = &ctx.data().shop.catalog;

    let mut matching: Vec<String> = catalog
        .categories()
        .flat_map(move |category| {
            std::iter::once(category).chain(catalog.children(&category.id).into_iter().flat_map(
                move |child| std::iter::once(child).chain(catalog.children(&child.id)),
            ))
        })
        .filter(|item| !item.is_product() && item.id.to_lowercase().contains(&partial_lower))
        .map(|item| item.id.clone())
        .collect();

    matching.sort();
    matching.truncate(MAX_SUGGESTIONS);
    matching
}

/// Configured payment method ids matching the partial input.
pub async fn autocomplete_payment_method(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let partial_lower = partial.to_lowercase();

    ctx.data()
        .shop
        .config
        .payment_methods
        .iter()
        .filter(|method| {
            method.id.to_lowercase().contains(&partial_lower)
                || method.name.to_lowercase().contains(&partial_lower)
        })
        .map(|method| method.id.clone())
        .take(MAX_SUGGESTIONS)
        .collect()
}
