//! Reply text rendering for catalog, cart and journal views.
//!
//! Kept apart from the command functions so the text can be tested without a Discord
//! context.

use crate::{
    config::shop::{PaymentMethodConfig, ShopConfig},
    core::{
        catalog::{Availability, AvailabilityWindow, Catalog, CatalogItem, ItemKind},
        checkout::CheckoutPrompt,
        report::{format_amount, format_payment_summary, format_purchase_summary},
        session::{Cart, CartEntry},
    },
    entities::{PendingPaymentModel, PurchaseModel},
    errors::Result,
};
use std::fmt::Write;

/// Most journal lines shown in one reply, to stay under Discord's message limit
pub const MAX_LISTED: usize = 10;

/// Availability line for a product detail screen.
#[must_use]
pub fn availability_note(window: Option<AvailabilityWindow>, hour: u32) -> String {
    let Some(window) = window else {
        return "✅ Available now".to_string();
    };

    match window.status_at(hour) {
        Availability::Open => format!("✅ Available now (window {window})"),
        Availability::NotYetOpen => format!("⏰ Available from {}:00", window.start_hour),
        Availability::Closed => format!("❌ Not available today (window {window})"),
    }
}

/// Detail screen for a product.
#[must_use]
pub fn product_detail(product: &CatalogItem, hour: u32) -> String {
    format!(
        "**{name}**\n\
         📂 {path}\n\
         💵 Price: {price}\n\
         {note}\n\n\
         Buy now with `/buy {id}` or save it with `/cart_add {id}`.",
        name = product.name,
        path = product.breadcrumb(),
        price = format_amount(product.price.unwrap_or_default()),
        note = availability_note(product.availability, hour),
        id = product.id,
    )
}

fn child_line(child: &CatalogItem) -> String {
    match (child.kind, child.price) {
        (ItemKind::Product, Some(price)) => {
            format!("• {} - {} (`{}`)", child.name, format_amount(price), child.id)
        }
        (ItemKind::Server, _) => match child.availability {
            Some(window) => format!("• {} ⏰ {window} (`{}`)", child.name, child.id),
            None => format!("• {} (`{}`)", child.name, child.id),
        },
        _ => format!("• {} (`{}`)", child.name, child.id),
    }
}

/// Top-level category menu.
pub fn category_listing(catalog: &Catalog) -> Result<String> {
    let mut text = "**Categories**\n".to_string();
    for category in catalog.categories() {
        writeln!(text, "{}", child_line(category))?;
    }
    text.push_str("\nOpen one with `/browse <id>`.");
    Ok(text)
}

/// Children of a category, subcategory or server, or the detail screen of a product.
pub fn node_listing(catalog: &Catalog, item: &CatalogItem, hour: u32) -> Result<String> {
    if item.is_product() {
        return Ok(product_detail(item, hour));
    }

    let mut text = String::new();
    let path = item.breadcrumb();
    if path.is_empty() {
        writeln!(text, "**{}**", item.name)?;
    } else {
        writeln!(text, "**{}**\n📂 {path}", item.name)?;
    }

    let children = catalog.children(&item.id);
    if children.is_empty() {
        text.push_str("Nothing here yet.");
        return Ok(text);
    }
    for child in children {
        writeln!(text, "{}", child_line(child))?;
    }
    text.push_str("\nOpen an entry with `/browse <id>`.");
    Ok(text)
}

/// Confirmation for a product saved in the cart.
#[must_use]
pub fn cart_added(entry: &CartEntry, cart_total: f64) -> String {
    format!(
        "✅ Added to cart: **{}** (`{}`) from {} for {}\nCart total: {}",
        entry.name,
        entry.product_id,
        entry.breadcrumb,
        format_amount(entry.price),
        format_amount(cart_total)
    )
}

/// Cart contents with a total.
pub fn cart_summary(cart: &Cart) -> Result<String> {
    if cart.is_empty() {
        return Ok("🛒 Your cart is empty. Add products with `/cart_add <id>`.".to_string());
    }

    let mut text = "🛒 **Your cart**\n".to_string();
    for entry in cart.iter() {
        writeln!(
            text,
            "• {} - {} ({}) → `/cart_buy {}`",
            entry.name,
            format_amount(entry.price),
            entry.breadcrumb,
            entry.product_id
        )?;
    }
    write!(text, "\n**Total:** {}", format_amount(cart.total()))?;
    Ok(text)
}

/// Prompt shown after a purchase passes its entry checks.
#[must_use]
pub fn checkout_prompt(prompt: &CheckoutPrompt<'_>) -> String {
    format!(
        "🛍️ **{name}** for {price}\n\
         Your balance: {balance}\n\n\
         Send the account ID to deliver to (digits only) as a direct message.\n\
         Use `/cancel` to abort.",
        name = prompt.product.name,
        price = format_amount(prompt.price),
        balance = format_amount(prompt.balance),
    )
}

/// Transfer instructions shown when a deposit starts.
pub fn deposit_instructions(method: &PaymentMethodConfig) -> Result<String> {
    let mut text = format!(
        "💳 **Deposit via {}**\nSend your transfer to: `{}`\n",
        method.name, method.destination
    );
    if !method.instructions.is_empty() {
        writeln!(text, "{}", method.instructions)?;
    }
    text.push_str("\nThen send me the amount you transferred as a direct message.\nUse `/cancel` to abort.");
    Ok(text)
}

/// Balance plus the accepted payment methods.
pub fn wallet_summary(balance: f64, methods: &[PaymentMethodConfig]) -> Result<String> {
    let mut text = format!("💰 Your balance: **{}**\n\n**Deposit methods**\n", format_amount(balance));
    for method in methods {
        writeln!(text, "• {} → `/deposit {}`", method.name, method.id)?;
    }
    Ok(text)
}

/// Shop description and contact details for `/about`.
pub fn about_shop(shop: &ShopConfig) -> Result<String> {
    let mut text = format!("ℹ️ **About {}**\n", shop.name);
    if !shop.about.is_empty() {
        writeln!(text, "\n{}", shop.about)?;
    }
    if !shop.contact.is_empty() {
        writeln!(text, "\n📞 **Contact**\n{}", shop.contact)?;
    }
    if shop.about.is_empty() && shop.contact.is_empty() {
        text.push_str("\nBrowse the shop with `/categories`.");
    }
    Ok(text)
}

/// Purchase history, newest first, capped at [`MAX_LISTED`] lines.
pub fn order_history(records: &[PurchaseModel]) -> Result<String> {
    if records.is_empty() {
        return Ok("📭 You have no orders yet.".to_string());
    }

    let mut text = "📜 **Your orders**\n".to_string();
    for record in records.iter().take(MAX_LISTED) {
        writeln!(text, "• {}", format_purchase_summary(record))?;
    }
    if records.len() > MAX_LISTED {
        write!(text, "…and {} older", records.len() - MAX_LISTED)?;
    }
    Ok(text)
}

/// Pending deposit requests, oldest first, capped at [`MAX_LISTED`] entries.
pub fn pending_listing(payments: &[PendingPaymentModel]) -> Result<String> {
    if payments.is_empty() {
        return Ok("✅ No deposits awaiting review.".to_string());
    }

    let mut text = format!("🧾 **{} pending deposit(s)**\n", payments.len());
    for payment in payments.iter().take(MAX_LISTED) {
        writeln!(text, "• {}", format_payment_summary(payment))?;
    }
    if payments.len() > MAX_LISTED {
        write!(text, "…and {} more", payments.len() - MAX_LISTED)?;
    }
    Ok(text)
}
