//! Purchase dialogue and cart operations.
//!
//! `Idle → AwaitingFulfillmentId → Completed | Aborted`. Entry re-checks the product,
//! its availability window and the buyer's balance every time, whether the user came
//! from the product screen, the cart or a typed command. The debit and the purchase
//! record are written together by [`purchase::create_with_debit`].

use crate::{
    core::{
        Customer, Shop, UserId,
        catalog::CatalogItem,
        notify::{Notifier, notify_best_effort},
        purchase,
        session::{CartEntry, Conversation, Session},
        wallet,
    },
    entities::PurchaseModel,
    errors::{Error, Result},
};
use tracing::{debug, info};

/// What the buyer is asked to confirm after a successful entry check.
#[derive(Debug, Clone)]
pub struct CheckoutPrompt<'a> {
    /// Product being bought
    pub product: &'a CatalogItem,
    /// Current catalog price
    pub price: f64,
    /// Balance at the time of the check
    pub balance: f64,
}

/// Result of a completed purchase
#[derive(Debug, Clone)]
pub struct CompletedPurchase {
    /// The new journal record
    pub purchase: PurchaseModel,
    /// Category path of the product for display
    pub breadcrumb: String,
    /// Wallet balance after the debit
    pub new_balance: f64,
    /// Whether the administrator received the order notice
    pub admin_notified: bool,
}

/// Outcome of a fulfillment identifier message
#[derive(Debug, Clone)]
pub enum FulfillmentOutcome {
    /// Input was not digits only; the dialogue stays open
    Retry,
    /// The order was paid and recorded
    Completed(Box<CompletedPurchase>),
}

/// Fails with `Error::Unavailable` when `hour` is outside the product's window.
fn ensure_available(product: &CatalogItem, hour: u32) -> Result<()> {
    match product.availability {
        Some(window) if !window.contains(hour) => Err(Error::Unavailable {
            product: product.name.clone(),
            start_hour: window.start_hour,
            end_hour: window.end_hour,
        }),
        _ => Ok(()),
    }
}

/// Enters the purchase dialogue for `product_id` at local hour `hour`.
///
/// Any dialogue already open is discarded first, so a second purchase entry replaces the
/// first rather than running next to it. Checks run in order: the product exists, the
/// window is open, the balance covers the price.
///
/// # Errors
/// `Error::ProductNotFound`, `Error::Unavailable` or `Error::InsufficientFunds`; the
/// session is left idle on error.
pub async fn initiate_purchase<'s, N: Notifier>(
    shop: &'s Shop<N>,
    session: &mut Session,
    user_id: UserId,
    product_id: &str,
    hour: u32,
) -> Result<CheckoutPrompt<'s>> {
    if let Some(previous) = session.cancel() {
        debug!("User {user_id} left {previous:?} to start a purchase");
    }

    let product = shop.catalog.find_product(product_id)?;
    ensure_available(product, hour)?;

    let price = product.price.unwrap_or_default();
    let balance = wallet::get_balance(&shop.db, user_id).await?;
    if balance < price {
        return Err(Error::InsufficientFunds {
            current: balance,
            required: price,
        });
    }

    session.conversation = Conversation::AwaitingFulfillmentId {
        product_id: product.id.clone(),
    };
    info!("User {user_id} started purchase of {product_id}");

    Ok(CheckoutPrompt {
        product,
        price,
        balance,
    })
}

/// Message sent to the administrator for a new order
fn order_notice(purchase: &PurchaseModel, breadcrumb: &str) -> String {
    format!(
        "🛒 New order\n\
         Purchase ID: {id}\n\
         User: {username} ({user_id})\n\
         Product: {product} ({breadcrumb})\n\
         Fulfillment ID: {fulfillment}\n\
         Price: ${price:.2}\n\n\
         Mark it shipped with:\n/confirm_shipped {id}",
        id = purchase.purchase_id,
        username = purchase.username,
        user_id = purchase.user_id,
        product = purchase.product_name,
        fulfillment = purchase.fulfillment_id,
        price = purchase.price,
    )
}

/// Handles the buyer's fulfillment identifier for the open purchase of `product_id`.
///
/// Non-digit input keeps the dialogue open. Valid input charges the current catalog
/// price, records the order, drops the product from the cart and notifies the
/// administrator on a best-effort basis.
///
/// # Errors
/// `Error::ProductNotFound` or `Error::InsufficientFunds` (the balance changed since
/// entry), or a database error. The dialogue is closed and nothing is written.
pub async fn submit_fulfillment_id<N: Notifier>(
    shop: &Shop<N>,
    session: &mut Session,
    customer: Customer<'_>,
    product_id: &str,
    input: &str,
) -> Result<FulfillmentOutcome> {
    let fulfillment_id = input.trim();
    if !purchase::is_valid_fulfillment_id(fulfillment_id) {
        debug!("User {} sent a non-numeric fulfillment id", customer.user_id);
        return Ok(FulfillmentOutcome::Retry);
    }

    session.conversation = Conversation::Idle;

    let product = shop.catalog.find_product(product_id)?;
    let price = product.price.unwrap_or_default();
    let (record, new_balance) =
        purchase::create_with_debit(&shop.db, customer, &product.name, fulfillment_id, price)
            .await?;

    session.cart.remove_product(product_id);

    let breadcrumb = product.breadcrumb();
    let admin_notified =
        notify_best_effort(&shop.notifier, shop.admin_id, &order_notice(&record, &breadcrumb))
            .await;

    Ok(FulfillmentOutcome::Completed(Box::new(CompletedPurchase {
        purchase: record,
        breadcrumb,
        new_balance,
        admin_notified,
    })))
}

/// Adds a product to the cart after checking it exists and its window is open.
///
/// # Errors
/// `Error::ProductNotFound` or `Error::Unavailable`.
pub fn add_to_cart<'c, N>(
    shop: &Shop<N>,
    session: &'c mut Session,
    product_id: &str,
    hour: u32,
) -> Result<&'c CartEntry> {
    let product = shop.catalog.find_product(product_id)?;
    ensure_available(product, hour)?;
    Ok(session.cart.add(product))
}
