//! Purchase journal - paid orders awaiting manual fulfillment.
//!
//! A purchase is written in the same database transaction as the wallet debit that pays
//! for it, so the ledger never shows a debit without its order or an order without its
//! debit. The only later change is the one-way `pending_shipment` → `shipped` transition.

use crate::{
    core::{Customer, UserId, wallet},
    entities::{Purchase, PurchaseStatus, purchase},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::info;
use uuid::Uuid;

/// Whether a buyer-supplied fulfillment identifier is acceptable: non-empty, ASCII digits only.
#[must_use]
pub fn is_valid_fulfillment_id(input: &str) -> bool {
    !input.is_empty() && input.chars().all(|c| c.is_ascii_digit())
}

/// Inserts a `pending_shipment` purchase record.
///
/// Does not touch the wallet; use [`create_with_debit`] for the checkout path.
///
/// # Errors
/// Returns `Error::InvalidFulfillmentId` for non-digit identifiers, `Error::InvalidAmount`
/// for negative or non-finite prices, or a database error.
pub async fn create<C>(
    db: &C,
    customer: Customer<'_>,
    product_name: &str,
    fulfillment_id: &str,
    price: f64,
) -> Result<purchase::Model>
where
    C: ConnectionTrait,
{
    if !is_valid_fulfillment_id(fulfillment_id) {
        return Err(Error::InvalidFulfillmentId);
    }
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidAmount { amount: price });
    }

    let record = purchase::ActiveModel {
        purchase_id: Set(Uuid::new_v4().to_string()),
        user_id: Set(customer.user_id),
        username: Set(customer.username.to_string()),
        product_name: Set(product_name.to_string()),
        fulfillment_id: Set(fulfillment_id.to_string()),
        price: Set(price),
        status: Set(PurchaseStatus::PendingShipment),
        timestamp: Set(Utc::now()),
        shipped_at: Set(None),
    };

    let result = record.insert(db).await?;
    info!(
        "Purchase {} added for user {}: {}",
        result.purchase_id, result.user_id, result.product_name
    );
    Ok(result)
}

/// Debits the buyer and records the purchase as one atomic unit.
///
/// The debit is applied first and rolled back when it leaves the wallet below zero, so
/// the transaction holds the write lock from its first statement and concurrent
/// purchases are serialised by the database. Returns the record and the balance after
/// the debit.
///
/// # Errors
/// Returns `Error::InsufficientFunds` when the balance no longer covers `price`, plus any
/// error from [`create`]. Nothing is written on error.
pub async fn create_with_debit(
    db: &DatabaseConnection,
    customer: Customer<'_>,
    product_name: &str,
    fulfillment_id: &str,
    price: f64,
) -> Result<(purchase::Model, f64)> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidAmount { amount: price });
    }

    let txn = db.begin().await?;

    let new_balance =
        wallet::apply_delta(&txn, customer.user_id, -price, Some(customer.username)).await?;
    if new_balance < 0.0 {
        txn.rollback().await?;
        return Err(Error::InsufficientFunds {
            current: new_balance + price,
            required: price,
        });
    }

    let record = create(&txn, customer, product_name, fulfillment_id, price).await?;

    txn.commit().await?;
    Ok((record, new_balance))
}

/// Fetches a purchase by id.
pub async fn get<C>(db: &C, purchase_id: &str) -> Result<Option<purchase::Model>>
where
    C: ConnectionTrait,
{
    Purchase::find_by_id(purchase_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists a user's purchases, most recent first.
pub async fn get_history<C>(db: &C, user_id: UserId) -> Result<Vec<purchase::Model>>
where
    C: ConnectionTrait,
{
    Purchase::find()
        .filter(purchase::Column::UserId.eq(user_id))
        .order_by_desc(purchase::Column::Timestamp)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves a purchase from `pending_shipment` to `shipped` at `shipped_at` with one
/// conditional update. Returns the record and whether this call made the transition.
///
/// A purchase that is already shipped keeps its first shipment timestamp, and of several
/// concurrent callers exactly one sees `true`.
///
/// # Errors
/// Returns `Error::PurchaseNotFound` if no purchase has this id.
pub async fn set_shipped<C>(
    db: &C,
    purchase_id: &str,
    shipped_at: DateTime<Utc>,
) -> Result<(purchase::Model, bool)>
where
    C: ConnectionTrait,
{
    let changed = Purchase::update_many()
        .col_expr(
            purchase::Column::Status,
            Expr::value(PurchaseStatus::Shipped.as_str()),
        )
        .col_expr(purchase::Column::ShippedAt, Expr::value(shipped_at))
        .filter(purchase::Column::PurchaseId.eq(purchase_id))
        .filter(purchase::Column::Status.eq(PurchaseStatus::PendingShipment))
        .exec(db)
        .await?
        .rows_affected
        > 0;

    let record = get(db, purchase_id)
        .await?
        .ok_or_else(|| Error::PurchaseNotFound {
            id: purchase_id.to_string(),
        })?;

    if changed {
        info!("Purchase {purchase_id} marked as shipped");
    }
    Ok((record, changed))
}
