//! Report generation business logic.
//!
//! User statistics for the administrator plus one-line summaries of journal entries.
//! All functions are framework-agnostic and return structured data or plain strings
//! that the bot layer drops into replies.

use crate::{
    entities::{PaymentStatus, PurchaseStatus, User, pending_payment, purchase, user},
    errors::Result,
};
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use sea_orm::{PaginatorTrait, prelude::*};

/// Counts shown by the `stats` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserStats {
    /// Every user with a wallet row
    pub total_users: u64,
    /// Users first seen since local midnight
    pub new_today: u64,
    /// Users active in the last 24 hours
    pub active_24h: u64,
}

/// Start of the calendar day containing `now`, in `now`'s own offset.
fn start_of_day(now: DateTime<FixedOffset>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    (midnight - Duration::seconds(i64::from(now.offset().local_minus_utc()))).and_utc()
}

/// Computes user statistics relative to `now`, the operator's local time.
pub async fn user_stats<C>(db: &C, now: DateTime<FixedOffset>) -> Result<UserStats>
where
    C: ConnectionTrait,
{
    let today = start_of_day(now);
    let day_ago = now.with_timezone(&Utc) - Duration::hours(24);

    let total_users = User::find().count(db).await?;
    let new_today = User::find()
        .filter(user::Column::CreatedAt.gte(today))
        .count(db)
        .await?;
    let active_24h = User::find()
        .filter(user::Column::LastActivity.gte(day_ago))
        .count(db)
        .await?;

    Ok(UserStats {
        total_users,
        new_today,
        active_24h,
    })
}

/// Formats a dollar amount, e.g. `"$5.00"`.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${amount:.2}")
    }
}

/// Generates a summary line for a purchase.
#[must_use]
pub fn format_purchase_summary(record: &purchase::Model) -> String {
    let status = match record.status {
        PurchaseStatus::PendingShipment => "⏳ pending shipment",
        PurchaseStatus::Shipped => "📦 shipped",
    };

    format!(
        "{} | {} | {} | {status} | ID: {}",
        record.timestamp.format("%Y-%m-%d %H:%M"),
        record.product_name,
        format_amount(record.price),
        record.purchase_id
    )
}

/// Generates a summary line for a deposit request, including the command that credits it.
#[must_use]
pub fn format_payment_summary(payment: &pending_payment::Model) -> String {
    let line = format!(
        "{} | {} ({}) | {} via {} | ref {}",
        payment.timestamp.format("%Y-%m-%d %H:%M"),
        payment.username,
        payment.user_id,
        format_amount(payment.amount),
        payment.payment_method,
        payment.transaction_id
    );

    match payment.status {
        PaymentStatus::Pending => format!("{line}\n`/confirm_payment {}`", payment.payment_id),
        PaymentStatus::Confirmed => format!("{line} | confirmed"),
    }
}
