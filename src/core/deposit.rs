//! Deposit dialogue: `Idle → AwaitingAmount → AwaitingTransactionRef → Completed`.
//!
//! Completing the dialogue only records a pending payment and tells the administrator.
//! The wallet is credited later, by hand, through an administrator command.

use crate::{
    config::shop::PaymentMethodConfig,
    core::{
        Customer, Shop,
        notify::{Notifier, notify_best_effort},
        payment,
        session::{Conversation, Session},
        wallet,
    },
    entities::PendingPaymentModel,
    errors::{Error, Result},
};
use tracing::{debug, info};

/// Outcome of the amount message
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmountOutcome {
    /// Not a positive number; the dialogue stays open
    Retry,
    /// Amount stored, waiting for the transaction reference
    Accepted(f64),
}

/// Outcome of the transaction reference message
#[derive(Debug, Clone)]
pub enum DepositOutcome {
    /// Empty reference; the dialogue stays open
    Retry,
    /// Pending payment recorded
    Submitted {
        /// The new journal entry
        payment: PendingPaymentModel,
        /// Whether the administrator received the review request
        admin_notified: bool,
    },
}

/// Enters the deposit dialogue with the given payment method, or the first configured one.
///
/// Replaces any open dialogue. The returned method carries the transfer destination and
/// instructions to show before asking for the amount.
///
/// # Errors
/// Returns `Error::UnknownPaymentMethod` if `method_id` is not configured.
pub fn start_deposit<'s, N>(
    shop: &'s Shop<N>,
    session: &mut Session,
    method_id: Option<&str>,
) -> Result<&'s PaymentMethodConfig> {
    let method = shop
        .config
        .payment_method(method_id)
        .ok_or_else(|| Error::UnknownPaymentMethod {
            id: method_id.unwrap_or_default().to_string(),
        })?;

    session.cancel();
    session.conversation = Conversation::AwaitingAmount {
        method: method.name.clone(),
    };
    Ok(method)
}

/// Parses a claimed amount: a finite decimal greater than zero.
#[must_use]
pub fn parse_amount(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
}

/// Handles the amount message for an open deposit via `method`.
pub fn submit_amount(session: &mut Session, method: &str, input: &str) -> AmountOutcome {
    let Some(amount) = parse_amount(input) else {
        return AmountOutcome::Retry;
    };

    session.conversation = Conversation::AwaitingTransactionRef {
        method: method.to_string(),
        amount,
    };
    AmountOutcome::Accepted(amount)
}

/// Message sent to the administrator for a new deposit claim
fn review_notice(payment: &PendingPaymentModel) -> String {
    format!(
        "💰 New deposit request\n\
         Payment ID: {id}\n\
         User: {username} ({user_id})\n\
         Amount: ${amount:.2}\n\
         Method: {method}\n\
         Transaction: {reference}\n\n\
         Credit it with:\n/confirm_deposit {user_id} {amount:.2}\n\
         or:\n/confirm_payment {id}",
        id = payment.payment_id,
        username = payment.username,
        user_id = payment.user_id,
        amount = payment.amount,
        method = payment.payment_method,
        reference = payment.transaction_id,
    )
}

/// Handles the transaction reference for an open deposit of `amount` via `method`.
///
/// The trimmed reference is stored as-is. The balance is not touched.
///
/// # Errors
/// Returns a database error; the dialogue is closed and no entry is written.
pub async fn submit_transaction_ref<N: Notifier>(
    shop: &Shop<N>,
    session: &mut Session,
    customer: Customer<'_>,
    method: &str,
    amount: f64,
    input: &str,
) -> Result<DepositOutcome> {
    let reference = input.trim();
    if reference.is_empty() {
        debug!("User {} sent an empty transaction reference", customer.user_id);
        return Ok(DepositOutcome::Retry);
    }

    session.conversation = Conversation::Idle;

    wallet::record_activity(&shop.db, customer.user_id, Some(customer.username)).await?;
    let payment = payment::create(&shop.db, customer, amount, reference, method).await?;
    info!(
        "User {} submitted deposit {} of {amount:.2}",
        customer.user_id, payment.payment_id
    );

    let admin_notified =
        notify_best_effort(&shop.notifier, shop.admin_id, &review_notice(&payment)).await;

    Ok(DepositOutcome::Submitted {
        payment,
        admin_notified,
    })
}
