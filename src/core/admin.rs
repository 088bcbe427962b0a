//! Administrator-only commands.
//!
//! Every function checks the caller against the configured administrator before touching
//! anything. Data changes are committed before the affected user is notified, and a failed
//! notification never undoes them.

use crate::{
    core::{
        Shop, UserId,
        notify::{Notifier, notify_best_effort},
        payment, purchase,
        report::{self, UserStats, format_amount},
        session::{Conversation, Session},
        wallet,
    },
    entities::{PaymentStatus, PendingPaymentModel, PurchaseModel},
    errors::{Error, Result},
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::TransactionTrait;
use tracing::{info, instrument, warn};

/// Result of crediting a wallet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Credit {
    /// Balance after the credit
    pub new_balance: f64,
    /// Whether the user was told
    pub user_notified: bool,
}

/// Result of `confirm_payment`
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    /// The journal entry, now `confirmed`
    pub payment: PendingPaymentModel,
    /// `false` when the entry had already been confirmed and nothing was credited
    pub credited: bool,
    /// Owner's balance after the call
    pub new_balance: f64,
    /// Whether the owner was told
    pub user_notified: bool,
}

/// Result of `confirm_shipped`
#[derive(Debug, Clone)]
pub struct ShipmentConfirmation {
    /// The purchase, now `shipped`
    pub purchase: PurchaseModel,
    /// `true` when it had been shipped before this call
    pub already_shipped: bool,
    /// Whether the buyer was told
    pub buyer_notified: bool,
}

/// Delivery counts for a broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Users that received the message
    pub sent: usize,
    /// Users the message could not be delivered to
    pub failed: usize,
}

/// Outcome of the broadcast body message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Empty body; still waiting for the message
    Retry,
    /// Delivery finished
    Delivered(BroadcastReport),
}

/// Rejects callers other than the configured administrator.
///
/// # Errors
/// Returns `Error::PermissionDenied`.
pub fn ensure_admin<N>(shop: &Shop<N>, caller: UserId) -> Result<()> {
    if caller == shop.admin_id {
        Ok(())
    } else {
        warn!("User {caller} attempted an administrator command");
        Err(Error::PermissionDenied)
    }
}

/// Credits `amount` to `target`'s wallet and tells them their new balance.
///
/// Independent of the pending-payment journal: no entry is looked up or changed.
///
/// # Errors
/// `Error::PermissionDenied`, `Error::InvalidAmount` for non-positive amounts, or a
/// database error.
#[instrument(skip(shop))]
pub async fn confirm_deposit<N: Notifier>(
    shop: &Shop<N>,
    caller: UserId,
    target: UserId,
    amount: f64,
) -> Result<Credit> {
    ensure_admin(shop, caller)?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    let new_balance = wallet::adjust_balance(&shop.db, target, amount, None).await?;
    info!("Deposit of {amount:.2} confirmed for user {target}");

    let text = format!(
        "✅ Your deposit of {} has been confirmed.\nNew balance: {}",
        format_amount(amount),
        format_amount(new_balance)
    );
    let user_notified = notify_best_effort(&shop.notifier, target, &text).await;

    Ok(Credit {
        new_balance,
        user_notified,
    })
}

/// Credits a specific pending payment to its owner and marks it confirmed.
///
/// The credit and the status change commit together. Confirming an entry that is already
/// confirmed credits nothing.
///
/// # Errors
/// `Error::PermissionDenied`, `Error::PaymentNotFound`, or a database error.
#[instrument(skip(shop))]
pub async fn confirm_payment<N: Notifier>(
    shop: &Shop<N>,
    caller: UserId,
    payment_id: &str,
) -> Result<PaymentConfirmation> {
    ensure_admin(shop, caller)?;

    // The conditional update runs first so only one concurrent caller can credit
    let txn = shop.db.begin().await?;
    let (entry, changed) = payment::set_status(&txn, payment_id, PaymentStatus::Confirmed).await?;
    if !changed {
        let new_balance = wallet::get_balance(&txn, entry.user_id).await?;
        txn.commit().await?;
        info!("Payment {payment_id} was already confirmed");
        return Ok(PaymentConfirmation {
            payment: entry,
            credited: false,
            new_balance,
            user_notified: false,
        });
    }

    let new_balance = wallet::apply_delta(&txn, entry.user_id, entry.amount, None).await?;
    txn.commit().await?;
    info!(
        "Payment {payment_id} confirmed, credited {:.2} to user {}",
        entry.amount, entry.user_id
    );

    let text = format!(
        "✅ Your deposit of {} (ref {}) has been confirmed.\nNew balance: {}",
        format_amount(entry.amount),
        entry.transaction_id,
        format_amount(new_balance)
    );
    let user_notified = notify_best_effort(&shop.notifier, entry.user_id, &text).await;

    Ok(PaymentConfirmation {
        payment: entry,
        credited: true,
        new_balance,
        user_notified,
    })
}

/// Marks a purchase shipped and tells the buyer.
///
/// The status change is committed before the notice is sent. A purchase that was already
/// shipped keeps its first shipment time and the buyer is not told again.
///
/// # Errors
/// `Error::PermissionDenied`, `Error::PurchaseNotFound`, or a database error.
#[instrument(skip(shop))]
pub async fn confirm_shipped<N: Notifier>(
    shop: &Shop<N>,
    caller: UserId,
    purchase_id: &str,
) -> Result<ShipmentConfirmation> {
    ensure_admin(shop, caller)?;

    let (record, changed) = purchase::set_shipped(&shop.db, purchase_id, Utc::now()).await?;
    if !changed {
        return Ok(ShipmentConfirmation {
            purchase: record,
            already_shipped: true,
            buyer_notified: false,
        });
    }

    let text = format!(
        "📦 Your order has been shipped!\nProduct: {}\nFulfillment ID: {}\nPurchase ID: {}",
        record.product_name, record.fulfillment_id, record.purchase_id
    );
    let buyer_notified = notify_best_effort(&shop.notifier, record.user_id, &text).await;
    if !buyer_notified {
        warn!(
            "Purchase {purchase_id} is shipped but user {} was not notified",
            record.user_id
        );
    }

    Ok(ShipmentConfirmation {
        purchase: record,
        already_shipped: false,
        buyer_notified,
    })
}

/// Lists deposit requests still awaiting review, oldest first.
///
/// # Errors
/// `Error::PermissionDenied` or a database error.
pub async fn pending_payments<N>(shop: &Shop<N>, caller: UserId) -> Result<Vec<PendingPaymentModel>> {
    ensure_admin(shop, caller)?;
    payment::list_pending(&shop.db).await
}

/// User counts relative to the operator-local time `now`.
///
/// # Errors
/// `Error::PermissionDenied` or a database error.
pub async fn stats<N>(shop: &Shop<N>, caller: UserId, now: DateTime<FixedOffset>) -> Result<UserStats> {
    ensure_admin(shop, caller)?;
    report::user_stats(&shop.db, now).await
}

/// Opens the broadcast dialogue; the administrator's next message is the body.
///
/// # Errors
/// `Error::PermissionDenied`; the session is left untouched.
pub fn start_broadcast<N>(shop: &Shop<N>, session: &mut Session, caller: UserId) -> Result<()> {
    ensure_admin(shop, caller)?;
    session.cancel();
    session.conversation = Conversation::AwaitingBroadcast;
    Ok(())
}

/// Sends `text` to every known user except the administrator, one at a time.
///
/// A failed delivery is counted and the loop moves on.
///
/// # Errors
/// `Error::PermissionDenied` or a database error while listing users.
#[instrument(skip(shop, session, text))]
pub async fn submit_broadcast<N: Notifier>(
    shop: &Shop<N>,
    session: &mut Session,
    caller: UserId,
    text: &str,
) -> Result<BroadcastOutcome> {
    ensure_admin(shop, caller)?;
    let body = text.trim();
    if body.is_empty() {
        return Ok(BroadcastOutcome::Retry);
    }
    session.conversation = Conversation::Idle;

    let mut report = BroadcastReport::default();
    for user_id in wallet::get_all_user_ids(&shop.db).await? {
        if user_id == shop.admin_id {
            continue;
        }
        if notify_best_effort(&shop.notifier, user_id, body).await {
            report.sent += 1;
        } else {
            report.failed += 1;
        }
    }

    info!(
        "Broadcast finished: {} sent, {} failed",
        report.sent, report.failed
    );
    Ok(BroadcastOutcome::Delivered(report))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{checkout, deposit},
        entities::PurchaseStatus,
        test_utils::*,
    };
    use std::sync::Arc;

    const OUTSIDER: UserId = 7;

    #[tokio::test]
    async fn test_confirm_deposit_credits_user() -> Result<()> {
        let shop = setup_test_shop().await?;
        create_test_user(&shop.db, 42, 0.0).await?;

        let credit = confirm_deposit(&shop, TEST_ADMIN_ID, 42, 5.0).await?;
        assert_eq!(credit.new_balance, 5.0);
        assert!(credit.user_notified);
        assert_eq!(wallet::get_balance(&shop.db, 42).await?, 5.0);

        let messages = shop.notifier.messages_for(42);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("$5.00"));

        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_deposit_requires_admin() -> Result<()> {
        let shop = setup_test_shop().await?;
        create_test_user(&shop.db, 42, 0.0).await?;

        let result = confirm_deposit(&shop, OUTSIDER, 42, 5.0).await;
        assert!(matches!(result, Err(Error::PermissionDenied)));
        assert_eq!(wallet::get_balance(&shop.db, 42).await?, 0.0);
        assert_eq!(shop.notifier.total_sent(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_deposit_rejects_bad_amounts() -> Result<()> {
        let shop = setup_test_shop().await?;

        for amount in [0.0, -1.0, f64::NAN] {
            let result = confirm_deposit(&shop, TEST_ADMIN_ID, 42, amount).await;
            assert!(matches!(result, Err(Error::InvalidAmount { amount: _ })));
        }
        assert!(wallet::get_user(&shop.db, 42).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_deposit_ignores_journal() -> Result<()> {
        let shop = setup_test_shop().await?;
        create_test_user(&shop.db, 42, 0.0).await?;
        let entry = payment::create(&shop.db, customer(42), 5.0, "TX123", "Cash Transfer").await?;

        confirm_deposit(&shop, TEST_ADMIN_ID, 42, 5.0).await?;

        let entry = payment::get(&shop.db, &entry.payment_id).await?.unwrap();
        assert_eq!(entry.status, PaymentStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_deposit_blocked_user_still_credited() -> Result<()> {
        let shop = setup_test_shop().await?;
        shop.notifier.block(42);

        let credit = confirm_deposit(&shop, TEST_ADMIN_ID, 42, 3.0).await?;
        assert!(!credit.user_notified);
        assert_eq!(wallet::get_balance(&shop.db, 42).await?, 3.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_payment_credits_once() -> Result<()> {
        let shop = setup_test_shop().await?;
        let mut session = Session::default();
        deposit::start_deposit(&shop, &mut session, None)?;
        deposit::submit_amount(&mut session, "Cash Transfer", "5.0");
        let deposit::DepositOutcome::Submitted { payment: entry, .. } =
            deposit::submit_transaction_ref(
                &shop,
                &mut session,
                customer(42),
                "Cash Transfer",
                5.0,
                "TX123",
            )
            .await?
        else {
            return Err(Error::PaymentNotFound { id: String::new() });
        };

        let first = confirm_payment(&shop, TEST_ADMIN_ID, &entry.payment_id).await?;
        assert!(first.credited);
        assert_eq!(first.new_balance, 5.0);
        assert_eq!(first.payment.status, PaymentStatus::Confirmed);
        assert!(first.user_notified);

        let second = confirm_payment(&shop, TEST_ADMIN_ID, &entry.payment_id).await?;
        assert!(!second.credited);
        assert_eq!(second.new_balance, 5.0);
        assert_eq!(wallet::get_balance(&shop.db, 42).await?, 5.0);
        assert_eq!(shop.notifier.messages_for(42).len(), 1);
        assert!(payment::list_pending(&shop.db).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_payment_errors() -> Result<()> {
        let shop = setup_test_shop().await?;
        create_test_user(&shop.db, 42, 0.0).await?;
        let entry = payment::create(&shop.db, customer(42), 5.0, "TX", "Cash").await?;

        let denied = confirm_payment(&shop, OUTSIDER, &entry.payment_id).await;
        assert!(matches!(denied, Err(Error::PermissionDenied)));

        let missing = confirm_payment(&shop, TEST_ADMIN_ID, "missing").await;
        assert!(matches!(missing, Err(Error::PaymentNotFound { id: _ })));

        assert_eq!(wallet::get_balance(&shop.db, 42).await?, 0.0);
        assert_eq!(payment::list_pending(&shop.db).await?.len(), 1);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_parallel_confirm_payment_credits_once() -> Result<()> {
        let (shop, _file_db) = setup_file_shop().await?;
        let shop = Arc::new(shop);
        create_test_user(&shop.db, 42, 0.0).await?;
        let entry = payment::create(&shop.db, customer(42), 5.0, "TX-1", "Cash Transfer").await?;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let shop = Arc::clone(&shop);
            let payment_id = entry.payment_id.clone();
            handles.push(tokio::spawn(async move {
                confirm_payment(&shop, TEST_ADMIN_ID, &payment_id).await
            }));
        }

        let mut credited = 0;
        for handle in handles {
            if handle.await.unwrap()?.credited {
                credited += 1;
            }
        }

        assert_eq!(credited, 1);
        assert_eq!(wallet::get_balance(&shop.db, 42).await?, 5.0);
        assert_eq!(shop.notifier.messages_for(42).len(), 1);
        assert!(payment::list_pending(&shop.db).await?.is_empty());

        Ok(())
    }

    async fn place_order(shop: &Shop<RecordingNotifier>) -> Result<PurchaseModel> {
        create_test_user(&shop.db, 42, 10.0).await?;
        let mut session = Session::default();
        checkout::initiate_purchase(shop, &mut session, 42, "pubg_60", 12).await?;
        match checkout::submit_fulfillment_id(shop, &mut session, customer(42), "pubg_60", "999")
            .await?
        {
            checkout::FulfillmentOutcome::Completed(done) => Ok(done.purchase),
            checkout::FulfillmentOutcome::Retry => Err(Error::InvalidFulfillmentId),
        }
    }

    #[tokio::test]
    async fn test_confirm_shipped_notifies_buyer() -> Result<()> {
        let shop = setup_test_shop().await?;
        let order = place_order(&shop).await?;

        let shipped = confirm_shipped(&shop, TEST_ADMIN_ID, &order.purchase_id).await?;
        assert_eq!(shipped.purchase.status, PurchaseStatus::Shipped);
        assert!(shipped.purchase.shipped_at.is_some());
        assert!(!shipped.already_shipped);
        assert!(shipped.buyer_notified);

        let messages = shop.notifier.messages_for(42);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("60 UC"));

        let again = confirm_shipped(&shop, TEST_ADMIN_ID, &order.purchase_id).await?;
        assert!(again.already_shipped);
        assert_eq!(again.purchase.shipped_at, shipped.purchase.shipped_at);
        assert_eq!(shop.notifier.messages_for(42).len(), 1);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_parallel_confirm_shipped_notifies_once() -> Result<()> {
        let (shop, _file_db) = setup_file_shop().await?;
        let shop = Arc::new(shop);
        let order = place_order(&shop).await?;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let shop = Arc::clone(&shop);
            let purchase_id = order.purchase_id.clone();
            handles.push(tokio::spawn(async move {
                confirm_shipped(&shop, TEST_ADMIN_ID, &purchase_id).await
            }));
        }

        let mut first_shipments = 0;
        for handle in handles {
            if !handle.await.unwrap()?.already_shipped {
                first_shipments += 1;
            }
        }

        assert_eq!(first_shipments, 1);
        assert_eq!(shop.notifier.messages_for(42).len(), 1);
        let stored = purchase::get(&shop.db, &order.purchase_id).await?.unwrap();
        assert_eq!(stored.status, PurchaseStatus::Shipped);

        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_shipped_persists_when_buyer_blocked() -> Result<()> {
        let shop = setup_test_shop().await?;
        let order = place_order(&shop).await?;
        shop.notifier.block(42);

        let shipped = confirm_shipped(&shop, TEST_ADMIN_ID, &order.purchase_id).await?;
        assert!(!shipped.buyer_notified);

        let stored = purchase::get(&shop.db, &order.purchase_id).await?.unwrap();
        assert_eq!(stored.status, PurchaseStatus::Shipped);

        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_shipped_errors() -> Result<()> {
        let shop = setup_test_shop().await?;
        let order = place_order(&shop).await?;

        let denied = confirm_shipped(&shop, OUTSIDER, &order.purchase_id).await;
        assert!(matches!(denied, Err(Error::PermissionDenied)));
        let stored = purchase::get(&shop.db, &order.purchase_id).await?.unwrap();
        assert_eq!(stored.status, PurchaseStatus::PendingShipment);

        let missing = confirm_shipped(&shop, TEST_ADMIN_ID, "missing").await;
        assert!(matches!(missing, Err(Error::PurchaseNotFound { id: _ })));

        Ok(())
    }

    #[tokio::test]
    async fn test_broadcast_skips_admin_and_counts_failures() -> Result<()> {
        let shop = setup_test_shop().await?;
        for user_id in [1, 2, 3, TEST_ADMIN_ID] {
            create_test_user(&shop.db, user_id, 0.0).await?;
        }
        shop.notifier.block(2);
        let mut session = Session::default();

        assert!(matches!(
            start_broadcast(&shop, &mut session, OUTSIDER),
            Err(Error::PermissionDenied)
        ));
        assert_eq!(session.conversation, Conversation::Idle);

        start_broadcast(&shop, &mut session, TEST_ADMIN_ID)?;
        assert_eq!(session.conversation, Conversation::AwaitingBroadcast);

        let retry = submit_broadcast(&shop, &mut session, TEST_ADMIN_ID, "  ").await?;
        assert_eq!(retry, BroadcastOutcome::Retry);
        assert_eq!(session.conversation, Conversation::AwaitingBroadcast);

        let outcome = submit_broadcast(&shop, &mut session, TEST_ADMIN_ID, "Sale today!").await?;
        assert_eq!(
            outcome,
            BroadcastOutcome::Delivered(BroadcastReport { sent: 2, failed: 1 })
        );
        assert_eq!(session.conversation, Conversation::Idle);
        assert!(shop.notifier.messages_for(TEST_ADMIN_ID).is_empty());
        assert_eq!(shop.notifier.messages_for(3), vec!["Sale today!".to_string()]);

        Ok(())
    }

    #[tokio::test]
    async fn test_pending_payments_and_stats_require_admin() -> Result<()> {
        let shop = setup_test_shop().await?;
        create_test_user(&shop.db, 42, 0.0).await?;
        payment::create(&shop.db, customer(42), 5.0, "TX", "Cash").await?;

        assert!(matches!(
            pending_payments(&shop, OUTSIDER).await,
            Err(Error::PermissionDenied)
        ));
        assert_eq!(pending_payments(&shop, TEST_ADMIN_ID).await?.len(), 1);

        let now = Utc::now().fixed_offset();
        assert!(matches!(
            stats(&shop, OUTSIDER, now).await,
            Err(Error::PermissionDenied)
        ));
        let counts = stats(&shop, TEST_ADMIN_ID, now).await?;
        assert_eq!(counts.total_users, 1);
        assert_eq!(counts.active_24h, 1);

        Ok(())
    }
}
