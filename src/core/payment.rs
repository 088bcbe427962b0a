//! Pending-payment journal - deposit requests awaiting manual reconciliation.
//!
//! Entries are append-only: after insertion only the status changes, and nothing is ever
//! deleted. The journal is evidence for the administrator; `confirm_deposit` credits wallets
//! independently of it, while `confirm_payment` credits a specific entry and flips its status.

use crate::{
    core::{Customer, UserId},
    entities::{PaymentStatus, PendingPayment, pending_payment},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use tracing::info;
use uuid::Uuid;

/// Records a new `pending` deposit request and returns it with its generated id.
///
/// # Errors
/// Returns `Error::InvalidAmount` for non-positive or non-finite amounts, or a database error.
pub async fn create<C>(
    db: &C,
    customer: Customer<'_>,
    amount: f64,
    transaction_ref: &str,
    method: &str,
) -> Result<pending_payment::Model>
where
    C: ConnectionTrait,
{
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    let payment = pending_payment::ActiveModel {
        payment_id: Set(Uuid::new_v4().to_string()),
        user_id: Set(customer.user_id),
        username: Set(customer.username.to_string()),
        amount: Set(amount),
        transaction_id: Set(transaction_ref.to_string()),
        payment_method: Set(method.to_string()),
        status: Set(PaymentStatus::Pending),
        timestamp: Set(Utc::now()),
    };

    let result = payment.insert(db).await?;
    info!(
        "Pending payment {} added for user {} via {}",
        result.payment_id, result.user_id, result.payment_method
    );
    Ok(result)
}

/// Fetches a deposit request by id.
pub async fn get<C>(db: &C, payment_id: &str) -> Result<Option<pending_payment::Model>>
where
    C: ConnectionTrait,
{
    PendingPayment::find_by_id(payment_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Sets a request's status with one conditional update and returns it, together with
/// whether this call changed it. Setting the status it already has writes nothing.
///
/// Of several concurrent callers setting the same status exactly one sees `true`.
///
/// # Errors
/// Returns `Error::PaymentNotFound` if no request has this id.
pub async fn set_status<C>(
    db: &C,
    payment_id: &str,
    status: PaymentStatus,
) -> Result<(pending_payment::Model, bool)>
where
    C: ConnectionTrait,
{
    let changed = PendingPayment::update_many()
        .col_expr(pending_payment::Column::Status, Expr::value(status.as_str()))
        .filter(pending_payment::Column::PaymentId.eq(payment_id))
        .filter(pending_payment::Column::Status.ne(status))
        .exec(db)
        .await?
        .rows_affected
        > 0;

    let payment = get(db, payment_id)
        .await?
        .ok_or_else(|| Error::PaymentNotFound {
            id: payment_id.to_string(),
        })?;

    if changed {
        info!(
            "Pending payment {payment_id} status updated to {}",
            status.as_str()
        );
    }
    Ok((payment, changed))
}

/// Lists requests that still await review, oldest first.
pub async fn list_pending<C>(db: &C) -> Result<Vec<pending_payment::Model>>
where
    C: ConnectionTrait,
{
    PendingPayment::find()
        .filter(pending_payment::Column::Status.eq(PaymentStatus::Pending))
        .order_by_asc(pending_payment::Column::Timestamp)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists a user's requests, most recent first.
pub async fn get_for_user<C>(db: &C, user_id: UserId) -> Result<Vec<pending_payment::Model>>
where
    C: ConnectionTrait,
{
    PendingPayment::find()
        .filter(pending_payment::Column::UserId.eq(user_id))
        .order_by_desc(pending_payment::Column::Timestamp)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_create_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = create(&db, customer(1), amount, "TX", "Cash").await;
            assert!(matches!(result, Err(Error::InvalidAmount { amount: _ })));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_get() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, 42, 0.0).await?;

        let payment = create(&db, customer(42), 5.0, "TX123", "Cash Transfer").await?;
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount, 5.0);
        assert_eq!(payment.transaction_id, "TX123");
        assert_eq!(payment.username, TEST_USERNAME);

        let found = get(&db, &payment.payment_id).await?.unwrap();
        assert_eq!(found, payment);
        assert!(get(&db, "missing").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_ids_are_unique() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, 1, 0.0).await?;

        let mut ids = HashSet::new();
        for i in 0..50 {
            let payment = create(&db, customer(1), 1.0, &format!("TX{i}"), "Cash").await?;
            ids.insert(payment.payment_id);
        }
        assert_eq!(ids.len(), 50);

        Ok(())
    }

    #[tokio::test]
    async fn test_set_status_changes_once() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, 1, 0.0).await?;
        let payment = create(&db, customer(1), 3.0, "TX", "Cash").await?;

        let (first, changed) = set_status(&db, &payment.payment_id, PaymentStatus::Confirmed).await?;
        assert!(changed);
        assert_eq!(first.status, PaymentStatus::Confirmed);
        assert_eq!(first.timestamp, payment.timestamp);

        let (second, changed) = set_status(&db, &payment.payment_id, PaymentStatus::Confirmed).await?;
        assert!(!changed);
        assert_eq!(first, second);

        let missing = set_status(&db, "missing", PaymentStatus::Confirmed).await;
        assert!(matches!(missing, Err(Error::PaymentNotFound { id: _ })));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_pending_excludes_confirmed() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, 1, 0.0).await?;
        create_test_user(&db, 2, 0.0).await?;

        let first = create(&db, customer(1), 1.0, "A", "Cash").await?;
        let second = create(&db, customer(2), 2.0, "B", "Cash").await?;
        let third = create(&db, customer(1), 3.0, "C", "Cash").await?;
        set_status(&db, &second.payment_id, PaymentStatus::Confirmed).await?;

        let pending: Vec<_> = list_pending(&db)
            .await?
            .into_iter()
            .map(|p| p.payment_id)
            .collect();
        assert_eq!(pending, vec![first.payment_id.clone(), third.payment_id.clone()]);

        let mine: Vec<_> = get_for_user(&db, 1)
            .await?
            .into_iter()
            .map(|p| p.payment_id)
            .collect();
        assert_eq!(mine, vec![third.payment_id, first.payment_id]);

        Ok(())
    }
}
