//! Wallet ledger - per-user balances with atomic signed adjustments.
//!
//! A user's row is created lazily with a zero balance the first time they interact with
//! the bot or their balance is touched. Adjustments are a single
//! `UPDATE users SET balance = balance + ?` so concurrent callers can never lose an update.
//! No floor is enforced here; callers that debit must check sufficiency first (the purchase
//! journal does so inside the same database transaction).

use crate::{
    core::UserId,
    entities::{User, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    QueryOrder, QuerySelect, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use tracing::{debug, info, warn};

/// Fetches the full wallet row for a user, if one exists.
pub async fn get_user<C>(db: &C, user_id: UserId) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Returns the user's balance, or `0.0` when they have no wallet yet.
pub async fn get_balance<C>(db: &C, user_id: UserId) -> Result<f64>
where
    C: ConnectionTrait,
{
    Ok(get_user(db, user_id).await?.map_or(0.0, |u| u.balance))
}

/// Inserts a zero-balance wallet for the user unless one already exists.
///
/// Returns `true` when a new row was created.
async fn ensure_user<C>(db: &C, user_id: UserId, username: Option<&str>) -> Result<bool>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let wallet = user::ActiveModel {
        user_id: Set(user_id),
        username: Set(username.map(str::to_string)),
        balance: Set(0.0),
        created_at: Set(now),
        last_activity: Set(now),
    };

    let inserted = User::insert(wallet)
        .on_conflict(
            OnConflict::column(user::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    if inserted > 0 {
        info!("Created wallet for user {user_id}");
    }
    Ok(inserted > 0)
}

/// Stamps the user's last activity, creating their wallet on first contact.
///
/// A provided username replaces the stored one so the row keeps the last-known name.
pub async fn record_activity<C>(db: &C, user_id: UserId, username: Option<&str>) -> Result<()>
where
    C: ConnectionTrait,
{
    if ensure_user(db, user_id, username).await? {
        return Ok(());
    }

    let mut update = User::update_many()
        .col_expr(user::Column::LastActivity, Expr::value(Utc::now()))
        .filter(user::Column::UserId.eq(user_id));
    if let Some(name) = username {
        update = update.col_expr(user::Column::Username, Expr::value(name.to_string()));
    }
    update.exec(db).await?;

    debug!("User {user_id} last activity updated");
    Ok(())
}

/// Adds `delta` to the user's balance on an existing connection or transaction and
/// returns the resulting balance.
///
/// A user without a wallet starts from zero, so a negative first delta yields a negative
/// balance.
pub(crate) async fn apply_delta<C>(
    db: &C,
    user_id: UserId,
    delta: f64,
    username: Option<&str>,
) -> Result<f64>
where
    C: ConnectionTrait,
{
    if !delta.is_finite() {
        return Err(Error::InvalidAmount { amount: delta });
    }

    if ensure_user(db, user_id, username).await? && delta < 0.0 {
        warn!("Wallet for user {user_id} created by a debit of {delta:.2}; balance starts negative");
    }

    let mut update = User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).add(delta),
        )
        .col_expr(user::Column::LastActivity, Expr::value(Utc::now()))
        .filter(user::Column::UserId.eq(user_id));
    if let Some(name) = username {
        update = update.col_expr(user::Column::Username, Expr::value(name.to_string()));
    }
    update.exec(db).await?;

    let new_balance = get_balance(db, user_id).await?;
    info!("User {user_id} wallet adjusted by {delta:.2}. New balance: {new_balance:.2}");
    Ok(new_balance)
}

/// Atomically adds a signed amount to a user's balance and returns the new balance.
///
/// The read-modify-write runs in one database transaction. Creates the wallet when the
/// user has none.
///
/// # Errors
/// Returns `Error::InvalidAmount` for NaN or infinite deltas, or a database error.
pub async fn adjust_balance(
    db: &DatabaseConnection,
    user_id: UserId,
    delta: f64,
    username: Option<&str>,
) -> Result<f64> {
    if !delta.is_finite() {
        return Err(Error::InvalidAmount { amount: delta });
    }

    let txn = db.begin().await?;
    let new_balance = apply_delta(&txn, user_id, delta, username).await?;
    txn.commit().await?;

    Ok(new_balance)
}

/// Lists every known user ID, oldest wallet first.
pub async fn get_all_user_ids<C>(db: &C) -> Result<Vec<UserId>>
where
    C: ConnectionTrait,
{
    User::find()
        .select_only()
        .column(user::Column::UserId)
        .order_by_asc(user::Column::CreatedAt)
        .into_tuple::<UserId>()
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

    #[tokio::test]
    async fn test_adjust_balance_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        for delta in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = adjust_balance(&db, 1, delta, None).await;
            assert!(matches!(result, Err(Error::InvalidAmount { amount: _ })));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_get_balance_unknown_user_is_zero() -> Result<()> {
        let db = setup_test_db().await?;

        assert_eq!(get_balance(&db, 404).await?, 0.0);
        assert!(get_user(&db, 404).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_balance_creates_wallet() -> Result<()> {
        let db = setup_test_db().await?;

        let balance = adjust_balance(&db, 42, 5.0, Some("alice")).await?;
        assert_eq!(balance, 5.0);

        let user = get_user(&db, 42).await?.unwrap();
        assert_eq!(user.balance, 5.0);
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert!(user.created_at <= user.last_activity);

        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_balance_accumulates() -> Result<()> {
        let db = setup_test_db().await?;

        adjust_balance(&db, 7, 10.0, None).await?;
        adjust_balance(&db, 7, -4.5, None).await?;
        let balance = adjust_balance(&db, 7, 2.0, None).await?;

        assert_eq!(balance, 7.5);
        assert_eq!(get_balance(&db, 7).await?, 7.5);

        Ok(())
    }

    #[tokio::test]
    async fn test_negative_first_delta_starts_negative() -> Result<()> {
        let db = setup_test_db().await?;

        let balance = adjust_balance(&db, 9, -3.0, None).await?;
        assert_eq!(balance, -3.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_adjustments_are_isolated_per_user() -> Result<()> {
        let db = setup_test_db().await?;

        adjust_balance(&db, 1, 10.0, None).await?;
        adjust_balance(&db, 2, 3.0, None).await?;
        adjust_balance(&db, 1, -1.0, None).await?;

        assert_eq!(get_balance(&db, 1).await?, 9.0);
        assert_eq!(get_balance(&db, 2).await?, 3.0);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_parallel_adjustments_same_user() -> Result<()> {
        const WRITERS: usize = 50;
        let file_db = setup_file_db().await?;

        let mut handles = Vec::new();
        for _ in 0..WRITERS {
            let db = file_db.handle();
            handles.push(tokio::spawn(async move {
                adjust_balance(&db, 42, 1.0, None).await
            }));
        }
        for handle in handles {
            handle.await.unwrap()?;
        }

        assert_eq!(get_balance(&file_db.db, 42).await?, 50.0);
        assert_eq!(get_all_user_ids(&file_db.db).await?, vec![42]);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_activity_creates_then_updates() -> Result<()> {
        let db = setup_test_db().await?;

        record_activity(&db, 5, None).await?;
        let first = get_user(&db, 5).await?.unwrap();
        assert_eq!(first.balance, 0.0);
        assert!(first.username.is_none());

        record_activity(&db, 5, Some("bob")).await?;
        let second = get_user(&db, 5).await?.unwrap();
        assert_eq!(second.username.as_deref(), Some("bob"));
        assert_eq!(second.created_at, first.created_at);
        assert!(second.last_activity >= first.last_activity);
        assert_eq!(second.balance, 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_user_ids() -> Result<()> {
        let db = setup_test_db().await?;

        record_activity(&db, 10, None).await?;
        record_activity(&db, 20, None).await?;
        adjust_balance(&db, 30, 1.0, None).await?;

        let mut ids = get_all_user_ids(&db).await?;
        ids.sort_unstable();
        assert_eq!(ids, vec![10, 20, 30]);

        Ok(())
    }
}
