//! Core business logic - framework-agnostic wallet, journal, catalog and dialogue operations.
//!
//! Nothing in here knows about Discord. Stores take a `SeaORM` connection, dialogue steps
//! take a [`Shop`] plus the caller's [`session::Session`], and outbound messages go through
//! the [`notify::Notifier`] seam so the transport can be swapped or mocked.

use crate::config::shop::Config;
use sea_orm::DatabaseConnection;

/// Administrator-only commands: deposit/shipment confirmation, broadcast, stats
pub mod admin;
/// Read-only catalog index with availability windows
pub mod catalog;
/// Purchase dialogue and cart operations
pub mod checkout;
/// Deposit dialogue
pub mod deposit;
/// Outbound notification seam
pub mod notify;
/// Pending-payment journal
pub mod payment;
/// Purchase journal
pub mod purchase;
/// User statistics for the administrator
pub mod report;
/// Per-user session scratch data, conversation state and cart
pub mod session;
/// Wallet ledger
pub mod wallet;

/// Chat platform user identifier
pub type UserId = i64;

/// The user an operation is performed for, with the username snapshot stored on journal rows.
#[derive(Debug, Clone, Copy)]
pub struct Customer<'a> {
    /// Chat platform user ID
    pub user_id: UserId,
    /// Username or display name at the time of the request
    pub username: &'a str,
}

/// Everything a dialogue step or admin command needs besides the caller's session.
pub struct Shop<N> {
    /// Database holding wallets and journals
    pub db: DatabaseConnection,
    /// Immutable catalog index
    pub catalog: catalog::Catalog,
    /// Storefront and payment method settings
    pub config: Config,
    /// The only user allowed to run privileged commands
    pub admin_id: UserId,
    /// Delivers messages to arbitrary users
    pub notifier: N,
}
