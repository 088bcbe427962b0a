//! Shared test utilities for `ShopBuddy`.
//!
//! Provides an in-memory database, a small catalog, a shop wired to a recording
//! notifier, and helpers for creating users with a starting balance.

use crate::{
    config::shop::{Config, parse_config},
    core::{
        Customer, Shop, UserId,
        catalog::Catalog,
        notify::Notifier,
        wallet,
    },
    errors::{Error, Result},
};
use sea_orm::{ConnectOptions, DatabaseConnection};
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};
use tempfile::TempDir;

/// Administrator ID used by [`setup_test_shop`]
pub const TEST_ADMIN_ID: UserId = 1000;

/// Username stored on journal rows created through [`customer`]
pub const TEST_USERNAME: &str = "test_user";

/// Small catalog covering every tree shape: a windowed server, an unrestricted server,
/// products directly under a subcategory, and a second category.
pub const TEST_CONFIG: &str = r#"
[shop]
name = "Test Shop"
welcome = "Welcome!"
about = "Digital top-ups, delivered by hand."
contact = "Email: support@example.com\nHours: 10:00-22:00"

[[payment_methods]]
id = "cash"
name = "Cash Transfer"
destination = "0000"
instructions = "Send the amount, then report it here."

[[payment_methods]]
id = "card"
name = "Card"
destination = "1111"

[[categories]]
id = "games"
name = "Games"

    [[categories.subcategories]]
    id = "freefire"
    name = "Free Fire"

        [[categories.subcategories.servers]]
        id = "ffs1"
        name = "Free Fire Server 1"
        availability = { start_hour = 19, end_hour = 20 }

            [[categories.subcategories.servers.products]]
            id = "ffs1_100"
            name = "100 Gems"
            price = 0.9

            [[categories.subcategories.servers.products]]
            id = "ffs1_520"
            name = "520 Gems"
            price = 4.5

        [[categories.subcategories.servers]]
        id = "ffs2"
        name = "Free Fire Server 2"

            [[categories.subcategories.servers.products]]
            id = "ffs2_100"
            name = "100 Gems (Server 2)"
            price = 0.9

            [[categories.subcategories.servers.products]]
            id = "ffs2_520"
            name = "520 Gems (Server 2)"
            price = 4.5

    [[categories.subcategories]]
    id = "pubg"
    name = "PUBG"

        [[categories.subcategories.products]]
        id = "pubg_60"
        name = "60 UC"
        price = 0.95

[[categories]]
id = "social"
name = "Social Media"

    [[categories.subcategories]]
    id = "instagram"
    name = "Instagram"

        [[categories.subcategories.products]]
        id = "ig_followers_1k"
        name = "1000 Followers"
        price = 2.0
"#;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A pooled `SQLite` database in a temporary directory that is deleted on drop.
///
/// In-memory databases are limited to one connection, so tests that exercise concurrent
/// writers use this instead.
pub struct FileDb {
    /// Pool over the database file
    pub db: DatabaseConnection,
    _dir: TempDir,
}

impl FileDb {
    /// Another handle on the same pool. `DatabaseConnection` is not `Clone` while
    /// sea-orm's `mock` feature is on, so this rewraps the shared sqlx pool instead.
    pub fn handle(&self) -> DatabaseConnection {
        sea_orm::SqlxSqliteConnector::from_sqlx_sqlite_pool(
            self.db.get_sqlite_connection_pool().clone(),
        )
    }
}

/// Creates a file-backed database with several pooled connections and all tables.
pub async fn setup_file_db() -> Result<FileDb> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shop_buddy.sqlite");
    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    options.max_connections(8).sqlx_logging(false);

    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(FileDb { db, _dir: dir })
}

/// A shop like [`setup_test_shop`] over a [`FileDb`]. Keep the `FileDb` alive while the
/// shop is in use.
pub async fn setup_file_shop() -> Result<(Shop<RecordingNotifier>, FileDb)> {
    let file_db = setup_file_db().await?;
    let config = test_config();
    let shop = Shop {
        db: file_db.handle(),
        catalog: Catalog::from_config(&config.categories)?,
        config,
        admin_id: TEST_ADMIN_ID,
        notifier: RecordingNotifier::default(),
    };
    Ok((shop, file_db))
}

/// Parsed [`TEST_CONFIG`]
#[allow(clippy::unwrap_used)]
pub fn test_config() -> Config {
    parse_config(TEST_CONFIG).unwrap()
}

/// Catalog index built from [`TEST_CONFIG`]
#[allow(clippy::unwrap_used)]
pub fn test_catalog() -> Catalog {
    Catalog::from_config(&test_config().categories).unwrap()
}

/// A customer with the shared [`TEST_USERNAME`]
pub const fn customer(user_id: UserId) -> Customer<'static> {
    Customer {
        user_id,
        username: TEST_USERNAME,
    }
}

/// Creates a wallet for `user_id` holding `balance`.
pub async fn create_test_user(db: &DatabaseConnection, user_id: UserId, balance: f64) -> Result<()> {
    wallet::record_activity(db, user_id, Some(TEST_USERNAME)).await?;
    if balance != 0.0 {
        wallet::adjust_balance(db, user_id, balance, None).await?;
    }
    Ok(())
}

/// Notifier that records every delivered message and fails for blocked users.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<HashMap<UserId, Vec<String>>>,
    blocked: Mutex<HashSet<UserId>>,
}

#[allow(clippy::unwrap_used)]
impl RecordingNotifier {
    /// Makes every later delivery to `user_id` fail.
    pub fn block(&self, user_id: UserId) {
        self.blocked.lock().unwrap().insert(user_id);
    }

    /// Messages delivered to `user_id`, oldest first.
    pub fn messages_for(&self, user_id: UserId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of delivered messages.
    pub fn total_sent(&self) -> usize {
        self.sent.lock().unwrap().values().map(Vec::len).sum()
    }
}

#[allow(clippy::unwrap_used)]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user_id: UserId, text: &str) -> Result<()> {
        if self.blocked.lock().unwrap().contains(&user_id) {
            return Err(Error::Notification {
                message: format!("user {user_id} blocked the bot"),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .push(text.to_string());
        Ok(())
    }
}

/// A shop over a fresh in-memory database with [`TEST_ADMIN_ID`] as administrator.
pub async fn setup_test_shop() -> Result<Shop<RecordingNotifier>> {
    let config = test_config();
    Ok(Shop {
        db: setup_test_db().await?,
        catalog: Catalog::from_config(&config.categories)?,
        config,
        admin_id: TEST_ADMIN_ID,
        notifier: RecordingNotifier::default(),
    })
}
