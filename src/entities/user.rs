//! User entity - One wallet per chat user.
//!
//! The row is created on first contact (or first wallet mutation) with a zero balance
//! and is never deleted. `last_activity` is stamped on every interaction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User wallet database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Chat platform user ID
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    /// Last known username, if the platform supplied one
    pub username: Option<String>,
    /// Current wallet balance in dollars
    pub balance: f64,
    /// When the user was first seen
    pub created_at: DateTimeUtc,
    /// When the user last interacted with the bot or had their balance changed
    pub last_activity: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many pending payments
    #[sea_orm(has_many = "super::pending_payment::Entity")]
    PendingPayments,
    /// One user has many purchases
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchases,
}

impl Related<super::pending_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PendingPayments.def()
    }
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
