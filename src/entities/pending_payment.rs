//! Pending payment entity - A user's unverified claim to have transferred funds.
//!
//! Rows are evidence for the administrator, not the source of truth for the balance.
//! Only the status column changes after insertion.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review status of a deposit request
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentStatus {
    /// Waiting for the administrator
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Reconciled and credited
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
}

impl PaymentStatus {
    /// Stored string form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
        }
    }
}

/// Pending payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pending_payments")]
pub struct Model {
    /// Generated UUID
    #[sea_orm(primary_key, auto_increment = false)]
    pub payment_id: String,
    /// Owner of the deposit request
    pub user_id: i64,
    /// Username snapshot taken when the request was made
    pub username: String,
    /// Amount the user claims to have transferred
    pub amount: f64,
    /// Free-text transfer reference supplied by the user
    pub transaction_id: String,
    /// Payment method tag (e.g. `"Syriatel Cash"`)
    pub payment_method: String,
    /// Review status
    pub status: PaymentStatus,
    /// When the request was made
    pub timestamp: DateTimeUtc,
}

/// Defines relationships between `PendingPayment` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::UserId"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
