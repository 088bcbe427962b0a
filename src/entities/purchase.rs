//! Purchase entity - A completed, wallet-debited order awaiting manual shipment.
//!
//! `product_name` and `price` are snapshots taken at purchase time; later catalog
//! changes never alter them. The fulfillment identifier keeps the historical
//! `game_id` column name.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fulfillment status of a purchase
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
pub enum PurchaseStatus {
    /// Paid, waiting for the operator to deliver
    #[sea_orm(string_value = "pending_shipment")]
    PendingShipment,
    /// Delivered
    #[sea_orm(string_value = "shipped")]
    Shipped,
}

impl PurchaseStatus {
    /// Stored string form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingShipment => "pending_shipment",
            Self::Shipped => "shipped",
        }
    }
}

/// Purchase database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases_history")]
pub struct Model {
    /// Generated UUID
    #[sea_orm(primary_key, auto_increment = false)]
    pub purchase_id: String,
    /// Buyer
    pub user_id: i64,
    /// Username snapshot taken at purchase time
    pub username: String,
    /// Product display name at purchase time
    pub product_name: String,
    /// Buyer-supplied digits-only identifier (e.g. a game account id)
    #[sea_orm(column_name = "game_id")]
    pub fulfillment_id: String,
    /// Price charged
    pub price: f64,
    /// Fulfillment status
    pub status: PurchaseStatus,
    /// When the purchase was made
    pub timestamp: DateTimeUtc,
    /// When the operator confirmed shipment
    pub shipped_at: Option<DateTimeUtc>,
}

/// Defines relationships between Purchase and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each purchase belongs to one user
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
