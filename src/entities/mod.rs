//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod pending_payment;
pub mod purchase;
pub mod user;

// Re-export specific types to avoid conflicts
pub use pending_payment::{
    Column as PendingPaymentColumn, Entity as PendingPayment, Model as PendingPaymentModel,
    PaymentStatus,
};
pub use purchase::{
    Column as PurchaseColumn, Entity as Purchase, Model as PurchaseModel, PurchaseStatus,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
