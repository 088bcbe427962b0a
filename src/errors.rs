//! Unified error types and result handling for `ShopBuddy`.

use thiserror::Error;

/// Every failure the shop can report, from storage errors to business rule rejections.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Storage-layer failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Amount is zero, negative where a positive value is required, or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Wallet balance is lower than the required price
    #[error("Insufficient funds: balance {current:.2}, required {required:.2}")]
    InsufficientFunds {
        /// Balance at the time of the check
        current: f64,
        /// Amount that would have been debited
        required: f64,
    },

    /// No product with this identifier exists in the catalog
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// The identifier that was looked up
        id: String,
    },

    /// No purchase record with this identifier exists
    #[error("Purchase not found: {id}")]
    PurchaseNotFound {
        /// The identifier that was looked up
        id: String,
    },

    /// No pending payment with this identifier exists
    #[error("Payment not found: {id}")]
    PaymentNotFound {
        /// The identifier that was looked up
        id: String,
    },

    /// No payment method with this identifier is configured
    #[error("Unknown payment method: {id}")]
    UnknownPaymentMethod {
        /// The identifier that was requested
        id: String,
    },

    /// The product's server is outside its availability window
    #[error("{product} is only available between {start_hour}:00 and {end_hour}:00")]
    Unavailable {
        /// Display name of the product
        product: String,
        /// Inclusive start hour
        start_hour: u32,
        /// Exclusive end hour
        end_hour: u32,
    },

    /// Fulfillment identifier contained something other than digits
    #[error("Fulfillment identifier must contain digits only")]
    InvalidFulfillmentId,

    /// Caller is not the configured administrator
    #[error("You don't have permission to use this command")]
    PermissionDenied,

    /// A message to a user could not be delivered
    #[error("Notification failed: {message}")]
    Notification {
        /// Transport-reported reason
        message: String,
    },

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reply text could not be rendered
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework failure
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
