//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Administrator commands
pub mod admin;

/// General utility commands
pub mod general;

/// Catalog browsing, purchase and cart commands
pub mod shop;

/// Wallet, deposit and order history commands
pub mod wallet;

// Export commands
pub use admin::*;
pub use general::*;
pub use shop::*;
pub use wallet::*;

use crate::{bot::BotData, errors::Error};

/// Every command registered with the framework.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        start(),
        help(),
        about(),
        ping(),
        categories(),
        browse(),
        buy(),
        cart_add(),
        cart(),
        cart_buy(),
        cart_clear(),
        wallet(),
        deposit(),
        orders(),
        cancel(),
        confirm_deposit(),
        confirm_payment(),
        confirm_shipped(),
        pending_payments(),
        stats(),
        broadcast(),
    ]
}
