//! Shop configuration loading from config.toml
//!
//! The TOML file describes the storefront (name, greeting), the out-of-band payment
//! methods users can deposit with, and the static catalog tree. The catalog is turned
//! into an index by [`crate::core::catalog::Catalog::from_config`], which also validates it.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Environment variable that overrides the config file location
pub const SHOP_CONFIG_VAR: &str = "SHOP_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Storefront settings
    pub shop: ShopConfig,
    /// Accepted deposit methods, in display order
    #[serde(default)]
    pub payment_methods: Vec<PaymentMethodConfig>,
    /// Top level of the catalog tree
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

/// Storefront display settings
#[derive(Debug, Deserialize, Clone)]
pub struct ShopConfig {
    /// Shop name shown in greetings
    pub name: String,
    /// Extra greeting text shown by `/start`
    #[serde(default)]
    pub welcome: String,
    /// Shop description shown by `/about`
    #[serde(default)]
    pub about: String,
    /// Contact details (email, hours, social accounts) shown by `/about`
    #[serde(default)]
    pub contact: String,
}

/// A manual transfer method the administrator reconciles by hand
#[derive(Debug, Deserialize, Clone)]
pub struct PaymentMethodConfig {
    /// Short identifier used in commands (e.g. `syriatel_cash`)
    pub id: String,
    /// Display name, also stored as the payment method tag
    pub name: String,
    /// Where users send money (phone number, account number)
    pub destination: String,
    /// Additional instructions shown before the amount prompt
    #[serde(default)]
    pub instructions: String,
}

/// Catalog category
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    /// Globally unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Child subcategories
    #[serde(default)]
    pub subcategories: Vec<SubcategoryConfig>,
}

/// Catalog subcategory, holding either servers or products directly
#[derive(Debug, Deserialize, Clone)]
pub struct SubcategoryConfig {
    /// Globally unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Servers, each with their own products
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
    /// Products sold without a server level
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// Catalog server node; may restrict purchases to an hour-of-day window
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Globally unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional purchase window in the operator's local clock
    pub availability: Option<AvailabilityConfig>,
    /// Products sold on this server
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// Hour-of-day window, `[start_hour, end_hour)`
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct AvailabilityConfig {
    /// Inclusive start hour
    pub start_hour: u32,
    /// Exclusive end hour
    pub end_hour: u32,
}

/// Purchasable catalog leaf
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Globally unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Fixed price in dollars
    pub price: f64,
}

impl Config {
    /// Looks up a payment method by id, or the first configured one when `id` is `None`.
    #[must_use]
    pub fn payment_method(&self, id: Option<&str>) -> Option<&PaymentMethodConfig> {
        match id {
            Some(id) => self.payment_methods.iter().find(|m| m.id == id),
            None => self.payment_methods.first(),
        }
    }
}

/// Parses configuration from a TOML string.
///
/// # Errors
/// Returns `Error::Config` if the TOML is invalid, required fields are missing, or no
/// payment method is configured.
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.payment_methods.is_empty() {
        return Err(Error::Config {
            message: "At least one [[payment_methods]] entry is required".to_string(),
        });
    }

    Ok(config)
}

/// Loads shop configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or [`parse_config`] rejects it.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    debug!("Loading shop configuration from {}", path_ref.display());
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Loads shop configuration from `SHOP_CONFIG`, or `./config.toml` when unset.
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var(SHOP_CONFIG_VAR).unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    const SAMPLE: &str = r#"
        [shop]
        name = "Test Shop"

        [[payment_methods]]
        id = "cash"
        name = "Cash Transfer"
        destination = "0000"

        [[payment_methods]]
        id = "card"
        name = "Card"
        destination = "1111"

        [[categories]]
        id = "games"
        name = "Games"

            [[categories.subcategories]]
            id = "ff"
            name = "Free Fire"

                [[categories.subcategories.servers]]
                id = "ffs1"
                name = "Server 1"
                availability = { start_hour = 19, end_hour = 20 }

                    [[categories.subcategories.servers.products]]
                    id = "ffs1_100"
                    name = "100 Gems"
                    price = 0.9

            [[categories.subcategories]]
            id = "pubg"
            name = "PUBG"

                [[categories.subcategories.products]]
                id = "pubg_60"
                name = "60 UC"
                price = 0.95
    "#;

    #[test]
    fn test_parse_shop_config() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.shop.name, "Test Shop");
        assert!(config.shop.welcome.is_empty());
        assert!(config.shop.about.is_empty());
        assert!(config.shop.contact.is_empty());
        assert_eq!(config.payment_methods.len(), 2);
        assert_eq!(config.categories.len(), 1);

        let games = &config.categories[0];
        assert_eq!(games.subcategories.len(), 2);

        let server = &games.subcategories[0].servers[0];
        let window = server.availability.unwrap();
        assert_eq!((window.start_hour, window.end_hour), (19, 20));
        assert_eq!(server.products[0].price, 0.9);

        assert!(games.subcategories[1].servers.is_empty());
        assert_eq!(games.subcategories[1].products[0].id, "pubg_60");
    }

    #[test]
    fn test_payment_method_lookup() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.payment_method(None).unwrap().id, "cash");
        assert_eq!(config.payment_method(Some("card")).unwrap().name, "Card");
        assert!(config.payment_method(Some("crypto")).is_none());
    }

    #[test]
    fn test_missing_payment_methods_rejected() {
        let result = parse_config("[shop]\nname = \"x\"\n");
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(matches!(
            parse_config("this is = = not toml"),
            Err(Error::Config { message: _ })
        ));
    }
}
