/// Administrator identity from the environment
pub mod admin;

/// Database configuration and connection management
pub mod database;

/// Shop, payment method and catalog loading from config.toml
pub mod shop;
