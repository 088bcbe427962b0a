use shop_buddy::{
    bot,
    config::{admin, database, shop},
    core::catalog::Catalog,
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Shop settings and catalog
    let config = shop::load_default_config()
        .inspect_err(|e| error!("Failed to load shop configuration: {e}"))?;
    let catalog = Catalog::from_config(&config.categories)
        .inspect_err(|e| error!("Invalid catalog: {e}"))?;
    info!(
        "Loaded {} with {} catalog entries and {} payment method(s)",
        config.shop.name,
        catalog.len(),
        config.payment_methods.len()
    );

    // 4. Database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;

    // 5. Administrator identity
    let admin_id = admin::get_admin_user_id()
        .inspect_err(|e| error!("Administrator not configured: {e}"))?;

    // 6. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, db, catalog, config, admin_id).await
}
