use comanda::{
    api::{self, ApiState},
    bot::{self, BotData},
    config::{Settings, database, seed},
    core::events::EventBus,
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
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

    // 3. Runtime settings
    let settings = Settings::from_env()
        .inspect_err(|e| error!("Invalid configuration: {e}"))?;

    // 4. Database
    let db = database::init_db(&settings.database_url)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;
    let db = Arc::new(db);

    // 5. Seed menu, tables and staff from the config file
    let seed_config = seed::load_config_or_default(&settings.config_path)?;
    seed::seed_database(&db, &seed_config)
        .await
        .inspect(|summary| info!(?summary, "Seed data applied."))
        .inspect_err(|e| error!("Failed to seed database: {e}"))?;

    let events = EventBus::new();

    // 6. Customer API
    let api_state = ApiState::new(Arc::clone(&db), events.clone());
    let api_addr = settings.api_bind_addr;
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_addr, api_state).await {
            error!("Customer API stopped: {e}");
        }
    });

    // 7. Run the bot
    // DISCORD_BOT_TOKEN is read directly before use, never stored in Settings
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    let data = BotData::new(db, events, seed_config.restaurant.name);
    bot::run(token, data, settings.kitchen_channel_id).await
}
