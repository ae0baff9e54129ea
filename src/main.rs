use dotenvy::dotenv;
use tcg_marketplace::{
    api::{self, AppState},
    config::{database, seed, settings::AppConfig},
    core::user,
    errors::Result,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env file (non-fatal, env vars can be set externally)
    let dotenv_loaded = dotenv().is_ok();

    // 2. Initialize tracing, honouring RUST_LOG from .env
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    info!(dotenv_loaded, "Attempted to load .env file.");

    // 3. Load the application configuration
    let config = AppConfig::from_env()
        .inspect_err(|e| error!("Critical error loading application configuration: {e}"))?;
    info!(environment = %config.environment, "Configuration loaded.");

    // 4. Initialize database
    let db = database::create_connection(&config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Seed development accounts
    if !config.environment.is_production() {
        match seed::load_seed_config(&config.seed_file) {
            Ok(seeds) => {
                user::seed_users(&db, &seeds.users)
                    .await
                    .inspect_err(|e| error!("Failed to seed users: {e}"))?;
            }
            Err(e) => warn!("Skipping user seeding: {e}"),
        }
    }

    // 6. Serve until shutdown
    api::serve(AppState::new(db, config)).await
}
