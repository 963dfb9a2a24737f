use anyhow::{Context, Result};
use clap::Parser;
use kuura_server::cli::{Cli, Command};
use kuura_server::config::Settings;
use kuura_server::state::AppState;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Arc::new(Settings::load().context("failed to load configuration")?);

    telemetry::init(settings.log_format, &settings.rust_log).context("failed to install logging")?;

    let kek = settings.load_kek().context("failed to load key-encryption key")?;
    let pool = database_layer::connect(&settings.database_url, settings.pool)
        .await
        .context("failed to connect to the database")?;

    if settings.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to apply migrations")?;
    }

    let state = AppState::new(settings, pool, &kek)
        .await
        .context("failed to initialize application state")?;

    kuura_server::cli::dispatch(cli.command.unwrap_or(Command::Serve), state).await
}
