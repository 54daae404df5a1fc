//! Database migration runner for Depot.
//!
//! Usage:
//!   migrator [up]   - Run all pending migrations
//!   migrator down   - Roll back the last migration
//!   migrator status - Show migration status
//!   migrator fresh  - Drop everything and re-run migrations
//!
//! The database URL comes from the same configuration as the server
//! (`DEPOT__DATABASE__URL` or `config/*.toml`).

use anyhow::bail;
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use depot_db::{connect_with_config, migration::Migrator};
use depot_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "depot=info,sea_orm_migration=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());

    let config = AppConfig::load()?;
    let db = connect_with_config(&config.database).await?;

    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        "down" => Migrator::down(&db, Some(1)).await?,
        "status" => Migrator::status(&db).await?,
        "fresh" => Migrator::fresh(&db).await?,
        other => bail!("Unknown command '{other}', expected up, down, status or fresh"),
    }

    info!(command = %command, "Migration command finished");
    Ok(())
}
