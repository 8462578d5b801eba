use std::sync::Arc;

use anyhow::{Context, Result};
use decent_fund::config::{DatabaseConfig, FundConfig, StorageBackend};
use decent_fund::models::{NewUser, ProposalFilter};
use decent_fund::seed::seed_sample_proposals;
use decent_fund::{DatabaseStore, FundServices, FundStore, MemoryStore};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = FundConfig::load().context("Failed to load configuration")?;

    let store = open_store(&config).await?;
    let services = FundServices::new(store, config.admin.usernames.clone());

    if let Some(bootstrap) = &config.admin.bootstrap {
        let admin = services
            .users
            .ensure_user(NewUser {
                username: bootstrap.username.clone(),
                password: bootstrap.password.clone(),
            })
            .await
            .context("Failed to provision bootstrap admin")?;
        info!("Admin account {} ready", admin.username);
    }

    if config.seed.sample_proposals {
        seed_sample_proposals(&services)
            .await
            .context("Failed to seed sample proposals")?;
    }

    let proposals = services
        .proposals
        .list_proposals(&ProposalFilter::default())
        .await
        .context("Failed to list proposals")?;
    let approved = proposals.iter().filter(|p| p.approved).count();
    info!(
        "Decent Fund store ready ({:?} backend): {} proposals, {} approved",
        config.storage.backend,
        proposals.len(),
        approved
    );

    Ok(())
}

fn init_tracing() {
    let default_filter = "info";
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .compact()
        .init();
}

async fn open_store(config: &FundConfig) -> Result<Arc<dyn FundStore>> {
    match (config.storage.backend, &config.database) {
        (StorageBackend::Database, Some(database_config)) => {
            let database = connect_database(database_config).await?;
            run_migrations(&database).await?;
            Ok(Arc::new(DatabaseStore::new(database)))
        }
        (StorageBackend::Database, None) => {
            anyhow::bail!("Database backend selected without a [database] section")
        }
        (StorageBackend::Memory, _) => Ok(Arc::new(MemoryStore::new())),
    }
}

async fn connect_database(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug)
        .acquire_timeout(config.acquire_timeout());

    if let Some(min) = config.min_connections {
        options.min_connections(min);
    }

    Database::connect(options)
        .await
        .context("Failed to connect to the database")
}

async fn run_migrations(database: &DatabaseConnection) -> Result<()> {
    migration::Migrator::up(database, None)
        .await
        .context("Database migrations failed")
}
