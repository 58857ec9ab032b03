use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use bookstore_api::app::{app, AppState, Stores};
use bookstore_api::auth::SystemClock;
use bookstore_api::config::{self, AppConfig};
use bookstore_api::database::{DatabaseManager, PgStore};

#[derive(Parser, Debug)]
#[command(name = "bookstore-api", version, about = "Bookstore catalog and commerce API")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Environment preset (development|staging|production)
    #[arg(long = "env")]
    environment: Option<String>,

    /// PostgreSQL DSN
    #[arg(long = "db-dsn", env = "DATABASE_URL")]
    db_dsn: Option<String>,

    /// Apply pending migrations before serving
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and friends are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config: AppConfig = match args.environment.as_deref() {
        Some(name) => AppConfig::load(Some(name)),
        None => config::config().clone(),
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dsn) = args.db_dsn {
        config.database.url = dsn;
    }
    if args.migrate {
        config.database.run_migrations = true;
    }
    tracing::info!("Starting bookstore-api in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await.context("failed to apply migrations")?;
    }

    let store = Arc::new(PgStore::new(pool, config.database.statement_timeout()));
    let state = AppState::new(Stores::shared(store), &config, Arc::new(SystemClock));
    let router = app(state, &config.security);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("bookstore-api listening on http://{}", bind_addr);
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
