use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::distr::Alphanumeric;
use rand::Rng;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

use bookstore_api::database::models::NewBook;
use bookstore_api::database::repository::BookStore;
use bookstore_api::database::{DatabaseManager, PgStore};

/// A migrated schema of its own on the database named by `DATABASE_URL`.
/// Every pooled connection has its search_path pinned to that schema, so
/// tests never see each other's rows.
pub struct TestDb {
    pub store: Arc<PgStore>,
    admin: PgPool,
    schema: String,
}

impl TestDb {
    /// `None` when `DATABASE_URL` is not set; callers skip in that case
    pub async fn connect() -> Result<Option<Self>> {
        dotenvy::dotenv().ok();
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping Postgres test");
            return Ok(None);
        };

        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(|c| (c as char).to_ascii_lowercase())
            .collect();
        let schema = format!("bookstore_test_{}", suffix);

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .context("failed to connect to DATABASE_URL")?;
        admin.execute(format!("CREATE SCHEMA {}", schema).as_str()).await?;

        let search_path = format!("SET search_path TO {}", schema);
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(search_path.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await?;
        DatabaseManager::migrate(&pool).await?;

        let store = Arc::new(PgStore::new(pool, Duration::from_secs(5)));
        Ok(Some(Self { store, admin, schema }))
    }

    pub async fn user(&self, email: &str) -> Result<i64> {
        let id = sqlx::query_scalar(
            "INSERT INTO users (name, email, password_hash, activated) VALUES ($1, $2, 'unused', TRUE) RETURNING id",
        )
        .bind(email)
        .bind(email)
        .fetch_one(self.store.pool())
        .await?;
        Ok(id)
    }

    pub async fn book(&self, title: &str, author: &str, price: f64, stock_quantity: i32) -> Result<i64> {
        let book = self
            .store
            .insert(&NewBook { title: title.to_string(), author: author.to_string(), price, stock_quantity })
            .await?;
        Ok(book.id)
    }

    pub async fn count(&self, table: &str) -> Result<i64> {
        let n = sqlx::query_scalar(&format!("SELECT count(*) FROM {}", table))
            .fetch_one(self.store.pool())
            .await?;
        Ok(n)
    }

    pub async fn cleanup(self) -> Result<()> {
        self.store.pool().close().await;
        self.admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await?;
        Ok(())
    }
}
