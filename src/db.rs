use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Instant;
use tracing::{debug, info, Instrument};

use crate::catalog::{Catalog, CatalogSource};
use crate::errors::{AppError, AppResult};
use crate::observability;

/// Represents a catalog item in the database
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Initialize the catalog schema
pub async fn init_catalog_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing catalog schema");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS catalog_items (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create catalog_items table")?;

    // Names are unique regardless of case
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS catalog_items_lower_name_idx ON catalog_items (LOWER(name))",
    )
    .execute(pool)
    .await
    .context("Failed to create catalog name index")?;

    info!("Catalog schema initialized successfully");
    Ok(())
}

/// Insert a catalog item, returning its ID, or `None` when the name already exists
pub async fn insert_catalog_item(pool: &PgPool, name: &str) -> Result<Option<i64>> {
    debug!(name = %name, "Inserting catalog item");

    let row = sqlx::query(
        "INSERT INTO catalog_items (name) VALUES ($1) ON CONFLICT DO NOTHING RETURNING id",
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to insert catalog item")?;

    let id = row.map(|row| row.get::<i64, _>(0));
    match id {
        Some(id) => debug!(item_id = %id, "Catalog item created successfully"),
        None => info!("Catalog item already exists: {name}"),
    }
    Ok(id)
}

/// Delete a catalog item by ID
pub async fn delete_catalog_item(pool: &PgPool, item_id: i64) -> Result<bool> {
    debug!(item_id = %item_id, "Deleting catalog item");

    let result = sqlx::query("DELETE FROM catalog_items WHERE id = $1")
        .bind(item_id)
        .execute(pool)
        .await
        .context("Failed to delete catalog item")?;

    if result.rows_affected() > 0 {
        debug!(item_id = %item_id, "Catalog item deleted successfully");
        Ok(true)
    } else {
        info!("No catalog item found with ID: {item_id}");
        Ok(false)
    }
}

/// List all catalog items in insertion order
pub async fn list_catalog_items(pool: &PgPool) -> Result<Vec<CatalogItem>> {
    let rows = sqlx::query("SELECT id, name, created_at FROM catalog_items ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list catalog items")?;

    let items: Vec<CatalogItem> = rows
        .into_iter()
        .map(|row| CatalogItem {
            id: row.get(0),
            name: row.get(1),
            created_at: row.get(2),
        })
        .collect();

    debug!("Found {} catalog items", items.len());
    Ok(items)
}

/// Fetch catalog names in insertion order
pub async fn fetch_catalog_names(pool: &PgPool) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT name FROM catalog_items ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to fetch catalog names")?;

    Ok(rows.into_iter().map(|row| row.get(0)).collect())
}

/// Catalog backed by the `catalog_items` table
#[derive(Debug, Clone)]
pub struct PgCatalogSource {
    pool: PgPool,
}

impl PgCatalogSource {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool
    pub async fn connect(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(max_connections, "Connected catalog database pool");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogSource for PgCatalogSource {
    async fn fetch_catalog(&self) -> AppResult<Catalog> {
        let start = Instant::now();
        let names = fetch_catalog_names(&self.pool)
            .instrument(observability::db_span("fetch_catalog", "catalog_items"))
            .await
            .map_err(|e| AppError::Catalog(format!("{:#}", e)))?;
        observability::record_db_metrics("fetch_catalog", start.elapsed());

        Ok(Catalog::new(names))
    }

    fn describe(&self) -> String {
        "postgres(catalog_items)".to_string()
    }
}
