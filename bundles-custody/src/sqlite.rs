#![cfg(feature = "sqlite")]

use crate::storage_traits::{CustodyStorage, CustodyStorageIterator};
use anyhow::{anyhow, Context};
use bundles_core::error::StorageError;
use bundles_core::id::BundleId;
use bundles_core::manifest::PackedManifest;
use bundles_core::objects::BundleRecord;
use log::debug;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::{
    path::Path,
    str::FromStr,
    sync::Arc,
};
use tokio::runtime::Runtime;

/// A SQLite-based implementation of the CustodyStorage interface using sqlx.
pub struct SqliteCustodyStorage {
    pool: SqlitePool,
    rt: Arc<Runtime>,
}

/// Iterator implementation for SQLite storage
pub struct SqliteCustodyIterator {
    pool: SqlitePool,
    rt: Arc<Runtime>,
    last_id: Option<i64>,
    done: bool,
}

impl SqliteCustodyStorage {
    /// Creates a new SQLite storage instance
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db_path = path.as_ref();
        let db_url = format!("sqlite:{}", db_path.to_string_lossy());

        // Create a runtime for async operations
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create runtime")?;
        let rt = Arc::new(rt);

        let options = SqliteConnectOptions::from_str(&db_url)
            .with_context(|| format!("Invalid database URL: {}", db_url))?
            .create_if_missing(true);

        let pool = rt
            .block_on(
                SqlitePoolOptions::new()
                    .max_connections(5)
                    .connect_with(options),
            )
            .context("Failed to connect to database")?;

        rt.block_on(Self::initialize_schema(&pool))
            .context("Failed to initialize database schema")?;

        debug!("opened custody database at {}", db_path.display());

        Ok(Self { pool, rt })
    }

    /// Creates the necessary tables in the database
    async fn initialize_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        // Table for live bundles, manifests kept in packed form
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS bundles (
                id INTEGER PRIMARY KEY,
                manifest BLOB NOT NULL,
                issued_at INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        // Single-row table for the issued counter
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS supply (
                id INTEGER PRIMARY KEY CHECK (id = 0),
                issued INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    fn id_to_sql(id: BundleId) -> Result<i64, StorageError> {
        i64::try_from(id.value())
            .map_err(|_| StorageError::Other(format!("{} does not fit in an SQL integer", id)))
    }

    fn record_from_row(id: i64, manifest: &[u8]) -> Result<BundleRecord, StorageError> {
        let id = u64::try_from(id)
            .map_err(|_| StorageError::Serialization(format!("negative bundle id {}", id)))?;
        let packed = PackedManifest::from_bytes(manifest)?;
        let manifest = packed
            .decode()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(BundleRecord::new(BundleId(id), manifest))
    }
}

impl CustodyStorage for SqliteCustodyStorage {
    fn get(&self, id: BundleId) -> Result<Option<BundleRecord>, StorageError> {
        let sql_id = Self::id_to_sql(id)?;
        self.rt.block_on(async {
            let row = sqlx::query("SELECT id, manifest FROM bundles WHERE id = ?")
                .bind(sql_id)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Failed to fetch {}", id))?;

            match row {
                Some(row) => {
                    let manifest: Vec<u8> = row.get(1);
                    Ok(Some(Self::record_from_row(row.get(0), &manifest)?))
                }
                None => Ok(None),
            }
        })
    }

    fn insert(&self, record: &BundleRecord) -> Result<(), StorageError> {
        let sql_id = Self::id_to_sql(record.id)?;
        let manifest = record.packed().to_bytes()?;

        self.rt.block_on(async {
            // Use a transaction so the existence check and the insert are atomic
            let mut tx = self
                .pool
                .begin()
                .await
                .context("Failed to start database transaction")?;

            let existing = sqlx::query("SELECT 1 FROM bundles WHERE id = ?")
                .bind(sql_id)
                .fetch_optional(&mut *tx)
                .await
                .with_context(|| format!("Failed to check {}", record.id))?;
            if existing.is_some() {
                return Err(StorageError::Duplicate(record.id));
            }

            sqlx::query("INSERT INTO bundles (id, manifest, issued_at) VALUES (?, ?, ?)")
                .bind(sql_id)
                .bind(&manifest)
                .bind(chrono::Utc::now().timestamp())
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to store {}", record.id))?;

            tx.commit().await.context("Failed to commit transaction")?;

            debug!("stored {} in sqlite", record.id);
            Ok(())
        })
    }

    fn remove(&self, id: BundleId) -> Result<Option<BundleRecord>, StorageError> {
        let sql_id = Self::id_to_sql(id)?;
        self.rt.block_on(async {
            let mut tx = self
                .pool
                .begin()
                .await
                .context("Failed to start transaction for delete operation")?;

            let row = sqlx::query("SELECT id, manifest FROM bundles WHERE id = ?")
                .bind(sql_id)
                .fetch_optional(&mut *tx)
                .await
                .with_context(|| format!("Failed to fetch {}", id))?;

            let Some(row) = row else {
                return Ok(None);
            };
            let manifest: Vec<u8> = row.get(1);
            let record = Self::record_from_row(row.get(0), &manifest)?;

            sqlx::query("DELETE FROM bundles WHERE id = ?")
                .bind(sql_id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to delete {}", id))?;

            tx.commit()
                .await
                .context("Failed to commit delete transaction")?;

            Ok(Some(record))
        })
    }

    fn scan(&self) -> Box<dyn CustodyStorageIterator + '_> {
        Box::new(SqliteCustodyIterator {
            pool: self.pool.clone(),
            rt: self.rt.clone(),
            last_id: None,
            done: false,
        })
    }

    fn len(&self) -> Result<usize, StorageError> {
        self.rt.block_on(async {
            let row = sqlx::query("SELECT COUNT(*) FROM bundles")
                .fetch_one(&self.pool)
                .await
                .context("Failed to count bundles")?;
            let count: i64 = row.get(0);
            usize::try_from(count)
                .map_err(|_| StorageError::Other(format!("invalid bundle count {}", count)))
        })
    }

    fn issued_count(&self) -> Result<u64, StorageError> {
        self.rt.block_on(async {
            let row = sqlx::query("SELECT issued FROM supply WHERE id = 0")
                .fetch_optional(&self.pool)
                .await
                .context("Failed to read issued counter")?;

            match row {
                Some(row) => {
                    let issued: i64 = row.get(0);
                    u64::try_from(issued).map_err(|_| {
                        StorageError::Serialization(format!("negative issued counter {}", issued))
                    })
                }
                None => Ok(0),
            }
        })
    }

    fn set_issued_count(&self, count: u64) -> Result<(), StorageError> {
        let issued = i64::try_from(count)
            .map_err(|_| StorageError::Other(format!("issued counter {} out of range", count)))?;
        self.rt.block_on(async {
            sqlx::query("INSERT OR REPLACE INTO supply (id, issued) VALUES (0, ?)")
                .bind(issued)
                .execute(&self.pool)
                .await
                .context("Failed to store issued counter")?;
            Ok(())
        })
    }
}

impl Iterator for SqliteCustodyIterator {
    type Item = Result<BundleRecord, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let after = self.last_id.unwrap_or(-1);
        let row = self.rt.block_on(async {
            sqlx::query("SELECT id, manifest FROM bundles WHERE id > ? ORDER BY id LIMIT 1")
                .bind(after)
                .fetch_optional(&self.pool)
                .await
        });

        match row {
            Ok(Some(row)) => {
                let id: i64 = row.get(0);
                let manifest: Vec<u8> = row.get(1);
                self.last_id = Some(id);
                Some(SqliteCustodyStorage::record_from_row(id, &manifest))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(StorageError::Context(anyhow!(
                    "Failed to scan bundles: {}",
                    e
                ))))
            }
        }
    }
}

impl CustodyStorageIterator for SqliteCustodyIterator {}
