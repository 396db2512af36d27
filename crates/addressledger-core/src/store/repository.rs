//! `SQLite` verification record repository.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use super::{DuplicateKey, RecordStore, StoreTransaction};
use crate::verification::{
    AddressInput, NormalizedAddress, RecordId, RecordUpdate, VerificationRecord,
};
use crate::{Error, Result};

/// How long a transaction waits for the write lock by default.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(60);

/// Repository for verification record storage and retrieval.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist. Transactions
    /// wait up to [`DEFAULT_BUSY_TIMEOUT`] for another writer to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        Self::open(database_path, DEFAULT_BUSY_TIMEOUT).await
    }

    /// Create a repository whose transactions wait up to `busy_timeout`
    /// for the write lock.
    ///
    /// A verification holds the write lock across its provider call, so
    /// `busy_timeout` should exceed the provider timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn open(database_path: &str, busy_timeout: Duration) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .busy_timeout(busy_timeout);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS address_verifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                address_1 TEXT NOT NULL,
                address_2 TEXT,
                address_3 TEXT,
                city TEXT,
                state TEXT,
                postal TEXT NOT NULL,
                country TEXT NOT NULL,
                block_po_boxes INTEGER NOT NULL DEFAULT 1,
                raw_response TEXT,
                result_codes TEXT,
                result_good INTEGER,
                formatted_address TEXT,
                result_address_1 TEXT,
                result_address_2 TEXT,
                result_address_3 TEXT,
                result_city TEXT,
                result_state TEXT,
                result_postal TEXT,
                result_country TEXT,
                result_latitude TEXT,
                result_longitude TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_verifications_lookup
            ON address_verifications(address_1, postal, country)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a record by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: RecordId) -> Result<Option<VerificationRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, address_1, address_2, address_3, city, state, postal, country,
                   block_po_boxes, raw_response, result_codes, result_good, formatted_address,
                   result_address_1, result_address_2, result_address_3, result_city,
                   result_state, result_postal, result_country, result_latitude,
                   result_longitude, created_at, updated_at
            FROM address_verifications
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// Get the most recent records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<VerificationRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, address_1, address_2, address_3, city, state, postal, country,
                   block_po_boxes, raw_response, result_codes, result_good, formatted_address,
                   result_address_1, result_address_2, result_address_3, result_city,
                   result_state, result_postal, result_country, result_latitude,
                   result_longitude, created_at, updated_at
            FROM address_verifications
            ORDER BY id DESC
            LIMIT ?
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }
}

impl RecordStore for SqliteRecordStore {
    type Transaction = SqliteTransaction;

    async fn begin(&self) -> Result<SqliteTransaction> {
        // Take the write lock up front; a deferred transaction that reads
        // before writing fails with SQLITE_BUSY instead of waiting.
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(SqliteTransaction { tx })
    }
}

/// An open `SQLite` transaction. Rolls back on drop unless committed.
pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTransaction for SqliteTransaction {
    async fn find_duplicate(
        &mut self,
        key: &DuplicateKey<'_>,
    ) -> Result<Option<VerificationRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, address_1, address_2, address_3, city, state, postal, country,
                   block_po_boxes, raw_response, result_codes, result_good, formatted_address,
                   result_address_1, result_address_2, result_address_3, result_city,
                   result_state, result_postal, result_country, result_latitude,
                   result_longitude, created_at, updated_at
            FROM address_verifications
            WHERE address_1 = ? AND address_2 IS ? AND postal = ? AND country = ?
              AND result_good IS NOT NULL
            ORDER BY id DESC
            LIMIT 1
            ",
        )
        .bind(key.address_1)
        .bind(key.address_2)
        .bind(key.postal)
        .bind(key.country)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn create(&mut self, input: &AddressInput) -> Result<Option<RecordId>> {
        let result = sqlx::query(
            r"
            INSERT INTO address_verifications
                (address_1, address_2, address_3, city, state, postal, country,
                 block_po_boxes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&input.address_1)
        .bind(input.address_2.as_deref())
        .bind(input.address_3.as_deref())
        .bind(input.city.as_deref())
        .bind(input.state.as_deref())
        .bind(&input.postal)
        .bind(&input.country)
        .bind(input.block_po_boxes)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() != 1 {
            return Ok(None);
        }

        let id = RecordId(result.last_insert_rowid());
        debug!(record_id = %id, "Created verification record");
        Ok(Some(id))
    }

    async fn update_results(&mut self, id: RecordId, update: &RecordUpdate) -> Result<bool> {
        let normalized = &update.normalized;
        let result = sqlx::query(
            r"
            UPDATE address_verifications SET
                raw_response = ?, result_codes = ?, result_good = ?, formatted_address = ?,
                result_address_1 = ?, result_address_2 = ?, result_address_3 = ?,
                result_city = ?, result_state = ?, result_postal = ?, result_country = ?,
                result_latitude = ?, result_longitude = ?,
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&update.raw_response)
        .bind(&update.codes)
        .bind(update.good)
        .bind(&update.formatted_address)
        .bind(&normalized.address_1)
        .bind(&normalized.address_2)
        .bind(&normalized.address_3)
        .bind(&normalized.city)
        .bind(&normalized.state)
        .bind(&normalized.postal)
        .bind(&normalized.country)
        .bind(&normalized.latitude)
        .bind(&normalized.longitude)
        .bind(Utc::now().to_rfc3339())
        .bind(id.0)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_raw_response(&mut self, id: RecordId, raw_response: &str) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE address_verifications SET raw_response = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(raw_response)
        .bind(Utc::now().to_rfc3339())
        .bind(id.0)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn row_to_record(row: &SqliteRow) -> Result<VerificationRecord> {
    let created_at = parse_timestamp(&row.get::<String, _>("created_at"))?;
    let updated_at = row
        .get::<Option<String>, _>("updated_at")
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;

    let normalized = row
        .get::<Option<String>, _>("result_address_1")
        .map(|address_1| NormalizedAddress {
            address_1,
            address_2: text(row, "result_address_2"),
            address_3: text(row, "result_address_3"),
            city: text(row, "result_city"),
            state: text(row, "result_state"),
            postal: text(row, "result_postal"),
            country: text(row, "result_country"),
            latitude: text(row, "result_latitude"),
            longitude: text(row, "result_longitude"),
        });

    Ok(VerificationRecord {
        id: RecordId(row.get::<i64, _>("id")),
        input: AddressInput {
            address_1: row.get("address_1"),
            address_2: row.get("address_2"),
            address_3: row.get("address_3"),
            city: row.get("city"),
            state: row.get("state"),
            postal: row.get("postal"),
            country: row.get("country"),
            block_po_boxes: row.get::<bool, _>("block_po_boxes"),
        },
        raw_response: row.get("raw_response"),
        codes: row.get("result_codes"),
        good: row.get::<Option<bool>, _>("result_good"),
        formatted_address: row.get("formatted_address"),
        normalized,
        created_at,
        updated_at,
    })
}

fn text(row: &SqliteRow, column: &str) -> String {
    row.get::<Option<String>, _>(column).unwrap_or_default()
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Persistence(format!("invalid timestamp '{value}': {e}")))
}
