use anyhow::{Context, Result};
use sqlx::{Row, Sqlite, SqlitePool, Transaction as SqlTransaction};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::database::{Database, Object, Store};
use crate::models::{Name, RecordId, RecordType, Transaction, TransactionItem, User};

/// SQLite snapshot of the object store
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(database_path: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Path::new(database_path).exists() {
            std::fs::File::create(database_path)
                .with_context(|| format!("Cannot create database file {}", database_path))?;
        }

        let database_url = format!("sqlite://{}", database_path);
        let pool = SqlitePool::connect(&database_url)
            .await
            .with_context(|| format!("Cannot open database {}", database_path))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                record_type TEXT NOT NULL,
                body TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_record_type ON records(record_type);
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Storage { pool })
    }

    /// Read every stored record into a fresh database
    pub async fn load(&self) -> Result<Database> {
        let rows = sqlx::query("SELECT id, record_type, body FROM records")
            .fetch_all(&self.pool)
            .await?;

        let mut store = Store::default();
        for row in rows {
            let id: String = row.get("id");
            let record_type: String = row.get("record_type");
            let body: String = row.get("body");

            match RecordType::parse(&record_type) {
                Some(RecordType::Name) => insert_record::<Name>(&mut store, &body)?,
                Some(RecordType::User) => insert_record::<User>(&mut store, &body)?,
                Some(RecordType::Transaction) => insert_record::<Transaction>(&mut store, &body)?,
                Some(RecordType::TransactionItem) => {
                    insert_record::<TransactionItem>(&mut store, &body)?
                }
                None => warn!("Skipping record {} of unknown type '{}'", id, record_type),
            }
        }

        info!(
            "Loaded {} names, {} transactions, {} items",
            store.names.len(),
            store.transactions.len(),
            store.transaction_items.len()
        );
        Ok(Database::from_store(store))
    }

    /// Replace the stored snapshot with the current contents of `database`
    pub async fn save(&self, database: &Database) -> Result<()> {
        let store = database.snapshot();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM records").execute(&mut *tx).await?;
        let mut count = 0;
        count += write_collection(&mut tx, &store.names).await?;
        count += write_collection(&mut tx, &store.users).await?;
        count += write_collection(&mut tx, &store.transactions).await?;
        count += write_collection(&mut tx, &store.transaction_items).await?;

        tx.commit().await?;
        debug!("Saved {} records at generation {}", count, database.generation());
        Ok(())
    }
}

fn insert_record<T: Object>(store: &mut Store, body: &str) -> Result<()> {
    let record: T = serde_json::from_str(body)
        .with_context(|| format!("Malformed {} record", T::RECORD_TYPE.as_str()))?;
    T::collection_mut(store).insert(record.id().clone(), record);
    Ok(())
}

async fn write_collection<T: Object>(
    tx: &mut SqlTransaction<'_, Sqlite>,
    records: &BTreeMap<RecordId, T>,
) -> Result<usize> {
    for (id, record) in records {
        let body = serde_json::to_string(record)?;
        sqlx::query("INSERT OR REPLACE INTO records (id, record_type, body) VALUES (?, ?, ?)")
            .bind(id.as_str())
            .bind(T::RECORD_TYPE.as_str())
            .bind(&body)
            .execute(&mut **tx)
            .await?;
    }
    Ok(records.len())
}
