//! Arbitrage History Storage
//! Mission: Persist each user's spread computations with strict owner scoping

use crate::error::{Error, Result};
use crate::models::{ArbitrageRecord, SpreadResult};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS arbitrage_history (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    coin_name TEXT NOT NULL,
    lowest_exchange TEXT NOT NULL,
    lowest_price REAL NOT NULL,
    lowest_trade_url TEXT NOT NULL,
    lowest_logo TEXT NOT NULL,
    highest_exchange TEXT NOT NULL,
    highest_price REAL NOT NULL,
    highest_trade_url TEXT NOT NULL,
    highest_logo TEXT NOT NULL,
    price_difference REAL NOT NULL,
    percentage_difference REAL NOT NULL,
    timestamp INTEGER NOT NULL
) WITHOUT ROWID;

CREATE INDEX IF NOT EXISTS idx_history_user_ts
    ON arbitrage_history(user_id, timestamp DESC);
"#;

/// SQLite-backed store for computed spreads. Every read and every mutation is
/// scoped to the owning user.
pub struct HistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl HistoryStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        info!("📊 Arbitrage history store ready at {db_path}");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Persist a computed spread for `user_id`, assigning a fresh id.
    /// Returns the stored record with its numeric timestamp.
    pub fn record(
        &self,
        user_id: &str,
        spread: SpreadResult,
        timestamp: i64,
    ) -> Result<ArbitrageRecord> {
        let record = ArbitrageRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            coin_name: spread.coin_name,
            lowest_exchange: spread.lowest_exchange,
            lowest_price: spread.lowest_price,
            lowest_trade_url: spread.lowest_trade_url,
            lowest_logo: spread.lowest_logo,
            highest_exchange: spread.highest_exchange,
            highest_price: spread.highest_price,
            highest_trade_url: spread.highest_trade_url,
            highest_logo: spread.highest_logo,
            price_difference: spread.price_difference,
            percentage_difference: spread.percentage_difference,
            timestamp,
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO arbitrage_history (
                id, user_id, coin_name,
                lowest_exchange, lowest_price, lowest_trade_url, lowest_logo,
                highest_exchange, highest_price, highest_trade_url, highest_logo,
                price_difference, percentage_difference, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                record.id,
                record.user_id,
                record.coin_name,
                record.lowest_exchange,
                record.lowest_price,
                record.lowest_trade_url,
                record.lowest_logo,
                record.highest_exchange,
                record.highest_price,
                record.highest_trade_url,
                record.highest_logo,
                record.price_difference,
                record.percentage_difference,
                record.timestamp,
            ],
        )?;

        debug!(user = user_id, coin = %record.coin_name, "spread recorded");
        Ok(record)
    }

    /// All records owned by `user_id`, newest first. The owner filter lives
    /// in the query itself so no cross-user row can ever be returned.
    pub fn list(&self, user_id: &str) -> Result<Vec<ArbitrageRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, coin_name,
                    lowest_exchange, lowest_price, lowest_trade_url, lowest_logo,
                    highest_exchange, highest_price, highest_trade_url, highest_logo,
                    price_difference, percentage_difference, timestamp
             FROM arbitrage_history
             WHERE user_id = ?1
             ORDER BY timestamp DESC",
        )?;

        let rows = stmt.query_map(params![user_id], row_to_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Delete a record the caller owns. Unknown ids and ids owned by someone
    /// else are rejected through the same ownership gate.
    pub fn delete(&self, id: &str, user_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        Self::assert_owner(&conn, id, user_id)?;
        conn.execute("DELETE FROM arbitrage_history WHERE id = ?1", params![id])?;
        debug!(user = user_id, record = id, "history entry deleted");
        Ok(())
    }

    /// Single authorization gate for every owner-scoped mutation: resolves
    /// the record's owner and compares it against the requester.
    fn assert_owner(conn: &Connection, id: &str, user_id: &str) -> Result<()> {
        let owner: Option<String> = conn
            .query_row(
                "SELECT user_id FROM arbitrage_history WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match owner {
            None => Err(Error::NotFound("Not found or forbidden".to_string())),
            Some(owner) if owner != user_id => Err(Error::Forbidden),
            Some(_) => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM arbitrage_history", [], |row| {
            row.get::<_, i64>(0)
        })
        .unwrap_or(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArbitrageRecord> {
    Ok(ArbitrageRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        coin_name: row.get(2)?,
        lowest_exchange: row.get(3)?,
        lowest_price: row.get(4)?,
        lowest_trade_url: row.get(5)?,
        lowest_logo: row.get(6)?,
        highest_exchange: row.get(7)?,
        highest_price: row.get(8)?,
        highest_trade_url: row.get(9)?,
        highest_logo: row.get(10)?,
        price_difference: row.get(11)?,
        percentage_difference: row.get(12)?,
        timestamp: row.get(13)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (HistoryStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.db");
        let store = HistoryStore::new(path.to_str().unwrap()).unwrap();
        (store, dir)
    }

    fn sample_spread(coin: &str) -> SpreadResult {
        SpreadResult {
            coin_name: coin.to_string(),
            lowest_exchange: "Alpha".to_string(),
            lowest_price: 100.0,
            lowest_trade_url: "https://alpha.test".to_string(),
            lowest_logo: "https://alpha.test/logo.png".to_string(),
            highest_exchange: "Beta".to_string(),
            highest_price: 105.0,
            highest_trade_url: "https://beta.test".to_string(),
            highest_logo: "https://beta.test/logo.png".to_string(),
            price_difference: 5.0,
            percentage_difference: 5.0,
        }
    }

    #[test]
    fn record_assigns_id_and_roundtrips() {
        let (store, _dir) = test_store();
        let stored = store.record("user-1", sample_spread("Bitcoin"), 1_700_000_000_000).unwrap();
        assert!(!stored.id.is_empty());
        assert_eq!(stored.timestamp, 1_700_000_000_000);

        let listed = store.list("user-1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, stored.id);
        assert_eq!(listed[0].coin_name, "Bitcoin");
        assert_eq!(listed[0].price_difference, 5.0);
    }

    #[test]
    fn list_is_newest_first() {
        let (store, _dir) = test_store();
        store.record("user-1", sample_spread("Old"), 1_000).unwrap();
        store.record("user-1", sample_spread("New"), 3_000).unwrap();
        store.record("user-1", sample_spread("Mid"), 2_000).unwrap();

        let coins: Vec<String> = store
            .list("user-1")
            .unwrap()
            .into_iter()
            .map(|r| r.coin_name)
            .collect();
        assert_eq!(coins, vec!["New", "Mid", "Old"]);
    }

    #[test]
    fn list_never_returns_other_users_rows() {
        let (store, _dir) = test_store();
        store.record("user-1", sample_spread("Bitcoin"), 1_000).unwrap();
        store.record("user-2", sample_spread("Ethereum"), 2_000).unwrap();

        let listed = store.list("user-1").unwrap();
        assert!(listed.iter().all(|r| r.user_id == "user-1"));
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn delete_by_owner_removes_row() {
        let (store, _dir) = test_store();
        let stored = store.record("user-1", sample_spread("Bitcoin"), 1_000).unwrap();
        store.delete(&stored.id, "user-1").unwrap();
        assert!(store.list("user-1").unwrap().is_empty());
    }

    #[test]
    fn delete_by_non_owner_is_rejected_and_row_survives() {
        let (store, _dir) = test_store();
        let stored = store.record("user-1", sample_spread("Bitcoin"), 1_000).unwrap();

        let err = store.delete(&stored.id, "user-2").unwrap_err();
        assert!(matches!(err, Error::Forbidden));

        // The rejected delete must leave the record untouched.
        assert_eq!(store.list("user-1").unwrap().len(), 1);
    }

    #[test]
    fn delete_unknown_id_is_not_found() {
        let (store, _dir) = test_store();
        let err = store.delete("no-such-id", "user-1").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
