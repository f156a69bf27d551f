//! SQLite-backed score store.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::schema::{INCREMENT_LOST_SQL, INCREMENT_WON_SQL, SCHEMA_SQL};
use crate::types::*;
use crate::ScoreStore;
use chaosgame_core::{Error, Result};

/// Score store persisted in a single SQLite file.
pub struct SqliteScoreStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteScoreStore {
    /// Open or create the store.
    ///
    /// `db_dir` is the directory (e.g., `data/scoredb/`). The file will be `db_dir/scores.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Persistence(e.to_string()))?;
        let db_path = db_dir.join("scores.db");

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        info!("SqliteScoreStore initialized: path={}", db_path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl ScoreStore for SqliteScoreStore {
    fn increment(&self, key: &str, field: ScoreField) -> Result<()> {
        let sql = match field {
            ScoreField::Won => INCREMENT_WON_SQL,
            ScoreField::Lost => INCREMENT_LOST_SQL,
        };
        let now = chrono::Utc::now().timestamp_millis();

        let conn = self.conn.lock();
        conn.prepare_cached(sql)
            .map_err(|e| Error::Persistence(e.to_string()))?
            .execute(params![key, now])
            .map_err(|e| Error::Persistence(e.to_string()))?;
        debug!("Incremented {} for score key {}", field, key);
        Ok(())
    }

    fn get_score(&self, key: &str) -> Result<ScoreRecord> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT won, lost FROM scores WHERE pk = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![key], |row| {
                Ok(ScoreRecord {
                    won: row.get::<_, i64>(0)? as u64,
                    lost: row.get::<_, i64>(1)? as u64,
                })
            })
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row.unwrap_or_default())
    }
}
