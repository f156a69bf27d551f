//! Database schema SQL.

/// One row per score key. Counters only ever move through `col = col + 1`.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS scores (
    pk TEXT PRIMARY KEY,
    won INTEGER NOT NULL DEFAULT 0 CHECK (won >= 0),
    lost INTEGER NOT NULL DEFAULT 0 CHECK (lost >= 0),
    updated_at INTEGER NOT NULL
);
"#;

/// Upsert-increment of the `won` counter.
pub const INCREMENT_WON_SQL: &str = "INSERT INTO scores (pk, won, lost, updated_at) VALUES (?1, 1, 0, ?2)
     ON CONFLICT(pk) DO UPDATE SET won = won + 1, updated_at = ?2";

/// Upsert-increment of the `lost` counter.
pub const INCREMENT_LOST_SQL: &str = "INSERT INTO scores (pk, won, lost, updated_at) VALUES (?1, 0, 1, ?2)
     ON CONFLICT(pk) DO UPDATE SET lost = lost + 1, updated_at = ?2";
