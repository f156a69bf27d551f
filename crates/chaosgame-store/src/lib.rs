//! Chaos Game Store — atomic win/loss counters keyed by a fixed record identity.

pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use memory::MemoryScoreStore;
pub use sqlite::SqliteScoreStore;
pub use types::*;

use chaosgame_core::Result;

/// Persistent score counters.
///
/// Implementations must apply `increment` as a single atomic add. Callers never
/// read the record back to compute the new value.
pub trait ScoreStore: Send + Sync {
    /// Add one to `field` of the record identified by `key`, creating it if absent.
    fn increment(&self, key: &str, field: ScoreField) -> Result<()>;

    /// Read the record identified by `key`. A missing record reads as zero.
    fn get_score(&self, key: &str) -> Result<ScoreRecord>;
}
