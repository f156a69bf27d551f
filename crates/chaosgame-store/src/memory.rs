//! In-memory score store for tests and throwaway runs.

use dashmap::DashMap;

use crate::types::*;
use crate::ScoreStore;
use chaosgame_core::Result;

/// Score counters held in a concurrent map; each increment holds the entry lock.
#[derive(Default)]
pub struct MemoryScoreStore {
    records: DashMap<String, ScoreRecord>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn increment(&self, key: &str, field: ScoreField) -> Result<()> {
        let mut record = self.records.entry(key.to_string()).or_default();
        match field {
            ScoreField::Won => record.won += 1,
            ScoreField::Lost => record.lost += 1,
        }
        Ok(())
    }

    fn get_score(&self, key: &str) -> Result<ScoreRecord> {
        Ok(self.records.get(key).map(|r| *r).unwrap_or_default())
    }
}
