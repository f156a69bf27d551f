//! Score record types.

use serde::{Deserialize, Serialize};

/// Counter of the score record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreField {
    Won,
    Lost,
}

impl ScoreField {
    /// Persisted column name.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }
}

impl std::fmt::Display for ScoreField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Cumulative wins and losses across all orchestration runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub won: u64,
    pub lost: u64,
}

impl ScoreRecord {
    /// Runs that reached a win or loss verdict.
    pub fn total(&self) -> u64 {
        self.won + self.lost
    }
}
