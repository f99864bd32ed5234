//! Durable game log boundary.
//!
//! The core only ever appends one row per completed game and reads a user's
//! rows back in chronological order; everything else about storage is the
//! host's business. Two sinks are provided: a JSONL file store (one JSON
//! object per line, append-only) and an in-memory store for tests.

pub mod jsonl;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MimicError;

/// One logged ply of a finished game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggedMove {
    /// Fullmove number at the time of the move (1-based).
    pub turn: u32,
    /// Coordinate notation, e.g. "e2e4".
    pub uci: String,
}

/// One completed game, as stored durably.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameLogRow {
    /// Owner identity (the human player).
    pub user: String,
    /// Result string: "1-0", "0-1" or "1/2-1/2".
    pub result: String,
    /// Every ply of the game in order, user plies first (the user always
    /// plays White against the mimic).
    pub moves: Vec<LoggedMove>,
    /// Unix seconds at completion.
    pub completed_at: u64,
}

/// Append-only persistence boundary for completed games.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Append one completed-game row.
    async fn append_game(&self, row: GameLogRow) -> Result<(), MimicError>;

    /// All completed games for a user, oldest first.
    async fn games_for(&self, user: &str) -> Result<Vec<GameLogRow>, MimicError>;
}

/// In-memory store for tests and ephemeral setups.
pub struct MemoryStore {
    rows: std::sync::Mutex<Vec<GameLogRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rows: std::sync::Mutex::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn append_game(&self, row: GameLogRow) -> Result<(), MimicError> {
        self.rows
            .lock()
            .map_err(|e| MimicError::Store(format!("poisoned store lock: {}", e)))?
            .push(row);
        Ok(())
    }

    async fn games_for(&self, user: &str) -> Result<Vec<GameLogRow>, MimicError> {
        Ok(self
            .rows
            .lock()
            .map_err(|e| MimicError::Store(format!("poisoned store lock: {}", e)))?
            .iter()
            .filter(|row| row.user == user)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user: &str, completed_at: u64) -> GameLogRow {
        GameLogRow {
            user: user.to_string(),
            result: "1-0".to_string(),
            moves: vec![LoggedMove {
                turn: 1,
                uci: "e2e4".to_string(),
            }],
            completed_at,
        }
    }

    #[tokio::test]
    async fn test_memory_store_filters_by_user() {
        let store = MemoryStore::new();
        store.append_game(row("alice", 1)).await.unwrap();
        store.append_game(row("bob", 2)).await.unwrap();
        store.append_game(row("alice", 3)).await.unwrap();

        let games = store.games_for("alice").await.unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].completed_at, 1);
        assert_eq!(games[1].completed_at, 3);
        assert!(store.games_for("carol").await.unwrap().is_empty());
    }
}
