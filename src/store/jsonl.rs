//! JSONL-backed game store: one JSON object per line, append-only.
//!
//! The full history per user is small (tens of games), so `games_for`
//! simply rescans the file. Writes go through std fs; a single append per
//! completed game does not warrant async IO plumbing.

use async_trait::async_trait;
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;

use super::{GameLogRow, GameStore};
use crate::error::MimicError;

pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    /// Store rows in `<dir>/games.jsonl`, creating the directory if needed.
    /// Fails up front when the directory cannot be created, so the host
    /// learns at startup that games would not persist.
    pub fn new(dir: PathBuf) -> Result<Self, MimicError> {
        std::fs::create_dir_all(&dir).map_err(|e| {
            MimicError::Store(format!(
                "cannot create store directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self {
            path: dir.join("games.jsonl"),
        })
    }
}

#[async_trait]
impl GameStore for JsonlStore {
    async fn append_game(&self, row: GameLogRow) -> Result<(), MimicError> {
        let line = serde_json::to_string(&row)
            .map_err(|e| MimicError::Store(format!("failed to encode game row: {}", e)))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;

        info!(
            "appended game for '{}' ({} plies, result {}) to {}",
            row.user,
            row.moves.len(),
            row.result,
            self.path.display()
        );
        Ok(())
    }

    async fn games_for(&self, user: &str) -> Result<Vec<GameLogRow>, MimicError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut rows = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<GameLogRow>(line) {
                Ok(row) if row.user == user => rows.push(row),
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        "skipping unreadable row {} in {}: {}",
                        lineno + 1,
                        self.path.display(),
                        e
                    );
                }
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LoggedMove;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "mimicfish-store-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn row(user: &str, uci: &str) -> GameLogRow {
        GameLogRow {
            user: user.to_string(),
            result: "1/2-1/2".to_string(),
            moves: vec![LoggedMove {
                turn: 1,
                uci: uci.to_string(),
            }],
            completed_at: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_round_trip_preserves_order() {
        let dir = temp_dir("roundtrip");
        let store = JsonlStore::new(dir.clone()).unwrap();

        store.append_game(row("alice", "e2e4")).await.unwrap();
        store.append_game(row("bob", "d2d4")).await.unwrap();
        store.append_game(row("alice", "g1f3")).await.unwrap();

        let games = store.games_for("alice").await.unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].moves[0].uci, "e2e4");
        assert_eq!(games[1].moves[0].uci, "g1f3");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_history() {
        let dir = temp_dir("missing");
        let store = JsonlStore::new(dir.clone()).unwrap();
        assert!(store.games_for("alice").await.unwrap().is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_corrupt_lines_are_skipped() {
        let dir = temp_dir("corrupt");
        let store = JsonlStore::new(dir.clone()).unwrap();
        store.append_game(row("alice", "e2e4")).await.unwrap();

        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(dir.join("games.jsonl"))
            .unwrap();
        writeln!(file, "{{not json").unwrap();

        store.append_game(row("alice", "d2d4")).await.unwrap();
        let games = store.games_for("alice").await.unwrap();
        assert_eq!(games.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_uncreatable_directory_is_reported_at_construction() {
        let base = temp_dir("blocked");
        std::fs::create_dir_all(&base).unwrap();
        // A regular file where a parent directory is needed.
        let occupied = base.join("occupied");
        std::fs::write(&occupied, b"x").unwrap();

        let result = JsonlStore::new(occupied.join("sub"));
        assert!(matches!(result, Err(MimicError::Store(_))));

        let _ = std::fs::remove_dir_all(&base);
    }
}
