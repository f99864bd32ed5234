//! Move-Oracle Adapter: one uniform contract over whichever external
//! move-strength authority is configured.
//!
//! ```text
//! profile::build_profile()      selector (per mimic turn)
//!             \                  /
//!           OracleAdapter::rank_moves()
//!             ├── backend (one attempt, bounded timeout)
//!             │     ├── local::LocalEngine   (UCI subprocess)
//!             │     └── cloud::CloudEval     (lichess cloud-eval)
//!             └── material::rank_moves       (fallback, never fails)
//! ```
//!
//! Oracle failures are fully expected operational conditions: one call, one
//! timeout, then the material fallback. Callers never see an error; a
//! non-terminal position always yields a complete ranking.

pub mod cloud;
pub mod local;
pub mod material;

use async_trait::async_trait;
use chess::{Board, ChessMove, MoveGen};
use log::{debug, warn};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::MimicError;
use crate::notation::parse_uci_move;

/// One external move-strength authority.
///
/// `rank_moves` may return a partial prefix of the legal set (the cloud
/// endpoint rarely reports more than a handful of lines); the adapter fills
/// in the rest. Anything the backend returns that is not legal in `board`
/// is discarded.
#[async_trait]
pub trait OracleBackend: Send + Sync {
    /// Candidate moves, best first. May be partial; must not be trusted to
    /// be legal.
    async fn rank_moves(&self, board: &Board) -> Result<Vec<ChessMove>, MimicError>;

    /// Short name for log lines.
    fn name(&self) -> &str;
}

/// Uniform ranking facade over an optional backend plus the built-in
/// material fallback.
pub struct OracleAdapter {
    backend: Option<Box<dyn OracleBackend>>,
    timeout: Duration,
}

impl OracleAdapter {
    pub fn new(backend: Box<dyn OracleBackend>, timeout: Duration) -> Self {
        Self {
            backend: Some(backend),
            timeout,
        }
    }

    /// Adapter with no external authority: every ranking comes from the
    /// material evaluator.
    pub fn material_only() -> Self {
        Self {
            backend: None,
            timeout: Duration::from_millis(4000),
        }
    }

    /// Rank every legal move in `board`, best first.
    ///
    /// Guarantees: the result contains each legal move exactly once; it is
    /// empty only when the position is terminal. A backend that times out,
    /// errors, or returns a partial list never degrades this contract.
    pub async fn rank_moves(&self, board: &Board) -> Vec<ChessMove> {
        let legal: Vec<ChessMove> = MoveGen::new_legal(board).collect();
        if legal.is_empty() {
            return Vec::new();
        }

        if let Some(backend) = &self.backend {
            match tokio::time::timeout(self.timeout, backend.rank_moves(board)).await {
                Ok(Ok(prefix)) => {
                    debug!(
                        "oracle '{}' returned {} of {} moves",
                        backend.name(),
                        prefix.len(),
                        legal.len()
                    );
                    return complete_ranking(prefix, &legal);
                }
                Ok(Err(e)) => {
                    warn!("oracle '{}' failed, using material fallback: {}", backend.name(), e);
                }
                Err(_) => {
                    warn!(
                        "oracle '{}' timed out after {:?}, using material fallback",
                        backend.name(),
                        self.timeout
                    );
                }
            }
        }

        material::rank_moves(board, &legal)
    }

    /// Convenience: the head of the ranking. `None` only for terminal
    /// positions.
    pub async fn best_move(&self, board: &Board) -> Option<ChessMove> {
        self.rank_moves(board).await.into_iter().next()
    }
}

/// Keep the backend's ordering as a prefix, drop duplicates and illegal
/// entries, then append every remaining legal move in enumeration order.
fn complete_ranking(prefix: Vec<ChessMove>, legal: &[ChessMove]) -> Vec<ChessMove> {
    let mut out: Vec<ChessMove> = Vec::with_capacity(legal.len());
    for m in prefix {
        if legal.contains(&m) && !out.contains(&m) {
            out.push(m);
        }
    }
    for &m in legal {
        if !out.contains(&m) {
            out.push(m);
        }
    }
    out
}

/// Backend that serves pre-recorded rankings keyed by FEN.
///
/// Positions without a script entry count as an oracle failure, so this
/// doubles as an always-failing backend when the script is empty. Used in
/// tests and for replaying cached analysis offline.
pub struct ScriptedBackend {
    rankings: HashMap<String, Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            rankings: HashMap::new(),
        }
    }

    pub fn insert(&mut self, fen: &str, moves: &[&str]) {
        self.rankings
            .insert(fen.to_string(), moves.iter().map(|s| s.to_string()).collect());
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OracleBackend for ScriptedBackend {
    async fn rank_moves(&self, board: &Board) -> Result<Vec<ChessMove>, MimicError> {
        let fen = board.to_string();
        let listed = self
            .rankings
            .get(&fen)
            .ok_or_else(|| MimicError::OracleUnavailable(format!("no scripted ranking for '{}'", fen)))?;
        Ok(listed
            .iter()
            .filter_map(|s| parse_uci_move(board, s))
            .collect())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
