//! Style profile builder: historical replay + aggregation.
//!
//! Each of the user's own moves is re-judged against the oracle at the
//! position where it was played: where did it rank among everything that
//! was objectively available at that instant? The pooled records then
//! collapse into three numbers the live selector can bias toward.
//!
//! Replay assumes the user is the first-moving side (they always play White
//! against the mimic), so even plies belong to the user. This is an explicit
//! assumption of the stored format, not a detection heuristic.

use chess::Board;
use log::{debug, warn};
use std::collections::HashMap;

use crate::notation::{gives_check, is_capture, moved_piece, parse_uci_move, piece_char};
use crate::oracle::OracleAdapter;
use crate::store::GameLogRow;

/// One historical user ply, re-ranked against the oracle. Immutable once
/// created.
#[derive(Debug, Clone)]
pub struct MoveRecord {
    /// Fullmove number at the time of the move.
    pub turn: u32,
    /// The move in coordinate notation.
    pub uci: String,
    /// 1-based position within the oracle's ranking at that position;
    /// equals `total_options` when the oracle did not list the move.
    pub rank: usize,
    /// Count of legal moves available at that position.
    pub total_options: usize,
    /// Color-normalized letter of the piece that moved.
    pub piece: char,
    pub is_capture: bool,
    pub is_check: bool,
}

/// Derived numeric summary of a player's historical move choices.
///
/// Rebuilt wholesale from the full game log, never patched incrementally.
/// Cached per user identity and evicted at logout; reconstructible at any
/// time from the durable log.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Fraction of the player's moves that were captures or checks.
    pub aggression: f64,
    /// `1 − mean(rank/total_options)`; 1.0 means the player always chose
    /// the oracle's top move.
    pub precision: f64,
    /// How often each piece identity was moved (raw counts).
    pub piece_preference: HashMap<char, u32>,
}

impl Default for Profile {
    /// Fixed profile for an empty history or a failed build.
    fn default() -> Self {
        Self {
            aggression: 0.2,
            precision: 0.8,
            piece_preference: HashMap::new(),
        }
    }
}

/// Replay one stored game and collect a record for every user ply.
///
/// Every ply (user's and the mimic's) advances the reconstructed board so
/// later oracle queries see the correct position. A move that no longer
/// parses or is illegal on the reconstructed board truncates replay of this
/// game from that point on; records collected before the break are kept.
pub async fn replay_game(row: &GameLogRow, oracle: &OracleAdapter) -> Vec<MoveRecord> {
    let mut records = Vec::new();
    let mut board = Board::default();

    for (ply, entry) in row.moves.iter().enumerate() {
        let Some(chess_move) = parse_uci_move(&board, &entry.uci) else {
            warn!(
                "corrupt history entry '{}' at ply {} (turn {}) for '{}'; truncating replay of this game",
                entry.uci, ply, entry.turn, row.user
            );
            break;
        };

        if ply % 2 == 0 {
            let ranked = oracle.rank_moves(&board).await;
            let total_options = ranked.len();
            if total_options > 0 {
                let rank = ranked
                    .iter()
                    .position(|&m| m == chess_move)
                    .map(|i| i + 1)
                    .unwrap_or(total_options);
                records.push(MoveRecord {
                    turn: entry.turn,
                    uci: entry.uci.clone(),
                    rank,
                    total_options,
                    piece: piece_char(moved_piece(&board, chess_move)),
                    is_capture: is_capture(&board, chess_move),
                    is_check: gives_check(&board, chess_move),
                });
            }
        }

        board = board.make_move_new(chess_move);
    }

    records
}

/// Pool records from every game into a single profile.
pub fn aggregate(records: &[MoveRecord]) -> Profile {
    if records.is_empty() {
        return Profile::default();
    }

    let n = records.len() as f64;
    let aggressive = records
        .iter()
        .filter(|r| r.is_capture || r.is_check)
        .count() as f64;
    let rank_fraction_sum: f64 = records
        .iter()
        .map(|r| r.rank as f64 / r.total_options as f64)
        .sum();

    let mut piece_preference = HashMap::new();
    for record in records {
        *piece_preference.entry(record.piece).or_insert(0) += 1;
    }

    Profile {
        aggression: aggressive / n,
        precision: 1.0 - rank_fraction_sum / n,
        piece_preference,
    }
}

/// Build a user's profile from their complete game log.
///
/// One oracle call per historical user ply, so this is the expensive path;
/// callers run it off the request path (login, post-game rebuild task) and
/// own cache placement. An empty or fully-corrupt history yields the
/// default profile.
pub async fn build_profile(games: &[GameLogRow], oracle: &OracleAdapter) -> Profile {
    let mut records = Vec::new();
    for row in games {
        records.extend(replay_game(row, oracle).await);
    }
    debug!(
        "profile built from {} games, {} analyzed plies",
        games.len(),
        records.len()
    );
    aggregate(&records)
}
