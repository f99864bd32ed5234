//! Live move selection: profile-biased sampling over the oracle's ranking.
//!
//! The oracle only hands us an ordered list, not scores, so the bias layer
//! builds its own: a small base score per candidate, bonuses for matching
//! the profile's aggression and piece habits, and a rank penalty that
//! shrinks as the profile gets more precise. Scores become weights through
//! `10^score` and one move is drawn from the resulting distribution.
//!
//! Selection is randomized by design; callers that need reproducibility
//! (tests) inject a seeded RNG.

use chess::{Board, ChessMove};
use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::notation::{format_move, gives_check, is_capture, moved_piece, piece_char};
use crate::profile::Profile;

/// Fraction of the ranking considered safe to play. The mimic never picks
/// from the bottom quarter, no matter what the profile says.
const SAFE_POOL_FRACTION: f64 = 0.75;

/// Score one candidate at 0-based `index` in the ranking.
///
/// With `precision == 1` the rank penalty vanishes entirely: a perfectly
/// precise player already always chose near the top, so rank carries no
/// extra information about them.
pub fn candidate_score(profile: &Profile, index: usize, is_aggressive: bool, piece: char) -> f64 {
    let mut score = 0.01;
    if is_aggressive {
        score += profile.aggression * 10.0;
    }
    if let Some(&count) = profile.piece_preference.get(&piece) {
        score += count as f64 * 0.1;
    }
    score -= index as f64 * (1.0 - profile.precision);
    score
}

/// Number of candidates kept from a ranking of `total` moves.
pub fn pool_size(total: usize) -> usize {
    ((total as f64 * SAFE_POOL_FRACTION).ceil() as usize).max(1)
}

/// Pick one move from `ranked` (best first, as produced by the oracle
/// adapter), biased toward `profile`.
///
/// Returns `None` only for an empty ranking, i.e. a terminal position the
/// caller should not have reached here with.
pub fn select_move<R: Rng>(
    board: &Board,
    ranked: &[ChessMove],
    profile: &Profile,
    rng: &mut R,
) -> Option<ChessMove> {
    if ranked.is_empty() {
        return None;
    }

    let pool = &ranked[..pool_size(ranked.len())];

    let scores: Vec<f64> = pool
        .iter()
        .enumerate()
        .map(|(index, &m)| {
            let aggressive = is_capture(board, m) || gives_check(board, m);
            let piece = piece_char(moved_piece(board, m));
            candidate_score(profile, index, aggressive, piece)
        })
        .collect();

    // Weights only matter relative to each other, so shift by the best
    // score before exponentiating; a raw 10^score overflows to infinity
    // once preference counts push scores past ~308.
    let best = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = scores.iter().map(|s| 10f64.powf(s - best)).collect();

    // The best candidate always has weight 1.0, so the distribution is
    // constructible; fall back to the top move if it degenerates anyway.
    let chosen = match WeightedIndex::new(&weights) {
        Ok(dist) => pool[dist.sample(rng)],
        Err(_) => pool[0],
    };

    debug!(
        "selected '{}' from pool of {} (of {} ranked)",
        format_move(chosen),
        pool.len(),
        ranked.len()
    );
    Some(chosen)
}
