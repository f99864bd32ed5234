//! Last-resort move ranking by raw material count.
//!
//! No search, no positional terms: apply each legal move, sum piece values
//! (white-positive), and rank from the mover's perspective. Deliberately
//! dumb, but it always produces a ranking when legal moves exist, which is
//! what the fallback path needs.

use chess::{Board, ChessMove, Color, Piece, ALL_SQUARES};

/// Classic material values; the king carries no weight.
pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 1,
        Piece::Knight => 3,
        Piece::Bishop => 3,
        Piece::Rook => 5,
        Piece::Queen => 9,
        Piece::King => 0,
    }
}

/// Signed material sum of a position. Positive favors White.
pub fn evaluate_board(board: &Board) -> i32 {
    let mut score = 0;
    for square in ALL_SQUARES {
        if let Some(piece) = board.piece_on(square) {
            let value = piece_value(piece);
            match board.color_on(square) {
                Some(Color::White) => score += value,
                Some(Color::Black) => score -= value,
                None => {}
            }
        }
    }
    score
}

/// Rank `legal` best-first by the material balance after each move, from the
/// mover's perspective. Ties keep the original enumeration order.
pub fn rank_moves(board: &Board, legal: &[ChessMove]) -> Vec<ChessMove> {
    let mover = board.side_to_move();

    let mut scored: Vec<(usize, i32, ChessMove)> = legal
        .iter()
        .enumerate()
        .map(|(i, &m)| (i, evaluate_board(&board.make_move_new(m)), m))
        .collect();

    scored.sort_by(|a, b| {
        let ordering = match mover {
            Color::White => b.1.cmp(&a.1),
            Color::Black => a.1.cmp(&b.1),
        };
        ordering.then(a.0.cmp(&b.0))
    });

    scored.into_iter().map(|(_, _, m)| m).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::parse_uci_move;
    use chess::MoveGen;

    #[test]
    fn test_start_position_is_balanced() {
        assert_eq!(evaluate_board(&Board::default()), 0);
    }

    #[test]
    fn test_capture_ranks_first() {
        // 1. e4 d5: the only material-winning move for white is exd5.
        let mut board = Board::default();
        for mv in ["e2e4", "d7d5"] {
            board = board.make_move_new(parse_uci_move(&board, mv).unwrap());
        }
        let legal: Vec<ChessMove> = MoveGen::new_legal(&board).collect();
        let ranked = rank_moves(&board, &legal);
        assert_eq!(crate::notation::format_move(ranked[0]), "e4d5");
    }

    #[test]
    fn test_ranking_is_permutation_of_legal_set() {
        let board = Board::default();
        let legal: Vec<ChessMove> = MoveGen::new_legal(&board).collect();
        let ranked = rank_moves(&board, &legal);
        assert_eq!(ranked.len(), legal.len());
        for m in &legal {
            assert!(ranked.contains(m));
        }
    }

    #[test]
    fn test_ties_keep_enumeration_order() {
        // From the start position every move is material-neutral, so the
        // ranking must equal the enumeration order.
        let board = Board::default();
        let legal: Vec<ChessMove> = MoveGen::new_legal(&board).collect();
        assert_eq!(rank_moves(&board, &legal), legal);
    }
}
