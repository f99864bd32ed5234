//! Coordinate (UCI-style) move notation and per-move tactical facts.
//!
//! The durable game log and the oracle boundary both speak coordinate
//! notation ("e2e4", "e7e8q"), so parsing doubles as the legality check:
//! a move that parses against a position is legal in it.

use chess::{Board, ChessMove, Piece, Square};
use std::str::FromStr;

/// Parse a coordinate move string (e.g., "e2e4", "e7e8q") against a position.
///
/// Returns `None` if the string is malformed or the move is not legal in
/// `board`.
pub fn parse_uci_move(board: &Board, move_str: &str) -> Option<ChessMove> {
    let move_str = move_str.trim();
    if move_str.len() < 4 {
        return None;
    }

    let from = Square::from_str(&move_str[0..2]).ok()?;
    let to = Square::from_str(&move_str[2..4]).ok()?;

    let promotion = if move_str.len() > 4 {
        match move_str.as_bytes()[4] {
            b'q' | b'Q' => Some(Piece::Queen),
            b'r' | b'R' => Some(Piece::Rook),
            b'b' | b'B' => Some(Piece::Bishop),
            b'n' | b'N' => Some(Piece::Knight),
            _ => None,
        }
    } else {
        None
    };

    let chess_move = ChessMove::new(from, to, promotion);

    if board.legal(chess_move) {
        Some(chess_move)
    } else {
        None
    }
}

/// Format a ChessMove as a coordinate string (e.g., "e2e4", "e7e8q").
pub fn format_move(m: ChessMove) -> String {
    let promo = m
        .get_promotion()
        .map(|p| match p {
            Piece::Queen => "q",
            Piece::Rook => "r",
            Piece::Bishop => "b",
            Piece::Knight => "n",
            _ => "",
        })
        .unwrap_or("");

    format!("{}{}{}", m.get_source(), m.get_dest(), promo)
}

/// Whether a legal move captures a piece (including en passant, where the
/// destination square is empty but a pawn leaves its file).
pub fn is_capture(board: &Board, m: ChessMove) -> bool {
    if board.piece_on(m.get_dest()).is_some() {
        return true;
    }
    board.piece_on(m.get_source()) == Some(Piece::Pawn)
        && m.get_source().get_file() != m.get_dest().get_file()
}

/// Whether a legal move gives check.
pub fn gives_check(board: &Board, m: ChessMove) -> bool {
    board.make_move_new(m).checkers().popcnt() > 0
}

/// Identity of the piece a legal move moves. The source square of a legal
/// move always holds a piece.
pub fn moved_piece(board: &Board, m: ChessMove) -> Piece {
    board.piece_on(m.get_source()).unwrap_or(Piece::Pawn)
}

/// Color-normalized piece letter used as the piece-preference key.
pub fn piece_char(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}
