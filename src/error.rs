//! Error taxonomy for the mimic core.
//!
//! Only [`MimicError::IllegalMove`], [`MimicError::NoSession`] and
//! [`MimicError::GameComplete`] ever reach the caller of the move submission
//! boundary. Everything else is an internal condition that degrades to a
//! defined fallback (material ranking, truncated replay, default profile)
//! and is logged rather than surfaced. No variant should ever take the
//! hosting process down.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MimicError {
    /// User-submitted move is not legal in the current position. The session
    /// is left untouched.
    #[error("illegal move '{0}' for the current position")]
    IllegalMove(String),

    /// No active session exists for this user. Start one with `new_game`.
    #[error("no active session for user '{0}'")]
    NoSession(String),

    /// The session's game already finished; a new game must be started
    /// before submitting further moves.
    #[error("game already complete for user '{0}'")]
    GameComplete(String),

    /// The external move authority failed, timed out, or returned garbage.
    /// Recovered internally via the material fallback.
    #[error("move oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// Durable game store failure.
    #[error("game store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
