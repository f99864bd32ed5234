//! Mimicfish: an adaptive chess opponent that imitates a specific player's
//! style instead of simply playing the strongest move.
//!
//! The chess rules (legality, move generation, terminal detection) come from
//! the `chess` crate, and absolute move strength comes from an external
//! move oracle (a local UCI engine, the Lichess cloud-eval API, or a pure
//! material evaluator as a last resort). What this crate adds on top:
//!
//! - replaying a user's game history against the oracle to build a numeric
//!   style [`Profile`](profile::Profile) (aggression, precision, piece
//!   preference),
//! - choosing a reply move that is legal, not catastrophically bad, and
//!   biased toward that profile,
//! - managing one isolated game session per user and the profile cache
//!   lifecycle around it.
//!
//! # Architecture
//!
//! ```text
//! CLI / host application
//!     ↕ SessionManager::submit_move()        (the one exposed boundary)
//! session::SessionManager
//!     ├── profile::build_profile()           (login + game completion)
//!     ├── selector::select_move()            (one call per mimic turn)
//!     └── store::GameStore                   (append-only game log)
//!             ↑ both lean on
//! oracle::OracleAdapter
//!     ├── oracle::local::LocalEngine         (UCI subprocess)
//!     ├── oracle::cloud::CloudEval           (Lichess cloud-eval)
//!     └── oracle::material                   (built-in fallback, never fails)
//! ```

pub mod config;
pub mod error;
pub mod notation;
pub mod oracle;
pub mod profile;
pub mod selector;
pub mod session;
pub mod store;

pub use config::{MimicConfig, OracleKind};
pub use error::MimicError;
pub use oracle::OracleAdapter;
pub use profile::{build_profile, Profile};
pub use session::{MoveOutcome, SessionManager};
