//! Runtime configuration, loaded from environment variables.
//!
//! ```bash
//! export MIMIC_ORACLE=local              # local, cloud, or material
//! export MIMIC_ENGINE_PATH=stockfish     # binary for the local oracle
//! export MIMIC_DEPTH=10                  # local engine search depth
//! export MIMIC_MULTIPV=32                # ranked lines requested per query
//! export MIMIC_ORACLE_TIMEOUT_MS=4000    # budget for one oracle call
//! export MIMIC_CLOUD_URL=https://lichess.org/api/cloud-eval
//! export MIMIC_STORE_DIR=./games         # durable game log directory
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Which external move authority to put behind the oracle adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleKind {
    /// Local UCI engine subprocess (e.g. stockfish).
    Local,
    /// Remote cloud evaluation endpoint.
    Cloud,
    /// No external authority; material evaluation only.
    Material,
}

#[derive(Debug, Clone)]
pub struct MimicConfig {
    pub oracle: OracleKind,
    /// Path to the local engine binary.
    pub engine_path: String,
    /// Search depth for local engine queries.
    pub depth: u8,
    /// How many ranked lines to request per oracle query. The adapter fills
    /// in any legal moves the oracle leaves out, so this only bounds the
    /// quality of the ranking prefix.
    pub multi_pv: usize,
    /// Budget for a single oracle call before falling back.
    pub oracle_timeout: Duration,
    /// Cloud evaluation endpoint.
    pub cloud_url: String,
    /// Directory holding the durable game log.
    pub store_dir: PathBuf,
}

impl Default for MimicConfig {
    fn default() -> Self {
        Self {
            oracle: OracleKind::Material,
            engine_path: "stockfish".to_string(),
            depth: 10,
            multi_pv: 32,
            oracle_timeout: Duration::from_millis(4000),
            cloud_url: "https://lichess.org/api/cloud-eval".to_string(),
            store_dir: PathBuf::from("./games"),
        }
    }
}

impl MimicConfig {
    /// Create config from environment variables, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let oracle = match std::env::var("MIMIC_ORACLE").as_deref() {
            Ok("local") => OracleKind::Local,
            Ok("cloud") => OracleKind::Cloud,
            Ok("material") | Err(_) => OracleKind::Material,
            Ok(other) => {
                log::warn!("unknown MIMIC_ORACLE '{}', using material fallback", other);
                OracleKind::Material
            }
        };

        Self {
            oracle,
            engine_path: std::env::var("MIMIC_ENGINE_PATH").unwrap_or(defaults.engine_path),
            depth: std::env::var("MIMIC_DEPTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.depth),
            multi_pv: std::env::var("MIMIC_MULTIPV")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.multi_pv),
            oracle_timeout: std::env::var("MIMIC_ORACLE_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.oracle_timeout),
            cloud_url: std::env::var("MIMIC_CLOUD_URL").unwrap_or(defaults.cloud_url),
            store_dir: std::env::var("MIMIC_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_dir),
        }
    }
}
