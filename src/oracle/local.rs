//! Local UCI engine subprocess backend.
//!
//! Speaks just enough of the UCI protocol to get a ranked move list:
//! `position fen` + `go depth`, reading MultiPV `info` lines until the
//! terminating `bestmove`. The engine process is spawned once and reused
//! for every query.

use async_trait::async_trait;
use chess::{Board, ChessMove};
use log::info;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use super::OracleBackend;
use crate::error::MimicError;
use crate::notation::parse_uci_move;

pub struct LocalEngine {
    io: Mutex<EngineIo>,
    depth: u8,
}

struct EngineIo {
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    _child: Child,
}

impl EngineIo {
    async fn send(&mut self, cmd: &str) -> Result<(), MimicError> {
        self.stdin.write_all(cmd.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, MimicError> {
        self.lines
            .next_line()
            .await?
            .ok_or_else(|| MimicError::OracleUnavailable("engine closed its stdout".to_string()))
    }

    /// Interrupt any running search and discard buffered output. A query
    /// cancelled by the adapter's timeout leaves stale lines behind; the
    /// `stop`/`isready` pair flushes them before the next query starts.
    async fn resync(&mut self) -> Result<(), MimicError> {
        self.send("stop").await?;
        self.send("isready").await?;
        loop {
            if self.read_line().await?.trim() == "readyok" {
                return Ok(());
            }
        }
    }
}

impl LocalEngine {
    /// Spawn the engine binary and run the UCI handshake. `multi_pv` bounds
    /// how many ranked lines each query reports. A binary that runs but
    /// never answers the handshake within `handshake_timeout` counts as
    /// unavailable, same as one that fails to spawn.
    pub async fn spawn(
        path: &str,
        depth: u8,
        multi_pv: usize,
        handshake_timeout: Duration,
    ) -> Result<Self, MimicError> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                MimicError::OracleUnavailable(format!("failed to spawn engine '{}': {}", path, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MimicError::OracleUnavailable("engine stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MimicError::OracleUnavailable("engine stdout unavailable".to_string()))?;

        let mut io = EngineIo {
            stdin,
            lines: BufReader::new(stdout).lines(),
            _child: child,
        };

        tokio::time::timeout(handshake_timeout, handshake(&mut io, multi_pv))
            .await
            .map_err(|_| {
                MimicError::OracleUnavailable(format!(
                    "engine '{}' did not complete the UCI handshake within {:?}",
                    path, handshake_timeout
                ))
            })??;

        info!("local engine '{}' ready (depth={}, multipv={})", path, depth, multi_pv);

        Ok(Self {
            io: Mutex::new(io),
            depth,
        })
    }
}

async fn handshake(io: &mut EngineIo, multi_pv: usize) -> Result<(), MimicError> {
    io.send("uci").await?;
    loop {
        if io.read_line().await?.trim() == "uciok" {
            break;
        }
    }
    io.send(&format!("setoption name MultiPV value {}", multi_pv)).await?;
    io.send("isready").await?;
    loop {
        if io.read_line().await?.trim() == "readyok" {
            return Ok(());
        }
    }
}

#[async_trait]
impl OracleBackend for LocalEngine {
    async fn rank_moves(&self, board: &Board) -> Result<Vec<ChessMove>, MimicError> {
        let mut io = self.io.lock().await;
        io.resync().await?;
        io.send(&format!("position fen {}", board)).await?;
        io.send(&format!("go depth {}", self.depth)).await?;

        // Latest reported move per MultiPV slot; later (deeper) info lines
        // overwrite earlier ones for the same slot.
        let mut slots: Vec<(usize, String)> = Vec::new();
        loop {
            let line = io.read_line().await?;
            let trimmed = line.trim();
            if trimmed.starts_with("bestmove") {
                break;
            }
            if let Some((idx, mv)) = parse_info_line(trimmed) {
                match slots.iter_mut().find(|(i, _)| *i == idx) {
                    Some(slot) => slot.1 = mv,
                    None => slots.push((idx, mv)),
                }
            }
        }

        slots.sort_by_key(|&(i, _)| i);
        Ok(slots
            .into_iter()
            .filter_map(|(_, s)| parse_uci_move(board, &s))
            .collect())
    }

    fn name(&self) -> &str {
        "local-engine"
    }
}

/// Extract (multipv index, first pv move) from a UCI `info` line.
/// Lines without a `pv` token (currmove chatter, option echoes) yield None.
fn parse_info_line(line: &str) -> Option<(usize, String)> {
    if !line.starts_with("info") {
        return None;
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let pv_pos = tokens.iter().position(|&t| t == "pv")?;
    let first = tokens.get(pv_pos + 1)?;
    let idx = tokens
        .iter()
        .position(|&t| t == "multipv")
        .and_then(|i| tokens.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    Some((idx, first.to_string()))
}
