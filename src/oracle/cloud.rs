//! Remote cloud-evaluation backend.
//!
//! Queries a Lichess cloud-eval compatible endpoint by FEN and reads the
//! first move of each returned principal variation. The endpoint only knows
//! positions in its cache and rarely reports more than a few lines, so the
//! result is almost always a partial prefix for the adapter to complete.

use async_trait::async_trait;
use chess::{Board, ChessMove};
use serde::Deserialize;

use super::OracleBackend;
use crate::error::MimicError;
use crate::notation::parse_uci_move;

pub struct CloudEval {
    client: reqwest::Client,
    endpoint: String,
    multi_pv: usize,
}

impl CloudEval {
    pub fn new(endpoint: String, multi_pv: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            multi_pv,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CloudEvalResponse {
    #[serde(default)]
    pvs: Vec<PrincipalVariation>,
}

#[derive(Debug, Deserialize)]
struct PrincipalVariation {
    /// Space-separated UCI moves; the first is the move to play.
    moves: String,
}

#[async_trait]
impl OracleBackend for CloudEval {
    async fn rank_moves(&self, board: &Board) -> Result<Vec<ChessMove>, MimicError> {
        let fen = board.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("fen", fen.as_str()), ("multiPv", &self.multi_pv.to_string())])
            .send()
            .await
            .map_err(|e| MimicError::OracleUnavailable(format!("cloud-eval request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| MimicError::OracleUnavailable(format!("cloud-eval rejected query: {}", e)))?;

        let body: CloudEvalResponse = response
            .json()
            .await
            .map_err(|e| MimicError::OracleUnavailable(format!("cloud-eval malformed response: {}", e)))?;

        Ok(body
            .pvs
            .iter()
            .filter_map(|pv| pv.moves.split_whitespace().next())
            .filter_map(|uci| parse_uci_move(board, uci))
            .collect())
    }

    fn name(&self) -> &str {
        "cloud-eval"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"fen":"start","knodes":13683,"depth":49,
            "pvs":[{"moves":"e2e4 e7e5 g1f3","cp":18},{"moves":"d2d4 g8f6","cp":15}]}"#;
        let parsed: CloudEvalResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.pvs.len(), 2);
        assert_eq!(parsed.pvs[0].moves.split_whitespace().next(), Some("e2e4"));
    }

    #[test]
    fn test_response_without_pvs() {
        let parsed: CloudEvalResponse = serde_json::from_str(r#"{"error":"Not found"}"#).unwrap();
        assert!(parsed.pvs.is_empty());
    }
}
