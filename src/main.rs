//! mimicfish: play against an opponent that imitates your own style.
//!
//! # Usage
//!
//! ```bash
//! # Optional
//! export MIMIC_ORACLE=local              # local, cloud, or material
//! export MIMIC_ENGINE_PATH=stockfish     # binary for the local oracle
//! export MIMIC_DEPTH=10
//! export MIMIC_ORACLE_TIMEOUT_MS=4000
//! export MIMIC_STORE_DIR=./games
//!
//! cargo run --release
//! ```
//!
//! Commands at the move prompt: a coordinate move ("e2e4", "e7e8q"),
//! `new` to start a fresh game, `profile` to show the current style
//! profile, `quit` to leave.

use chess::{Board, Color, File, Piece, Rank, Square};
use colored::Colorize;
use dotenv::dotenv;
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use mimicfish::config::{MimicConfig, OracleKind};
use mimicfish::oracle::cloud::CloudEval;
use mimicfish::oracle::local::LocalEngine;
use mimicfish::oracle::OracleAdapter;
use mimicfish::profile::Profile;
use mimicfish::session::{MoveOutcome, SessionManager};
use mimicfish::store::jsonl::JsonlStore;
use mimicfish::store::{GameStore, MemoryStore};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    println!("=== mimicfish ===");
    println!("An opponent that studies how you play, then plays like you.");
    println!();

    let config = MimicConfig::from_env();
    info!(
        "config: oracle={:?}, depth={}, timeout={:?}, store={}",
        config.oracle,
        config.depth,
        config.oracle_timeout,
        config.store_dir.display()
    );

    let oracle = build_oracle(&config).await;
    let store: Arc<dyn GameStore> = match JsonlStore::new(config.store_dir.clone()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("store unusable, completed games will not persist: {}", e);
            Arc::new(MemoryStore::new())
        }
    };
    let manager = SessionManager::new(Arc::new(oracle), store);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    print!("Your name: ");
    io::stdout().flush().ok();
    let user = match lines.next() {
        Some(Ok(line)) if !line.trim().is_empty() => line.trim().to_string(),
        _ => "anonymous".to_string(),
    };

    println!("Analyzing your game history...");
    let profile = manager.login(&user).await;
    print_profile(&profile);

    manager.new_game(&user).await;

    loop {
        if let Some(board) = manager.current_board(&user).await {
            print_board(&board);
        }

        print!("Your move (White, e.g. e2e4): ");
        io::stdout().flush().ok();
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "quit" | "exit" => break,
            "new" => {
                manager.new_game(&user).await;
                println!("New game started.");
                continue;
            }
            "profile" => {
                print_profile(&manager.cached_profile(&user));
                continue;
            }
            uci => match manager.submit_move(&user, uci).await {
                Ok(MoveOutcome::Accepted { reply }) => {
                    println!("Mimic plays {}.", reply.to_string().bold());
                }
                Ok(MoveOutcome::GameOver { reply, result }) => {
                    if let Some(reply) = reply {
                        println!("Mimic plays {}.", reply.to_string().bold());
                    }
                    if let Some(board) = manager.current_board(&user).await {
                        print_board(&board);
                    }
                    println!("{} Result: {}", "Game over!".green().bold(), result.bold());
                    println!("Type 'new' for another game or 'quit' to leave.");
                }
                Err(e) => {
                    println!("{} {}", "!!!".red(), e);
                }
            },
        }
    }

    manager.logout(&user).await;
    println!("Bye.");
}

async fn build_oracle(config: &MimicConfig) -> OracleAdapter {
    match config.oracle {
        OracleKind::Local => {
            match LocalEngine::spawn(
                &config.engine_path,
                config.depth,
                config.multi_pv,
                config.oracle_timeout,
            )
            .await
            {
                Ok(engine) => OracleAdapter::new(Box::new(engine), config.oracle_timeout),
                Err(e) => {
                    warn!("local engine unavailable, using material ranking: {}", e);
                    OracleAdapter::material_only()
                }
            }
        }
        OracleKind::Cloud => OracleAdapter::new(
            Box::new(CloudEval::new(config.cloud_url.clone(), config.multi_pv)),
            config.oracle_timeout,
        ),
        OracleKind::Material => OracleAdapter::material_only(),
    }
}

fn print_profile(profile: &Profile) {
    println!("--- Player Profile ---");
    println!(
        "Aggression: {:.2} (share of captures and checks)",
        profile.aggression
    );
    println!(
        "Precision:  {:.2} (1.0 means always the oracle's top move)",
        profile.precision
    );
    let mut preferences: Vec<_> = profile.piece_preference.iter().collect();
    preferences.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    let listed: Vec<String> = preferences
        .iter()
        .map(|(piece, count)| format!("{}×{}", piece, count))
        .collect();
    println!("Preferred pieces: {}", if listed.is_empty() {
        "(none yet)".to_string()
    } else {
        listed.join(", ")
    });
    println!("----------------------");
}

fn print_board(board: &Board) {
    println!("  a b c d e f g h");
    for rank in (0..8usize).rev() {
        print!("{} ", rank + 1);
        for file in 0..8usize {
            let square = Square::make_square(Rank::from_index(rank), File::from_index(file));
            match (board.piece_on(square), board.color_on(square)) {
                (Some(piece), Some(color)) => {
                    let glyph = piece_glyph(piece, color);
                    if color == Color::White {
                        print!("{} ", glyph.bright_white());
                    } else {
                        print!("{} ", glyph.cyan());
                    }
                }
                _ => print!("{} ", ".".dimmed()),
            }
        }
        println!("{}", rank + 1);
    }
    println!("  a b c d e f g h");
    println!();
}

fn piece_glyph(piece: Piece, color: Color) -> &'static str {
    match (color, piece) {
        (Color::White, Piece::Pawn) => "♙",
        (Color::White, Piece::Knight) => "♘",
        (Color::White, Piece::Bishop) => "♗",
        (Color::White, Piece::Rook) => "♖",
        (Color::White, Piece::Queen) => "♕",
        (Color::White, Piece::King) => "♔",
        (Color::Black, Piece::Pawn) => "♟",
        (Color::Black, Piece::Knight) => "♞",
        (Color::Black, Piece::Bishop) => "♝",
        (Color::Black, Piece::Rook) => "♜",
        (Color::Black, Piece::Queen) => "♛",
        (Color::Black, Piece::King) => "♚",
    }
}
