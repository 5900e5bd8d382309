//! Command line front end: perft counts, move listings and fog-of-war views.
//!
//! Usage: cargo run --release -- perft --depth 5 --parallel
//!        cargo run --release -- fog --fen "<fen>" --observer black

use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;

use fog_chess::bitboard::attack_tables;
use fog_chess::board::Board;
use fog_chess::fog::FogOfWarView;
use fog_chess::movegen::{generate_moves, PromotionMode};
use fog_chess::perft::{perft, perft_divide, perft_parallel};
use fog_chess::types::{Color, STARTING_POSITION_FEN};

#[derive(Parser, Debug)]
#[command(name = "fog_chess")]
#[command(about = "Legal move generation and fog-of-war views for chess positions")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count leaf nodes of the legal move tree
    Perft {
        #[arg(long, default_value = STARTING_POSITION_FEN)]
        fen: String,

        #[arg(short, long, default_value_t = 4)]
        depth: u8,

        /// Split the root moves over all cores
        #[arg(long)]
        parallel: bool,
    },
    /// Node counts below each root move
    Divide {
        #[arg(long, default_value = STARTING_POSITION_FEN)]
        fen: String,

        #[arg(short, long, default_value_t = 4)]
        depth: u8,
    },
    /// List the legal moves of the side to move
    Moves {
        #[arg(long, default_value = STARTING_POSITION_FEN)]
        fen: String,

        /// Only captures (and queen promotions that capture)
        #[arg(long)]
        captures_only: bool,

        #[arg(long, value_enum, default_value_t = Promotions::All)]
        promotions: Promotions,
    },
    /// Show a position as one side sees it
    Fog {
        #[arg(long, default_value = STARTING_POSITION_FEN)]
        fen: String,

        /// Defaults to the side to move
        #[arg(long, value_enum)]
        observer: Option<Side>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Promotions {
    All,
    QueenKnight,
    Queen,
}

impl From<Promotions> for PromotionMode {
    fn from(p: Promotions) -> Self {
        match p {
            Promotions::All => PromotionMode::All,
            Promotions::QueenKnight => PromotionMode::QueenAndKnight,
            Promotions::Queen => PromotionMode::QueenOnly,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(s: Side) -> Self {
        match s {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let tables = attack_tables();

    match args.command {
        Command::Perft { fen, depth, parallel } => {
            let mut board = Board::from_fen(&fen)?;
            let start = Instant::now();
            let nodes = if parallel {
                perft_parallel(&board, tables, depth)
            } else {
                perft(&mut board, tables, depth)
            };
            let elapsed = start.elapsed();
            println!("Depth {depth}: {nodes} nodes");
            println!("  Time: {:?}", elapsed);
            println!("  NPS: {:.0}", nodes as f64 / elapsed.as_secs_f64().max(1e-9));
        }
        Command::Divide { fen, depth } => {
            let mut board = Board::from_fen(&fen)?;
            let divided = perft_divide(&mut board, tables, depth);
            for (m, nodes) in &divided {
                println!("{m}: {nodes}");
            }
            println!();
            println!("Moves: {}", divided.len());
            println!("Nodes: {}", divided.iter().map(|(_, n)| n).sum::<u64>());
        }
        Command::Moves { fen, captures_only, promotions } => {
            let board = Board::from_fen(&fen)?;
            let moves = generate_moves(&board, tables, !captures_only, promotions.into());
            println!("{}", board.draw_board());
            let listed: Vec<String> = moves.iter().map(|m| m.to_uci()).collect();
            println!("{} moves: {}", moves.len(), listed.join(" "));
            if board.is_in_check(tables) {
                println!("{} is in check", board.side_to_move().to_human());
            }
        }
        Command::Fog { fen, observer } => {
            let board = Board::from_fen(&fen)?;
            let observer = observer.map(Color::from).unwrap_or(board.side_to_move());
            let view = FogOfWarView::new(&board, tables, observer);
            println!("{view}");
            println!();
            println!("{}", view.to_fen());
        }
    }

    Ok(())
}
