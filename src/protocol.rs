//! Line protocol spoken with an external fog-of-war engine.
//!
//! The engine is sent one request line per move,
//! `fen <masked-fen> [prev <masked-fen>] time <ms> inc <ms>`, and answers with a single
//! move in long algebraic notation. Process and pipe handling live with the caller.

use std::fmt;
use std::str::FromStr;

use color_eyre::eyre::{bail, eyre, Report, Result, WrapErr};

use crate::bitboard::AttackTables;
use crate::board::Board;
use crate::fog::FogOfWarView;
use crate::movegen::legal_moves;
use crate::moves::Move;

/// One request line for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStateMessage {
    /// Masked position the engine has to move in
    pub fen: String,
    /// Masked position from the engine's previous turn, absent on its first move
    pub prev: Option<String>,
    pub time_ms: u64,
    pub inc_ms: u64,
}

impl GameStateMessage {
    pub fn new(
        view: &FogOfWarView,
        previous: Option<&FogOfWarView>,
        time_ms: u64,
        inc_ms: u64,
    ) -> Self {
        GameStateMessage {
            fen: view.to_fen(),
            prev: previous.map(|p| p.to_fen()),
            time_ms,
            inc_ms,
        }
    }
}

impl fmt::Display for GameStateMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fen {}", self.fen)?;
        if let Some(prev) = &self.prev {
            write!(f, " prev {prev}")?;
        }
        write!(f, " time {} inc {}", self.time_ms, self.inc_ms)
    }
}

impl FromStr for GameStateMessage {
    type Err = Report;

    /// Parse a request line, as the engine side reads it. Keys come in pairs with their
    /// values and may appear in any order.
    fn from_str(line: &str) -> Result<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() % 2 != 0 {
            bail!("Request `{line}` has a key without a value.");
        }

        let mut fen = None;
        let mut prev = None;
        let mut time_ms = None;
        let mut inc_ms = None;
        for pair in tokens.chunks(2) {
            let (key, value) = (pair[0], pair[1]);
            match key {
                "fen" => fen = Some(value.to_string()),
                "prev" => prev = Some(value.to_string()),
                "time" => {
                    time_ms = Some(value.parse::<u64>().wrap_err_with(|| format!("Bad time `{value}`"))?)
                }
                "inc" => {
                    inc_ms = Some(value.parse::<u64>().wrap_err_with(|| format!("Bad increment `{value}`"))?)
                }
                _ => bail!("Unknown key `{key}` in request."),
            }
        }

        Ok(GameStateMessage {
            fen: fen.ok_or_else(|| eyre!("Request `{line}` has no fen."))?,
            prev,
            time_ms: time_ms.ok_or_else(|| eyre!("Request `{line}` has no time."))?,
            inc_ms: inc_ms.unwrap_or(0),
        })
    }
}

/// The legal move written as `text` in long algebraic notation.
pub fn find_move(board: &Board, tables: &AttackTables, text: &str) -> Result<Move> {
    let (start, target, promotion) = Move::parse_uci(text)?;
    legal_moves(board, tables)
        .iter()
        .find(|m| m.start() == start && m.target() == target && m.promotion_piece() == promotion)
        .ok_or_else(|| eyre!("`{}` is not a legal move in {}", text.trim(), board.to_fen()))
}

/// The engine's reply as a move on `board`. Anything that is not a legal move, including
/// the `a1a1` placeholder some engines send, comes back as [`Move::NULL`].
pub fn parse_reply(board: &Board, tables: &AttackTables, text: &str) -> Move {
    find_move(board, tables, text).unwrap_or(Move::NULL)
}
