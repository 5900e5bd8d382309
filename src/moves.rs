//! Bit-packed move representation.
//!
//! A move fits in 17 bits of a `u32`:
//!
//! | bits  | field                                   |
//! | ----- | --------------------------------------- |
//! | 0-5   | start square                            |
//! | 6-11  | target square                           |
//! | 12-14 | [`MoveFlag`]                            |
//! | 15-16 | uncertainty: bit 0 start, bit 1 target  |
//!
//! The uncertainty bits only appear on moves shown to a fog-of-war observer.
//! Such moves describe what the observer saw and can never be played on a
//! [`crate::board::Board`].

use std::fmt;

use color_eyre::eyre::{bail, Result};

use crate::types::{square_from_algebraic, square_to_algebraic, PieceType, Square};

const START_MASK: u32 = 0b00000000000111111;
const TARGET_MASK: u32 = 0b00000111111000000;
const FLAG_MASK: u32 = 0b00111000000000000;
const UNCERTAINTY_MASK: u32 = 0b11000000000000000;

pub const UNKNOWN_START: u8 = 0b01;
pub const UNKNOWN_TARGET: u8 = 0b10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveFlag {
    None,
    EnPassantCapture,
    Castle,
    PawnDoublePush,
    PromoteToQueen,
    PromoteToKnight,
    PromoteToRook,
    PromoteToBishop,
}

impl MoveFlag {
    /// Decode the low three bits; every value is valid.
    pub const fn from_bits(bits: u8) -> MoveFlag {
        match bits & 0b111 {
            0 => MoveFlag::None,
            1 => MoveFlag::EnPassantCapture,
            2 => MoveFlag::Castle,
            3 => MoveFlag::PawnDoublePush,
            4 => MoveFlag::PromoteToQueen,
            5 => MoveFlag::PromoteToKnight,
            6 => MoveFlag::PromoteToRook,
            _ => MoveFlag::PromoteToBishop,
        }
    }

    pub const fn bits(&self) -> u8 {
        match self {
            MoveFlag::None => 0,
            MoveFlag::EnPassantCapture => 1,
            MoveFlag::Castle => 2,
            MoveFlag::PawnDoublePush => 3,
            MoveFlag::PromoteToQueen => 4,
            MoveFlag::PromoteToKnight => 5,
            MoveFlag::PromoteToRook => 6,
            MoveFlag::PromoteToBishop => 7,
        }
    }

    pub fn promotion(piece_type: PieceType) -> Option<MoveFlag> {
        match piece_type {
            PieceType::Queen => Some(MoveFlag::PromoteToQueen),
            PieceType::Knight => Some(MoveFlag::PromoteToKnight),
            PieceType::Rook => Some(MoveFlag::PromoteToRook),
            PieceType::Bishop => Some(MoveFlag::PromoteToBishop),
            _ => None,
        }
    }

    pub fn promotion_piece(&self) -> Option<PieceType> {
        match self {
            MoveFlag::PromoteToQueen => Some(PieceType::Queen),
            MoveFlag::PromoteToKnight => Some(PieceType::Knight),
            MoveFlag::PromoteToRook => Some(PieceType::Rook),
            MoveFlag::PromoteToBishop => Some(PieceType::Bishop),
            _ => None,
        }
    }
}

/// A packed move. Copy it around freely, it is four bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Move(u32);

impl Move {
    /// The all-zero move, returned whenever no move was produced.
    pub const NULL: Move = Move(0);

    /// Pack the four fields. Values wider than their field keep only their low bits.
    #[inline(always)]
    pub const fn pack(start: u8, target: u8, flag: u8, uncertainty: u8) -> Move {
        Move(
            (start as u32 & 0x3f)
                | (target as u32 & 0x3f) << 6
                | (flag as u32 & 0x7) << 12
                | (uncertainty as u32 & 0x3) << 15,
        )
    }

    #[inline(always)]
    pub const fn new(start: Square, target: Square, flag: MoveFlag) -> Move {
        Move::pack(start, target, flag.bits(), 0)
    }

    /// Inverse of [`Move::pack`]: `(start, target, flag, uncertainty)`.
    #[inline(always)]
    pub const fn unpack(self) -> (u8, u8, u8, u8) {
        (
            self.start(),
            self.target(),
            self.flag().bits(),
            self.uncertainty(),
        )
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn start(self) -> Square {
        (self.0 & START_MASK) as u8
    }

    #[inline(always)]
    pub const fn target(self) -> Square {
        ((self.0 & TARGET_MASK) >> 6) as u8
    }

    #[inline(always)]
    pub const fn flag(self) -> MoveFlag {
        MoveFlag::from_bits(((self.0 & FLAG_MASK) >> 12) as u8)
    }

    #[inline(always)]
    pub const fn uncertainty(self) -> u8 {
        ((self.0 & UNCERTAINTY_MASK) >> 15) as u8
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    pub fn is_promotion(self) -> bool {
        self.flag().bits() >= MoveFlag::PromoteToQueen.bits()
    }

    pub fn promotion_piece(self) -> Option<PieceType> {
        self.flag().promotion_piece()
    }

    pub fn is_en_passant(self) -> bool {
        self.flag() == MoveFlag::EnPassantCapture
    }

    pub fn is_castle(self) -> bool {
        self.flag() == MoveFlag::Castle
    }

    /// Square of the pawn removed by an en passant capture landing on `target`.
    pub fn en_passant_capture_square(self) -> Square {
        let target = self.target();
        if target < 32 {
            target + 8
        } else {
            target - 8
        }
    }

    pub fn is_start_unknown(self) -> bool {
        self.uncertainty() & UNKNOWN_START != 0
    }

    pub fn is_target_unknown(self) -> bool {
        self.uncertainty() & UNKNOWN_TARGET != 0
    }

    pub fn is_fully_unknown(self) -> bool {
        self.is_start_unknown() && self.is_target_unknown()
    }

    pub fn is_fully_known(self) -> bool {
        self.uncertainty() == 0
    }

    pub const fn with_uncertainty(self, uncertainty: u8) -> Move {
        Move((self.0 & !UNCERTAINTY_MASK) | (uncertainty as u32 & 0x3) << 15)
    }

    /// Long algebraic notation, e.g. `e2e4` or `e7e8q`. The null move is `0000`.
    pub fn to_uci(self) -> String {
        if self.is_null() {
            return "0000".to_string();
        }
        let mut s = format!(
            "{}{}",
            square_to_algebraic(self.start()),
            square_to_algebraic(self.target())
        );
        if let Some(promotion) = self.promotion_piece() {
            s.push(promotion.to_char());
        }
        s
    }

    /// Parse long algebraic text into start, target and optional promotion piece.
    ///
    /// The result carries no move flag: only the position knows whether `e1g1` is a
    /// castle, so callers match it against generated moves.
    pub fn parse_uci(text: &str) -> Result<(Square, Square, Option<PieceType>)> {
        let text = text.trim();
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            bail!("Move `{text}` is not in long algebraic notation.");
        }
        let start = square_from_algebraic(&text[0..2])?;
        let target = square_from_algebraic(&text[2..4])?;
        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => {
                let piece_type = PieceType::from_char(c)?;
                if MoveFlag::promotion(piece_type).is_none() {
                    bail!("Cannot promote to {}.", piece_type.to_human());
                }
                Some(piece_type)
            }
        };
        Ok((start, target, promotion))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uci())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({} {:?}", self.to_uci(), self.flag())?;
        if !self.is_fully_known() {
            write!(f, " uncertainty={:#04b}", self.uncertainty())?;
        }
        f.write_str(")")
    }
}
