use color_eyre::eyre::{bail, Result};

pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Board square index, 0 = a1, 1 = b1, ..., 63 = h8.
pub type Square = u8;

/// One bit per square, same indexing as [`Square`].
pub type Bitboard = u64;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn from_char(c: char) -> Result<Color> {
        match c {
            'w' => Ok(Color::White),
            'b' => Ok(Color::Black),
            other => bail!("Color must be either `w` or `b`, got `{other}`."),
        }
    }

    pub fn from_case(c: char) -> Color {
        if c.is_uppercase() {
            Color::White
        } else {
            Color::Black
        }
    }

    pub fn other_color(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Index into per-color arrays: white 0, black 1.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    pub fn to_human(&self) -> &str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

pub const ALL_PIECE_TYPES: [PieceType; 6] = [
    PieceType::Pawn,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Rook,
    PieceType::Queen,
    PieceType::King,
];

impl PieceType {
    pub fn from_char(c: char) -> Result<PieceType> {
        Ok(match c.to_ascii_lowercase() {
            'p' => PieceType::Pawn,
            'n' => PieceType::Knight,
            'b' => PieceType::Bishop,
            'r' => PieceType::Rook,
            'q' => PieceType::Queen,
            'k' => PieceType::King,
            other => bail!("Unrecognized piece type `{other}`."),
        })
    }

    /// Index into per-piece arrays, pawn 0 through king 5.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        match self {
            PieceType::Pawn => 0,
            PieceType::Knight => 1,
            PieceType::Bishop => 2,
            PieceType::Rook => 3,
            PieceType::Queen => 4,
            PieceType::King => 5,
        }
    }

    pub fn to_human(&self) -> &str {
        match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }

    /// Lowercase letter used in FEN and long algebraic promotions.
    pub fn to_char(&self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Piece {
    pub color: Color,
    pub piece_type: PieceType,
}

impl Piece {
    pub const fn new(color: Color, piece_type: PieceType) -> Self {
        Self { color, piece_type }
    }

    /// Parse a FEN piece letter; uppercase is white.
    pub fn from_char(c: char) -> Result<Piece> {
        Ok(Piece {
            color: Color::from_case(c),
            piece_type: PieceType::from_char(c)?,
        })
    }

    /// FEN letter, uppercase for white.
    pub fn to_char(&self) -> char {
        let c = self.piece_type.to_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn to_symbol(&self) -> &str {
        match (self.color, self.piece_type) {
            (Color::White, PieceType::Pawn) => "♙",
            (Color::White, PieceType::Knight) => "♘",
            (Color::White, PieceType::Bishop) => "♗",
            (Color::White, PieceType::Rook) => "♖",
            (Color::White, PieceType::Queen) => "♕",
            (Color::White, PieceType::King) => "♔",
            (Color::Black, PieceType::Pawn) => "♟︎",
            (Color::Black, PieceType::Knight) => "♞",
            (Color::Black, PieceType::Bishop) => "♝",
            (Color::Black, PieceType::Rook) => "♜",
            (Color::Black, PieceType::Queen) => "♛",
            (Color::Black, PieceType::King) => "♚",
        }
    }
}

/// Square index from 1-indexed rank and file.
#[inline(always)]
pub const fn pos_to_sq(rank: u8, file: u8) -> Square {
    (rank - 1) * 8 + (file - 1)
}

/// Rank (1-8) of a square
#[inline(always)]
pub const fn sq_rank(sq: Square) -> u8 {
    (sq >> 3) + 1
}

/// File (1-8) of a square
#[inline(always)]
pub const fn sq_file(sq: Square) -> u8 {
    (sq & 7) + 1
}

/// Parse a square like `e4`.
pub fn square_from_algebraic(s: &str) -> Result<Square> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        bail!("Algebraic square must be of length 2, got `{s}`.");
    }
    let (file_char, rank_char) = (bytes[0], bytes[1]);
    if !(b'a'..=b'h').contains(&file_char) || !(b'1'..=b'8').contains(&rank_char) {
        bail!("Square `{s}` is off the board.");
    }
    Ok(pos_to_sq(rank_char - b'0', file_char - b'a' + 1))
}

pub fn square_to_algebraic(sq: Square) -> String {
    format!(
        "{}{}",
        (sq_file(sq) - 1 + b'a') as char,
        (sq_rank(sq) + b'0') as char
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_char() {
        assert_eq!(Color::from_char('w').unwrap(), Color::White);
        assert_eq!(Color::from_char('b').unwrap(), Color::Black);
        assert!(Color::from_char('x').is_err());
    }

    #[test]
    fn test_other_color() {
        assert_eq!(Color::White.other_color(), Color::Black);
        assert_eq!(Color::Black.other_color(), Color::White);
    }

    #[test]
    fn test_piece_from_char() {
        assert_eq!(
            Piece::from_char('N').unwrap(),
            Piece::new(Color::White, PieceType::Knight)
        );
        assert_eq!(
            Piece::from_char('q').unwrap(),
            Piece::new(Color::Black, PieceType::Queen)
        );
        assert!(Piece::from_char('x').is_err());
        assert_eq!(Piece::new(Color::Black, PieceType::King).to_char(), 'k');
        assert_eq!(Piece::new(Color::White, PieceType::Pawn).to_char(), 'P');
    }

    #[test]
    fn test_piece_indices_are_dense() {
        for (i, pt) in ALL_PIECE_TYPES.iter().enumerate() {
            assert_eq!(pt.index(), i);
        }
    }

    #[test]
    fn test_square_algebraic() {
        assert_eq!(square_from_algebraic("a1").unwrap(), 0);
        assert_eq!(square_from_algebraic("h1").unwrap(), 7);
        assert_eq!(square_from_algebraic("e4").unwrap(), 28);
        assert_eq!(square_from_algebraic("h8").unwrap(), 63);
        assert!(square_from_algebraic("i1").is_err());
        assert!(square_from_algebraic("a9").is_err());
        assert!(square_from_algebraic("e").is_err());
        assert_eq!(square_to_algebraic(28), "e4");
        assert_eq!(square_to_algebraic(63), "h8");
    }

    #[test]
    fn test_rank_file() {
        let sq = pos_to_sq(4, 5);
        assert_eq!(sq_rank(sq), 4);
        assert_eq!(sq_file(sq), 5);
    }
}
