//! Stack-allocated move list for move generation.
//!
//! `MoveList` is a fixed-size array that avoids heap allocations during move
//! generation. Its capacity is the largest number of legal moves any chess position
//! has, so a full list means the generator is broken, not that the position is large.

use std::ops::Index;

use crate::moves::Move;

/// Maximum number of legal moves in any reachable chess position.
pub const MAX_MOVES: usize = 218;

#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    count: usize,
}

impl MoveList {
    /// Create a new empty move list.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            moves: [Move::NULL; MAX_MOVES],
            count: 0,
        }
    }

    /// Add a move to the list. Overflowing the list is an invariant violation and panics.
    #[inline(always)]
    pub fn push(&mut self, mv: Move) {
        assert!(self.count < MAX_MOVES, "MoveList overflow");
        self.moves[self.count] = mv;
        self.count += 1;
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Clear the list (reset count, no need to clear data).
    #[inline(always)]
    pub fn clear(&mut self) {
        self.count = 0;
    }

    #[inline]
    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.count]
    }

    /// Iterate over all moves (by value).
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Move> + '_ {
        self.as_slice().iter().copied()
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for MoveList {
    type Output = Move;

    fn index(&self, idx: usize) -> &Move {
        &self.as_slice()[idx]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = Move;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Move>>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter().copied()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoveList")
            .field("count", &self.count)
            .field(
                "moves",
                &self.as_slice().iter().map(|m| m.to_uci()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::MoveFlag;

    #[test]
    fn test_movelist_basic() {
        let mut list = MoveList::new();
        assert!(list.is_empty());

        let m1 = Move::new(12, 28, MoveFlag::PawnDoublePush); // e2e4
        let m2 = Move::new(12, 20, MoveFlag::None); // e2e3
        list.push(m1);
        list.push(m2);

        assert_eq!(list.len(), 2);
        assert_eq!(list[0], m1);
        assert_eq!(list[1], m2);
        assert!(list.contains(m2));
        assert!(!list.contains(Move::new(11, 27, MoveFlag::PawnDoublePush)));

        let moves: Vec<_> = list.iter().collect();
        assert_eq!(moves, vec![m1, m2]);

        list.clear();
        assert!(list.is_empty());
        assert!(!list.contains(m1));
    }

    #[test]
    #[should_panic(expected = "MoveList overflow")]
    fn test_movelist_overflow_panics() {
        let mut list = MoveList::new();
        for _ in 0..=MAX_MOVES {
            list.push(Move::new(0, 1, MoveFlag::None));
        }
    }
}
