/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not},
};

use super::{Color, Square};

/// A set of squares, stored as a 64-bit mask.
///
/// Bit `i` is set if and only if the square with index `i` is a member.
/// Set operations are available both as named `const` functions and as bitwise operators.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Bitboard(u64);

impl Bitboard {
    pub const EMPTY_BOARD: Self = Self(0);
    pub const FULL_BOARD: Self = Self(u64::MAX);

    pub const FILE_A: Self = Self(0x0101_0101_0101_0101);
    pub const FILE_B: Self = Self(Self::FILE_A.0 << 1);
    pub const FILE_C: Self = Self(Self::FILE_A.0 << 2);
    pub const FILE_D: Self = Self(Self::FILE_A.0 << 3);
    pub const FILE_E: Self = Self(Self::FILE_A.0 << 4);
    pub const FILE_F: Self = Self(Self::FILE_A.0 << 5);
    pub const FILE_G: Self = Self(Self::FILE_A.0 << 6);
    pub const FILE_H: Self = Self(Self::FILE_A.0 << 7);

    pub const RANK_1: Self = Self(0xFF);
    pub const RANK_2: Self = Self(Self::RANK_1.0 << 8);
    pub const RANK_3: Self = Self(Self::RANK_1.0 << 16);
    pub const RANK_4: Self = Self(Self::RANK_1.0 << 24);
    pub const RANK_5: Self = Self(Self::RANK_1.0 << 32);
    pub const RANK_6: Self = Self(Self::RANK_1.0 << 40);
    pub const RANK_7: Self = Self(Self::RANK_1.0 << 48);
    pub const RANK_8: Self = Self(Self::RANK_1.0 << 56);

    pub const CORNERS: Self = Self(0x8100_0000_0000_0081);
    pub const EDGES: Self = Self(Self::FILE_A.0 | Self::FILE_H.0 | Self::RANK_1.0 | Self::RANK_8.0);
    pub const LIGHT_SQUARES: Self = Self(0x55AA_55AA_55AA_55AA);
    pub const DARK_SQUARES: Self = Self(!Self::LIGHT_SQUARES.0);

    #[inline(always)]
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// A [`Bitboard`] containing only `square`.
    #[inline(always)]
    pub const fn from_square(square: Square) -> Self {
        Self(1 << square.index())
    }

    /// [`Bitboard::FULL_BOARD`] if `value` is `true`, else [`Bitboard::EMPTY_BOARD`].
    #[inline(always)]
    pub const fn from_bool(value: bool) -> Self {
        Self((value as u64).wrapping_neg())
    }

    /// The rank `color` pawns land on after a single push from their starting rank.
    #[inline(always)]
    pub const fn third_rank(color: Color) -> Self {
        match color {
            Color::White => Self::RANK_3,
            Color::Black => Self::RANK_6,
        }
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn is_nonempty(&self) -> bool {
        self.0 != 0
    }

    /// Returns `true` if this set holds two or more squares.
    #[inline(always)]
    pub const fn more_than_one(&self) -> bool {
        self.0 & self.0.wrapping_sub(1) != 0
    }

    /// Number of squares in this set.
    #[inline(always)]
    pub const fn population(&self) -> u32 {
        self.0.count_ones()
    }

    #[inline(always)]
    pub const fn contains(&self, square: Square) -> bool {
        self.0 & (1 << square.index()) != 0
    }

    /// Returns `true` if the two sets share any square.
    #[inline(always)]
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline(always)]
    pub fn set(&mut self, square: Square) {
        self.0 |= 1 << square.index();
    }

    #[inline(always)]
    pub fn clear(&mut self, square: Square) {
        self.0 &= !(1 << square.index());
    }

    #[inline(always)]
    pub fn toggle(&mut self, square: Square) {
        self.0 ^= 1 << square.index();
    }

    /// The lowest square in this set, if any.
    #[inline(always)]
    pub const fn lsb(&self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            Some(self.lsb_unchecked())
        }
    }

    /// The lowest square in this set. Meaningless on an empty set.
    #[inline(always)]
    pub const fn lsb_unchecked(&self) -> Square {
        Square::from_index_unchecked(self.0.trailing_zeros() as usize)
    }

    /// The highest square in this set, if any.
    #[inline(always)]
    pub const fn msb(&self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            Some(Square::from_index_unchecked(63 - self.0.leading_zeros() as usize))
        }
    }

    /// Removes the lowest square from this set and returns it.
    ///
    /// # Example
    /// ```
    /// # use chesskit_types::{Bitboard, Square};
    /// let mut bb = Square::C3.bitboard() | Square::A5;
    /// assert_eq!(bb.pop_lsb(), Some(Square::C3));
    /// assert_eq!(bb.pop_lsb(), Some(Square::A5));
    /// assert_eq!(bb.pop_lsb(), None);
    /// ```
    #[inline(always)]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        let square = self.lsb()?;
        self.clear_lsb();
        Some(square)
    }

    #[inline(always)]
    pub fn clear_lsb(&mut self) {
        self.0 &= self.0.wrapping_sub(1);
    }

    /// If this set holds exactly one square, returns it.
    #[inline(always)]
    pub const fn to_square(&self) -> Option<Square> {
        if self.0 != 0 && !self.more_than_one() {
            self.lsb()
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn and(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline(always)]
    pub const fn or(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline(always)]
    pub const fn xor(self, other: Self) -> Self {
        Self(self.0 ^ other.0)
    }

    #[inline(always)]
    pub const fn not(self) -> Self {
        Self(!self.0)
    }

    /// Squares in `self` that are not in `other`.
    #[inline(always)]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[inline(always)]
    pub const fn shl(self, n: u32) -> Self {
        Self(self.0 << n)
    }

    #[inline(always)]
    pub const fn shr(self, n: u32) -> Self {
        Self(self.0 >> n)
    }

    /// Shifts every square one rank up. Squares on the eighth rank fall off.
    #[inline(always)]
    pub const fn north(self) -> Self {
        Self(self.0 << 8)
    }

    /// Shifts every square one rank down. Squares on the first rank fall off.
    #[inline(always)]
    pub const fn south(self) -> Self {
        Self(self.0 >> 8)
    }

    /// Shifts every square one file toward `h`, without wrapping onto the `a` file.
    ///
    /// # Example
    /// ```
    /// # use chesskit_types::Bitboard;
    /// assert_eq!(Bitboard::FILE_H.east(), Bitboard::EMPTY_BOARD);
    /// assert_eq!(Bitboard::FILE_A.east(), Bitboard::FILE_B);
    /// ```
    #[inline(always)]
    pub const fn east(self) -> Self {
        Self((self.0 & !Self::FILE_H.0) << 1)
    }

    /// Shifts every square one file toward `a`, without wrapping onto the `h` file.
    #[inline(always)]
    pub const fn west(self) -> Self {
        Self((self.0 & !Self::FILE_A.0) >> 1)
    }

    /// Shifts every square `n` ranks toward `color`'s promotion rank.
    #[inline(always)]
    pub const fn forward_by(self, color: Color, n: u32) -> Self {
        match color {
            Color::White => Self(self.0 << (8 * n)),
            Color::Black => Self(self.0 >> (8 * n)),
        }
    }

    /// Shifts every square `n` ranks toward `color`'s back rank.
    #[inline(always)]
    pub const fn backward_by(self, color: Color, n: u32) -> Self {
        self.forward_by(color.opponent(), n)
    }

    /// Iterates over the squares of this set in ascending order.
    #[inline(always)]
    pub const fn iter(&self) -> BitboardIter {
        BitboardIter { bits: *self }
    }

    /// Formats the raw bits as hexadecimal, such as `0x00000000000000FF`.
    pub fn to_hex_string(&self) -> String {
        format!("0x{:016X}", self.0)
    }
}

impl From<Square> for Bitboard {
    #[inline(always)]
    fn from(value: Square) -> Self {
        Self::from_square(value)
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<T: IntoIterator<Item = Square>>(iter: T) -> Self {
        iter.into_iter().fold(Self::EMPTY_BOARD, |bb, sq| bb | sq)
    }
}

macro_rules! impl_bitwise_op {
    ($op:ident, $fn:ident, $assign_op:ident, $assign_fn:ident, $sym:tt) => {
        impl $op for Bitboard {
            type Output = Self;
            #[inline(always)]
            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0 $sym rhs.0)
            }
        }

        impl $op<Square> for Bitboard {
            type Output = Self;
            #[inline(always)]
            fn $fn(self, rhs: Square) -> Self::Output {
                Self(self.0 $sym rhs.bitboard().0)
            }
        }

        impl $assign_op for Bitboard {
            #[inline(always)]
            fn $assign_fn(&mut self, rhs: Self) {
                self.0 = self.0 $sym rhs.0;
            }
        }

        impl $assign_op<Square> for Bitboard {
            #[inline(always)]
            fn $assign_fn(&mut self, rhs: Square) {
                self.0 = self.0 $sym rhs.bitboard().0;
            }
        }
    };
}

impl_bitwise_op!(BitAnd, bitand, BitAndAssign, bitand_assign, &);
impl_bitwise_op!(BitOr, bitor, BitOrAssign, bitor_assign, |);
impl_bitwise_op!(BitXor, bitxor, BitXorAssign, bitxor_assign, ^);

impl Not for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over the squares of a [`Bitboard`].
pub struct BitboardIter {
    bits: Bitboard,
}

impl Iterator for BitboardIter {
    type Item = Square;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.bits.pop_lsb()
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.bits.population() as usize;
        (size, Some(size))
    }
}

impl ExactSizeIterator for BitboardIter {}

impl fmt::Display for Bitboard {
    /// Prints this set as an 8x8 grid with the eighth rank on top.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let bit = self.0 >> (rank * 8 + file) & 1;
                let c = if bit == 1 { 'X' } else { '.' };
                if file == 7 {
                    write!(f, "{c}")?;
                } else {
                    write!(f, "{c} ")?;
                }
            }
            if rank != 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shifts_do_not_wrap() {
        assert_eq!(Bitboard::FILE_A.west(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::RANK_8.north(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::RANK_1.south(), Bitboard::EMPTY_BOARD);
        assert_eq!(Square::H4.bitboard().east(), Bitboard::EMPTY_BOARD);
        assert_eq!(Square::D4.bitboard().east(), Square::E4.bitboard());
    }

    #[test]
    fn test_iteration_is_ascending() {
        let bb = Bitboard::RANK_1 | Square::H8;
        let squares = bb.iter().collect::<Vec<_>>();
        assert_eq!(squares.len(), 9);
        assert!(squares.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(squares.last(), Some(&Square::H8));
    }

    #[test]
    fn test_pawn_push_directions() {
        let e2 = Square::E2.bitboard();
        assert_eq!(e2.forward_by(Color::White, 1), Square::E3.bitboard());
        assert_eq!(e2.forward_by(Color::Black, 1), Square::E1.bitboard());
        assert_eq!(e2.backward_by(Color::Black, 2), Square::E4.bitboard());
    }

    #[test]
    fn test_population_and_more_than_one() {
        assert_eq!(Bitboard::CORNERS.population(), 4);
        assert!(Bitboard::CORNERS.more_than_one());
        assert!(!Square::A1.bitboard().more_than_one());
        assert_eq!(Square::A1.bitboard().to_square(), Some(Square::A1));
        assert_eq!(Bitboard::CORNERS.to_square(), None);
    }

    #[test]
    fn test_square_colors() {
        assert!(Bitboard::LIGHT_SQUARES.contains(Square::H1));
        assert!(Bitboard::DARK_SQUARES.contains(Square::A1));
        for square in Square::iter() {
            assert_eq!(Bitboard::LIGHT_SQUARES.contains(square), square.is_light());
        }
    }
}
