/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut, Mul},
    str::FromStr,
};

use anyhow::{anyhow, bail, Result};

use super::{Bitboard, Color};

/// A vertical column of the chessboard, `a` through `h`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct File(u8);

impl File {
    pub const A: Self = Self(0);
    pub const B: Self = Self(1);
    pub const C: Self = Self(2);
    pub const D: Self = Self(3);
    pub const E: Self = Self(4);
    pub const F: Self = Self(5);
    pub const G: Self = Self(6);
    pub const H: Self = Self(7);

    /// Number of files on a board.
    pub const COUNT: usize = 8;

    /// Creates a new [`File`] from a value in `0..8`, returning `None` otherwise.
    #[inline(always)]
    pub const fn new(file: u8) -> Option<Self> {
        if file < Self::COUNT as u8 {
            Some(Self(file))
        } else {
            None
        }
    }

    /// Creates a new [`File`] without checking that `file` is in `0..8`.
    #[inline(always)]
    pub const fn new_unchecked(file: u8) -> Self {
        debug_assert!(file < Self::COUNT as u8);
        Self(file)
    }

    /// Parses a [`File`] from a character in `a..=h` (case insensitive).
    ///
    /// # Example
    /// ```
    /// # use chesskit_types::File;
    /// assert_eq!(File::from_char('c').unwrap(), File::C);
    /// assert_eq!(File::from_char('H').unwrap(), File::H);
    /// assert!(File::from_char('i').is_err());
    /// ```
    pub fn from_char(c: char) -> Result<Self> {
        let lower = c.to_ascii_lowercase();
        if !('a'..='h').contains(&lower) {
            bail!("Invalid char for File: {c:?}. Expected one of a-h");
        }
        Ok(Self(lower as u8 - b'a'))
    }

    /// Lowercase character of this [`File`].
    #[inline(always)]
    pub const fn char(&self) -> char {
        (self.0 + b'a') as char
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn inner(&self) -> u8 {
        self.0
    }

    /// Absolute distance between two files.
    #[inline(always)]
    pub const fn abs_diff(self, other: Self) -> u8 {
        self.0.abs_diff(other.0)
    }

    /// All squares on this file.
    #[inline(always)]
    pub const fn bitboard(&self) -> Bitboard {
        Bitboard::FILE_A.shl(self.0 as u32)
    }

    /// Iterates over all files, `a` first.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..Self::COUNT as u8).map(Self)
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

/// A horizontal row of the chessboard, `1` through `8`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Rank(u8);

impl Rank {
    pub const ONE: Self = Self(0);
    pub const TWO: Self = Self(1);
    pub const THREE: Self = Self(2);
    pub const FOUR: Self = Self(3);
    pub const FIVE: Self = Self(4);
    pub const SIX: Self = Self(5);
    pub const SEVEN: Self = Self(6);
    pub const EIGHT: Self = Self(7);

    /// Number of ranks on a board.
    pub const COUNT: usize = 8;

    /// Creates a new [`Rank`] from a value in `0..8`, returning `None` otherwise.
    #[inline(always)]
    pub const fn new(rank: u8) -> Option<Self> {
        if rank < Self::COUNT as u8 {
            Some(Self(rank))
        } else {
            None
        }
    }

    /// Creates a new [`Rank`] without checking that `rank` is in `0..8`.
    #[inline(always)]
    pub const fn new_unchecked(rank: u8) -> Self {
        debug_assert!(rank < Self::COUNT as u8);
        Self(rank)
    }

    /// Parses a [`Rank`] from a character in `1..=8`.
    pub fn from_char(c: char) -> Result<Self> {
        if !('1'..='8').contains(&c) {
            bail!("Invalid char for Rank: {c:?}. Expected one of 1-8");
        }
        Ok(Self(c as u8 - b'1'))
    }

    /// The rank on which `color`'s pieces start.
    #[inline(always)]
    pub const fn first(color: Color) -> Self {
        Self::ONE.relative_to(color)
    }

    /// The rank on which `color`'s pawns start.
    #[inline(always)]
    pub const fn second(color: Color) -> Self {
        Self::TWO.relative_to(color)
    }

    /// The rank a `color` pawn lands on after a double push.
    #[inline(always)]
    pub const fn fourth(color: Color) -> Self {
        Self::FOUR.relative_to(color)
    }

    /// The rank just before promotion for `color`.
    #[inline(always)]
    pub const fn seventh(color: Color) -> Self {
        Self::SEVEN.relative_to(color)
    }

    /// The promotion rank for `color`.
    #[inline(always)]
    pub const fn eighth(color: Color) -> Self {
        Self::EIGHT.relative_to(color)
    }

    /// Mirrors this rank vertically if `color` is Black.
    ///
    /// # Example
    /// ```
    /// # use chesskit_types::{Color, Rank};
    /// assert_eq!(Rank::TWO.relative_to(Color::White), Rank::TWO);
    /// assert_eq!(Rank::TWO.relative_to(Color::Black), Rank::SEVEN);
    /// ```
    #[inline(always)]
    pub const fn relative_to(self, color: Color) -> Self {
        Self(self.0 ^ (7 * color.index() as u8))
    }

    /// Character of this [`Rank`], `'1'` through `'8'`.
    #[inline(always)]
    pub const fn char(&self) -> char {
        (self.0 + b'1') as char
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn inner(&self) -> u8 {
        self.0
    }

    /// Absolute distance between two ranks.
    #[inline(always)]
    pub const fn abs_diff(self, other: Self) -> u8 {
        self.0.abs_diff(other.0)
    }

    /// All squares on this rank.
    #[inline(always)]
    pub const fn bitboard(&self) -> Bitboard {
        Bitboard::RANK_1.shl(8 * self.0 as u32)
    }

    /// Iterates over all ranks, `1` first.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..Self::COUNT as u8).map(Self)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

/// One of the 64 squares of a chessboard, indexed `a1 = 0` through `h8 = 63`.
///
/// The absence of a square is expressed as `Option<Square>`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Square(u8);

impl Square {
    pub const A1: Self = Self(0);
    pub const B1: Self = Self(1);
    pub const C1: Self = Self(2);
    pub const D1: Self = Self(3);
    pub const E1: Self = Self(4);
    pub const F1: Self = Self(5);
    pub const G1: Self = Self(6);
    pub const H1: Self = Self(7);
    pub const A2: Self = Self(8);
    pub const B2: Self = Self(9);
    pub const C2: Self = Self(10);
    pub const D2: Self = Self(11);
    pub const E2: Self = Self(12);
    pub const F2: Self = Self(13);
    pub const G2: Self = Self(14);
    pub const H2: Self = Self(15);
    pub const A3: Self = Self(16);
    pub const B3: Self = Self(17);
    pub const C3: Self = Self(18);
    pub const D3: Self = Self(19);
    pub const E3: Self = Self(20);
    pub const F3: Self = Self(21);
    pub const G3: Self = Self(22);
    pub const H3: Self = Self(23);
    pub const A4: Self = Self(24);
    pub const B4: Self = Self(25);
    pub const C4: Self = Self(26);
    pub const D4: Self = Self(27);
    pub const E4: Self = Self(28);
    pub const F4: Self = Self(29);
    pub const G4: Self = Self(30);
    pub const H4: Self = Self(31);
    pub const A5: Self = Self(32);
    pub const B5: Self = Self(33);
    pub const C5: Self = Self(34);
    pub const D5: Self = Self(35);
    pub const E5: Self = Self(36);
    pub const F5: Self = Self(37);
    pub const G5: Self = Self(38);
    pub const H5: Self = Self(39);
    pub const A6: Self = Self(40);
    pub const B6: Self = Self(41);
    pub const C6: Self = Self(42);
    pub const D6: Self = Self(43);
    pub const E6: Self = Self(44);
    pub const F6: Self = Self(45);
    pub const G6: Self = Self(46);
    pub const H6: Self = Self(47);
    pub const A7: Self = Self(48);
    pub const B7: Self = Self(49);
    pub const C7: Self = Self(50);
    pub const D7: Self = Self(51);
    pub const E7: Self = Self(52);
    pub const F7: Self = Self(53);
    pub const G7: Self = Self(54);
    pub const H7: Self = Self(55);
    pub const A8: Self = Self(56);
    pub const B8: Self = Self(57);
    pub const C8: Self = Self(58);
    pub const D8: Self = Self(59);
    pub const E8: Self = Self(60);
    pub const F8: Self = Self(61);
    pub const G8: Self = Self(62);
    pub const H8: Self = Self(63);

    /// Number of squares on a board.
    pub const COUNT: usize = 64;

    /// Creates a [`Square`] from a [`File`] and a [`Rank`].
    ///
    /// # Example
    /// ```
    /// # use chesskit_types::{File, Rank, Square};
    /// assert_eq!(Square::new(File::E, Rank::FOUR), Square::E4);
    /// ```
    #[inline(always)]
    pub const fn new(file: File, rank: Rank) -> Self {
        Self(rank.0 << 3 | file.0)
    }

    /// Creates a [`Square`] from an index in `0..64`, returning `None` otherwise.
    #[inline(always)]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Creates a [`Square`] from an index without checking that it is in `0..64`.
    #[inline(always)]
    pub const fn from_index_unchecked(index: usize) -> Self {
        debug_assert!(index < Self::COUNT);
        Self(index as u8)
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn inner(&self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub const fn file(&self) -> File {
        File(self.0 & 7)
    }

    #[inline(always)]
    pub const fn rank(&self) -> Rank {
        Rank(self.0 >> 3)
    }

    /// A [`Bitboard`] containing only this square.
    #[inline(always)]
    pub const fn bitboard(&self) -> Bitboard {
        Bitboard::from_square(*self)
    }

    /// Offsets this square by `df` files and `dr` ranks, returning `None` if that leaves the board.
    ///
    /// # Example
    /// ```
    /// # use chesskit_types::Square;
    /// assert_eq!(Square::B1.offset(-1, 2), Some(Square::A3));
    /// assert_eq!(Square::B1.offset(-2, 1), None);
    /// ```
    #[inline(always)]
    pub const fn offset(&self, df: i8, dr: i8) -> Option<Self> {
        let file = self.file().0 as i8 + df;
        let rank = self.rank().0 as i8 + dr;
        if file < 0 || file > 7 || rank < 0 || rank > 7 {
            None
        } else {
            Some(Self((rank as u8) << 3 | file as u8))
        }
    }

    /// The square `n` ranks ahead of this one, from `color`'s point of view.
    ///
    /// # Example
    /// ```
    /// # use chesskit_types::{Color, Square};
    /// assert_eq!(Square::E2.forward_by(Color::White, 2), Some(Square::E4));
    /// assert_eq!(Square::E7.forward_by(Color::Black, 2), Some(Square::E5));
    /// assert_eq!(Square::E8.forward_by(Color::White, 1), None);
    /// ```
    #[inline(always)]
    pub const fn forward_by(&self, color: Color, n: u8) -> Option<Self> {
        let n = n as i8;
        match color {
            Color::White => self.offset(0, n),
            Color::Black => self.offset(0, -n),
        }
    }

    /// The square `n` ranks behind this one, from `color`'s point of view.
    #[inline(always)]
    pub const fn backward_by(&self, color: Color, n: u8) -> Option<Self> {
        self.forward_by(color.opponent(), n)
    }

    /// Mirrors this square vertically if `color` is Black.
    ///
    /// Useful for naming squares from a side's own point of view, such as `Square::G1.rank_relative_to(color)`.
    #[inline(always)]
    pub const fn rank_relative_to(self, color: Color) -> Self {
        Self(self.0 ^ (56 * color.index() as u8))
    }

    /// The rank of this square from `color`'s point of view.
    #[inline(always)]
    pub const fn relative_rank(&self, color: Color) -> Rank {
        self.rank().relative_to(color)
    }

    /// Chebyshev (king-step) distance between two squares.
    ///
    /// # Example
    /// ```
    /// # use chesskit_types::Square;
    /// assert_eq!(Square::A1.distance(Square::H8), 7);
    /// assert_eq!(Square::E4.distance(Square::F6), 2);
    /// ```
    #[inline(always)]
    pub const fn distance(&self, other: Self) -> u8 {
        let df = self.file().abs_diff(other.file());
        let dr = self.rank().abs_diff(other.rank());
        if df > dr {
            df
        } else {
            dr
        }
    }

    /// Returns `true` if this is a light square.
    #[inline(always)]
    pub const fn is_light(&self) -> bool {
        (self.file().0 + self.rank().0) % 2 == 1
    }

    /// Parses a [`Square`] from coordinate text like `"e4"`.
    ///
    /// # Example
    /// ```
    /// # use chesskit_types::Square;
    /// assert_eq!(Square::from_uci("e4").unwrap(), Square::E4);
    /// assert!(Square::from_uci("e9").is_err());
    /// assert!(Square::from_uci("e").is_err());
    /// ```
    pub fn from_uci(uci: &str) -> Result<Self> {
        let mut chars = uci.chars();
        let file = chars
            .next()
            .ok_or(anyhow!("Invalid square {uci:?}: missing file"))?;
        let rank = chars
            .next()
            .ok_or(anyhow!("Invalid square {uci:?}: missing rank"))?;
        if chars.next().is_some() {
            bail!("Invalid square {uci:?}: trailing characters");
        }

        Ok(Self::new(File::from_char(file)?, Rank::from_char(rank)?))
    }

    /// Coordinate text of this square, like `"e4"`.
    pub fn to_uci(&self) -> String {
        format!("{}{}", self.file(), self.rank())
    }

    /// Iterates over all squares, `a1` first.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..Self::COUNT as u8).map(Self)
    }
}

impl Mul<Rank> for File {
    type Output = Square;
    #[inline(always)]
    fn mul(self, rhs: Rank) -> Self::Output {
        Square::new(self, rhs)
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl<T> Index<Square> for [T; Square::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Square) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<Square> for [T; Square::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_parts() {
        for square in Square::iter() {
            assert_eq!(Square::new(square.file(), square.rank()), square);
        }
        assert_eq!(Square::C6.file(), File::C);
        assert_eq!(Square::C6.rank(), Rank::SIX);
    }

    #[test]
    fn test_relative_squares() {
        assert_eq!(Square::G1.rank_relative_to(Color::Black), Square::G8);
        assert_eq!(Square::G1.rank_relative_to(Color::White), Square::G1);
        assert_eq!(Square::A7.relative_rank(Color::Black), Rank::TWO);
        assert_eq!(Square::D5.backward_by(Color::White, 1), Some(Square::D4));
        assert_eq!(Square::D5.backward_by(Color::Black, 1), Some(Square::D6));
    }

    #[test]
    fn test_uci_round_trip() {
        for square in Square::iter() {
            assert_eq!(Square::from_uci(&square.to_uci()).unwrap(), square);
        }
    }
}
