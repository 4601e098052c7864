/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not},
};

use super::{Color, Square};

/// Which side of the board a castling move goes to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CastlingSide {
    /// Short castling, `O-O`.
    King,
    /// Long castling, `O-O-O`.
    Queen,
}

impl CastlingSide {
    /// Where the King ends up after castling to this side.
    #[inline(always)]
    pub const fn king_destination(&self, color: Color) -> Square {
        match self {
            Self::King => Square::G1.rank_relative_to(color),
            Self::Queen => Square::C1.rank_relative_to(color),
        }
    }

    /// Where the Rook ends up after castling to this side.
    #[inline(always)]
    pub const fn rook_destination(&self, color: Color) -> Square {
        match self {
            Self::King => Square::F1.rank_relative_to(color),
            Self::Queen => Square::D1.rank_relative_to(color),
        }
    }
}

/// A set of the four castling rights, stored as a bitmask.
///
/// | bit | right |
/// |-----|-------|
/// | `1` | White short |
/// | `2` | White long |
/// | `4` | Black short |
/// | `8` | Black long |
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct CastleRight(u8);

impl CastleRight {
    pub const NONE: Self = Self(0);
    pub const WHITE_OO: Self = Self(1);
    pub const WHITE_OOO: Self = Self(2);
    pub const BLACK_OO: Self = Self(4);
    pub const BLACK_OOO: Self = Self(8);

    pub const KING_SIDE: Self = Self(Self::WHITE_OO.0 | Self::BLACK_OO.0);
    pub const QUEEN_SIDE: Self = Self(Self::WHITE_OOO.0 | Self::BLACK_OOO.0);
    pub const WHITE: Self = Self(Self::WHITE_OO.0 | Self::WHITE_OOO.0);
    pub const BLACK: Self = Self(Self::BLACK_OO.0 | Self::BLACK_OOO.0);
    pub const ANY: Self = Self(Self::WHITE.0 | Self::BLACK.0);

    /// Number of distinct sets of rights.
    pub const COUNT: usize = 16;

    /// The single right for `color` on `side`.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// assert_eq!(CastleRight::new(Color::Black, CastlingSide::Queen), CastleRight::BLACK_OOO);
    /// ```
    #[inline(always)]
    pub const fn new(color: Color, side: CastlingSide) -> Self {
        let base = match side {
            CastlingSide::King => Self::WHITE_OO.0,
            CastlingSide::Queen => Self::WHITE_OOO.0,
        };
        Self(base << (2 * color.index()))
    }

    /// Both rights of `color`.
    #[inline(always)]
    pub const fn for_color(color: Color) -> Self {
        Self(Self::WHITE.0 << (2 * color.index()))
    }

    /// The four single rights, in FEN order (`K`, `Q`, `k`, `q`).
    #[inline(always)]
    pub const fn all() -> [Self; 4] {
        [
            Self::WHITE_OO,
            Self::WHITE_OOO,
            Self::BLACK_OO,
            Self::BLACK_OOO,
        ]
    }

    /// Returns `true` if any right in `other` is also in `self`.
    #[inline(always)]
    pub const fn has(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// `self` with every right in `other` added.
    #[inline(always)]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// `self` with every right in `other` removed.
    #[inline(always)]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Index in `0..16`, for lookup tables.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn inner(&self) -> u8 {
        self.0
    }

    /// The color of a single right.
    #[inline(always)]
    pub const fn color(&self) -> Color {
        Color::from_bool(self.0 & Self::BLACK.0 != 0)
    }

    /// The side of a single right.
    #[inline(always)]
    pub const fn side(&self) -> CastlingSide {
        if self.0 & Self::KING_SIDE.0 != 0 {
            CastlingSide::King
        } else {
            CastlingSide::Queen
        }
    }

    /// Where the Rook of a single right starts in standard chess.
    ///
    /// In Chess960 the Rook may start elsewhere; see `Position::castling_rook_square`.
    #[inline(always)]
    pub const fn default_rook_square(&self) -> Square {
        let square = match self.side() {
            CastlingSide::King => Square::H1,
            CastlingSide::Queen => Square::A1,
        };
        square.rank_relative_to(self.color())
    }

    /// FEN letter of a single right.
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self.0 {
            1 => 'K',
            2 => 'Q',
            4 => 'k',
            _ => 'q',
        }
    }

    /// Standard FEN text of this set, such as `"KQkq"` or `"-"`.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let rights = CastleRight::WHITE_OO | CastleRight::BLACK;
    /// assert_eq!(rights.to_uci(), "Kkq");
    /// assert_eq!(CastleRight::NONE.to_uci(), "-");
    /// ```
    pub fn to_uci(&self) -> String {
        if self.is_empty() {
            return String::from("-");
        }
        Self::all()
            .into_iter()
            .filter(|right| self.has(*right))
            .map(|right| right.char())
            .collect()
    }
}

impl BitOr for CastleRight {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self::Output {
        self.with(rhs)
    }
}

impl BitOrAssign for CastleRight {
    #[inline(always)]
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.with(rhs);
    }
}

impl BitAnd for CastleRight {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for CastleRight {
    #[inline(always)]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for CastleRight {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        Self(!self.0 & Self::ANY.0)
    }
}

impl fmt::Display for CastleRight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl fmt::Debug for CastleRight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CastleRight({})", self.to_uci())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_rights() {
        for right in CastleRight::all() {
            assert_eq!(CastleRight::new(right.color(), right.side()), right);
            assert!(CastleRight::for_color(right.color()).has(right));
        }
        assert_eq!(CastleRight::BLACK_OO.default_rook_square(), Square::H8);
        assert_eq!(CastleRight::WHITE_OOO.default_rook_square(), Square::A1);
    }

    #[test]
    fn test_removing_rights() {
        let rights = CastleRight::ANY.without(CastleRight::WHITE);
        assert_eq!(rights, CastleRight::BLACK);
        assert_eq!(!CastleRight::BLACK, CastleRight::WHITE);
        assert_eq!(rights.to_uci(), "kq");
    }
}
