/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Result};

use super::{
    CastleRight, CastlingSide, ChessMode, File, PieceKind, Position, Square, MAX_NUM_MOVES,
};

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// What a [`Move`] does beyond moving a piece from one square to another.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum MoveKind {
    /// Quiet moves, captures, and pawn pushes (single or double).
    Normal,
    /// A pawn reaching the last rank, optionally capturing.
    Promotion,
    /// A pawn capturing the pawn that just double-pushed past it.
    EnPassant,
    /// The King castling. Encoded as the King moving onto its own Rook's square.
    Castling,
}

impl MoveKind {
    #[inline(always)]
    const fn from_bits(bits: u16) -> Self {
        match bits & 0b11 {
            0 => Self::Normal,
            1 => Self::Promotion,
            2 => Self::EnPassant,
            _ => Self::Castling,
        }
    }
}

/// A move, packed into 16 bits.
///
/// | bits | field |
/// |------|-------|
/// | `0..6` | source square |
/// | `6..12` | destination square |
/// | `12..14` | promotion kind, offset from Knight |
/// | `14..16` | [`MoveKind`] |
///
/// Castling moves store the castling Rook's square as the destination, so the same
/// encoding works for standard chess and Chess960.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Move(u16);

impl Move {
    /// A move that does nothing. Never produced by the move generator.
    pub const NULL: Self = Self(0);

    const SQUARE_MASK: u16 = 0b11_1111;
    const TO_SHIFT: u16 = 6;
    const PROMOTION_SHIFT: u16 = 12;
    const KIND_SHIFT: u16 = 14;

    /// Creates a new [`Move`] of the given kind. Use [`Move::new_promotion`] for promotions.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let mv = Move::new(Square::E2, Square::E4, MoveKind::Normal);
    /// assert_eq!(mv.from(), Square::E2);
    /// assert_eq!(mv.to(), Square::E4);
    /// assert_eq!(mv.promotion(), None);
    /// ```
    #[inline(always)]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self(
            from.inner() as u16
                | (to.inner() as u16) << Self::TO_SHIFT
                | (kind as u16) << Self::KIND_SHIFT,
        )
    }

    /// Creates a promotion to `promotion`, which must be a Knight, Bishop, Rook, or Queen.
    #[inline(always)]
    pub const fn new_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        let promo_bits = (promotion.bits() - PieceKind::Knight.bits()) as u16;
        Self(
            Self::new(from, to, MoveKind::Promotion).0 | promo_bits << Self::PROMOTION_SHIFT,
        )
    }

    #[inline(always)]
    pub const fn from(&self) -> Square {
        Square::from_index_unchecked((self.0 & Self::SQUARE_MASK) as usize)
    }

    #[inline(always)]
    pub const fn to(&self) -> Square {
        Square::from_index_unchecked((self.0 >> Self::TO_SHIFT & Self::SQUARE_MASK) as usize)
    }

    #[inline(always)]
    pub const fn kind(&self) -> MoveKind {
        MoveKind::from_bits(self.0 >> Self::KIND_SHIFT)
    }

    /// Source, destination, and kind of this move.
    #[inline(always)]
    pub const fn parts(&self) -> (Square, Square, MoveKind) {
        (self.from(), self.to(), self.kind())
    }

    /// The piece kind a pawn becomes, if this is a promotion.
    #[inline(always)]
    pub const fn promotion(&self) -> Option<PieceKind> {
        if self.is_promotion() {
            let bits = (self.0 >> Self::PROMOTION_SHIFT & 0b11) as u8;
            Some(PieceKind::from_bits_unchecked(bits + PieceKind::Knight.bits()))
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn is_null(&self) -> bool {
        self.0 == Self::NULL.0
    }

    #[inline(always)]
    pub const fn is_normal(&self) -> bool {
        matches!(self.kind(), MoveKind::Normal)
    }

    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        matches!(self.kind(), MoveKind::Promotion)
    }

    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        matches!(self.kind(), MoveKind::EnPassant)
    }

    #[inline(always)]
    pub const fn is_castling(&self) -> bool {
        matches!(self.kind(), MoveKind::Castling)
    }

    /// For castling moves, the side castled to.
    #[inline(always)]
    pub const fn castling_side(&self) -> Option<CastlingSide> {
        if !self.is_castling() {
            None
        } else if self.to().inner() > self.from().inner() {
            Some(CastlingSide::King)
        } else {
            Some(CastlingSide::Queen)
        }
    }

    #[inline(always)]
    pub const fn inner(&self) -> u16 {
        self.0
    }

    /// Parses UCI move text like `"e2e4"` or `"a7a8q"` in the context of `position`.
    ///
    /// Castling may be written as the King's destination (`"e1g1"`) or, as Chess960 GUIs do,
    /// as the King moving onto its own Rook (`"e1h1"`).
    ///
    /// This checks the text is well-formed and that a piece of the side to move stands on the
    /// source square. It does not check that the move is legal; see [`Position::is_legal`].
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let position = Position::default();
    /// let mv = Move::from_uci(&position, "e2e4").unwrap();
    /// assert_eq!(mv, Move::new(Square::E2, Square::E4, MoveKind::Normal));
    /// assert!(Move::from_uci(&position, "e3e4").is_err());
    /// ```
    pub fn from_uci(position: &Position, uci: &str) -> Result<Self> {
        let uci = uci.trim();
        if !uci.is_ascii() || !(4..=5).contains(&uci.len()) {
            bail!("Invalid UCI move {uci:?}: expected 4 or 5 characters");
        }

        let from = Square::from_uci(&uci[0..2])?;
        let to = Square::from_uci(&uci[2..4])?;

        let Some(piece) = position.piece_at(from) else {
            bail!("Invalid UCI move {uci:?}: no piece on {from}");
        };
        let color = position.side_to_move();
        if piece.color() != color {
            bail!("Invalid UCI move {uci:?}: the piece on {from} is not {}'s", color.name());
        }

        if let Some(c) = uci.chars().nth(4) {
            let promotion = PieceKind::from_uci(c)?;
            if matches!(promotion, PieceKind::Pawn | PieceKind::King) || !piece.is_pawn() {
                bail!("Invalid UCI move {uci:?}: illegal promotion");
            }
            return Ok(Self::new_promotion(from, to, promotion));
        }

        if piece.is_pawn() && Some(to) == position.ep_square() {
            return Ok(Self::new(from, to, MoveKind::EnPassant));
        }

        if piece.is_king() {
            // King onto its own Rook.
            if position
                .piece_at(to)
                .is_some_and(|target| target.is_rook() && target.color() == color)
            {
                return Ok(Self::new(from, to, MoveKind::Castling));
            }

            // King two files sideways in standard notation.
            if position.chess_mode() == ChessMode::Normal
                && from.rank() == to.rank()
                && from.file().abs_diff(to.file()) == 2
            {
                let side = if to.file() > from.file() {
                    CastlingSide::King
                } else {
                    CastlingSide::Queen
                };
                let right = CastleRight::new(color, side);
                if let Some(rook) = position.castling_rook_square(right) {
                    return Ok(Self::new(from, rook, MoveKind::Castling));
                }
            }
        }

        Ok(Self::new(from, to, MoveKind::Normal))
    }

    /// UCI text of this move.
    ///
    /// In standard chess, castling is written as the King's destination (`e1g1`).
    /// In Chess960 it is written as the King moving onto its Rook (`e1h1`).
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let castle = Move::new(Square::E1, Square::H1, MoveKind::Castling);
    /// assert_eq!(castle.to_uci(ChessMode::Normal), "e1g1");
    /// assert_eq!(castle.to_uci(ChessMode::Chess960), "e1h1");
    /// ```
    pub fn to_uci(&self, mode: ChessMode) -> String {
        let (from, mut to, _) = self.parts();

        if let Some(side) = self.castling_side() {
            if mode == ChessMode::Normal {
                let file = match side {
                    CastlingSide::King => File::G,
                    CastlingSide::Queen => File::C,
                };
                to = Square::new(file, from.rank());
            }
        }

        match self.promotion() {
            Some(promotion) => format!("{from}{to}{promotion}"),
            None => format!("{from}{to}"),
        }
    }
}

impl fmt::Display for Move {
    /// Displays this move as stored, with castling shown as King-onto-Rook.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "0000");
        }
        write!(f, "{}", self.to_uci(ChessMode::Chess960))
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({:?})", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_packing() {
        for promotion in PieceKind::promotions() {
            let mv = Move::new_promotion(Square::B7, Square::A8, promotion);
            assert_eq!(mv.parts(), (Square::B7, Square::A8, MoveKind::Promotion));
            assert_eq!(mv.promotion(), Some(promotion));
        }

        let ep = Move::new(Square::E5, Square::D6, MoveKind::EnPassant);
        assert!(ep.is_en_passant());
        assert_eq!(ep.promotion(), None);
        assert!(Move::NULL.is_null());
        assert!(!ep.is_null());
    }

    #[test]
    fn test_castling_side() {
        let short = Move::new(Square::E8, Square::H8, MoveKind::Castling);
        let long = Move::new(Square::E8, Square::A8, MoveKind::Castling);
        assert_eq!(short.castling_side(), Some(CastlingSide::King));
        assert_eq!(long.castling_side(), Some(CastlingSide::Queen));
        assert_eq!(long.to_uci(ChessMode::Normal), "e8c8");
    }

    #[test]
    fn test_uci_parsing_special_moves() {
        let pos = Position::from_fen("r3k2r/8/8/3pP3/8/8/8/R3K2R w KQkq d6 0 1").unwrap();

        let ep = Move::from_uci(&pos, "e5d6").unwrap();
        assert_eq!(ep.kind(), MoveKind::EnPassant);

        let short = Move::from_uci(&pos, "e1g1").unwrap();
        assert_eq!(short, Move::new(Square::E1, Square::H1, MoveKind::Castling));

        let long = Move::from_uci(&pos, "e1a1").unwrap();
        assert_eq!(long, Move::new(Square::E1, Square::A1, MoveKind::Castling));

        assert!(Move::from_uci(&pos, "e5e6k").is_err());
        assert!(Move::from_uci(&pos, "e8e7").is_err());
    }
}
