/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{Bitboard, CastleRight, Color, Piece, PieceKind, Square, ZobristKey};

/// Everything about a position that the [`Board`](super::Board) alone cannot tell you.
///
/// A [`Position`](super::Position) keeps one of these per ply on a stack. Making a move pushes
/// a new one and taking it back pops it, so a `State` is never edited after its move is made.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct State {
    pub(crate) side_to_move: Color,
    pub(crate) castle_rights: CastleRight,

    /// Set after every double pawn push, whether or not a capture is possible.
    pub(crate) ep_square: Option<Square>,

    /// Plies since the last capture or pawn move.
    pub(crate) rule50: usize,
    pub(crate) fullmove: usize,

    /// Plies since the last null move, or since the root if there was none.
    pub(crate) plies_from_null: usize,

    pub(crate) key: ZobristKey,
    pub(crate) pawn_key: ZobristKey,

    /// Pieces giving check to the side to move.
    pub(crate) checkers: Bitboard,

    /// Pieces of either color standing between each King and an enemy slider.
    pub(crate) blockers_for_king: [Bitboard; Color::COUNT],

    /// Sliders pinning a piece to the opposing King, indexed by the slider's color.
    pub(crate) pinners: [Bitboard; Color::COUNT],

    /// Squares from which a piece of each kind would check the enemy King.
    pub(crate) check_squares: [Bitboard; PieceKind::COUNT],

    /// The piece removed by the move that led here.
    pub(crate) captured: Option<Piece>,

    /// Distance in plies to the previous occurrence of this position.
    ///
    /// Zero if there is none, negative if that earlier occurrence was itself a repetition.
    pub(crate) repetition: i32,
}

impl State {
    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub const fn castle_rights(&self) -> CastleRight {
        self.castle_rights
    }

    #[inline(always)]
    pub const fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    /// The halfmove clock used for the fifty-move rule.
    #[inline(always)]
    pub const fn rule50(&self) -> usize {
        self.rule50
    }

    #[inline(always)]
    pub const fn fullmove(&self) -> usize {
        self.fullmove
    }

    #[inline(always)]
    pub const fn key(&self) -> ZobristKey {
        self.key
    }

    #[inline(always)]
    pub const fn pawn_key(&self) -> ZobristKey {
        self.pawn_key
    }

    #[inline(always)]
    pub const fn checkers(&self) -> Bitboard {
        self.checkers
    }

    #[inline(always)]
    pub const fn captured(&self) -> Option<Piece> {
        self.captured
    }

    #[inline(always)]
    pub const fn repetition(&self) -> i32 {
        self.repetition
    }

    /// Copies the fields that carry over unchanged into the next ply.
    ///
    /// Cached check information is cleared and must be recomputed.
    #[inline(always)]
    pub(crate) fn next(&self) -> Self {
        Self {
            side_to_move: self.side_to_move.opponent(),
            castle_rights: self.castle_rights,
            ep_square: None,
            rule50: self.rule50 + 1,
            fullmove: self.fullmove + self.side_to_move.index(),
            plies_from_null: self.plies_from_null + 1,
            key: self.key,
            pawn_key: self.pawn_key,
            captured: None,
            repetition: 0,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_state_advances_counters() {
        let white = State {
            rule50: 7,
            fullmove: 12,
            ep_square: Some(Square::E3),
            checkers: Square::E1.bitboard(),
            ..Default::default()
        };

        let black = white.next();
        assert_eq!(black.side_to_move(), Color::Black);
        assert_eq!(black.rule50(), 8);
        assert_eq!(black.fullmove(), 12);
        assert_eq!(black.ep_square(), None);
        assert!(black.checkers().is_empty());

        let white_again = black.next();
        assert_eq!(white_again.fullmove(), 13);
    }
}
