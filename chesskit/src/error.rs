/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use thiserror::Error;

use super::{Color, Square};

/// A rule that a [`Position`](super::Position) breaks.
///
/// Returned by [`Position::validate`](super::Position::validate).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{color} has {count} kings, expected exactly one")]
    KingCount { color: Color, count: usize },

    #[error("pawn on back rank at {square}")]
    PawnsOnBackRank { square: Square },

    #[error("{color} has {count} pieces, more than 16")]
    TooManyPieces { color: Color, count: usize },

    #[error("{color} has {count} pawns, more than 8")]
    TooManyPawns { color: Color, count: usize },

    #[error("{color} is in check but it is not their turn")]
    OpponentInCheck { color: Color },

    #[error("{count} pieces give check, at most two can")]
    TooManyCheckers { count: usize },

    #[error("en passant square {square} is not behind a pawn that just double-pushed")]
    InvalidEnPassant { square: Square },

    #[error("no castling rook on {square}")]
    CastlingRookMissing { square: Square },

    #[error("piece lists disagree with the board")]
    PieceListMismatch,

    #[error("{which} key does not match the position")]
    HashMismatch { which: &'static str },
}
