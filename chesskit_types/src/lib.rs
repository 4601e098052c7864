/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

#![doc = include_str!("../README.md")]

/// Precomputed attack tables for every piece kind, and the rays between squares.
mod attacks;
/// All things related to Bitboards.
mod bitboard;
/// Magic bitboard search and the perfect-hash sliding attack tables built from it.
mod magic;
/// Enums for piece kinds, colors, and a struct for a chess piece.
mod piece;
/// Pseudo-random number generation, written to be usable in `const` settings.
///
/// Primarily for Zobrist hashing and magic generation.
mod prng;
/// Squares on a chessboard (including files and ranks).
mod square;
/// Misc constants, such as well-known FEN strings.
mod utils;

pub use attacks::*;
pub use bitboard::*;
pub use magic::*;
pub use piece::*;
pub use prng::*;
pub use square::*;
pub use utils::*;

/// Re-exports all the things you'll need.
pub mod prelude {
    pub use crate::attacks::*;
    pub use crate::bitboard::*;
    pub use crate::magic::*;
    pub use crate::piece::*;
    pub use crate::prng::*;
    pub use crate::square::*;
    pub use crate::utils::*;
}
