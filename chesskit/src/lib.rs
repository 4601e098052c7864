/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

#![doc = include_str!("../README.md")]

pub use chesskit_types::*;

/// Piece placement: bitboards, a square-indexed mailbox, and per-piece square lists.
mod board;
/// Castling rights, and the sides of the board one can castle to.
mod castling;
/// Reasons a position can fail validation.
mod error;
/// All code related to generating moves (legal and pseudo-legal) for pieces on a board.
mod movegen;
/// Enums and structs for modeling the movement of a piece on a chessboard.
mod moves;
/// Writing and reading moves in SAN, LAN, ICCF, and UCI notation.
mod notation;
/// Utility functions for performance testing.
mod perft;
/// A chessboard, complete with piece placements, a history of game states, and legality checks.
mod position;
/// Static exchange evaluation.
mod see;
/// The per-ply game state that cannot be recovered by unmaking a move.
mod state;
/// Zobrist keys for hashing chess positions.
mod zobrist;

pub use board::*;
pub use castling::*;
pub use error::*;
pub use movegen::*;
pub use moves::*;
pub use notation::*;
pub use perft::*;
pub use position::*;
pub use see::*;
pub use state::*;
pub use zobrist::*;

/// Builds every process-wide table (attacks, magics, and the cuckoo table used for
/// repetition detection) now instead of on first use.
///
/// Calling this is optional, and calling it more than once is harmless.
pub fn init() {
    chesskit_types::init();
    zobrist::init_cuckoo();
}

/// Re-exports all the things you'll need.
pub mod prelude {
    pub use crate::board::*;
    pub use crate::castling::*;
    pub use crate::error::*;
    pub use crate::init;
    pub use crate::movegen::*;
    pub use crate::moves::*;
    pub use crate::notation::*;
    pub use crate::perft::*;
    pub use crate::position::*;
    pub use crate::see::*;
    pub use crate::state::*;
    pub use crate::zobrist::*;
    pub use chesskit_types::*;
}
