/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, sync::OnceLock};

use super::{
    piece_attacks, Board, CastleRight, Color, Move, MoveKind, Piece, PieceKind, Square,
    XorShiftRng,
};

/// Random constants XOR-ed together to form a [`ZobristKey`].
struct ZobristTable {
    pieces: [[u64; Square::COUNT]; Piece::COUNT],
    ep_files: [u64; 8],
    castling: [u64; CastleRight::COUNT],
    side: u64,
}

/// Generated at compile time, so keys are identical across runs and builds.
static ZOBRIST: ZobristTable = {
    let mut rng = XorShiftRng::new(XorShiftRng::DEFAULT_SEED);
    let mut pieces = [[0; Square::COUNT]; Piece::COUNT];
    let mut ep_files = [0; 8];
    let mut castling = [0; CastleRight::COUNT];

    let mut p = 0;
    while p < Piece::COUNT {
        let mut s = 0;
        while s < Square::COUNT {
            let (key, next) = rng.step();
            pieces[p][s] = key;
            rng = next;
            s += 1;
        }
        p += 1;
    }

    let mut f = 0;
    while f < 8 {
        let (key, next) = rng.step();
        ep_files[f] = key;
        rng = next;
        f += 1;
    }

    // One key per single right; a set of rights hashes to the XOR of its members.
    let mut singles = [0; 4];
    let mut i = 0;
    while i < 4 {
        let (key, next) = rng.step();
        singles[i] = key;
        rng = next;
        i += 1;
    }
    let mut rights = 0;
    while rights < CastleRight::COUNT {
        let mut bit = 0;
        while bit < 4 {
            if rights & (1 << bit) != 0 {
                castling[rights] ^= singles[bit];
            }
            bit += 1;
        }
        rights += 1;
    }

    let (side, _) = rng.step();

    ZobristTable {
        pieces,
        ep_files,
        castling,
        side,
    }
};

/// A 64-bit hash of a chess position.
///
/// Updated incrementally by XOR-ing in and out the components that change.
/// Since XOR is its own inverse, every `hash_*` method both adds and removes its component.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct ZobristKey(u64);

impl ZobristKey {
    /// Computes the key of a position from scratch.
    pub fn from_parts(
        board: &Board,
        side_to_move: Color,
        castle_rights: CastleRight,
        ep_square: Option<Square>,
    ) -> Self {
        let mut key = Self::default();

        for (square, piece) in board {
            key.hash_piece(square, piece);
        }

        key.hash_optional_ep_square(ep_square);
        key.hash_castling_rights(castle_rights);

        if side_to_move == Color::Black {
            key.hash_side_to_move();
        }

        key
    }

    /// Computes the pawn-only key of a board from scratch.
    pub fn pawns_of(board: &Board) -> Self {
        let mut key = Self::default();
        for (square, piece) in board.iter_for(board.kind(PieceKind::Pawn)) {
            key.hash_piece(square, piece);
        }
        key
    }

    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Adds/removes `piece` on `square`.
    #[inline(always)]
    pub fn hash_piece(&mut self, square: Square, piece: Piece) {
        self.0 ^= piece_square_key(piece, square);
    }

    /// Adds/removes the en passant file of `square`.
    #[inline(always)]
    pub fn hash_ep_square(&mut self, square: Square) {
        self.0 ^= ZOBRIST.ep_files[square.file().index()];
    }

    #[inline(always)]
    pub fn hash_optional_ep_square(&mut self, square: Option<Square>) {
        if let Some(square) = square {
            self.hash_ep_square(square);
        }
    }

    /// Adds/removes a set of castling rights.
    #[inline(always)]
    pub fn hash_castling_rights(&mut self, rights: CastleRight) {
        self.0 ^= ZOBRIST.castling[rights.index()];
    }

    /// Toggles the side to move.
    #[inline(always)]
    pub fn hash_side_to_move(&mut self) {
        self.0 ^= ZOBRIST.side;
    }
}

impl fmt::Display for ZobristKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl fmt::Debug for ZobristKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZobristKey({self})")
    }
}

#[inline(always)]
fn piece_square_key(piece: Piece, square: Square) -> u64 {
    ZOBRIST.pieces[piece.index()][square.index()]
}

/// Cuckoo hash table of every reversible piece move, keyed by the change it makes to a [`ZobristKey`].
///
/// Used to detect that some earlier position can be reached again in a single move.
struct Cuckoo {
    keys: Box<[u64]>,
    moves: Box<[Move]>,
}

const CUCKOO_SIZE: usize = 8192;

/// Number of reversible (non-pawn) piece moves on an empty board.
pub(crate) const CUCKOO_ENTRIES: usize = 3668;

#[inline(always)]
const fn cuckoo_h1(key: u64) -> usize {
    (key & 0x1fff) as usize
}

#[inline(always)]
const fn cuckoo_h2(key: u64) -> usize {
    ((key >> 16) & 0x1fff) as usize
}

static CUCKOO: OnceLock<Cuckoo> = OnceLock::new();

fn build_cuckoo() -> Cuckoo {
    let mut keys = vec![0u64; CUCKOO_SIZE].into_boxed_slice();
    let mut moves = vec![Move::NULL; CUCKOO_SIZE].into_boxed_slice();
    let mut count = 0;

    for piece in Piece::iter().filter(|piece| !piece.is_pawn()) {
        for s1 in Square::iter() {
            for s2 in piece_attacks(piece.kind(), s1, Default::default()) {
                if s2 <= s1 {
                    continue;
                }

                let mut mv = Move::new(s1, s2, MoveKind::Normal);
                let mut key =
                    piece_square_key(piece, s1) ^ piece_square_key(piece, s2) ^ ZOBRIST.side;
                let mut slot = cuckoo_h1(key);
                // Insert, evicting any occupant to its other slot until an empty one is found.
                loop {
                    std::mem::swap(&mut keys[slot], &mut key);
                    std::mem::swap(&mut moves[slot], &mut mv);
                    if mv.is_null() {
                        break;
                    }
                    slot = if slot == cuckoo_h1(key) {
                        cuckoo_h2(key)
                    } else {
                        cuckoo_h1(key)
                    };
                }
                count += 1;
            }
        }
    }

    debug_assert_eq!(count, CUCKOO_ENTRIES);
    log::debug!("built cuckoo table with {count} reversible moves");
    Cuckoo { keys, moves }
}

/// Looks up the reversible move that changes a position's key by `move_key`, if there is one.
pub(crate) fn cuckoo_move(move_key: u64) -> Option<Move> {
    let cuckoo = CUCKOO.get_or_init(build_cuckoo);
    [cuckoo_h1(move_key), cuckoo_h2(move_key)]
        .into_iter()
        .find(|&slot| cuckoo.keys[slot] == move_key)
        .map(|slot| cuckoo.moves[slot])
}

/// Builds the cuckoo table now instead of on first use.
pub(crate) fn init_cuckoo() {
    CUCKOO.get_or_init(build_cuckoo);
}
