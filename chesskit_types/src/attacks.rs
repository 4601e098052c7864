/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::OnceLock;

use super::{Bitboard, Color, MagicTable, Piece, PieceKind, Slider, Square};

const KNIGHT_ATTACKS: [Bitboard; Square::COUNT] = {
    let mut table = [Bitboard::EMPTY_BOARD; Square::COUNT];
    let mut i = 0;
    while i < Square::COUNT {
        let bb = Bitboard::new(1 << i);
        let one = bb.east().or(bb.west());
        let two = bb.east().east().or(bb.west().west());
        table[i] = one
            .north()
            .north()
            .or(one.south().south())
            .or(two.north())
            .or(two.south());
        i += 1;
    }
    table
};

const KING_ATTACKS: [Bitboard; Square::COUNT] = {
    let mut table = [Bitboard::EMPTY_BOARD; Square::COUNT];
    let mut i = 0;
    while i < Square::COUNT {
        let bb = Bitboard::new(1 << i);
        let row = bb.or(bb.east()).or(bb.west());
        table[i] = row.or(row.north()).or(row.south()).xor(bb);
        i += 1;
    }
    table
};

const PAWN_ATTACKS: [[Bitboard; Square::COUNT]; Color::COUNT] = {
    let mut table = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Color::COUNT];
    let mut i = 0;
    while i < Square::COUNT {
        let bb = Bitboard::new(1 << i);
        table[0][i] = bb.north().east().or(bb.north().west());
        table[1][i] = bb.south().east().or(bb.south().west());
        i += 1;
    }
    table
};

const PAWN_PUSHES: [[Bitboard; Square::COUNT]; Color::COUNT] = {
    let mut table = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Color::COUNT];
    let mut i = 0;
    while i < Square::COUNT {
        let bb = Bitboard::new(1 << i);
        let white = bb.north();
        let black = bb.south();
        table[0][i] = white.or(white.and(Bitboard::RANK_3).north());
        table[1][i] = black.or(black.and(Bitboard::RANK_6).south());
        i += 1;
    }
    table
};

/// Rays between and through every pair of aligned squares.
struct RayTables {
    between: [[Bitboard; Square::COUNT]; Square::COUNT],
    containing: [[Bitboard; Square::COUNT]; Square::COUNT],
}

static ROOK_TABLE: OnceLock<MagicTable> = OnceLock::new();
static BISHOP_TABLE: OnceLock<MagicTable> = OnceLock::new();
static RAY_TABLES: OnceLock<Box<RayTables>> = OnceLock::new();

/// Builds a sliding attack table. A failure here means attacks would be wrong, so it aborts.
fn build_slider_table(slider: Slider) -> MagicTable {
    match MagicTable::new(slider) {
        Ok(table) => table,
        Err(err) => {
            log::error!("{err}");
            panic!("failed to build {slider:?} attack table: {err}");
        }
    }
}

fn build_ray_tables() -> Box<RayTables> {
    let mut rays = Box::new(RayTables {
        between: [[Bitboard::EMPTY_BOARD; Square::COUNT]; Square::COUNT],
        containing: [[Bitboard::EMPTY_BOARD; Square::COUNT]; Square::COUNT],
    });

    for slider in [Slider::Rook, Slider::Bishop] {
        for from in Square::iter() {
            let from_rays = slider.attacks_slow(from, Bitboard::EMPTY_BOARD);
            for to in from_rays {
                let to_rays = slider.attacks_slow(to, Bitboard::EMPTY_BOARD);
                rays.containing[from][to] = (from_rays & to_rays) | from | to;
                rays.between[from][to] = slider.attacks_slow(from, to.bitboard())
                    & slider.attacks_slow(to, from.bitboard());
            }
        }
    }

    log::debug!("built between/line ray tables");
    rays
}

#[inline(always)]
fn rook_table() -> &'static MagicTable {
    ROOK_TABLE.get_or_init(|| build_slider_table(Slider::Rook))
}

#[inline(always)]
fn bishop_table() -> &'static MagicTable {
    BISHOP_TABLE.get_or_init(|| build_slider_table(Slider::Bishop))
}

#[inline(always)]
fn ray_tables() -> &'static RayTables {
    RAY_TABLES.get_or_init(build_ray_tables)
}

/// Builds every process-wide attack table now instead of on first use.
///
/// Calling this more than once is harmless. Panics if a sliding attack table cannot be built.
pub fn init() {
    rook_table();
    bishop_table();
    ray_tables();
}

/// Fetch the pseudo-legal attacks for `piece` at `square`, given `blockers`.
///
/// For Pawns, this is only their diagonal attacks, not their pushes.
#[inline(always)]
pub fn attacks_for(piece: Piece, square: Square, blockers: Bitboard) -> Bitboard {
    match piece.kind() {
        PieceKind::Pawn => pawn_attacks(square, piece.color()),
        kind => piece_attacks(kind, square, blockers),
    }
}

/// Attacks for a non-pawn piece kind at `square`, given `blockers`.
///
/// Pawns have no color here, so asking for them yields an empty set.
#[inline(always)]
pub fn piece_attacks(kind: PieceKind, square: Square, blockers: Bitboard) -> Bitboard {
    match kind {
        PieceKind::Pawn => Bitboard::EMPTY_BOARD,
        PieceKind::Knight => knight_attacks(square),
        PieceKind::Bishop => bishop_attacks(square, blockers),
        PieceKind::Rook => rook_attacks(square, blockers),
        PieceKind::Queen => queen_attacks(square, blockers),
        PieceKind::King => king_attacks(square),
    }
}

/// Fetches a [`Bitboard`] with all of the bits along the ray between `from` and `to` (exclusive) set to `1`.
///
/// Empty if the squares do not share a file, rank, or diagonal.
///
/// # Example
/// ```
/// # use chesskit_types::*;
/// assert_eq!(ray_between(Square::A1, Square::A8), Bitboard::FILE_A ^ Square::A1 ^ Square::A8);
/// assert!(ray_between(Square::A1, Square::B3).is_empty());
/// ```
#[inline(always)]
pub fn ray_between(from: Square, to: Square) -> Bitboard {
    ray_tables().between[from][to]
}

/// Fetches a [`Bitboard`] with all of the bits along the full line containing `from` and `to` set to `1`.
///
/// # Example
/// ```
/// # use chesskit_types::*;
/// assert_eq!(ray_containing(Square::A3, Square::A5), Bitboard::FILE_A);
/// ```
#[inline(always)]
pub fn ray_containing(from: Square, to: Square) -> Bitboard {
    ray_tables().containing[from][to]
}

/// Returns `true` if the three squares lie on one file, rank, or diagonal.
#[inline(always)]
pub fn aligned(a: Square, b: Square, c: Square) -> bool {
    ray_containing(a, b).contains(c)
}

/// Computes the possible moves for a Rook at a given [`Square`] with the provided blockers.
///
/// This will yield a [`Bitboard`] that allows the Rook to capture the first blocker.
#[inline(always)]
pub fn rook_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    rook_table().attacks(square, blockers)
}

/// Computes the possible moves for a Bishop at a given [`Square`] with the provided blockers.
///
/// # Example
/// ```
/// # use chesskit_types::*;
/// // From a corner, a bishop on an empty board sees the whole long diagonal.
/// assert_eq!(bishop_attacks(Square::H1, Bitboard::EMPTY_BOARD).population(), 7);
/// ```
#[inline(always)]
pub fn bishop_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    bishop_table().attacks(square, blockers)
}

/// Union of Rook and Bishop attacks.
#[inline(always)]
pub fn queen_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    rook_attacks(square, blockers) | bishop_attacks(square, blockers)
}

/// The unblocked moves for a Rook at a given [`Square`].
#[inline(always)]
pub fn rook_rays(square: Square) -> Bitboard {
    rook_attacks(square, Bitboard::EMPTY_BOARD)
}

/// The unblocked moves for a Bishop at a given [`Square`].
#[inline(always)]
pub fn bishop_rays(square: Square) -> Bitboard {
    bishop_attacks(square, Bitboard::EMPTY_BOARD)
}

/// Fetch the raw, unblocked attacks for a knight on the provided square.
#[inline(always)]
pub const fn knight_attacks(square: Square) -> Bitboard {
    KNIGHT_ATTACKS[square.index()]
}

/// Fetch the raw, unblocked attacks for a king on the provided square.
#[inline(always)]
pub const fn king_attacks(square: Square) -> Bitboard {
    KING_ATTACKS[square.index()]
}

/// Fetch the raw, unblocked attacks for a pawn of the provided color on the provided square.
#[inline(always)]
pub const fn pawn_attacks(square: Square, color: Color) -> Bitboard {
    PAWN_ATTACKS[color.index()][square.index()]
}

/// Fetch the raw, unblocked pushes for a pawn of the provided color on the provided square.
///
/// Pawns on their starting rank include the double push.
#[inline(always)]
pub const fn pawn_pushes(square: Square, color: Color) -> Bitboard {
    PAWN_PUSHES[color.index()][square.index()]
}

/// All squares attacked by every `color` pawn in `pawns`.
#[inline(always)]
pub const fn pawn_attacks_from(pawns: Bitboard, color: Color) -> Bitboard {
    let pushed = pawns.forward_by(color, 1);
    pushed.east().or(pushed.west())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Checks if `moves` and `expected` contain all the same elements, ignoring order
    fn lists_match(moves: Bitboard, expected: &[Square]) {
        assert_eq!(
            moves.population() as usize,
            expected.len(),
            "\nMoves: {:?}\nExpected: {:?}",
            moves.iter().collect::<Vec<_>>(),
            expected
        );

        for mv in moves {
            assert!(expected.contains(&mv), "{mv} not found in {expected:?}");
        }
    }

    #[test]
    fn test_rook_blockers() {
        let expected = [
            Square::D2,
            Square::D3,
            Square::D5,
            Square::D6,
            Square::A4,
            Square::B4,
            Square::C4,
            Square::E4,
            Square::F4,
            Square::G4,
            Square::H4,
        ];

        // . . . X . . . X
        // . . . . . . . .
        // . . . X . . . .
        // . . . . . . . .
        // . . . . . . . X
        // . . X . . . . .
        // . . . X . X . .
        // . . . . . . . .
        let blockers =
            Bitboard::new(0b1000100000000000000010000000000010000000000001000010100000000000);

        lists_match(rook_attacks(Square::D4, blockers), &expected);
    }

    /// Concentric rings of the board, from the outer edge inward.
    const BANDS: [Bitboard; 4] = [
        Bitboard::new(0xFF81_8181_8181_81FF),
        Bitboard::new(0x007E_4242_4242_7E00),
        Bitboard::new(0x0000_3C24_243C_0000),
        Bitboard::new(0x0000_0018_1800_0000),
    ];

    #[test]
    fn test_bishop_mobility_by_band() {
        for (band, expected) in BANDS.iter().zip([7, 9, 11, 13]) {
            for square in *band {
                assert_eq!(
                    bishop_attacks(square, Bitboard::EMPTY_BOARD).population(),
                    expected,
                    "bishop on {square}"
                );
            }
        }
    }

    #[test]
    fn test_bishop_mobility_is_sum_of_diagonals() {
        for square in Square::iter() {
            let (f, r) = (square.file().inner(), square.rank().inner());
            let rays = f.min(r) + f.min(7 - r) + (7 - f).min(r) + (7 - f).min(7 - r);
            assert_eq!(bishop_rays(square).population(), rays as u32);
        }
    }

    #[test]
    fn test_rook_mobility_is_constant() {
        for square in Square::iter() {
            assert_eq!(rook_rays(square).population(), 14);
        }
    }

    #[test]
    fn test_bishop_blocked_by_inner_ring() {
        let blockers = BANDS[1];
        for square in BANDS[0] {
            let expected = if Bitboard::CORNERS.contains(square) {
                1
            } else {
                2
            };
            assert_eq!(bishop_attacks(square, blockers).population(), expected);
        }
    }

    #[test]
    fn test_king_mobility() {
        assert_eq!(king_attacks(Square::A1).population(), 3);
        assert_eq!(king_attacks(Square::A4).population(), 5);
        assert_eq!(king_attacks(Square::E4).population(), 8);
    }

    #[test]
    fn test_knight_mobility() {
        lists_match(knight_attacks(Square::A1), &[Square::B3, Square::C2]);
        assert_eq!(knight_attacks(Square::D4).population(), 8);
        assert_eq!(knight_attacks(Square::H8).population(), 2);
    }

    #[test]
    fn test_pawn_tables() {
        lists_match(pawn_attacks(Square::A2, Color::White), &[Square::B3]);
        lists_match(pawn_attacks(Square::E5, Color::Black), &[Square::D4, Square::F4]);
        lists_match(pawn_pushes(Square::E2, Color::White), &[Square::E3, Square::E4]);
        lists_match(pawn_pushes(Square::E3, Color::White), &[Square::E4]);
        lists_match(pawn_pushes(Square::E7, Color::Black), &[Square::E6, Square::E5]);
    }

    #[test]
    fn test_rays_are_symmetric() {
        for a in Square::iter() {
            for b in Square::iter() {
                assert_eq!(ray_between(a, b), ray_between(b, a));
                assert_eq!(ray_containing(a, b), ray_containing(b, a));
            }
        }
        assert!(aligned(Square::A1, Square::C3, Square::H8));
        assert!(!aligned(Square::A1, Square::C3, Square::H7));
    }
}
