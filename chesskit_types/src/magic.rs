/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use thiserror::Error;

use super::{Bitboard, Square, XorShiftRng};

/// Per-rank seeds for the magic search. These were picked because they find a full set of magics quickly.
const MAGIC_SEEDS: [u64; 8] = [728, 10316, 55013, 32803, 12281, 15100, 16645, 255];

/// Candidates tried per square before giving up.
const MAX_MAGIC_ATTEMPTS: usize = 100_000_000;

/// The two kinds of sliding movement.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Slider {
    Rook,
    Bishop,
}

impl Slider {
    /// `(file, rank)` step of each ray.
    #[inline(always)]
    const fn directions(&self) -> [(i8, i8); 4] {
        match self {
            Self::Rook => [(0, 1), (0, -1), (1, 0), (-1, 0)],
            Self::Bishop => [(1, 1), (1, -1), (-1, 1), (-1, -1)],
        }
    }

    /// Attacks from `square`, computed by walking each ray until it leaves the board or hits a piece in `occupied`.
    ///
    /// This is the reference that the magic tables are built from and checked against.
    ///
    /// # Example
    /// ```
    /// # use chesskit_types::{Bitboard, Slider, Square};
    /// let attacks = Slider::Bishop.attacks_slow(Square::A1, Bitboard::EMPTY_BOARD);
    /// assert_eq!(attacks.population(), 7);
    /// ```
    pub fn attacks_slow(&self, square: Square, occupied: Bitboard) -> Bitboard {
        let mut attacks = Bitboard::EMPTY_BOARD;
        for (df, dr) in self.directions() {
            let mut current = square;
            while let Some(next) = current.offset(df, dr) {
                attacks |= next;
                if occupied.contains(next) {
                    break;
                }
                current = next;
            }
        }
        attacks
    }

    /// Squares whose occupancy can change the attacks from `square`.
    ///
    /// Board edges are excluded unless `square` is on that edge, since a piece on the last square of a ray never blocks anything.
    pub fn relevant_mask(&self, square: Square) -> Bitboard {
        let edges = (Bitboard::RANK_1 | Bitboard::RANK_8).without(square.rank().bitboard())
            | (Bitboard::FILE_A | Bitboard::FILE_H).without(square.file().bitboard());
        self.attacks_slow(square, Bitboard::EMPTY_BOARD).without(edges)
    }
}

/// Failure to build a magic attack table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MagicError {
    #[error("magic {magic:#018x} on {square} maps occupancies {first:?} and {second:?} to one slot with different attacks")]
    Collision {
        square: Square,
        magic: u64,
        first: Bitboard,
        second: Bitboard,
    },

    #[error("no {slider:?} magic found for {square} within {attempts} attempts")]
    Exhausted {
        slider: Slider,
        square: Square,
        attempts: usize,
    },
}

/// Multiply-and-shift hash parameters for a single square.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Magic {
    /// Relevant occupancy mask.
    pub mask: Bitboard,
    /// Multiplier.
    pub magic: u64,
    /// `64 - mask.population()`.
    pub shift: u32,
    /// Start of this square's slice in the shared attack table.
    pub offset: usize,
}

impl Magic {
    /// Slot in the shared attack table for the given board occupancy.
    #[inline(always)]
    pub const fn index(&self, occupied: Bitboard) -> usize {
        let relevant = occupied.inner() & self.mask.inner();
        let hash = relevant.wrapping_mul(self.magic);
        self.offset + (hash >> self.shift) as usize
    }
}

/// Every occupancy subset of `mask`, paired with the true attacks for that occupancy.
fn enumerate_occupancies(
    slider: Slider,
    square: Square,
    mask: Bitboard,
) -> Vec<(Bitboard, Bitboard)> {
    let mut subsets = Vec::with_capacity(1 << mask.population());
    let mut subset = 0u64;
    // Carry-rippler: steps through every subset of `mask`, ending back at zero.
    loop {
        let occupied = Bitboard::new(subset);
        subsets.push((occupied, slider.attacks_slow(square, occupied)));
        subset = subset.wrapping_sub(mask.inner()) & mask.inner();
        if subset == 0 {
            break;
        }
    }
    subsets
}

/// Perfect-hash lookup table of sliding attacks for one [`Slider`].
#[derive(Clone)]
pub struct MagicTable {
    slider: Slider,
    magics: [Magic; Square::COUNT],
    attacks: Vec<Bitboard>,
}

impl MagicTable {
    /// Searches for a working magic for every square, then builds and verifies the table.
    pub fn new(slider: Slider) -> Result<Self, MagicError> {
        let mut magics = [0u64; Square::COUNT];
        let mut total_attempts = 0;
        for square in Square::iter() {
            let (magic, attempts) = find_magic(slider, square)?;
            magics[square] = magic;
            total_attempts += attempts;
        }
        log::debug!("found {slider:?} magics after {total_attempts} candidates");

        Self::with_magics(slider, &magics)
    }

    /// Builds a table from known magic constants.
    ///
    /// Every occupancy subset of every square is hashed and written. If two subsets with different
    /// attacks land in the same slot, the constant is rejected with [`MagicError::Collision`].
    ///
    /// # Example
    /// ```
    /// # use chesskit_types::{MagicError, MagicTable, Slider};
    /// let degenerate = [0u64; 64];
    /// let result = MagicTable::with_magics(Slider::Rook, &degenerate);
    /// assert!(matches!(result, Err(MagicError::Collision { .. })));
    /// ```
    pub fn with_magics(
        slider: Slider,
        constants: &[u64; Square::COUNT],
    ) -> Result<Self, MagicError> {
        let mut magics = [Magic::default(); Square::COUNT];
        let mut offset = 0;
        for square in Square::iter() {
            let mask = slider.relevant_mask(square);
            magics[square] = Magic {
                mask,
                magic: constants[square],
                shift: 64 - mask.population(),
                offset,
            };
            offset += 1 << mask.population();
        }

        let mut attacks = vec![Bitboard::EMPTY_BOARD; offset];
        for square in Square::iter() {
            let magic = magics[square];
            let mut written: Vec<Option<Bitboard>> = vec![None; 1 << magic.mask.population()];

            for (occupied, reference) in enumerate_occupancies(slider, square, magic.mask) {
                let index = magic.index(occupied);
                let slot = index - magic.offset;
                match written[slot] {
                    Some(first) if attacks[index] != reference => {
                        return Err(MagicError::Collision {
                            square,
                            magic: magic.magic,
                            first,
                            second: occupied,
                        });
                    }
                    Some(_) => {}
                    None => {
                        written[slot] = Some(occupied);
                        attacks[index] = reference;
                    }
                }
            }
        }

        log::debug!("built {slider:?} attack table with {} entries", attacks.len());
        Ok(Self {
            slider,
            magics,
            attacks,
        })
    }

    /// Attacks from `square` given the board occupancy.
    #[inline(always)]
    pub fn attacks(&self, square: Square, occupied: Bitboard) -> Bitboard {
        self.attacks[self.magics[square].index(occupied)]
    }

    #[inline(always)]
    pub fn slider(&self) -> Slider {
        self.slider
    }

    /// Hash parameters for `square`.
    #[inline(always)]
    pub fn magic(&self, square: Square) -> &Magic {
        &self.magics[square]
    }

    /// Number of entries in the shared attack table.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.attacks.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty()
    }
}

/// Sparse-random search for a collision-free magic on `square`.
///
/// Returns the magic and the number of candidates tried.
fn find_magic(slider: Slider, square: Square) -> Result<(u64, usize), MagicError> {
    let mask = slider.relevant_mask(square);
    let bits = mask.population();
    let shift = 64 - bits;
    let subsets = enumerate_occupancies(slider, square, mask);

    let mut table = vec![Bitboard::EMPTY_BOARD; 1 << bits];
    // Slot `i` is valid for the current candidate only if `epoch[i] == attempt`, which avoids clearing `table` per candidate.
    let mut epoch = vec![0usize; 1 << bits];
    let mut rng = XorShiftRng::new(MAGIC_SEEDS[square.rank().index()]);

    for attempt in 1..=MAX_MAGIC_ATTEMPTS {
        let magic = rng.sparse_u64();

        // Candidates that leave the top byte sparse rarely work.
        if (mask.inner().wrapping_mul(magic) >> 56).count_ones() < 6 {
            continue;
        }

        let works = subsets.iter().all(|&(occupied, reference)| {
            let index = ((occupied.inner() & mask.inner()).wrapping_mul(magic) >> shift) as usize;
            if epoch[index] < attempt {
                epoch[index] = attempt;
                table[index] = reference;
                true
            } else {
                table[index] == reference
            }
        });

        if works {
            return Ok((magic, attempt));
        }
    }

    Err(MagicError::Exhausted {
        slider,
        square,
        attempts: MAX_MAGIC_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevant_mask_sizes() {
        assert_eq!(Slider::Rook.relevant_mask(Square::A1).population(), 12);
        assert_eq!(Slider::Rook.relevant_mask(Square::E4).population(), 10);
        assert_eq!(Slider::Bishop.relevant_mask(Square::A1).population(), 6);
        assert_eq!(Slider::Bishop.relevant_mask(Square::E4).population(), 9);
    }

    #[test]
    fn test_table_sizes() {
        let rook = MagicTable::new(Slider::Rook).unwrap();
        let bishop = MagicTable::new(Slider::Bishop).unwrap();
        assert_eq!(rook.len(), 102_400);
        assert_eq!(bishop.len(), 5_248);
    }

    #[test]
    fn test_table_matches_ray_casting() {
        let table = MagicTable::new(Slider::Bishop).unwrap();
        let mut rng = XorShiftRng::new(99);
        for _ in 0..2_000 {
            let occupied = Bitboard::new(rng.next_u64() & rng.next_u64());
            for square in Square::iter() {
                assert_eq!(
                    table.attacks(square, occupied),
                    Slider::Bishop.attacks_slow(square, occupied)
                );
            }
        }
    }

    #[test]
    fn test_found_magics_rebuild_without_collision() {
        let table = MagicTable::new(Slider::Rook).unwrap();
        let constants: [u64; 64] =
            std::array::from_fn(|i| table.magic(Square::from_index_unchecked(i)).magic);
        assert!(MagicTable::with_magics(Slider::Rook, &constants).is_ok());
    }

    #[test]
    fn test_degenerate_magic_is_rejected() {
        let table = MagicTable::with_magics(Slider::Bishop, &[1; 64]);
        assert!(matches!(table, Err(MagicError::Collision { .. })));
    }
}
