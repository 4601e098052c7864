/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Instant;

use super::Position;

/// Counts the leaf nodes of the legal move tree of `position`, `depth` plies deep.
///
/// Every move is made and taken back on `position` itself, which is left as it was found.
///
/// # Example
/// ```
/// # use chesskit::*;
/// let mut position = Position::default();
/// assert_eq!(perft(&mut position, 3), 8_902);
/// ```
pub fn perft(position: &mut Position, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = position.legal_moves();

    // Bulk counting
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in moves {
        position.make_move(mv);
        nodes += perft(position, depth - 1);
        position.take_move(mv);
    }
    nodes
}

/// Like [`perft`], but prints the number of nodes under each root move as `<uci>: <nodes>`.
pub fn splitperft(position: &mut Position, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mode = position.chess_mode();
    let mut total = 0;

    for mv in position.legal_moves() {
        position.make_move(mv);
        let nodes = perft(position, depth - 1);
        position.take_move(mv);

        println!("{}: {nodes}", mv.to_uci(mode));
        total += nodes;
    }

    total
}

/// Runs [`perft`] (or [`splitperft`] if `SPLIT` is set) and prints the total.
///
/// If `PRETTY` is set, the position and timing information are printed as well.
pub fn print_perft<const PRETTY: bool, const SPLIT: bool>(
    position: &mut Position,
    depth: usize,
) -> u64 {
    if PRETTY {
        println!("Computing PERFT({depth}) of the following position:\n{position:?}\n");
    }

    let now = Instant::now();
    let nodes = if SPLIT {
        splitperft(position, depth)
    } else {
        perft(position, depth)
    };
    let elapsed = now.elapsed();

    if PRETTY {
        let nps = nodes as f32 / elapsed.as_secs_f32();
        println!("\n  Total Nodes:\t{nodes}");
        println!(" Elapsed Time:\t{elapsed:.1?}");
        println!("  Nodes / Sec:\t{nps:.0}");
    } else {
        println!("\n{nodes}");
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FEN_KIWIPETE, FEN_STARTPOS};

    #[test]
    fn test_perft_leaves_position_untouched() {
        let mut position = Position::from_fen(FEN_KIWIPETE).unwrap();
        let before = position.clone();

        assert_eq!(perft(&mut position, 2), 2_039);
        assert_eq!(position, before);
        assert_eq!(position.key(), before.key());
        assert_eq!(position.game_ply(), before.game_ply());
    }

    #[test]
    fn test_splitperft_matches_perft() {
        let mut position = Position::from_fen(FEN_STARTPOS).unwrap();
        assert_eq!(splitperft(&mut position, 3), perft(&mut position, 3));
        assert_eq!(splitperft(&mut position, 0), 1);
    }
}
