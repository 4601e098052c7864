/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Instant;

use clap::Parser;
use colored::Colorize;

use chesskit::{perft, splitperft, ChessMode, MoveNotation, Position};

/// Compute total number of states reachable from a position, given a depth.
#[derive(Debug, Parser)]
struct Cli {
    /// Depth to run the perft.
    depth: usize,

    /// The FEN string of the position to run the perft.
    #[arg(required = false)]
    fen: Option<String>,

    /// List of moves to apply to the position before running the perft.
    #[arg(required = false)]
    moves: Vec<String>,

    /// If set, perform a splitperft, displaying the number of nodes reachable after each move available from the root.
    #[arg(short, long, default_value = "false")]
    split: bool,

    /// Read the FEN's castling rights as Chess960 Rook files.
    #[arg(long, default_value = "false")]
    chess960: bool,

    /// Reject positions that could not occur in a real game.
    #[arg(long, default_value = "false")]
    validate: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let mode = if args.chess960 {
        ChessMode::Chess960
    } else {
        ChessMode::Normal
    };

    // Parse args appropriately
    let mut position = if let Some(fen) = &args.fen {
        Position::from_fen_with(fen, mode, args.validate)?
    } else {
        Position::default()
    };

    // Apply moves, if any were provided
    for mv_str in args.moves {
        let mv = position.parse_move(&mv_str, MoveNotation::Uci)?;
        position.make_move(mv);
    }

    println!(
        "Computing PERFT({}) of the following position:\n{:?}\n",
        args.depth, position
    );

    let now = Instant::now();
    let total_nodes = if args.split {
        let nodes = splitperft(&mut position, args.depth);
        println!("\n{nodes}\n");
        nodes
    } else {
        perft(&mut position, args.depth)
    };

    let elapsed = now.elapsed();

    // Compute nodes-per-second metrics
    let nps = total_nodes as f32 / elapsed.as_secs_f32();
    let m_nps = nps / 1_000_000.0;

    println!("  Total Nodes:\t{}", total_nodes.to_string().green().bold());
    println!(" Elapsed Time:\t{elapsed:.1?}");
    println!("  Nodes / Sec:\t{nps:.0}");
    println!("M Nodes / Sec:\t{}", format!("{m_nps:.1}").cyan());

    Ok(())
}
