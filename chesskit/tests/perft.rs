/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use chesskit::*;

fn test_perft_fen_nodes(mode: ChessMode, fen: &str, expected: &[u64]) {
    let mut position = Position::from_fen_with(fen, mode, true).unwrap();
    for (depth, &nodes) in expected.iter().enumerate() {
        assert_eq!(
            perft(&mut position, depth + 1),
            nodes,
            "perft({}) of {fen}",
            depth + 1
        );
    }
}

fn play(position: &mut Position, moves: &[&str]) {
    for uci in moves {
        let mv = position.parse_move(uci, MoveNotation::Uci).unwrap();
        position.make_move(mv);
    }
}

#[test]
fn test_startpos_perft() {
    test_perft_fen_nodes(ChessMode::Normal, FEN_STARTPOS, &[20, 400, 8_902, 197_281]);
}

#[test]
fn test_kiwipete_perft() {
    test_perft_fen_nodes(ChessMode::Normal, FEN_KIWIPETE, &[48, 2_039, 97_862]);
}

#[test]
fn test_pos3_perft() {
    test_perft_fen_nodes(ChessMode::Normal, FEN_PERFT_POS3, &[14, 191, 2_812, 43_238]);
}

#[test]
fn test_pos4_perft() {
    test_perft_fen_nodes(ChessMode::Normal, FEN_PERFT_POS4, &[6, 264, 9_467]);

    let mirrored = "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1";
    test_perft_fen_nodes(ChessMode::Normal, mirrored, &[6, 264, 9_467]);
}

#[test]
fn test_pos5_perft() {
    test_perft_fen_nodes(ChessMode::Normal, FEN_PERFT_POS5, &[44, 1_486, 62_379]);
}

#[test]
fn test_chess960_perft() {
    test_perft_fen_nodes(ChessMode::Chess960, FEN_CHESS960, &[21, 528, 12_189]);
}

/// Walks the move tree, checking that every node's incremental state matches a recomputation and
/// that taking a move back restores the position exactly.
fn walk_and_verify(position: &mut Position, depth: usize) {
    let state = *position.state();
    let key = ZobristKey::from_parts(
        position.board(),
        position.side_to_move(),
        position.castling_rights(),
        position.ep_square(),
    );
    assert_eq!(state.key(), key, "key of {position}");
    assert_eq!(state.pawn_key(), ZobristKey::pawns_of(position.board()), "pawn key of {position}");
    assert!(position.board().is_consistent(), "piece lists of {position}");

    if depth == 0 {
        return;
    }

    let before = position.clone();
    for mv in position.legal_moves() {
        let gives_check = position.gives_check(mv);
        position.make_move(mv);

        assert_eq!(position.in_check(), gives_check, "gives_check({mv}) in {before}");
        walk_and_verify(position, depth - 1);

        position.take_move(mv);
        assert_eq!(*position, before, "taking back {mv:?}");
        assert_eq!(position.game_ply(), before.game_ply());
    }
}

#[test]
fn test_make_take_restores_everything() {
    for fen in [
        FEN_STARTPOS,
        FEN_KIWIPETE,
        FEN_PERFT_POS3,
        FEN_PERFT_POS4,
        FEN_PERFT_POS5,
    ] {
        let mut position = Position::from_fen(fen).unwrap();
        walk_and_verify(&mut position, 3);
    }

    let mut position =
        Position::from_fen_with(FEN_CHESS960, ChessMode::Chess960, true).unwrap();
    walk_and_verify(&mut position, 3);
}

#[test]
fn test_chess960_castling_onto_occupied_squares() {
    // The King starts on the Rook's destination square, and the Rook on the King's.
    let fen = "1r4k1/8/8/8/8/8/8/5RK1 w F - 0 1";
    let mut position = Position::from_fen_with(fen, ChessMode::Chess960, true).unwrap();
    let castle = Move::new(Square::G1, Square::F1, MoveKind::Castling);
    assert!(position.legal_moves().contains(&castle));
    assert_eq!(castle.to_uci(ChessMode::Chess960), "g1f1");

    let before = position.clone();
    position.make_move(castle);
    assert_eq!(position.to_fen(), "1r4k1/8/8/8/8/8/8/2KR4 b - - 1 1");
    position.take_move(castle);
    assert_eq!(position, before);
}

#[test]
fn test_generated_pseudo_legal_moves_pass_pseudo_legal_check() {
    let pinned_promotion = "8/KP5r/8/8/8/8/8/7k w - - 0 1";
    let pinned_en_passant = "8/8/8/K2pP2r/8/8/8/7k w - d6 0 1";
    let king_into_bishop = "4r1k1/8/b7/8/8/8/8/4K3 w - - 0 1";

    for fen in [
        pinned_promotion,
        pinned_en_passant,
        king_into_bishop,
        FEN_KIWIPETE,
        FEN_PERFT_POS3,
        FEN_PERFT_POS4,
    ] {
        let position = Position::from_fen(fen).unwrap();
        for mv in position.generate_moves(GenType::PseudoLegal) {
            assert!(position.is_pseudo_legal(mv), "{mv:?} in {fen}");
        }
    }

    let position = Position::from_fen(pinned_promotion).unwrap();
    let promote = Move::new_promotion(Square::B7, Square::B8, PieceKind::Queen);
    assert!(position.is_pseudo_legal(promote));
    assert!(!position.is_legal(promote));

    let position = Position::from_fen(pinned_en_passant).unwrap();
    let capture = Move::new(Square::E5, Square::D6, MoveKind::EnPassant);
    assert!(position.is_pseudo_legal(capture));
    assert!(!position.is_legal(capture));

    // The King may step off the checking Rook's line onto a square the Bishop covers.
    let position = Position::from_fen(king_into_bishop).unwrap();
    let step = Move::new(Square::E1, Square::F1, MoveKind::Normal);
    assert!(position.is_pseudo_legal(step));
    assert!(!position.is_legal(step));
    let back = Move::new(Square::E1, Square::E2, MoveKind::Normal);
    assert!(!position.is_pseudo_legal(back));
}

#[test]
fn test_pseudo_legal_check_rejects_foreign_moves() {
    let positions = [
        FEN_STARTPOS,
        FEN_KIWIPETE,
        FEN_PERFT_POS3,
        FEN_PERFT_POS4,
        FEN_PERFT_POS5,
    ]
    .map(|fen| Position::from_fen(fen).unwrap());

    for position in &positions {
        let legal = position.legal_moves();
        for &mv in &legal {
            assert!(position.is_pseudo_legal(mv), "{mv:?} in {position}");
        }

        for other in &positions {
            for mv in other.generate_moves(GenType::PseudoLegal) {
                if position.is_pseudo_legal(mv) && position.is_legal(mv) {
                    assert!(legal.contains(&mv), "{mv:?} accepted in {position}");
                }
            }
        }
    }
}

#[test]
fn test_threefold_repetition() {
    let mut position = Position::default();
    let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];

    play(&mut position, &shuffle);
    assert_eq!(position.state().repetition(), 4);
    assert!(position.has_repetition());
    assert!(!position.is_draw(0));
    assert!(position.is_draw(5));

    play(&mut position, &shuffle);
    assert_eq!(position.state().repetition(), -4);
    assert!(position.is_draw(0));
    assert_eq!(position.status(), GameStatus::Drawn);
}

#[test]
fn test_irreversible_move_resets_repetition() {
    let mut position = Position::default();
    play(&mut position, &["g1f3", "g8f6", "f3g1", "f6g8", "e2e4"]);
    assert_eq!(position.state().repetition(), 0);
    assert!(!position.has_repetition());
    assert_eq!(position.halfmove(), 0);
}

#[test]
fn test_game_cycle_detected_one_move_early() {
    let mut position = Position::default();
    play(&mut position, &["g1f3", "g8f6", "f3g1"]);

    // Black can return to the starting position with Nf6-g8. Inside a search that counts at
    // once, but at the root the position must already have repeated.
    assert!(position.has_game_cycle(4));
    assert!(!position.has_game_cycle(0));

    play(&mut position, &["f6g8", "g1f3", "g8f6", "f3g1"]);
    assert!(position.has_game_cycle(0));

    let fresh = Position::default();
    assert!(!fresh.has_game_cycle(0));
}

#[test]
fn test_fifty_move_rule() {
    let mut position = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 80").unwrap();
    assert!(!position.is_draw(0));
    play(&mut position, &["a1a2"]);
    assert_eq!(position.halfmove(), 100);
    assert!(position.is_draw(0));

    // Mate on the hundredth half move still wins.
    let mut position = Position::from_fen("7k/8/6K1/8/8/8/8/R7 w - - 99 80").unwrap();
    play(&mut position, &["a1a8"]);
    assert!(position.is_mate());
    assert!(!position.is_draw(0));
    assert_eq!(position.status(), GameStatus::Mate);
}

#[test]
fn test_insufficient_material() {
    let drawn = [
        "8/8/4k3/8/8/8/8/4K3 w - - 0 1",
        "8/8/4k3/8/8/8/8/4KN2 w - - 0 1",
        "4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1",
    ];
    for fen in drawn {
        let position = Position::from_fen(fen).unwrap();
        assert!(position.is_insufficient_material(), "{fen}");
        assert_eq!(position.status(), GameStatus::Drawn, "{fen}");
    }

    let playable = [
        "2b1k3/8/8/8/8/8/8/2B1K3 w - - 0 1",
        "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
        "4k3/8/8/8/8/8/8/3RK3 w - - 0 1",
    ];
    for fen in playable {
        let position = Position::from_fen(fen).unwrap();
        assert!(!position.is_insufficient_material(), "{fen}");
    }
}

#[test]
fn test_game_status() {
    let mut position = Position::default();
    assert_eq!(position.status(), GameStatus::Normal);

    play(&mut position, &["e2e4", "f7f6", "d2d4", "g7g5", "d1h5"]);
    assert_eq!(position.status(), GameStatus::Mate);

    let stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert_eq!(stalemate.status(), GameStatus::Stalemate);

    let check = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 1").unwrap();
    assert_eq!(check.status(), GameStatus::Normal);
    let check = Position::from_fen("R3k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
    assert_eq!(check.status(), GameStatus::InCheck);
}

#[test]
fn test_castling_rights_are_lost() {
    let mut position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

    // Moving a Rook loses that side only.
    play(&mut position, &["h1h2"]);
    assert!(!position.can_castle(CastleRight::WHITE_OO));
    assert!(position.can_castle(CastleRight::WHITE_OOO));

    // Capturing a Rook on its home square removes the victim's right.
    play(&mut position, &["a8a1"]);
    assert!(!position.can_castle(CastleRight::WHITE_OOO));
    assert!(!position.can_castle(CastleRight::BLACK_OOO));
    assert!(position.can_castle(CastleRight::BLACK_OO));

    // Moving the King loses both.
    play(&mut position, &["e1e2", "e8e7"]);
    assert!(position.castling_rights().is_empty());
    assert_eq!(position.to_fen(), "7r/4k3/8/8/8/8/4K2R/r7 w - - 2 3");
}

#[test]
fn test_en_passant_square_handling() {
    let mut position = Position::default();
    play(&mut position, &["e2e4"]);
    assert_eq!(position.ep_square(), Some(Square::E3));

    play(&mut position, &["a7a6", "e4e5", "d7d5"]);
    assert_eq!(position.ep_square(), Some(Square::D6));
    let capture = position.parse_move("exd6", MoveNotation::San).unwrap();
    assert!(capture.is_en_passant());

    position.make_move(capture);
    assert_eq!(position.piece_at(Square::D5), None);
    assert_eq!(
        position.piece_at(Square::D6),
        Some(Piece::new(Color::White, PieceKind::Pawn))
    );
    assert_eq!(position.captured_piece(), Some(Piece::new(Color::Black, PieceKind::Pawn)));

    // An en passant square that no pawn could have skipped is dropped, or rejected when validating.
    let fen = "4k3/8/8/8/8/8/8/4K3 w - e6 0 1";
    assert_eq!(Position::from_fen(fen).unwrap().ep_square(), None);
    assert!(Position::from_fen_with(fen, ChessMode::Normal, true).is_err());
}

#[test]
fn test_validation_errors() {
    let cases = [
        (
            "8/8/8/8/8/8/8/4K3 w - - 0 1",
            ValidationError::KingCount {
                color: Color::Black,
                count: 0,
            },
        ),
        (
            "4k3/8/8/8/8/8/8/1P2K3 w - - 0 1",
            ValidationError::PawnsOnBackRank { square: Square::B1 },
        ),
        (
            "4k3/pppppppp/p7/8/8/8/8/4K3 w - - 0 1",
            ValidationError::TooManyPawns {
                color: Color::Black,
                count: 9,
            },
        ),
        (
            "4k3/4R3/8/8/8/8/8/4K3 w - - 0 1",
            ValidationError::OpponentInCheck {
                color: Color::Black,
            },
        ),
    ];

    for (fen, expected) in cases {
        let position = Position::from_fen(fen).unwrap();
        assert_eq!(position.validate(), Err(expected), "{fen}");

        let err = Position::from_fen_with(fen, ChessMode::Normal, true).unwrap_err();
        assert_eq!(err.downcast_ref::<ValidationError>(), Some(&expected), "{fen}");
    }

    for fen in [FEN_STARTPOS, FEN_KIWIPETE, FEN_PERFT_POS4] {
        assert_eq!(Position::from_fen(fen).unwrap().validate(), Ok(()));
    }
}

#[test]
fn test_fen_round_trip() {
    for fen in [
        FEN_STARTPOS,
        FEN_KIWIPETE,
        FEN_PERFT_POS3,
        FEN_PERFT_POS4,
        FEN_PERFT_POS5,
    ] {
        assert_eq!(Position::from_fen(fen).unwrap().to_fen(), fen);
    }

    let chess960 = Position::from_fen_with(FEN_CHESS960, ChessMode::Chess960, true).unwrap();
    assert_eq!(chess960.to_fen(), FEN_CHESS960);
}

#[test]
fn test_missing_fen_fields_fall_back() {
    let full = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 0 1").unwrap();
    for partial in [
        "4k3/8/8/8/8/8/8/4K2R",
        "4k3/8/8/8/8/8/8/4K2R w",
        "4k3/8/8/8/8/8/8/4K2R w -",
        "4k3/8/8/8/8/8/8/4K2R w - -",
        "4k3/8/8/8/8/8/8/4K2R w - - 0",
    ] {
        let position = Position::from_fen(partial).unwrap();
        assert_eq!(position, full, "{partial}");
        assert_eq!(position.to_fen(), "4k3/8/8/8/8/8/8/4K2R w - - 0 1");
    }
}

#[test]
fn test_null_move() {
    let mut position = Position::from_fen(FEN_KIWIPETE).unwrap();
    let before = position.clone();

    position.make_null_move();
    assert_eq!(position.side_to_move(), Color::Black);
    assert_ne!(position.key(), before.key());
    assert_eq!(position.ep_square(), None);
    assert!(!position.legal_moves().is_empty());

    position.take_null_move();
    assert_eq!(position, before);
}
