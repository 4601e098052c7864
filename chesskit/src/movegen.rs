/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{
    bishop_rays, king_attacks, knight_attacks, pawn_attacks, piece_attacks, ray_between,
    ray_containing, rook_rays, Bitboard, CastleRight, CastlingSide, Color, Move, MoveKind,
    MoveList, PieceKind, Position, Rank, Square,
};

/// Which moves the generator produces.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum GenType {
    /// Every legal move.
    #[default]
    Legal,
    /// Moves that obey piece movement rules but may leave the King in check.
    ///
    /// When in check, this is the same as [`GenType::Evasions`].
    PseudoLegal,
    /// Captures, en passant, and promotions to a Queen (capturing or not).
    ///
    /// Meant for positions that are not in check.
    Captures,
    /// Non-captures, castling, and under-promotions (capturing or not).
    ///
    /// Meant for positions that are not in check.
    Quiets,
    /// Pseudo-legal moves that might get the King out of check. Empty when not in check.
    Evasions,
    /// Non-captures that give check, plus Knight promotions (capturing or not) that give check.
    ///
    /// Meant for positions that are not in check.
    QuietChecks,
}

impl Position {
    /// Generates every legal move in this position.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let position = Position::default();
    /// assert_eq!(position.legal_moves().len(), 20);
    /// ```
    #[inline(always)]
    pub fn legal_moves(&self) -> MoveList {
        self.generate_moves(GenType::Legal)
    }

    /// Generates the moves of the given [`GenType`] into a new list.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let position = Position::from_fen(FEN_KIWIPETE).unwrap();
    /// let captures = position.generate_moves(GenType::Captures);
    /// assert_eq!(captures.len(), 8);
    /// assert!(captures.iter().all(|mv| position.has(mv.to()) || mv.is_en_passant()));
    /// ```
    #[inline(always)]
    pub fn generate_moves(&self, gen: GenType) -> MoveList {
        let mut moves = MoveList::new();
        self.generate(gen, &mut moves);
        moves
    }

    /// Clears `moves` and fills it with the moves of the given [`GenType`].
    ///
    /// The order of the moves is the same every time for the same position and history.
    pub fn generate(&self, gen: GenType, moves: &mut MoveList) {
        moves.clear();
        let us = self.side_to_move();

        match gen {
            GenType::Legal => self.generate_legal(moves),
            GenType::PseudoLegal if self.in_check() => self.generate_evasions(moves),
            GenType::PseudoLegal => self.generate_all(gen, !self.color(us), moves),
            GenType::Captures => self.generate_all(gen, self.color(!us), moves),
            GenType::Quiets => self.generate_all(gen, self.empty(), moves),
            GenType::Evasions => self.generate_evasions(moves),
            GenType::QuietChecks => self.generate_quiet_checks(moves),
        }
    }

    fn generate_legal(&self, moves: &mut MoveList) {
        let us = self.side_to_move();
        if self.in_check() {
            self.generate_evasions(moves);
        } else {
            self.generate_all(GenType::PseudoLegal, !self.color(us), moves);
        }

        // Only moves of pinned pieces, the King, and en passant can expose the King.
        let pinned = self.pinned_pieces(us);
        let king = self.king_square(us);
        moves.retain(|mv| {
            let from = mv.from();
            let risky = pinned.contains(from) || Some(from) == king || mv.is_en_passant();
            !risky || self.is_legal(*mv)
        });
    }

    /// Generates every move of `gen` for the side to move, restricted to `target` squares
    /// (except for castling).
    fn generate_all(&self, gen: GenType, target: Bitboard, moves: &mut MoveList) {
        let us = self.side_to_move();
        let checks = gen == GenType::QuietChecks;

        self.generate_pawn_moves(gen, target, moves);
        for kind in [
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
        ] {
            self.generate_piece_moves(kind, checks, target, moves);
        }

        if !matches!(gen, GenType::QuietChecks | GenType::Evasions) {
            if let Some(king) = self.king_square(us) {
                for to in king_attacks(king) & target {
                    moves.push(Move::new(king, to, MoveKind::Normal));
                }
            }
        }

        if !matches!(gen, GenType::Captures | GenType::Evasions)
            && self.can_castle(CastleRight::for_color(us))
        {
            for side in [CastlingSide::King, CastlingSide::Queen] {
                self.generate_castling(CastleRight::new(us, side), checks, moves);
            }
        }
    }

    fn generate_piece_moves(
        &self,
        kind: PieceKind,
        checks: bool,
        target: Bitboard,
        moves: &mut MoveList,
    ) {
        let us = self.side_to_move();
        let occupied = self.occupied();
        let check_squares = self.check_squares(kind);

        for &from in self.squares(us, kind) {
            if checks {
                let rays = match kind {
                    PieceKind::Bishop => bishop_rays(from),
                    PieceKind::Rook => rook_rays(from),
                    PieceKind::Queen => bishop_rays(from) | rook_rays(from),
                    _ => Bitboard::FULL_BOARD,
                };
                if !(rays & target).intersects(check_squares) {
                    continue;
                }
                // Discovered checks were already generated.
                if self.blockers_for_king(!us).contains(from) {
                    continue;
                }
            }

            let mut attacks = piece_attacks(kind, from, occupied) & target;
            if checks {
                attacks &= check_squares;
            }

            for to in attacks {
                moves.push(Move::new(from, to, MoveKind::Normal));
            }
        }
    }

    fn generate_pawn_moves(&self, gen: GenType, target: Bitboard, moves: &mut MoveList) {
        let us = self.side_to_move();
        let them = !us;
        let pawns = self.pawns(us);
        let seventh = Rank::seventh(us).bitboard();
        let on_seventh = pawns & seventh;
        let not_on_seventh = pawns & !seventh;
        let third_rank = Bitboard::third_rank(us);

        // Rank offset from a pawn's destination back to its origin.
        let back: i8 = match us {
            Color::White => -1,
            Color::Black => 1,
        };

        let enemies = match gen {
            GenType::Evasions => self.color(them) & target,
            GenType::Captures => target,
            _ => self.color(them),
        };

        let mut empty = self.empty();

        // Single and double pushes, without promotions
        if gen != GenType::Captures {
            if matches!(gen, GenType::Quiets | GenType::QuietChecks) {
                empty = target;
            }

            let mut single = not_on_seventh.forward_by(us, 1) & empty;
            let mut double = (single & third_rank).forward_by(us, 1) & empty;

            if gen == GenType::Evasions {
                single &= target;
                double &= target;
            }

            if gen == GenType::QuietChecks {
                if let Some(king) = self.king_square(them) {
                    let checks = pawn_attacks(king, them);
                    single &= checks;
                    double &= checks;

                    // Pushes off a line to the King, unless the pawn stays on the King's file.
                    let candidates = self.blockers_for_king(them) & not_on_seventh;
                    let discovered = candidates.forward_by(us, 1) & empty & !king.file().bitboard();
                    single |= discovered;
                    double |= (discovered & third_rank).forward_by(us, 1) & empty;
                }
            }

            for to in single {
                if let Some(from) = to.offset(0, back) {
                    moves.push(Move::new(from, to, MoveKind::Normal));
                }
            }
            for to in double {
                if let Some(from) = to.offset(0, 2 * back) {
                    moves.push(Move::new(from, to, MoveKind::Normal));
                }
            }
        }

        // Promotions, capturing or not
        if on_seventh.is_nonempty() {
            if gen == GenType::Captures {
                empty = self.empty();
            }
            if gen == GenType::Evasions {
                empty &= target;
            }

            let enemy_king = self.king_square(them);
            let advanced = on_seventh.forward_by(us, 1);
            for (df, targets) in [
                (-1, advanced.east() & enemies),
                (1, advanced.west() & enemies),
                (0, advanced & empty),
            ] {
                for to in targets {
                    if let Some(from) = to.offset(df, back) {
                        Self::push_promotions(gen, from, to, enemy_king, moves);
                    }
                }
            }
        }

        // Regular captures and en passant
        if matches!(
            gen,
            GenType::Captures | GenType::Evasions | GenType::PseudoLegal
        ) {
            let advanced = not_on_seventh.forward_by(us, 1);
            for (df, targets) in [(-1, advanced.east() & enemies), (1, advanced.west() & enemies)] {
                for to in targets {
                    if let Some(from) = to.offset(df, back) {
                        moves.push(Move::new(from, to, MoveKind::Normal));
                    }
                }
            }

            if let Some(ep) = self.ep_square() {
                // While in check, en passant only helps by capturing the checking pawn.
                let pushed = ep.backward_by(us, 1);
                if gen != GenType::Evasions || pushed.is_some_and(|sq| target.contains(sq)) {
                    for from in not_on_seventh & pawn_attacks(ep, them) {
                        moves.push(Move::new(from, ep, MoveKind::EnPassant));
                    }
                }
            }
        }
    }

    fn push_promotions(
        gen: GenType,
        from: Square,
        to: Square,
        enemy_king: Option<Square>,
        moves: &mut MoveList,
    ) {
        if matches!(
            gen,
            GenType::Captures | GenType::Evasions | GenType::PseudoLegal
        ) {
            moves.push(Move::new_promotion(from, to, PieceKind::Queen));
        }

        if matches!(
            gen,
            GenType::Quiets | GenType::Evasions | GenType::PseudoLegal
        ) {
            for kind in [PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight] {
                moves.push(Move::new_promotion(from, to, kind));
            }
        }

        // A Knight is the only promotion that can check where a Queen would not.
        if gen == GenType::QuietChecks
            && enemy_king.is_some_and(|king| knight_attacks(to).contains(king))
        {
            moves.push(Move::new_promotion(from, to, PieceKind::Knight));
        }
    }

    fn generate_castling(&self, right: CastleRight, checks: bool, moves: &mut MoveList) {
        if !self.can_castle(right) || self.castling_impeded(right) {
            return;
        }
        let us = self.side_to_move();
        let (Some(king), Some(rook)) = (self.king_square(us), self.castling_rook_square(right))
        else {
            return;
        };

        let mv = Move::new(king, rook, MoveKind::Castling);
        // Rejects castling out of, through, or into check.
        if !self.is_legal(mv) {
            return;
        }
        if checks && !self.gives_check(mv) {
            return;
        }
        moves.push(mv);
    }

    fn generate_evasions(&self, moves: &mut MoveList) {
        let us = self.side_to_move();
        let checkers = self.checkers();
        let Some(king) = self.king_square(us) else {
            return;
        };
        if checkers.is_empty() {
            return;
        }

        // The King cannot step back along the line of a checking slider.
        let sliders = checkers & !(self.kind(PieceKind::Knight) | self.kind(PieceKind::Pawn));
        let slider_attacks = sliders
            .into_iter()
            .fold(Bitboard::EMPTY_BOARD, |acc, checker| {
                acc | (ray_containing(checker, king) ^ checker)
            });

        for to in king_attacks(king) & !self.color(us) & !slider_attacks {
            moves.push(Move::new(king, to, MoveKind::Normal));
        }

        // Only the King can escape a double check.
        if checkers.more_than_one() {
            return;
        }

        let checker = checkers.lsb_unchecked();
        let target = ray_between(checker, king) | checker;
        self.generate_all(GenType::Evasions, target, moves);
    }

    fn generate_quiet_checks(&self, moves: &mut MoveList) {
        let us = self.side_to_move();
        let Some(enemy_king) = self.king_square(!us) else {
            return;
        };
        let occupied = self.occupied();
        let empty = self.empty();

        // Pieces that uncover a check by moving anywhere off the line.
        for from in self.blockers_for_king(!us) & self.color(us) {
            let Some(kind) = self.kind_at(from) else {
                continue;
            };
            if kind == PieceKind::Pawn {
                continue;
            }

            let mut targets = piece_attacks(kind, from, occupied) & empty;
            if kind == PieceKind::King {
                targets &= !(rook_rays(enemy_king) | bishop_rays(enemy_king));
            }
            for to in targets {
                moves.push(Move::new(from, to, MoveKind::Normal));
            }
        }

        self.generate_all(GenType::QuietChecks, empty, moves);

        // Blockers moving along their own line do not uncover anything.
        moves.retain(|mv| self.gives_check(*mv));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FEN_KIWIPETE, FEN_PERFT_POS4, FEN_PERFT_POS5, FEN_STARTPOS};

    fn sorted(mut moves: Vec<Move>) -> Vec<Move> {
        moves.sort_by_key(|mv| mv.inner());
        moves
    }

    fn uci_moves(position: &Position, gen: GenType) -> Vec<String> {
        let mut moves = position
            .generate_moves(gen)
            .into_iter()
            .map(|mv| mv.to_uci(position.chess_mode()))
            .collect::<Vec<_>>();
        moves.sort();
        moves
    }

    #[test]
    fn test_captures_and_quiets_partition_pseudo_legal() {
        for fen in [FEN_STARTPOS, FEN_KIWIPETE, FEN_PERFT_POS5, "8/2P3k1/8/8/8/8/5K2/1r6 w - - 0 1"] {
            let position = Position::from_fen(fen).unwrap();
            assert!(!position.in_check());

            let mut split = position.generate_moves(GenType::Captures).to_vec();
            split.extend(position.generate_moves(GenType::Quiets));
            let all = position.generate_moves(GenType::PseudoLegal).to_vec();

            assert_eq!(sorted(split), sorted(all), "{fen}");
        }
    }

    #[test]
    fn test_legal_is_subset_of_pseudo_legal() {
        let position = Position::from_fen(FEN_PERFT_POS4).unwrap();
        let pseudo = position.generate_moves(GenType::PseudoLegal);
        let legal = position.legal_moves();

        assert!(legal.len() <= pseudo.len());
        for mv in &legal {
            assert!(pseudo.contains(mv), "{mv:?}");
            assert!(position.is_pseudo_legal(*mv), "{mv:?}");
        }
        for mv in &pseudo {
            assert_eq!(legal.contains(mv), position.is_legal(*mv), "{mv:?}");
        }
    }

    #[test]
    fn test_evasions_only_when_in_check() {
        let quiet = Position::default();
        assert!(quiet.generate_moves(GenType::Evasions).is_empty());

        // Back rank mate: the King's flight squares are on the Rook's line or blocked.
        let position = Position::from_fen("4k3/8/8/8/8/8/3PPP2/r3K3 w - - 0 1").unwrap();
        assert!(position.in_check());
        assert!(position.generate_moves(GenType::Evasions).is_empty());
        assert!(position.legal_moves().is_empty());

        // Capture the Rook, interpose on its line, or step off it.
        let position = Position::from_fen("4k3/8/8/8/8/1N6/3P1P2/r3K3 w - - 0 1").unwrap();
        let evasions = uci_moves(&position, GenType::Legal);
        assert_eq!(evasions, vec!["b3a1", "b3c1", "e1e2"]);
    }

    #[test]
    fn test_double_check_allows_only_king_moves() {
        let position = Position::from_fen("4k3/8/8/8/1b6/8/8/r3K2R w K - 0 1").unwrap();
        assert_eq!(position.checkers().population(), 2);
        assert!(position
            .legal_moves()
            .iter()
            .all(|mv| mv.from() == Square::E1 && !mv.is_castling()));
    }

    #[test]
    fn test_no_castling_through_attacked_square() {
        let position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        assert_eq!(position.legal_moves().iter().filter(|mv| mv.is_castling()).count(), 2);

        let position = Position::from_fen("r3k2r/8/8/8/8/8/5r2/R3K2R w KQkq - 0 1").unwrap();
        let castles = uci_moves(&position, GenType::Legal)
            .into_iter()
            .filter(|uci| uci == "e1g1" || uci == "e1c1")
            .collect::<Vec<_>>();
        assert_eq!(castles, vec!["e1c1"]);
    }

    #[test]
    fn test_en_passant_pinned_on_rank() {
        // Capturing would clear the rank between the King and the Rook.
        let position = Position::from_fen("8/8/8/K2pP2r/8/8/8/7k w - d6 0 1").unwrap();
        let ep = Move::new(Square::E5, Square::D6, MoveKind::EnPassant);
        assert!(position.generate_moves(GenType::PseudoLegal).contains(&ep));
        assert!(!position.legal_moves().contains(&ep));
    }

    #[test]
    fn test_en_passant_evasion() {
        // The double-pushed pawn gives check and can be taken en passant.
        let position = Position::from_fen("8/8/8/2k5/3Pp3/8/8/4K3 b - d3 0 1").unwrap();
        assert!(position.in_check());
        let ep = Move::new(Square::E4, Square::D3, MoveKind::EnPassant);
        assert!(position.legal_moves().contains(&ep));
    }

    #[test]
    fn test_quiet_checks_all_give_check() {
        for fen in [
            FEN_STARTPOS,
            FEN_KIWIPETE,
            FEN_PERFT_POS5,
            "4k3/8/8/8/8/8/4B3/4R1K1 w - - 0 1",
        ] {
            let position = Position::from_fen(fen).unwrap();
            let checks = position.generate_moves(GenType::QuietChecks);
            let quiets = position.generate_moves(GenType::Quiets);

            for mv in &checks {
                assert!(position.gives_check(*mv), "{fen}: {mv:?}");
                assert!(quiets.contains(mv), "{fen}: {mv:?}");
            }
            for mv in quiets.iter().filter(|mv| !mv.is_promotion()) {
                if position.gives_check(*mv) {
                    assert!(checks.contains(mv), "{fen}: missing {mv:?}");
                }
            }
        }
    }

    #[test]
    fn test_discovered_quiet_checks() {
        // Any Bishop move off the e-file uncovers the Rook.
        let position = Position::from_fen("4k3/8/8/8/8/8/4B3/4R1K1 w - - 0 1").unwrap();
        let checks = position.generate_moves(GenType::QuietChecks);
        let bishop_moves = checks.iter().filter(|mv| mv.from() == Square::E2).count();
        assert_eq!(bishop_moves, 9);
    }

    #[test]
    fn test_quiet_checks_include_capturing_knight_promotions() {
        let position = Position::from_fen("7r/5kP1/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let checks = uci_moves(&position, GenType::QuietChecks);
        assert!(checks.contains(&String::from("g7h8n")), "{checks:?}");
        assert!(!checks.contains(&String::from("g7g8n")), "{checks:?}");
    }

    #[test]
    fn test_promotions_split_by_type() {
        let position = Position::from_fen("1r5k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let captures = uci_moves(&position, GenType::Captures);
        assert_eq!(captures, vec!["a7a8q", "a7b8q"]);

        let quiets = uci_moves(&position, GenType::Quiets)
            .into_iter()
            .filter(|uci| uci.starts_with("a7"))
            .collect::<Vec<_>>();
        assert_eq!(
            quiets,
            vec!["a7a8b", "a7a8n", "a7a8r", "a7b8b", "a7b8n", "a7b8r"]
        );
    }

    #[test]
    fn test_generate_reuses_buffer() {
        let position = Position::from_fen(FEN_KIWIPETE).unwrap();
        let mut moves = MoveList::new();
        position.generate(GenType::Captures, &mut moves);
        position.generate(GenType::Legal, &mut moves);
        assert_eq!(moves.len(), 48);
    }
}
