/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{bishop_attacks, rook_attacks, Move, PieceKind, Position};

/// Material value, in internal units where a pawn is worth 128.
pub type Value = i32;

pub const PAWN_VALUE: Value = 128;
pub const KNIGHT_VALUE: Value = 781;
pub const BISHOP_VALUE: Value = 825;
pub const ROOK_VALUE: Value = 1276;
pub const QUEEN_VALUE: Value = 2538;

/// Material value of a piece kind for exchange purposes. The King is worth nothing.
///
/// # Example
/// ```
/// # use chesskit::*;
/// assert!(piece_value(PieceKind::Knight) < piece_value(PieceKind::Bishop));
/// assert_eq!(piece_value(PieceKind::King), 0);
/// ```
#[inline(always)]
pub const fn piece_value(kind: PieceKind) -> Value {
    match kind {
        PieceKind::Pawn => PAWN_VALUE,
        PieceKind::Knight => KNIGHT_VALUE,
        PieceKind::Bishop => BISHOP_VALUE,
        PieceKind::Rook => ROOK_VALUE,
        PieceKind::Queen => QUEEN_VALUE,
        PieceKind::King => 0,
    }
}

impl Position {
    /// Static exchange evaluation: returns `true` if making `mv` and then trading off every
    /// attacker of its destination square, cheapest first, wins at least `threshold`.
    ///
    /// Either side may stop capturing when continuing would make things worse for it.
    /// Pieces pinned to their King do not take part while their pinner is still on the board.
    /// Castling, en passant, and promotions count as an even trade.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let position = Position::from_fen("1k1r4/1pp4p/p7/4p3/8/P5P1/1PP4P/2K1R3 w - - 0 1").unwrap();
    /// let rxe5 = Move::new(Square::E1, Square::E5, MoveKind::Normal);
    /// assert!(position.see_ge(rxe5, PAWN_VALUE));
    /// assert!(!position.see_ge(rxe5, PAWN_VALUE + 1));
    /// ```
    pub fn see_ge(&self, mv: Move, threshold: Value) -> bool {
        if !mv.is_normal() {
            return 0 >= threshold;
        }

        let (from, to, _) = mv.parts();
        let Some(mover) = self.piece_at(from) else {
            return false;
        };

        // Best case: we win the target and lose nothing.
        let mut swap = self.kind_at(to).map_or(0, piece_value) - threshold;
        if swap < 0 {
            return false;
        }

        // Worst case: the mover is captured right back.
        swap = piece_value(mover.kind()) - swap;
        if swap <= 0 {
            return true;
        }

        let mut occupied = self.occupied() ^ from ^ to;
        let mut side = mover.color();
        let mut attackers = self.attacks_to_with(to, occupied);
        let mut res = 1;

        loop {
            side = !side;
            attackers &= occupied;

            let mut side_attackers = attackers & self.color(side);
            if side_attackers.is_empty() {
                break;
            }

            if !self.pinners(!side).intersects(!occupied) {
                side_attackers &= !self.blockers_for_king(side);
            }
            if side_attackers.is_empty() {
                break;
            }

            res ^= 1;

            let Some(kind) = PieceKind::all()
                .into_iter()
                .find(|&kind| side_attackers.intersects(self.kind(kind)))
            else {
                break;
            };

            if kind == PieceKind::King {
                // The King may only take last.
                return if attackers.intersects(!self.color(side)) {
                    res ^ 1 != 0
                } else {
                    res != 0
                };
            }

            swap = piece_value(kind) - swap;
            if swap < res {
                break;
            }

            let attacker = (side_attackers & self.kind(kind)).lsb_unchecked();
            occupied ^= attacker;

            // Removing the attacker may uncover a slider behind it.
            if matches!(kind, PieceKind::Pawn | PieceKind::Bishop | PieceKind::Queen) {
                attackers |= bishop_attacks(to, occupied) & self.diagonal_sliders();
            }
            if matches!(kind, PieceKind::Rook | PieceKind::Queen) {
                attackers |= rook_attacks(to, occupied) & self.orthogonal_sliders();
            }
        }

        res != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MoveKind, Square};

    #[test]
    fn test_see_undefended_pawn() {
        let position =
            Position::from_fen("1k1r4/1pp4p/p7/4p3/8/P5P1/1PP4P/2K1R3 w - - 0 1").unwrap();
        let rxe5 = Move::new(Square::E1, Square::E5, MoveKind::Normal);

        assert!(position.see_ge(rxe5, 0));
        assert!(position.see_ge(rxe5, PAWN_VALUE));
        assert!(!position.see_ge(rxe5, PAWN_VALUE + 1));
    }

    #[test]
    fn test_see_losing_knight_trade() {
        let position =
            Position::from_fen("1k1r3q/1ppn3p/p4b2/4p3/8/P2N2P1/1PP1R1BP/2K1Q3 w - - 0 1").unwrap();
        let nxe5 = Move::new(Square::D3, Square::E5, MoveKind::Normal);
        let expected = PAWN_VALUE - KNIGHT_VALUE;

        assert!(position.see_ge(nxe5, expected));
        assert!(!position.see_ge(nxe5, expected + 1));
        assert!(!position.see_ge(nxe5, 0));
        assert!(position.see_ge(nxe5, -1000));
    }

    #[test]
    fn test_see_is_monotonic() {
        let position =
            Position::from_fen("1k1r3q/1ppn3p/p4b2/4p3/8/P2N2P1/1PP1R1BP/2K1Q3 w - - 0 1").unwrap();

        for mv in position.legal_moves() {
            let mut was_true = true;
            for threshold in (-3000..=3000).step_by(97) {
                let result = position.see_ge(mv, threshold);
                assert!(was_true || !result, "{mv:?} passed {threshold} after failing lower");
                was_true = result;
            }
        }
    }

    #[test]
    fn test_see_quiet_move_into_pawn_attack() {
        let position = Position::from_fen("4k3/8/3p4/8/4N3/8/8/4K3 w - - 0 1").unwrap();
        let nc5 = Move::new(Square::E4, Square::C5, MoveKind::Normal);
        let nf6 = Move::new(Square::E4, Square::F6, MoveKind::Normal);

        assert!(!position.see_ge(nc5, 0));
        assert!(position.see_ge(nc5, -KNIGHT_VALUE));
        assert!(position.see_ge(nf6, 0));
    }
}
