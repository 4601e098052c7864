/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Result};

use super::{CastlingSide, File, Move, MoveKind, PieceKind, Position, Square};

/// The textual styles a [`Move`] can be written in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum MoveNotation {
    /// Standard algebraic notation, such as `Nf3`, `exd5`, `e8=Q+`, or `O-O`.
    #[default]
    San,
    /// Long algebraic notation, such as `Ng1-f3` or `e4xd5`.
    Lan,
    /// ICCF numeric notation, such as `7163`, with a trailing digit for promotions.
    Iccf,
    /// The notation spoken over UCI, such as `g1f3` or `e7e8q`.
    Uci,
}

impl fmt::Display for MoveNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::San => "SAN",
            Self::Lan => "LAN",
            Self::Iccf => "ICCF",
            Self::Uci => "UCI",
        };
        write!(f, "{name}")
    }
}

impl Position {
    /// Writes `mv` in the requested notation, in the context of this position.
    ///
    /// `mv` must be legal in this position. SAN and LAN get a trailing `+` or `#` when the move
    /// checks or mates.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let position = Position::default();
    /// let mv = Move::new(Square::G1, Square::F3, MoveKind::Normal);
    /// assert_eq!(position.to_notation(mv, MoveNotation::San), "Nf3");
    /// assert_eq!(position.to_notation(mv, MoveNotation::Lan), "Ng1-f3");
    /// assert_eq!(position.to_notation(mv, MoveNotation::Iccf), "7163");
    /// assert_eq!(position.to_notation(mv, MoveNotation::Uci), "g1f3");
    /// ```
    pub fn to_notation(&self, mv: Move, notation: MoveNotation) -> String {
        let mut text = self.notation_body(mv, notation);
        if matches!(notation, MoveNotation::San | MoveNotation::Lan) {
            text.push_str(self.check_suffix(mv));
        }
        text
    }

    /// Parses `text` as a legal move in this position, written in `notation`.
    ///
    /// Check and annotation suffixes (`+`, `#`, `!`, `?`) are ignored, and castling may be
    /// written with zeroes.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let position = Position::default();
    /// let mv = position.parse_move("Nf3", MoveNotation::San).unwrap();
    /// assert_eq!(mv, Move::new(Square::G1, Square::F3, MoveKind::Normal));
    /// assert!(position.parse_move("Nf4", MoveNotation::San).is_err());
    /// ```
    pub fn parse_move(&self, text: &str, notation: MoveNotation) -> Result<Move> {
        let text = text.trim();

        if notation == MoveNotation::Uci {
            let mv = Move::from_uci(self, text)?;
            if !self.legal_moves().contains(&mv) {
                bail!("Illegal move {text:?} in position {}", self.to_fen());
            }
            return Ok(mv);
        }

        let wanted = normalize(text, notation);
        let mut matching = self
            .legal_moves()
            .into_iter()
            .filter(|&mv| self.notation_body(mv, notation) == wanted);

        match (matching.next(), matching.next()) {
            (Some(mv), None) => Ok(mv),
            (Some(_), Some(_)) => bail!("Ambiguous {notation} move {text:?}"),
            (None, _) => bail!(
                "No legal move matches {notation} text {text:?} in position {}",
                self.to_fen()
            ),
        }
    }

    /// The move text without any check or mate suffix.
    fn notation_body(&self, mv: Move, notation: MoveNotation) -> String {
        match notation {
            MoveNotation::San => self.san_body(mv),
            MoveNotation::Lan => self.lan_body(mv),
            MoveNotation::Iccf => iccf(mv),
            MoveNotation::Uci => mv.to_uci(self.chess_mode()),
        }
    }

    fn san_body(&self, mv: Move) -> String {
        if let Some(side) = mv.castling_side() {
            return castling_text(side).to_string();
        }

        let (from, to, _) = mv.parts();
        let kind = self.kind_at(from).unwrap_or(PieceKind::Pawn);
        let is_capture = mv.is_en_passant() || self.has(to);

        let mut san = String::with_capacity(8);
        if kind == PieceKind::Pawn {
            if is_capture {
                san.push(from.file().char());
            }
        } else {
            san.push(kind.char().to_ascii_uppercase());
            self.push_disambiguation(&mut san, mv, kind);
        }

        if is_capture {
            san.push('x');
        }
        san.push_str(&to.to_string());

        if let Some(promotion) = mv.promotion() {
            san.push('=');
            san.push(promotion.char().to_ascii_uppercase());
        }

        san
    }

    /// Adds the file, rank, or full square of `mv`'s origin when another piece of the same kind
    /// could legally move to the same destination.
    fn push_disambiguation(&self, san: &mut String, mv: Move, kind: PieceKind) {
        let (from, to, _) = mv.parts();
        let us = self.side_to_move();
        let rivals = self.get_attacks(to, kind, self.occupied()) & self.piece_parts(us, kind);

        let mut ambiguous = false;
        let mut shares_file = false;
        let mut shares_rank = false;

        for square in rivals {
            if square == from || !self.is_legal(Move::new(square, to, MoveKind::Normal)) {
                continue;
            }

            ambiguous = true;
            if square.file() == from.file() {
                shares_file = true;
            } else if square.rank() == from.rank() {
                shares_rank = true;
            }
        }

        if !ambiguous {
            return;
        }

        if !shares_file {
            san.push(from.file().char());
        } else if !shares_rank {
            san.push(from.rank().char());
        } else {
            san.push_str(&from.to_string());
        }
    }

    fn lan_body(&self, mv: Move) -> String {
        if let Some(side) = mv.castling_side() {
            return castling_text(side).to_string();
        }

        let (from, to, _) = mv.parts();
        let kind = self.kind_at(from).unwrap_or(PieceKind::Pawn);
        let separator = if mv.is_en_passant() || self.has(to) {
            'x'
        } else {
            '-'
        };

        let mut lan = String::with_capacity(8);
        if kind != PieceKind::Pawn {
            lan.push(kind.char().to_ascii_uppercase());
        }
        lan.push_str(&format!("{from}{separator}{to}"));

        if let Some(promotion) = mv.promotion() {
            lan.push('=');
            lan.push(promotion.char().to_ascii_uppercase());
        }

        lan
    }

    fn check_suffix(&self, mv: Move) -> &'static str {
        if !self.gives_check(mv) {
            ""
        } else if self.with_move_made(mv).legal_moves().is_empty() {
            "#"
        } else {
            "+"
        }
    }
}

const fn castling_text(side: CastlingSide) -> &'static str {
    match side {
        CastlingSide::King => "O-O",
        CastlingSide::Queen => "O-O-O",
    }
}

/// ICCF text of a move: origin and destination as file and rank digits, then a digit for the
/// promoted piece (`1` queen, `2` rook, `3` bishop, `4` knight). Castling is written as the
/// King's two-square move.
fn iccf(mv: Move) -> String {
    let (from, mut to, _) = mv.parts();

    if let Some(side) = mv.castling_side() {
        let file = match side {
            CastlingSide::King => File::G,
            CastlingSide::Queen => File::C,
        };
        to = Square::new(file, from.rank());
    }

    let digits = |square: Square| {
        format!("{}{}", square.file().index() + 1, square.rank().index() + 1)
    };

    let mut text = digits(from) + &digits(to);
    if let Some(promotion) = mv.promotion() {
        let digit = match promotion {
            PieceKind::Queen => '1',
            PieceKind::Rook => '2',
            PieceKind::Bishop => '3',
            _ => '4',
        };
        text.push(digit);
    }
    text
}

/// Strips check and annotation marks from user text, and spells castling with letters.
fn normalize(text: &str, notation: MoveNotation) -> String {
    let text = text.trim_end_matches(['+', '#', '!', '?']);
    match notation {
        MoveNotation::San | MoveNotation::Lan => text.replace('0', "O"),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn san_of(fen: &str, uci: &str) -> String {
        let position = Position::from_fen(fen).unwrap();
        let mv = Move::from_uci(&position, uci).unwrap();
        position.to_notation(mv, MoveNotation::San)
    }

    #[test]
    fn test_san_same_rank_uses_file() {
        let fen = "8/6k1/8/8/8/8/1K1N1N2/8 w - - 0 1";
        assert_eq!(san_of(fen, "d2e4"), "Nde4");
        assert_eq!(san_of(fen, "f2e4"), "Nfe4");
    }

    #[test]
    fn test_san_same_file_uses_rank() {
        let fen = "8/6k1/8/8/3N4/8/1K1N4/8 w - - 0 1";
        assert_eq!(san_of(fen, "d2f3"), "N2f3");
        assert_eq!(san_of(fen, "d4f3"), "N4f3");
    }

    #[test]
    fn test_san_needs_full_square() {
        let fen = "4k3/8/8/8/8/Q7/8/Q1Q3K1 w - - 0 1";
        assert_eq!(san_of(fen, "a1b2"), "Qa1b2");
        assert_eq!(san_of(fen, "a3b2"), "Q3b2");
        assert_eq!(san_of(fen, "c1b2"), "Qcb2");
    }

    #[test]
    fn test_san_unrelated_rivals_use_file() {
        let position = Position::from_fen("5r1k/p6p/4r1n1/3NPp2/8/8/PP4RP/4R1K1 w - - 3 53").unwrap();
        let sans = position
            .legal_moves()
            .into_iter()
            .map(|mv| position.to_notation(mv, MoveNotation::San))
            .collect::<Vec<_>>();

        assert!(sans.contains(&"Ree2".to_string()));
        assert!(sans.contains(&"Rge2".to_string()));
    }

    #[test]
    fn test_san_pinned_rival_is_not_ambiguous() {
        // The c3 knight is pinned by the a5 bishop, so only one knight can reach e2.
        let fen = "4k3/8/8/b7/8/2N5/8/4K1N1 w - - 0 1";
        assert_eq!(san_of(fen, "g1e2"), "Ne2");
    }

    #[test]
    fn test_san_capture_with_check() {
        let fen = "2rr2k1/p3ppbp/b1n3p1/2p1P3/5P2/2N3P1/PP2N1BP/3R1RK1 w - - 2 18";
        assert_eq!(san_of(fen, "d1d8"), "Rxd8+");
    }

    #[test]
    fn test_san_recapture_is_not_mate() {
        let position =
            Position::from_fen("2rR2k1/p3ppbp/b1n3p1/2p1P3/5P2/2N3P1/PP2N1BP/5RK1 b - - 0 36")
                .unwrap();
        let mut sans = position
            .legal_moves()
            .into_iter()
            .map(|mv| position.to_notation(mv, MoveNotation::San))
            .collect::<Vec<_>>();
        sans.sort();

        assert_eq!(sans, ["Bf8", "Nxd8", "Rxd8"]);
    }

    #[test]
    fn test_san_mate_pawns_and_castling() {
        let fools = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2";
        assert_eq!(san_of(fools, "d8h4"), "Qh4#");

        let castles = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        assert_eq!(san_of(castles, "e1g1"), "O-O");
        assert_eq!(san_of(castles, "e1c1"), "O-O-O");

        let promotion = "3r3k/4P3/8/8/8/8/8/4K3 w - - 0 1";
        assert_eq!(san_of(promotion, "e7d8q"), "exd8=Q+");
        assert_eq!(san_of(promotion, "e7e8n"), "e8=N");

        let en_passant = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2";
        assert_eq!(san_of(en_passant, "e5d6"), "exd6");
    }

    #[test]
    fn test_lan() {
        let position = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K1N1 w - d6 0 2").unwrap();
        let lan = |uci: &str| {
            let mv = Move::from_uci(&position, uci).unwrap();
            position.to_notation(mv, MoveNotation::Lan)
        };

        assert_eq!(lan("g1f3"), "Ng1-f3");
        assert_eq!(lan("e5d6"), "e5xd6");
        assert_eq!(lan("e5e6"), "e5-e6");
    }

    #[test]
    fn test_iccf() {
        let position = Position::from_fen("8/6k1/8/8/3N4/8/1K1N4/8 w - - 0 1").unwrap();
        let mv = Move::new(Square::D2, Square::F3, MoveKind::Normal);
        assert_eq!(position.to_notation(mv, MoveNotation::Iccf), "4263");

        let position = Position::from_fen("8/1P4k1/8/8/8/8/1K6/8 w - - 0 1").unwrap();
        let expected = [
            (PieceKind::Queen, "27281"),
            (PieceKind::Rook, "27282"),
            (PieceKind::Bishop, "27283"),
            (PieceKind::Knight, "27284"),
        ];
        for (promotion, text) in expected {
            let mv = Move::new_promotion(Square::B7, Square::B8, promotion);
            assert_eq!(position.to_notation(mv, MoveNotation::Iccf), text);
        }

        let castle = Move::new(Square::E1, Square::H1, MoveKind::Castling);
        assert_eq!(iccf(castle), "5171");
    }

    #[test]
    fn test_parse_every_legal_move_back() {
        let kiwipete = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let position = Position::from_fen(kiwipete).unwrap();

        for notation in [
            MoveNotation::San,
            MoveNotation::Lan,
            MoveNotation::Iccf,
            MoveNotation::Uci,
        ] {
            for mv in position.legal_moves() {
                let text = position.to_notation(mv, notation);
                let parsed = position.parse_move(&text, notation).unwrap();
                assert_eq!(parsed, mv, "{notation} text {text:?}");
            }
        }
    }

    #[test]
    fn test_parse_loose_input() {
        let position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let castle = position.parse_move("0-0-0", MoveNotation::San).unwrap();
        assert_eq!(castle, Move::new(Square::E1, Square::A1, MoveKind::Castling));

        let check = position.parse_move("Rxa8+!", MoveNotation::San).unwrap();
        assert_eq!(check, Move::new(Square::A1, Square::A8, MoveKind::Normal));

        assert!(position.parse_move("Rb8", MoveNotation::San).is_err());
        assert!(position.parse_move("e1e2e3", MoveNotation::Uci).is_err());
    }
}
