/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Deref, str::FromStr};

use anyhow::{anyhow, bail, Result};

use super::{
    aligned, bishop_attacks, bishop_rays, king_attacks, knight_attacks, pawn_attacks,
    pawn_attacks_from, piece_attacks, ray_between, ray_containing, rook_attacks, rook_rays,
    Bitboard, Board, CastleRight, CastlingSide, Color, File, GenType, Move, MoveKind, Piece,
    PieceKind, Rank, Square, State, ValidationError, ZobristKey, FEN_STARTPOS,
};
use crate::zobrist::cuckoo_move;

/// Which castling rules a [`Position`] follows.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum ChessMode {
    /// Standard chess. FEN castling rights are written `KQkq`.
    #[default]
    Normal,
    /// Fischer random chess. FEN castling rights are written as Rook files, such as `HAha`.
    Chess960,
}

/// The outcome, or lack of one, of a [`Position`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GameStatus {
    /// The side to move has legal moves and is not in check.
    Normal,
    /// The side to move is in check but can escape.
    InCheck,
    /// The side to move is in check and cannot escape.
    Mate,
    /// The side to move has no legal moves but is not in check.
    Stalemate,
    /// Drawn by the fifty-move rule, repetition, or insufficient material.
    Drawn,
}

/// A chess position, together with the history needed to take moves back.
///
/// Dereferences to its [`Board`], so all of the board's queries are available directly.
///
/// Each ply has its own [`State`] on a stack. [`Position::make_move`] pushes one and
/// [`Position::take_move`] pops it, restoring the previous ply without recomputing anything.
#[derive(Clone)]
pub struct Position {
    /// Piece placement.
    board: Board,

    /// One entry per ply since the position was set. Never empty.
    states: Vec<State>,

    chess_mode: ChessMode,

    /// Rights lost when a piece leaves or is captured on each square.
    castling_rights_mask: [CastleRight; Square::COUNT],

    /// Starting square of the Rook for each single right.
    castling_rook_square: [Option<Square>; CastleRight::COUNT],

    /// Squares that must be empty to castle, excluding the King and Rook themselves.
    castling_path: [Bitboard; CastleRight::COUNT],

    /// Squares the King passes over or lands on, which must not be attacked.
    castling_king_path: [Bitboard; CastleRight::COUNT],
}

impl Position {
    /// Creates a new, empty [`Position`] with the following properties:
    /// * No pieces on the board
    /// * White moves first
    /// * No castling rights
    /// * No en passant square available
    /// * Halfmove counter set to 0
    /// * Fullmove counter set to 1
    ///
    /// # Example
    /// ```
    /// # use chesskit::Position;
    /// let position = Position::new();
    /// assert_eq!(position.to_fen(), "8/8/8/8/8/8/8/8 w - - 0 1");
    /// ```
    pub fn new() -> Self {
        let board = Board::new();
        let state = State {
            fullmove: 1,
            key: ZobristKey::from_parts(&board, Color::White, CastleRight::NONE, None),
            ..Default::default()
        };

        Self {
            board,
            states: vec![state],
            chess_mode: ChessMode::Normal,
            castling_rights_mask: [CastleRight::NONE; Square::COUNT],
            castling_rook_square: [None; CastleRight::COUNT],
            castling_path: [Bitboard::EMPTY_BOARD; CastleRight::COUNT],
            castling_king_path: [Bitboard::EMPTY_BOARD; CastleRight::COUNT],
        }
    }

    /// Creates a new standard chess [`Position`] from the provided FEN string, without validating it.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let position = Position::from_fen(FEN_KIWIPETE).unwrap();
    /// assert_eq!(position.to_fen(), FEN_KIWIPETE);
    /// ```
    #[inline(always)]
    pub fn from_fen(fen: &str) -> Result<Self> {
        Self::from_fen_with(fen, ChessMode::Normal, false)
    }

    /// Creates a new [`Position`] from the provided FEN string.
    ///
    /// Castling rights may be given as `KQkq` or as Rook files (`HAha`) in either mode.
    /// Missing trailing fields fall back to `w - - 0 1`.
    ///
    /// If `validate` is set, the position is also checked with [`Position::validate`],
    /// and the returned error can be downcast to a [`ValidationError`].
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let err = Position::from_fen_with("8/8/8/8/8/8/8/K7 w - - 0 1", ChessMode::Normal, true)
    ///     .unwrap_err();
    /// assert!(matches!(
    ///     err.downcast_ref::<ValidationError>(),
    ///     Some(ValidationError::KingCount { .. })
    /// ));
    /// ```
    pub fn from_fen_with(fen: &str, mode: ChessMode, validate: bool) -> Result<Self> {
        let mut pos = Self::new();
        pos.chess_mode = mode;

        let mut split = fen.split_whitespace();
        let placements = split.next().ok_or(anyhow!(
            "Invalid FEN string: FEN string must have piece placements."
        ))?;
        pos.board = Board::from_fen(placements)?;

        let mut state = State {
            fullmove: 1,
            ..Default::default()
        };

        let active_color = split.next().unwrap_or_else(|| {
            log::warn!("FEN {fen:?} has no side to move; assuming White");
            "w"
        });
        state.side_to_move = Color::from_str(active_color)?;

        let castling = split.next().unwrap_or_else(|| {
            log::warn!("FEN {fen:?} has no castling rights; assuming none");
            "-"
        });
        if castling != "-" {
            for c in castling.chars() {
                let color = Color::from_bool(c.is_ascii_lowercase());
                let rook = pos.find_castling_rook(color, c)?;
                pos.add_castling_right(&mut state, color, rook)?;
            }
        }

        let en_passant_target = split.next().unwrap_or_else(|| {
            log::warn!("FEN {fen:?} has no en passant square; assuming none");
            "-"
        });
        if en_passant_target != "-" {
            let square = Square::from_uci(en_passant_target)?;
            if pos.is_valid_ep_square(state.side_to_move, square) {
                state.ep_square = Some(square);
            } else if validate {
                return Err(ValidationError::InvalidEnPassant { square }.into());
            } else {
                log::warn!("Ignoring impossible en passant square {square} in FEN {fen:?}");
            }
        }

        let halfmove = split.next().unwrap_or_else(|| {
            log::warn!("FEN {fen:?} has no halfmove clock; assuming 0");
            "0"
        });
        state.rule50 = halfmove.parse().or(Err(anyhow!(
            "Invalid FEN string: FEN string must have valid halfmove counter. Got {halfmove}"
        )))?;

        let fullmove = split.next().unwrap_or_else(|| {
            log::warn!("FEN {fen:?} has no fullmove number; assuming 1");
            "1"
        });
        state.fullmove = fullmove.parse::<usize>().or(Err(anyhow!(
            "Invalid FEN string: FEN string must have valid fullmove counter. Got {fullmove}"
        )))?;
        state.fullmove = state.fullmove.max(1);

        state.key = ZobristKey::from_parts(
            &pos.board,
            state.side_to_move,
            state.castle_rights,
            state.ep_square,
        );
        state.pawn_key = ZobristKey::pawns_of(&pos.board);
        if let Some(king) = pos.king_square(state.side_to_move) {
            state.checkers = pos.attacks_to(king) & pos.color(!state.side_to_move);
        }
        pos.update_check_info(&mut state);
        pos.states = vec![state];

        if validate {
            pos.validate()?;
        }

        log::trace!("Set position {}", pos.to_fen());
        Ok(pos)
    }

    /// Replaces this position with the one described by `fen`.
    ///
    /// On error, `self` is left untouched.
    pub fn set(&mut self, fen: &str, mode: ChessMode, validate: bool) -> Result<()> {
        *self = Self::from_fen_with(fen, mode, validate)?;
        Ok(())
    }

    /// Resolves one FEN castling character to the square of the Rook it refers to.
    fn find_castling_rook(&self, color: Color, c: char) -> Result<Square> {
        let Some(king) = self.king_square(color) else {
            bail!("Castling right {c:?} given, but {} has no King", color.name());
        };
        let rank = Rank::first(color);
        if king.rank() != rank {
            bail!("Castling right {c:?} given, but {}'s King is not on its back rank", color.name());
        }
        let rook = Piece::new(color, PieceKind::Rook);
        let is_rook = |file: File| self.piece_at(Square::new(file, rank)) == Some(rook);

        let file = match c.to_ascii_uppercase() {
            // Outermost Rook on each side of the King.
            'K' => File::iter().rev().take_while(|&f| f > king.file()).find(|&f| is_rook(f)),
            'Q' => File::iter().take_while(|&f| f < king.file()).find(|&f| is_rook(f)),
            'A'..='H' => Some(File::from_char(c)?).filter(|&f| is_rook(f) && f != king.file()),
            _ => bail!("Invalid FEN string: invalid castling character {c:?}"),
        };

        let Some(file) = file else {
            bail!("Castling right {c:?} given, but there is no matching {} Rook", color.name());
        };
        Ok(Square::new(file, rank))
    }

    fn add_castling_right(&mut self, state: &mut State, color: Color, rook: Square) -> Result<()> {
        let Some(king) = self.king_square(color) else {
            bail!("Cannot castle without a King");
        };
        let side = if rook > king {
            CastlingSide::King
        } else {
            CastlingSide::Queen
        };
        let right = CastleRight::new(color, side);
        if state.castle_rights.has(right) {
            bail!("Invalid FEN string: castling right {right} given twice");
        }

        state.castle_rights |= right;
        self.castling_rights_mask[king] |= right;
        self.castling_rights_mask[rook] |= right;
        self.castling_rook_square[right.index()] = Some(rook);

        let king_to = side.king_destination(color);
        let rook_to = side.rook_destination(color);
        self.castling_path[right.index()] = (ray_between(rook, rook_to)
            | ray_between(king, king_to)
            | rook_to
            | king_to)
            & !(king.bitboard() | rook);
        self.castling_king_path[right.index()] = ray_between(king, king_to) | king_to;

        Ok(())
    }

    /// An en passant square is only kept if a pawn could just have double-pushed past it.
    fn is_valid_ep_square(&self, side_to_move: Color, square: Square) -> bool {
        square.relative_rank(side_to_move) == Rank::SIX
            && !self.has(square)
            && square
                .forward_by(side_to_move, 1)
                .is_some_and(|origin| !self.has(origin))
            && square.backward_by(side_to_move, 1).is_some_and(|pushed| {
                self.piece_at(pushed) == Some(Piece::new(!side_to_move, PieceKind::Pawn))
            })
    }

    /// Generates a FEN string from this [`Position`].
    ///
    /// In [`ChessMode::Chess960`], castling rights are written as Rook files.
    pub fn to_fen(&self) -> String {
        let placements = self.board.to_fen();
        let active_color = self.side_to_move();
        let castling = self.castling_rights_fen();

        let en_passant_target = if let Some(square) = self.ep_square() {
            square.to_string()
        } else {
            String::from("-")
        };

        let halfmove = self.halfmove();
        let fullmove = self.fullmove();

        format!("{placements} {active_color} {castling} {en_passant_target} {halfmove} {fullmove}")
    }

    fn castling_rights_fen(&self) -> String {
        let rights = self.castling_rights();
        if self.chess_mode == ChessMode::Normal || rights.is_empty() {
            return rights.to_uci();
        }

        CastleRight::all()
            .into_iter()
            .filter(|&right| rights.has(right))
            .filter_map(|right| {
                let file = self.castling_rook_square(right)?.file().char();
                Some(match right.color() {
                    Color::White => file.to_ascii_uppercase(),
                    Color::Black => file,
                })
            })
            .collect()
    }

    /// Copies `self` and returns a [`Position`] after having applied the provided [`Move`].
    #[inline(always)]
    pub fn with_move_made(&self, mv: Move) -> Self {
        let mut copied = self.clone();
        copied.make_move(mv);
        copied
    }

    /// The [`State`] of the current ply.
    #[inline(always)]
    pub fn state(&self) -> &State {
        // `states` is never empty
        &self.states[self.states.len() - 1]
    }

    /// Fetches this position's [`Board`].
    #[inline(always)]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[inline(always)]
    pub const fn chess_mode(&self) -> ChessMode {
        self.chess_mode
    }

    #[inline(always)]
    pub fn is_chess960(&self) -> bool {
        self.chess_mode == ChessMode::Chess960
    }

    /// Returns the current player as a [`Color`].
    #[inline(always)]
    pub fn side_to_move(&self) -> Color {
        self.state().side_to_move
    }

    /// The square a pawn just skipped over with a double push, if the last move was one.
    #[inline(always)]
    pub fn ep_square(&self) -> Option<Square> {
        self.state().ep_square
    }

    #[inline(always)]
    pub fn castling_rights(&self) -> CastleRight {
        self.state().castle_rights
    }

    /// Plies since the last capture or pawn move.
    #[inline(always)]
    pub fn halfmove(&self) -> usize {
        self.state().rule50
    }

    #[inline(always)]
    pub fn fullmove(&self) -> usize {
        self.state().fullmove
    }

    /// Plies since the start of the game, derived from the move counters.
    #[inline(always)]
    pub fn game_ply(&self) -> usize {
        2 * (self.fullmove() - 1) + self.side_to_move().index()
    }

    /// Fetch the Zobrist hash key of this position.
    #[inline(always)]
    pub fn key(&self) -> ZobristKey {
        self.state().key
    }

    /// Zobrist key of the pawns alone.
    #[inline(always)]
    pub fn pawn_key(&self) -> ZobristKey {
        self.state().pawn_key
    }

    /// The piece captured by the last move, if any.
    #[inline(always)]
    pub fn captured_piece(&self) -> Option<Piece> {
        self.state().captured
    }

    /// The piece that `mv` would move.
    #[inline(always)]
    pub fn moved_piece(&self, mv: Move) -> Option<Piece> {
        self.piece_at(mv.from())
    }

    /// Pieces giving check to the side to move.
    #[inline(always)]
    pub fn checkers(&self) -> Bitboard {
        self.state().checkers
    }

    #[inline(always)]
    pub fn in_check(&self) -> bool {
        self.checkers().is_nonempty()
    }

    /// Pieces of either color that shield `color`'s King from an enemy slider.
    #[inline(always)]
    pub fn blockers_for_king(&self, color: Color) -> Bitboard {
        self.state().blockers_for_king[color]
    }

    /// `color`'s own pieces that are pinned to its King.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let position = Position::from_fen("4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
    /// assert_eq!(position.pinned_pieces(Color::White), Square::E2.bitboard());
    /// ```
    #[inline(always)]
    pub fn pinned_pieces(&self, color: Color) -> Bitboard {
        self.blockers_for_king(color) & self.color(color)
    }

    /// Sliders of `color` that pin a piece to the enemy King.
    #[inline(always)]
    pub fn pinners(&self, color: Color) -> Bitboard {
        self.state().pinners[color]
    }

    /// Squares from which a piece of `kind` would give check to the side not to move.
    #[inline(always)]
    pub fn check_squares(&self, kind: PieceKind) -> Bitboard {
        self.state().check_squares[kind]
    }

    /// Returns `true` if any right in `rights` is still held.
    #[inline(always)]
    pub fn can_castle(&self, rights: CastleRight) -> bool {
        self.castling_rights().has(rights)
    }

    /// Returns `true` if a piece stands between the King and Rook of a single right,
    /// or on either of their destinations.
    #[inline(always)]
    pub fn castling_impeded(&self, right: CastleRight) -> bool {
        self.occupied().intersects(self.castling_path[right.index()])
    }

    /// Starting square of the Rook for a single castling right, if it was set up.
    #[inline(always)]
    pub fn castling_rook_square(&self, right: CastleRight) -> Option<Square> {
        self.castling_rook_square[right.index()]
    }

    /// Rights that are lost when the piece on `square` moves or is captured.
    #[inline(always)]
    pub fn castling_rights_mask(&self, square: Square) -> CastleRight {
        self.castling_rights_mask[square]
    }

    /// Squares the King crosses or lands on when castling with a single right.
    #[inline(always)]
    pub(crate) fn castling_king_path(&self, right: CastleRight) -> Bitboard {
        self.castling_king_path[right.index()]
    }

    /// All pieces of both colors attacking `square`, given `occupied` as blockers.
    pub fn attacks_to_with(&self, square: Square, occupied: Bitboard) -> Bitboard {
        (pawn_attacks(square, Color::Black) & self.pawns(Color::White))
            | (pawn_attacks(square, Color::White) & self.pawns(Color::Black))
            | (knight_attacks(square) & self.kind(PieceKind::Knight))
            | (rook_attacks(square, occupied) & self.orthogonal_sliders())
            | (bishop_attacks(square, occupied) & self.diagonal_sliders())
            | (king_attacks(square) & self.kind(PieceKind::King))
    }

    /// All pieces of both colors attacking `square`.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let position = Position::default();
    /// let defenders = Square::B1.bitboard() | Square::C1 | Square::D1 | Square::E1;
    /// assert_eq!(position.attacks_to(Square::D2), defenders);
    /// assert!(position.attacks_to(Square::E4).is_empty());
    /// ```
    #[inline(always)]
    pub fn attacks_to(&self, square: Square) -> Bitboard {
        self.attacks_to_with(square, self.occupied())
    }

    /// Squares a piece of `kind` on `square` attacks, given `occupied` as blockers.
    ///
    /// Pawns attack as the side to move's pawns do.
    #[inline(always)]
    pub fn get_attacks(&self, square: Square, kind: PieceKind, occupied: Bitboard) -> Bitboard {
        match kind {
            PieceKind::Pawn => pawn_attacks(square, self.side_to_move()),
            kind => piece_attacks(kind, square, occupied),
        }
    }

    /// Every square attacked by `color`'s pieces of `kind`.
    pub fn attacks_by(&self, kind: PieceKind, color: Color) -> Bitboard {
        let pieces = self.piece_parts(color, kind);
        if kind == PieceKind::Pawn {
            return pawn_attacks_from(pieces, color);
        }
        pieces
            .into_iter()
            .fold(Bitboard::EMPTY_BOARD, |acc, square| {
                acc | piece_attacks(kind, square, self.occupied())
            })
    }

    /// Returns `true` if any of `by`'s pieces attack `square`.
    #[inline(always)]
    pub fn is_attacked(&self, square: Square, by: Color) -> bool {
        self.attacks_to(square).intersects(self.color(by))
    }

    pub fn attacked_by_slider(&self, square: Square, by: Color) -> bool {
        let occupied = self.occupied();
        let rooks = rook_attacks(square, occupied) & self.orthogonal_sliders();
        let bishops = bishop_attacks(square, occupied) & self.diagonal_sliders();
        (rooks | bishops).intersects(self.color(by))
    }

    #[inline(always)]
    pub fn attacked_by_knight(&self, square: Square, by: Color) -> bool {
        knight_attacks(square).intersects(self.piece_parts(by, PieceKind::Knight))
    }

    #[inline(always)]
    pub fn attacked_by_pawn(&self, square: Square, by: Color) -> bool {
        pawn_attacks(square, !by).intersects(self.pawns(by))
    }

    #[inline(always)]
    pub fn attacked_by_king(&self, square: Square, by: Color) -> bool {
        king_attacks(square).intersects(self.king(by))
    }

    /// Pieces shielding `square` from `sliders`, and the sliders that pin a piece of the same
    /// color as the one on `square`.
    fn slider_blockers(&self, sliders: Bitboard, square: Square) -> (Bitboard, Bitboard) {
        let mut blockers = Bitboard::EMPTY_BOARD;
        let mut pinners = Bitboard::EMPTY_BOARD;

        let snipers = ((rook_rays(square) & self.orthogonal_sliders())
            | (bishop_rays(square) & self.diagonal_sliders()))
            & sliders;
        let occupancy = self.occupied() ^ snipers;

        let Some(color) = self.color_at(square) else {
            return (blockers, pinners);
        };

        for sniper in snipers {
            let between = ray_between(square, sniper) & occupancy;
            if between.is_nonempty() && !between.more_than_one() {
                blockers |= between;
                if between.intersects(self.color(color)) {
                    pinners |= sniper;
                }
            }
        }

        (blockers, pinners)
    }

    /// Fills in pins, blockers, and check squares of `state` from the current board.
    fn update_check_info(&self, state: &mut State) {
        for color in Color::all() {
            if let Some(king) = self.king_square(color) {
                let (blockers, pinners) = self.slider_blockers(self.color(!color), king);
                state.blockers_for_king[color] = blockers;
                state.pinners[!color] = pinners;
            }
        }

        let them = !state.side_to_move;
        let Some(king) = self.king_square(them) else {
            return;
        };
        let occupied = self.occupied();
        let bishop = bishop_attacks(king, occupied);
        let rook = rook_attacks(king, occupied);

        state.check_squares = [
            pawn_attacks(king, them),
            knight_attacks(king),
            bishop,
            rook,
            bishop | rook,
            Bitboard::EMPTY_BOARD,
        ];
    }

    /// Applies `mv`, which must be legal in this position.
    ///
    /// Passing an illegal move leaves the position in an unspecified state.
    /// Use [`Position::make_move_checked`] for moves from an untrusted source.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let mut position = Position::default();
    /// let mv = Move::from_uci(&position, "e2e4").unwrap();
    /// position.make_move(mv);
    /// assert_eq!(position.to_fen(), "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
    /// position.take_move(mv);
    /// assert_eq!(position.to_fen(), FEN_STARTPOS);
    /// ```
    #[inline(always)]
    pub fn make_move(&mut self, mv: Move) {
        let gives_check = self.gives_check(mv);
        self.make_move_with_check(mv, gives_check);
    }

    /// Applies `mv`, using a precomputed result of [`Position::gives_check`].
    pub fn make_move_with_check(&mut self, mv: Move, gives_check: bool) {
        let prev = *self.state();
        let mut state = prev.next();
        let us = prev.side_to_move;
        let them = !us;
        let (from, to, kind) = mv.parts();

        let Some(piece) = self.piece_at(from) else {
            debug_assert!(false, "no piece on {from} to make {mv:?} in {self}");
            return;
        };
        debug_assert_eq!(piece.color(), us, "{mv:?} moves the wrong color in {self}");

        let mut key = prev.key;
        key.hash_side_to_move();

        if let Some(ep) = prev.ep_square {
            key.hash_ep_square(ep);
        }

        if kind == MoveKind::Castling {
            let side = mv.castling_side().unwrap_or(CastlingSide::King);
            let rook = Piece::new(us, PieceKind::Rook);
            let king_to = side.king_destination(us);
            let rook_to = side.rook_destination(us);

            self.castle_pieces(from, to, king_to, rook_to);
            key.hash_piece(from, piece);
            key.hash_piece(king_to, piece);
            key.hash_piece(to, rook);
            key.hash_piece(rook_to, rook);
        } else {
            let captured_square = if kind == MoveKind::EnPassant {
                to.backward_by(us, 1).unwrap_or(to)
            } else {
                to
            };

            if let Some(captured) = self.board.remove_piece(captured_square) {
                debug_assert_eq!(captured.color(), them, "{mv:?} captures its own piece");
                key.hash_piece(captured_square, captured);
                if captured.is_pawn() {
                    state.pawn_key.hash_piece(captured_square, captured);
                }
                state.captured = Some(captured);
                state.rule50 = 0;
            }

            self.board.move_piece(from, to);
            key.hash_piece(from, piece);
            key.hash_piece(to, piece);
        }

        let lost = self.castling_rights_mask[from] | self.castling_rights_mask[to];
        if state.castle_rights.has(lost) {
            key.hash_castling_rights(state.castle_rights);
            state.castle_rights = state.castle_rights.without(lost);
            key.hash_castling_rights(state.castle_rights);
        }

        if piece.is_pawn() {
            state.rule50 = 0;
            state.pawn_key.hash_piece(from, piece);

            if let Some(promotion) = mv.promotion() {
                let promoted = piece.promoted(promotion);
                self.board.remove_piece(to);
                self.board.add_piece(promoted, to);
                key.hash_piece(to, piece);
                key.hash_piece(to, promoted);
            } else {
                state.pawn_key.hash_piece(to, piece);

                if from.rank().abs_diff(to.rank()) == 2 {
                    state.ep_square = from.forward_by(us, 1);
                    key.hash_optional_ep_square(state.ep_square);
                }
            }
        }

        state.key = key;

        if gives_check {
            if let Some(king) = self.king_square(them) {
                state.checkers = self.attacks_to(king) & self.color(us);
            }
        }
        debug_assert_eq!(
            state.checkers,
            self.king_square(them)
                .map(|king| self.attacks_to(king) & self.color(us))
                .unwrap_or_default(),
            "gives_check was wrong for {mv:?}"
        );

        self.update_check_info(&mut state);
        state.repetition = self.find_repetition(&state);
        self.states.push(state);
    }

    /// Plies back to the last occurrence of `state`'s key, negated if that one was itself a repetition.
    fn find_repetition(&self, state: &State) -> i32 {
        let end = state.rule50.min(state.plies_from_null);
        // `state` has not been pushed yet, so it would sit at `self.states.len()`.
        let current = self.states.len();

        (4..=end)
            .step_by(2)
            .filter_map(|distance| {
                let earlier = self.states.get(current.checked_sub(distance)?)?;
                (earlier.key == state.key).then_some((distance, earlier.repetition))
            })
            .next()
            .map(|(distance, earlier)| {
                if earlier != 0 {
                    -(distance as i32)
                } else {
                    distance as i32
                }
            })
            .unwrap_or(0)
    }

    /// Moves the King and Rook of a castling move. Either may land on the other's start square.
    fn castle_pieces(&mut self, king_from: Square, rook_from: Square, king_to: Square, rook_to: Square) {
        let king = self.board.remove_piece(king_from);
        let rook = self.board.remove_piece(rook_from);
        if let (Some(king), Some(rook)) = (king, rook) {
            self.board.add_piece(king, king_to);
            self.board.add_piece(rook, rook_to);
        }
    }

    /// Validates `mv` and then applies it, returning an error if it is not legal.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let mut position = Position::default();
    /// let bad = Move::new(Square::E2, Square::E5, MoveKind::Normal);
    /// assert!(position.make_move_checked(bad).is_err());
    /// assert_eq!(position.to_fen(), FEN_STARTPOS);
    /// ```
    pub fn make_move_checked(&mut self, mv: Move) -> Result<()> {
        if !self.is_pseudo_legal(mv) {
            bail!("{mv:?} is not a valid move in {self}");
        }
        if !self.is_legal(mv) {
            bail!("{mv:?} leaves the King in check in {self}");
        }
        self.make_move(mv);
        Ok(())
    }

    /// Undoes `mv`, which must be the last move made.
    pub fn take_move(&mut self, mv: Move) {
        debug_assert!(self.states.len() > 1, "no move to take back");
        if self.states.len() <= 1 {
            return;
        }
        let Some(state) = self.states.pop() else {
            return;
        };
        let us = !state.side_to_move;
        let (from, to, kind) = mv.parts();

        match kind {
            MoveKind::Castling => {
                let side = mv.castling_side().unwrap_or(CastlingSide::King);
                let king_to = side.king_destination(us);
                let rook_to = side.rook_destination(us);
                let king = self.board.remove_piece(king_to);
                let rook = self.board.remove_piece(rook_to);
                if let (Some(king), Some(rook)) = (king, rook) {
                    self.board.add_piece(king, from);
                    self.board.add_piece(rook, to);
                }
            }
            MoveKind::Promotion => {
                self.board.remove_piece(to);
                self.board.add_piece(Piece::new(us, PieceKind::Pawn), from);
            }
            MoveKind::Normal | MoveKind::EnPassant => self.board.move_piece(to, from),
        }

        if let Some(captured) = state.captured {
            let captured_square = if kind == MoveKind::EnPassant {
                to.backward_by(us, 1).unwrap_or(to)
            } else {
                to
            };
            self.board.add_piece(captured, captured_square);
        }
    }

    /// Passes the turn without moving a piece. The side to move must not be in check.
    pub fn make_null_move(&mut self) {
        debug_assert!(!self.in_check(), "null move while in check in {self}");
        let prev = *self.state();
        let mut state = prev.next();
        state.plies_from_null = 0;

        if let Some(ep) = prev.ep_square {
            state.key.hash_ep_square(ep);
        }
        state.key.hash_side_to_move();

        self.update_check_info(&mut state);
        self.states.push(state);
    }

    /// Undoes [`Position::make_null_move`].
    pub fn take_null_move(&mut self) {
        debug_assert!(self.states.len() > 1, "no null move to take back");
        if self.states.len() > 1 {
            self.states.pop();
        }
    }

    /// Returns `true` if `mv` could be made here, ignoring whether it leaves the King in check.
    ///
    /// Safe to call with any [`Move`], including ones from an untrusted source.
    pub fn is_pseudo_legal(&self, mv: Move) -> bool {
        if mv.is_null() {
            return false;
        }
        // Special moves are rare enough to check against the generator.
        if !mv.is_normal() {
            return self.generate_moves(GenType::PseudoLegal).contains(&mv);
        }

        let us = self.side_to_move();
        let (from, to, _) = mv.parts();
        let Some(piece) = self.piece_at(from) else {
            return false;
        };
        if piece.color() != us || self.color(us).contains(to) {
            return false;
        }

        if piece.is_pawn() {
            // Reaching the last rank must be a promotion.
            if to.rank() == Rank::eighth(us) {
                return false;
            }

            let empty = self.empty();
            let single = from.forward_by(us, 1);
            let is_capture = (pawn_attacks(from, us) & self.color(!us)).contains(to);
            let is_push = single == Some(to) && empty.contains(to);
            let is_double_push = from.rank() == Rank::second(us)
                && from.forward_by(us, 2) == Some(to)
                && empty.contains(to)
                && single.is_some_and(|single| empty.contains(single));

            if !(is_capture || is_push || is_double_push) {
                return false;
            }
        } else if !piece_attacks(piece.kind(), from, self.occupied()).contains(to) {
            return false;
        }

        let checkers = self.checkers();
        if checkers.is_nonempty() {
            if piece.is_king() {
                // Staying on a checking slider's line never escapes the check.
                let leapers = self.kind(PieceKind::Knight) | self.kind(PieceKind::Pawn);
                let sliders = checkers & !leapers;
                return !sliders
                    .into_iter()
                    .any(|checker| (ray_containing(checker, from) ^ checker).contains(to));
            }
            if checkers.more_than_one() {
                return false;
            }
            let Some(king) = self.king_square(us) else {
                return false;
            };
            if !(ray_between(king, checkers.lsb_unchecked()) | checkers).contains(to) {
                return false;
            }
        }

        true
    }

    /// Returns `true` if the pseudo-legal `mv` does not leave the mover's King in check.
    pub fn is_legal(&self, mv: Move) -> bool {
        let us = self.side_to_move();
        let them = !us;
        let (from, to, kind) = mv.parts();
        let Some(king) = self.king_square(us) else {
            return true;
        };
        let checkers = self.checkers();

        match kind {
            MoveKind::Castling => {
                if checkers.is_nonempty() {
                    return false;
                }
                let Some(side) = mv.castling_side() else {
                    return false;
                };
                let right = CastleRight::new(us, side);
                let enemies = self.color(them);
                if self
                    .castling_king_path(right)
                    .into_iter()
                    .any(|square| self.attacks_to(square).intersects(enemies))
                {
                    return false;
                }

                // The castling Rook may have been hiding an attack on the King's destination.
                let king_to = side.king_destination(us);
                !self.is_chess960()
                    || !(rook_attacks(king_to, self.occupied() ^ to)
                        & self.orthogonal_sliders()
                        & enemies)
                        .is_nonempty()
            }

            MoveKind::EnPassant => {
                let Some(captured) = to.backward_by(us, 1) else {
                    return false;
                };
                if checkers.more_than_one() {
                    return false;
                }
                if let Some(checker) = checkers.lsb() {
                    if checker != captured && !ray_between(king, checker).contains(to) {
                        return false;
                    }
                }

                let occupied = (self.occupied() ^ from ^ captured) | to;
                let enemies = self.color(them);
                !(rook_attacks(king, occupied) & self.orthogonal_sliders() & enemies).is_nonempty()
                    && !(bishop_attacks(king, occupied) & self.diagonal_sliders() & enemies)
                        .is_nonempty()
            }

            _ if from == king => {
                let occupied = self.occupied() ^ from;
                !self.attacks_to_with(to, occupied).intersects(self.color(them))
            }

            _ => {
                if checkers.more_than_one() {
                    return false;
                }
                if let Some(checker) = checkers.lsb() {
                    if !(ray_between(king, checker) | checker).contains(to) {
                        return false;
                    }
                }
                !self.blockers_for_king(us).contains(from) || aligned(from, to, king)
            }
        }
    }

    /// Returns `true` if the pseudo-legal `mv` would put the enemy King in check.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let position = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
    /// assert!(position.gives_check(Move::new(Square::A1, Square::A8, MoveKind::Normal)));
    /// assert!(!position.gives_check(Move::new(Square::A1, Square::A7, MoveKind::Normal)));
    /// // Castling long puts the Rook on d1, off the King's file.
    /// assert!(!position.gives_check(Move::new(Square::E1, Square::A1, MoveKind::Castling)));
    /// ```
    pub fn gives_check(&self, mv: Move) -> bool {
        let us = self.side_to_move();
        let (from, to, kind) = mv.parts();
        let Some(king) = self.king_square(!us) else {
            return false;
        };
        let Some(piece) = self.piece_at(from) else {
            return false;
        };

        // Direct check
        if self.check_squares(piece.kind()).contains(to) {
            return true;
        }

        // Discovered check
        if self.blockers_for_king(!us).contains(from) && !aligned(from, to, king) {
            return true;
        }

        match kind {
            MoveKind::Normal => false,

            MoveKind::Promotion => mv.promotion().is_some_and(|promotion| {
                piece_attacks(promotion, to, self.occupied() ^ from).contains(king)
            }),

            MoveKind::EnPassant => {
                let captured = Square::new(to.file(), from.rank());
                let occupied = (self.occupied() ^ from ^ captured) | to;
                let ours = self.color(us);
                (rook_attacks(king, occupied) & self.orthogonal_sliders() & ours).is_nonempty()
                    || (bishop_attacks(king, occupied) & self.diagonal_sliders() & ours)
                        .is_nonempty()
            }

            MoveKind::Castling => {
                let side = mv.castling_side().unwrap_or(CastlingSide::King);
                let king_to = side.king_destination(us);
                let rook_to = side.rook_destination(us);
                let occupied = (self.occupied() ^ from ^ to) | rook_to | king_to;
                rook_attacks(rook_to, occupied).contains(king)
            }
        }
    }

    /// Returns `true` if the position is drawn by the fifty-move rule, insufficient material,
    /// or repetition.
    ///
    /// A position repeated once after `ply` plies of search counts as a draw; one that
    /// repeated earlier must have occurred three times.
    pub fn is_draw(&self, ply: usize) -> bool {
        if self.halfmove() > 99 && (!self.in_check() || !self.legal_moves().is_empty()) {
            return true;
        }

        if self.is_insufficient_material() {
            return true;
        }

        let repetition = self.state().repetition;
        repetition != 0 && (repetition as i64) < ply as i64
    }

    /// Returns `true` if any position since the last irreversible move has occurred before.
    pub fn has_repetition(&self) -> bool {
        let end = self.halfmove().min(self.state().plies_from_null);
        self.states
            .iter()
            .rev()
            .take((end + 1).saturating_sub(4))
            .any(|state| state.repetition != 0)
    }

    /// Returns `true` if the side to move can reach an earlier position with a single
    /// reversible move, or if an earlier position already repeated.
    ///
    /// `ply` is the distance from the root of a search; cycles found entirely after the root
    /// count on their first occurrence.
    pub fn has_game_cycle(&self, ply: usize) -> bool {
        let end = self.halfmove().min(self.state().plies_from_null);
        if end < 3 {
            return false;
        }

        let current = self.states.len() - 1;
        let original = self.key().inner();
        let occupied = self.occupied();

        for distance in (3..=end).step_by(2) {
            let Some(earlier) = current.checked_sub(distance).and_then(|i| self.states.get(i))
            else {
                break;
            };

            let Some(mv) = cuckoo_move(original ^ earlier.key.inner()) else {
                continue;
            };
            let (s1, s2, _) = mv.parts();
            if ray_between(s1, s2).intersects(occupied) {
                continue;
            }

            if ply > distance {
                return true;
            }

            // At or before the root, the move must be one the side to move can make.
            let mover = if self.has(s1) { s1 } else { s2 };
            if self.color_at(mover) != Some(self.side_to_move()) {
                continue;
            }

            if earlier.repetition != 0 {
                return true;
            }
        }

        false
    }

    /// Returns `true` if neither side can possibly deliver mate.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// assert!(Position::from_fen("8/8/4k3/8/8/2B5/8/4K3 w - - 0 1").unwrap().is_insufficient_material());
    /// assert!(!Position::from_fen("8/8/4k3/8/8/2N5/8/3NK3 w - - 0 1").unwrap().is_insufficient_material());
    /// ```
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.kind(PieceKind::Pawn) | self.orthogonal_sliders();
        if heavy.is_nonempty() {
            return false;
        }

        let bishops = self.kind(PieceKind::Bishop);
        let minors = bishops | self.kind(PieceKind::Knight);
        if !minors.more_than_one() {
            return true;
        }

        // Any number of Bishops, all on one square color.
        minors == bishops
            && (!bishops.intersects(Bitboard::LIGHT_SQUARES)
                || !bishops.intersects(Bitboard::DARK_SQUARES))
    }

    /// Whether the game is over, and how.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let mut position = Position::default();
    /// for uci in ["f2f3", "e7e5", "g2g4", "d8h4"] {
    ///     let mv = Move::from_uci(&position, uci).unwrap();
    ///     position.make_move(mv);
    /// }
    /// assert_eq!(position.status(), GameStatus::Mate);
    /// ```
    pub fn status(&self) -> GameStatus {
        let has_moves = !self.legal_moves().is_empty();
        match (has_moves, self.in_check()) {
            (false, true) => GameStatus::Mate,
            (false, false) => GameStatus::Stalemate,
            _ if self.is_draw(0) => GameStatus::Drawn,
            (true, true) => GameStatus::InCheck,
            (true, false) => GameStatus::Normal,
        }
    }

    /// Returns `true` if the side to move has been checkmated.
    #[inline(always)]
    pub fn is_mate(&self) -> bool {
        self.in_check() && self.legal_moves().is_empty()
    }

    /// Checks the structural rules a position reachable in a real game must obey.
    ///
    /// # Example
    /// ```
    /// # use chesskit::*;
    /// let position = Position::from_fen("4k3/8/8/8/8/8/8/4K2P w - - 0 1").unwrap();
    /// assert_eq!(position.validate(), Err(ValidationError::PawnsOnBackRank { square: Square::H1 }));
    /// ```
    pub fn validate(&self) -> Result<(), ValidationError> {
        let result = self.check_rules();
        if let Err(err) = &result {
            log::debug!("Rejected position {}: {err}", self.to_fen());
        }
        result
    }

    fn check_rules(&self) -> Result<(), ValidationError> {
        let us = self.side_to_move();

        for color in Color::all() {
            let count = self.count(color, PieceKind::King);
            if count != 1 {
                return Err(ValidationError::KingCount { color, count });
            }

            let count = self.color(color).population() as usize;
            if count > 16 {
                return Err(ValidationError::TooManyPieces { color, count });
            }

            let count = self.count(color, PieceKind::Pawn);
            if count > 8 {
                return Err(ValidationError::TooManyPawns { color, count });
            }
        }

        let back_ranks = Bitboard::RANK_1 | Bitboard::RANK_8;
        if let Some(square) = (self.kind(PieceKind::Pawn) & back_ranks).lsb() {
            return Err(ValidationError::PawnsOnBackRank { square });
        }

        if self.king_square(!us).is_some_and(|king| self.is_attacked(king, us)) {
            return Err(ValidationError::OpponentInCheck { color: !us });
        }

        let count = self.checkers().population() as usize;
        if count > 2 {
            return Err(ValidationError::TooManyCheckers { count });
        }

        if let Some(square) = self.ep_square() {
            if !self.is_valid_ep_square(us, square) {
                return Err(ValidationError::InvalidEnPassant { square });
            }
        }

        for right in CastleRight::all() {
            if !self.can_castle(right) {
                continue;
            }
            let rook = Piece::new(right.color(), PieceKind::Rook);
            match self.castling_rook_square(right) {
                Some(square) if self.piece_at(square) == Some(rook) => {}
                square => {
                    return Err(ValidationError::CastlingRookMissing {
                        square: square.unwrap_or(right.default_rook_square()),
                    })
                }
            }
        }

        if !self.board.is_consistent() {
            return Err(ValidationError::PieceListMismatch);
        }

        let state = self.state();
        let key = ZobristKey::from_parts(&self.board, us, state.castle_rights, state.ep_square);
        if key != state.key {
            return Err(ValidationError::HashMismatch { which: "position" });
        }
        if ZobristKey::pawns_of(&self.board) != state.pawn_key {
            return Err(ValidationError::HashMismatch { which: "pawn" });
        }

        Ok(())
    }
}

impl FromStr for Position {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl Deref for Position {
    type Target = Board;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.board()
    }
}

impl Default for Position {
    #[inline(always)]
    fn default() -> Self {
        // Safe unwrap because the FEN for startpos is always valid
        Self::from_fen(FEN_STARTPOS).unwrap()
    }
}

impl PartialEq for Position {
    /// Positions are equal when their boards and current states match. History is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board && self.state() == other.state()
    }
}

impl fmt::Display for Position {
    /// Display this position's FEN string
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}|")?;
            for file in File::iter() {
                let piece_char = self.piece_at(file * rank).map(|p| p.char()).unwrap_or('.');
                write!(f, " {piece_char}")?;
            }

            if rank == Rank::SEVEN {
                write!(f, "           FEN: {}", self.to_fen())?;
            } else if rank == Rank::SIX {
                write!(f, "          Side: {}", self.side_to_move())?;
            } else if rank == Rank::FIVE {
                write!(f, "      Castling: {}", self.castling_rights_fen())?;
            } else if rank == Rank::FOUR {
                let ep = self.ep_square().map(|t| t.to_uci()).unwrap_or(String::from("-"));
                write!(f, "            EP: {ep}")?;
            } else if rank == Rank::THREE {
                write!(f, "           Key: {}", self.key())?;
            } else if rank == Rank::TWO {
                write!(f, "      Checkers: {:?}", self.checkers().iter().collect::<Vec<_>>())?;
            }
            writeln!(f)?;
        }
        write!(f, " +")?;
        for _ in File::iter() {
            write!(f, "--")?;
        }
        write!(f, "\n   ")?;
        for file in File::iter() {
            write!(f, "{file} ")?;
        }

        Ok(())
    }
}
