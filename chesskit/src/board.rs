/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt::{self, Write},
    ops::Index,
};

use anyhow::{bail, Result};

use super::{Bitboard, Color, File, Piece, PieceKind, Rank, Square, FEN_STARTPOS};

/// Capacity of a single piece list. Ten of one kind is the most a legal game can reach.
const MAX_PIECES_PER_KIND: usize = 16;

/// Represents all pieces and their locations on a chess board.
///
/// Has no knowledge of castling rights, en passant, or move counters. If you need those, see [`Position`](super::Position).
///
/// The mailbox is authoritative. Per-kind and per-color [`Bitboard`]s and per-piece square lists are kept in sync with it
/// by [`Board::add_piece`], [`Board::remove_piece`], and [`Board::move_piece`].
#[derive(Clone, Copy)]
pub struct Board {
    /// All squares occupied by a specific color.
    colors: [Bitboard; Color::COUNT],

    /// All squares occupied by a specific piece kind.
    pieces: [Bitboard; PieceKind::COUNT],

    /// The piece on each square.
    mailbox: [Option<Piece>; Square::COUNT],

    /// Number of each [`Piece`] on the board.
    counts: [u8; Piece::COUNT],

    /// Squares of each [`Piece`]. Only the first `counts[piece]` entries are meaningful.
    lists: [[Square; MAX_PIECES_PER_KIND]; Piece::COUNT],

    /// Position of each occupied square within its piece's list.
    ///
    /// Entries for empty squares are stale and never read.
    index: [u8; Square::COUNT],
}

impl Board {
    /// Creates a new, empty [`Board`] containing no pieces.
    ///
    /// # Example
    /// ```
    /// # use chesskit::Board;
    /// let board = Board::new();
    /// assert_eq!(board.to_fen(), "8/8/8/8/8/8/8/8");
    /// ```
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            colors: [Bitboard::EMPTY_BOARD; Color::COUNT],
            pieces: [Bitboard::EMPTY_BOARD; PieceKind::COUNT],
            mailbox: [None; Square::COUNT],
            counts: [0; Piece::COUNT],
            lists: [[Square::A1; MAX_PIECES_PER_KIND]; Piece::COUNT],
            index: [0; Square::COUNT],
        }
    }

    /// Constructs a [`Board`] from the placement field of a FEN string, ignoring any other fields.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut board = Self::new();

        let Some(placements) = fen.split_whitespace().next() else {
            bail!("Invalid FEN string: FEN string must have piece placements.");
        };

        if placements.matches('/').count() != 7 {
            bail!("Missing placements for all 8 ranks.");
        }

        // Need to reverse this so that White pieces are at the "bottom" of the board
        for (rank, placements) in placements.split('/').rev().enumerate() {
            let mut file = 0;
            let rank = Rank::new_unchecked(rank as u8);

            for piece_char in placements.chars() {
                if let Ok(piece) = Piece::from_uci(piece_char) {
                    let Some(file) = File::new(file) else {
                        bail!("Too many squares on rank {rank} when parsing FEN.");
                    };
                    let square = Square::new(file, rank);

                    if board.counts[piece] as usize == MAX_PIECES_PER_KIND {
                        bail!("Too many {piece:?} pieces when parsing FEN.");
                    }
                    board.add_piece(piece, square);
                } else {
                    let Some(empty) = piece_char.to_digit(10).filter(|n| (1..=8).contains(n)) else {
                        bail!("Found non-piece, non-numeric char {piece_char:?} when parsing FEN.");
                    };
                    file += empty as u8 - 1;
                }
                file += 1;
            }

            if file != File::COUNT as u8 {
                bail!("Rank {rank} does not describe exactly 8 squares in FEN.");
            }
        }

        Ok(board)
    }

    /// Places `piece` on the empty `square`.
    ///
    /// # Example
    /// ```
    /// # use chesskit::{Board, Piece, PieceKind, Color, Square};
    /// let white_knight = Piece::new(Color::White, PieceKind::Knight);
    /// let mut board = Board::new();
    /// board.add_piece(white_knight, Square::C4);
    /// assert_eq!(board.to_fen(), "8/8/8/8/2N5/8/8/8");
    /// assert_eq!(board.squares(Color::White, PieceKind::Knight), &[Square::C4]);
    /// ```
    #[inline(always)]
    pub fn add_piece(&mut self, piece: Piece, square: Square) {
        debug_assert!(self.mailbox[square].is_none(), "{square} is occupied");

        self.colors[piece.color()].set(square);
        self.pieces[piece.kind()].set(square);
        self.mailbox[square] = Some(piece);

        let count = self.counts[piece];
        self.index[square] = count;
        self.lists[piece][count as usize] = square;
        self.counts[piece] = count + 1;
    }

    /// Removes and returns the piece on `square`, if there is one.
    ///
    /// The last square of that piece's list is moved into the vacated slot, so list order is not
    /// preserved across removals.
    ///
    /// # Example
    /// ```
    /// # use chesskit::{Board, Piece, PieceKind, Color, Square};
    /// let mut board = Board::from_fen("k7/8/8/8/2N5/8/8/7K").unwrap();
    /// let white_knight = Piece::new(Color::White, PieceKind::Knight);
    /// let taken = board.remove_piece(Square::C4);
    /// assert_eq!(board.to_fen(), "k7/8/8/8/8/8/8/7K");
    /// assert_eq!(taken, Some(white_knight));
    /// ```
    #[inline(always)]
    pub fn remove_piece(&mut self, square: Square) -> Option<Piece> {
        let piece = self.mailbox[square].take()?;

        self.colors[piece.color()].clear(square);
        self.pieces[piece.kind()].clear(square);

        let last = self.counts[piece] - 1;
        self.counts[piece] = last;
        let last_square = self.lists[piece][last as usize];
        let slot = self.index[square];
        self.index[last_square] = slot;
        self.lists[piece][slot as usize] = last_square;

        Some(piece)
    }

    /// Moves the piece on `from` to the empty square `to`.
    ///
    /// The piece keeps its slot in its list.
    ///
    /// # Example
    /// ```
    /// # use chesskit::{Board, Color, PieceKind, Square};
    /// let mut board = Board::default();
    /// board.move_piece(Square::G1, Square::F3);
    /// assert!(board.squares(Color::White, PieceKind::Knight).contains(&Square::F3));
    /// assert!(board.piece_at(Square::G1).is_none());
    /// ```
    #[inline(always)]
    pub fn move_piece(&mut self, from: Square, to: Square) {
        debug_assert!(self.mailbox[to].is_none(), "{to} is occupied");
        let Some(piece) = self.mailbox[from].take() else {
            debug_assert!(false, "no piece on {from}");
            return;
        };

        let from_to = from.bitboard() | to;
        self.colors[piece.color()] ^= from_to;
        self.pieces[piece.kind()] ^= from_to;
        self.mailbox[to] = Some(piece);

        let slot = self.index[from];
        self.index[to] = slot;
        self.lists[piece][slot as usize] = to;
    }

    /// Returns `true` if there is a piece at the given [`Square`], else `false`.
    ///
    /// # Example
    /// ```
    /// # use chesskit::{Board, Square};
    /// let board = Board::default();
    /// assert_eq!(board.has(Square::B1), true);
    /// ```
    #[inline(always)]
    pub const fn has(&self, square: Square) -> bool {
        self.mailbox[square.index()].is_some()
    }

    /// Fetches the [`Piece`] at the provided [`Square`], if there is one.
    ///
    /// # Example
    /// ```
    /// # use chesskit::{Board, PieceKind, Color, Square};
    /// let board = Board::default();
    /// assert_eq!(board.piece_at(Square::A2).unwrap().kind(), PieceKind::Pawn);
    /// assert_eq!(board.piece_at(Square::A2).unwrap().color(), Color::White);
    /// assert!(board.piece_at(Square::E4).is_none());
    /// ```
    #[inline(always)]
    pub const fn piece_at(&self, square: Square) -> Option<Piece> {
        self.mailbox[square.index()]
    }

    /// Fetches the [`Color`] of the piece at the provided [`Square`], if there is one.
    #[inline(always)]
    pub fn color_at(&self, square: Square) -> Option<Color> {
        self.mailbox[square].map(|piece| piece.color())
    }

    /// Fetches the [`PieceKind`] of the piece at the provided [`Square`], if there is one.
    #[inline(always)]
    pub fn kind_at(&self, square: Square) -> Option<PieceKind> {
        self.mailbox[square].map(|piece| piece.kind())
    }

    /// All squares holding a piece of the supplied [`PieceKind`], of either color.
    ///
    /// # Example
    /// ```
    /// # use chesskit::{Board, PieceKind, Bitboard};
    /// let board = Board::default();
    /// let pawns = board.kind(PieceKind::Pawn);
    /// assert_eq!(pawns, Bitboard::RANK_2 | Bitboard::RANK_7);
    /// ```
    #[inline(always)]
    pub const fn kind(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()]
    }

    /// All squares holding a piece of the supplied [`Color`].
    ///
    /// # Example
    /// ```
    /// # use chesskit::{Board, Color, Bitboard};
    /// let board = Board::default();
    /// assert_eq!(board.color(Color::White), Bitboard::RANK_1 | Bitboard::RANK_2);
    /// ```
    #[inline(always)]
    pub const fn color(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    /// All squares holding a piece of the given color and kind.
    #[inline(always)]
    pub const fn piece_parts(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.color(color).and(self.kind(kind))
    }

    /// All squares holding the supplied [`Piece`].
    #[inline(always)]
    pub const fn piece(&self, piece: Piece) -> Bitboard {
        self.piece_parts(piece.color(), piece.kind())
    }

    /// Fetches a [`Bitboard`] of all occupied squares on the board.
    #[inline(always)]
    pub const fn occupied(&self) -> Bitboard {
        self.color(Color::White).or(self.color(Color::Black))
    }

    /// Fetches a [`Bitboard`] of all non-occupied squares on the board.
    #[inline(always)]
    pub const fn empty(&self) -> Bitboard {
        self.occupied().not()
    }

    /// Get all squares that are either empty or occupied by the enemy of `color`.
    #[inline(always)]
    pub const fn enemy_or_empty(&self, color: Color) -> Bitboard {
        self.color(color).not()
    }

    /// Rooks and Queens of both colors.
    #[inline(always)]
    pub const fn orthogonal_sliders(&self) -> Bitboard {
        self.kind(PieceKind::Rook).or(self.kind(PieceKind::Queen))
    }

    /// Bishops and Queens of both colors.
    #[inline(always)]
    pub const fn diagonal_sliders(&self) -> Bitboard {
        self.kind(PieceKind::Bishop).or(self.kind(PieceKind::Queen))
    }

    #[inline(always)]
    pub const fn king(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceKind::King)
    }

    #[inline(always)]
    pub const fn pawns(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceKind::Pawn)
    }

    /// The square of `color`'s King, if it has one.
    #[inline(always)]
    pub const fn king_square(&self, color: Color) -> Option<Square> {
        self.king(color).lsb()
    }

    /// Number of `color` pieces of `kind` on the board.
    #[inline(always)]
    pub const fn count(&self, color: Color, kind: PieceKind) -> usize {
        self.counts[Piece::new(color, kind).index()] as usize
    }

    /// The squares of every `color` piece of `kind`, in no particular order.
    #[inline(always)]
    pub fn squares(&self, color: Color, kind: PieceKind) -> &[Square] {
        let piece = Piece::new(color, kind);
        &self.lists[piece][..self.counts[piece] as usize]
    }

    /// The square of the first `color` piece of `kind` in its list, if any.
    #[inline(always)]
    pub fn square_of(&self, color: Color, kind: PieceKind) -> Option<Square> {
        self.squares(color, kind).first().copied()
    }

    /// Iterates over every occupied [`Square`] and its [`Piece`], `a1` first.
    #[inline(always)]
    pub const fn iter(&self) -> BoardIter<'_> {
        self.iter_for(self.occupied())
    }

    /// Iterates over every occupied square in `mask` and its [`Piece`].
    #[inline(always)]
    pub const fn iter_for(&self, mask: Bitboard) -> BoardIter<'_> {
        BoardIter {
            board: self,
            occupancy: mask.and(self.occupied()),
        }
    }

    /// Checks that the mailbox, bitboards, counts, piece lists, and indices all agree.
    pub fn is_consistent(&self) -> bool {
        let mut colors = [Bitboard::EMPTY_BOARD; Color::COUNT];
        let mut pieces = [Bitboard::EMPTY_BOARD; PieceKind::COUNT];
        for square in Square::iter() {
            if let Some(piece) = self.mailbox[square] {
                colors[piece.color()] |= square;
                pieces[piece.kind()] |= square;
            }
        }
        if colors != self.colors || pieces != self.pieces {
            return false;
        }

        Piece::iter().all(|piece| {
            let squares = self.squares(piece.color(), piece.kind());
            squares.len() == self.piece(piece).population() as usize
                && squares.iter().enumerate().all(|(i, &square)| {
                    self.mailbox[square] == Some(piece) && self.index[square] as usize == i
                })
        })
    }

    /// Generates the placement field of a [FEN](https://www.chess.com/terms/fen-chess) string of this [`Board`].
    pub fn to_fen(&self) -> String {
        let mut placements: [String; 8] = Default::default();

        for rank in Rank::iter() {
            let mut empty_spaces = 0;
            for file in File::iter() {
                if let Some(piece) = self.piece_at(file * rank) {
                    if empty_spaces != 0 {
                        placements[rank.index()] += &empty_spaces.to_string();
                        empty_spaces = 0;
                    }
                    placements[rank.index()].push(piece.char());
                } else {
                    empty_spaces += 1;
                }
            }

            if empty_spaces != 0 {
                placements[rank.index()] += &empty_spaces.to_string();
            }
        }
        placements.reverse();

        placements.join("/")
    }
}

impl Default for Board {
    #[inline(always)]
    fn default() -> Self {
        // Safe unwrap because the FEN for startpos is always valid
        Self::from_fen(FEN_STARTPOS).unwrap()
    }
}

impl PartialEq for Board {
    /// Boards are equal when they hold the same pieces on the same squares. Piece list order is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.mailbox == other.mailbox
            && self.colors == other.colors
            && self.pieces == other.pieces
            && self.counts == other.counts
    }
}

impl Eq for Board {}

impl Index<Square> for Board {
    type Output = Option<Piece>;
    #[inline(always)]
    fn index(&self, index: Square) -> &Self::Output {
        &self.mailbox[index]
    }
}

impl Index<Color> for Board {
    type Output = Bitboard;
    #[inline(always)]
    fn index(&self, index: Color) -> &Self::Output {
        &self.colors[index]
    }
}

impl Index<PieceKind> for Board {
    type Output = Bitboard;
    #[inline(always)]
    fn index(&self, index: PieceKind) -> &Self::Output {
        &self.pieces[index]
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut board = String::with_capacity(198);

        for rank in Rank::iter().rev() {
            _ = write!(board, "{rank}| ");

            for file in File::iter() {
                let occupant = self.piece_at(file * rank).map(|p| p.char()).unwrap_or('.');
                _ = write!(board, "{occupant} ");
            }

            board += "\n"
        }
        board += " +";
        for _ in File::iter() {
            board += "--";
        }
        board += "\n   ";
        for file in File::iter() {
            _ = write!(board, "{file} ");
        }

        write!(f, "{board}")
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")?;
        for piece in Piece::iter() {
            let squares = self.squares(piece.color(), piece.kind());
            if !squares.is_empty() {
                writeln!(f, "{}: {squares:?}", piece.char())?;
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Board {
    type IntoIter = BoardIter<'a>;
    type Item = <BoardIter<'a> as Iterator>::Item;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over a set of squares on a [`Board`].
///
/// Calls to [`Iterator::next`] will yield a tuple of a [`Square`] and a [`Piece`].
pub struct BoardIter<'a> {
    /// The board to retrieve pieces from.
    board: &'a Board,

    /// The occupied squares left to visit.
    occupancy: Bitboard,
}

impl Iterator for BoardIter<'_> {
    type Item = (Square, Piece);

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        let square = self.occupancy.pop_lsb()?;
        let piece = self.board.piece_at(square)?;
        Some((square, piece))
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.occupancy.population() as usize;
        (size, Some(size))
    }
}

impl ExactSizeIterator for BoardIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_counts(board: &Board, kind: PieceKind, white: usize, black: usize) {
        assert_eq!(board.count(Color::White, kind), white, "white {kind:?}");
        assert_eq!(board.count(Color::Black, kind), black, "black {kind:?}");
    }

    #[test]
    fn test_piece_counts_endgame() {
        let board = Board::from_fen("5r1k/p6p/4r1n1/3NPp2/8/8/PP4RP/4R1K1 w - - 3 53").unwrap();
        assert_counts(&board, PieceKind::Pawn, 4, 3);
        assert_counts(&board, PieceKind::Knight, 1, 1);
        assert_counts(&board, PieceKind::Bishop, 0, 0);
        assert_counts(&board, PieceKind::Rook, 2, 2);
        assert_counts(&board, PieceKind::Queen, 0, 0);
        assert_counts(&board, PieceKind::King, 1, 1);
    }

    #[test]
    fn test_piece_counts_opening() {
        let board =
            Board::from_fen("rnbqkbnr/1ppQpppp/p2p4/8/8/2P5/PP1PPPPP/RNB1KBNR b KQkq - 1 6").unwrap();
        assert_counts(&board, PieceKind::Pawn, 8, 8);
        assert_counts(&board, PieceKind::Knight, 2, 2);
        assert_counts(&board, PieceKind::Bishop, 2, 2);
        assert_counts(&board, PieceKind::Rook, 2, 2);
        assert_counts(&board, PieceKind::Queen, 1, 1);
        assert_counts(&board, PieceKind::King, 1, 1);
    }

    #[test]
    fn test_swap_removal_keeps_lists_consistent() {
        let mut board = Board::from_fen("8/8/8/8/8/8/PPPPPPPP/8").unwrap();
        board.remove_piece(Square::A2);
        board.remove_piece(Square::D2);
        board.move_piece(Square::H2, Square::H4);
        assert!(board.is_consistent());

        let pawns = board.squares(Color::White, PieceKind::Pawn);
        assert_eq!(pawns.len(), 6);
        assert!(pawns.contains(&Square::H4));
        assert!(!pawns.contains(&Square::A2));

        board.add_piece(Piece::new(Color::White, PieceKind::Pawn), Square::A2);
        assert!(board.is_consistent());
        assert_eq!(board.count(Color::White, PieceKind::Pawn), 7);
    }

    #[test]
    fn test_equality_ignores_list_order() {
        let original = Board::from_fen("8/8/8/8/8/8/PPP5/8").unwrap();
        let mut reordered = original;
        let pawn = reordered.remove_piece(Square::A2).unwrap();
        reordered.add_piece(pawn, Square::A2);
        assert_ne!(original.squares(Color::White, PieceKind::Pawn), reordered.squares(Color::White, PieceKind::Pawn));
        assert_eq!(original, reordered);
    }

    #[test]
    fn test_fen_round_trip() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R";
        assert_eq!(Board::from_fen(fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn test_malformed_placements() {
        assert!(Board::from_fen("8/8/8/8/8/8/8").is_err());
        assert!(Board::from_fen("9/8/8/8/8/8/8/8").is_err());
        assert!(Board::from_fen("7/8/8/8/8/8/8/8").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/ppppppppp").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/7x").is_err());
    }
}
