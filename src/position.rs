//! The board position: piece placement, side to move, the irreversible
//! state stack, and the incrementally maintained Zobrist hash.
//!
//! `make_move` pushes a new irreversible-state frame and `unmake_move` pops
//! it; after any sequence of makes followed by the matching unmakes in
//! reverse order the position compares equal to its starting value, hash
//! included.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::attacks;
use crate::bitboard::Bitboard;
use crate::moves::Move;
use crate::types::{CastlingRights, Color, Direction, Piece, PieceKind, Rank, Square};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A malformed FEN string. Recoverable: the caller reports it and keeps its
/// current position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid FEN: {reason}")]
pub struct FenError {
    reason: String,
}

impl FenError {
    fn new(reason: impl Into<String>) -> FenError {
        FenError {
            reason: reason.into(),
        }
    }
}

/// Bits of state that a move destroys and that cannot be recovered from the
/// move alone, stacked so `unmake_move` can restore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct State {
    pub ep_square: Option<Square>,
    pub castling: CastlingRights,
    pub halfmove_clock: u16,
    pub captured_piece: Option<Piece>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pieces_by_square: [Option<Piece>; 64],
    boards_by_piece: [Bitboard; 12],
    boards_by_color: [Bitboard; 2],
    side_to_move: Color,
    ply: u32,
    states: Vec<State>,
    hash: u64,
}

impl Default for Position {
    fn default() -> Position {
        Position::new()
    }
}

impl Position {
    /// An empty board, white to move, no rights, one initial state frame.
    pub fn new() -> Position {
        Position {
            pieces_by_square: [None; 64],
            boards_by_piece: [Bitboard::EMPTY; 12],
            boards_by_color: [Bitboard::EMPTY; 2],
            side_to_move: Color::White,
            ply: 0,
            states: vec![State::default()],
            hash: 0,
        }
    }

    pub fn startpos() -> Position {
        Position::from_fen(START_FEN).expect("start position FEN is valid")
    }

    fn state(&self) -> &State {
        self.states.last().expect("state stack is never empty")
    }

    fn state_mut(&mut self) -> &mut State {
        self.states.last_mut().expect("state stack is never empty")
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pieces_by_square[square.index()]
    }

    /// Places `piece` on `square`, which must be empty.
    pub fn add_piece(&mut self, piece: Piece, square: Square) {
        assert!(
            self.piece_at(square).is_none(),
            "adding piece to non-empty square {square}"
        );
        self.pieces_by_square[square.index()] = Some(piece);
        self.boards_by_piece[piece.index()].set(square);
        self.boards_by_color[piece.color().index()].set(square);
        crate::zobrist::modify_piece(&mut self.hash, square, piece);
    }

    /// Removes and returns the piece on `square`, which must be occupied.
    pub fn remove_piece(&mut self, square: Square) -> Piece {
        let piece = self
            .piece_at(square)
            .unwrap_or_else(|| panic!("removing piece from empty square {square}"));
        self.pieces_by_square[square.index()] = None;
        self.boards_by_piece[piece.index()].unset(square);
        self.boards_by_color[piece.color().index()].unset(square);
        crate::zobrist::modify_piece(&mut self.hash, square, piece);
        piece
    }

    /// All pieces of `side`.
    pub fn pieces(&self, side: Color) -> Bitboard {
        self.boards_by_color[side.index()]
    }

    /// Pieces of `side` with the given kind.
    pub fn pieces_of(&self, side: Color, kind: PieceKind) -> Bitboard {
        self.boards_by_piece[Piece::new(kind, side).index()]
    }

    pub fn occupancy(&self) -> Bitboard {
        self.boards_by_color[0] | self.boards_by_color[1]
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn en_passant_square(&self) -> Option<Square> {
        self.state().ep_square
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.state().castling
    }

    pub fn halfmove_clock(&self) -> u16 {
        self.state().halfmove_clock
    }

    pub fn can_castle_kingside(&self, side: Color) -> bool {
        self.castling_rights().contains(CastlingRights::kingside(side))
    }

    pub fn can_castle_queenside(&self, side: Color) -> bool {
        self.castling_rights().contains(CastlingRights::queenside(side))
    }

    /// The square of `side`'s king. Every valid position has exactly one.
    pub fn king_square(&self, side: Color) -> Square {
        self.pieces_of(side, PieceKind::King).expect_one()
    }

    /// The set of `side`'s pieces attacking `target`, found by running each
    /// attack table backwards from the target square; pawn attackers use the
    /// opposite color's table for the same reason.
    pub fn squares_attacking(&self, target: Square, side: Color) -> Bitboard {
        let occupancy = self.occupancy();
        let mut attackers = Bitboard::EMPTY;
        attackers |= attacks::pawns(target, !side) & self.pieces_of(side, PieceKind::Pawn);
        attackers |= attacks::knights(target) & self.pieces_of(side, PieceKind::Knight);
        attackers |= attacks::bishops(target, occupancy) & self.pieces_of(side, PieceKind::Bishop);
        attackers |= attacks::rooks(target, occupancy) & self.pieces_of(side, PieceKind::Rook);
        attackers |= attacks::queens(target, occupancy) & self.pieces_of(side, PieceKind::Queen);
        attackers |= attacks::kings(target) & self.pieces_of(side, PieceKind::King);
        attackers
    }

    pub fn is_check(&self, side: Color) -> bool {
        !self
            .squares_attacking(self.king_square(side), !side)
            .is_empty()
    }

    /// Applies `mov` to the position.
    pub fn make_move(&mut self, mov: Move) {
        let us = self.side_to_move;
        let src = mov.source();
        let dst = mov.destination();
        let mut piece = self.remove_piece(src);
        let moved_kind = piece.kind();
        assert!(
            piece.color() == us,
            "moving a piece that does not belong to the side to move"
        );

        let old_state = *self.state();
        let mut new_state = State {
            ep_square: None,
            castling: old_state.castling,
            halfmove_clock: old_state.halfmove_clock + 1,
            captured_piece: None,
        };

        if mov.is_capture() {
            // En passant is the one move whose victim does not stand on the
            // destination square.
            let target = if mov.is_en_passant() {
                dst.towards(Direction::down(us))
            } else {
                dst
            };
            let captured = self.remove_piece(target);
            assert!(captured.kind() != PieceKind::King, "illegal king capture");
            assert!(
                captured.color() == !us,
                "captured piece does not belong to the opponent"
            );
            new_state.captured_piece = Some(captured);

            // Capturing a rook on its home corner strips the opponent of the
            // corresponding castling right, or a later rook arriving on that
            // corner would enable a phantom castle.
            if captured.kind() == PieceKind::Rook {
                let them = !us;
                if target == rook_home(them, true)
                    && new_state.castling.contains(CastlingRights::kingside(them))
                {
                    new_state.castling.remove(CastlingRights::kingside(them));
                    crate::zobrist::modify_kingside_castle(&mut self.hash, them);
                } else if target == rook_home(them, false)
                    && new_state.castling.contains(CastlingRights::queenside(them))
                {
                    new_state.castling.remove(CastlingRights::queenside(them));
                    crate::zobrist::modify_queenside_castle(&mut self.hash, them);
                }
            }
        }

        if mov.is_castle() {
            // Castles are encoded as king moves; the king itself is placed
            // below, but the rook must be relocated here.
            let kingside = mov.is_kingside_castle();
            let rook_src = rook_home(us, kingside);
            let rook_dst = if kingside {
                dst.towards(Direction::West)
            } else {
                dst.towards(Direction::East)
            };
            let rook = self.remove_piece(rook_src);
            assert!(
                rook.kind() == PieceKind::Rook && rook.color() == us,
                "castling without a rook on its home square"
            );
            self.add_piece(rook, rook_dst);
        }

        if mov.is_promotion() {
            piece = Piece::new(mov.promotion_piece(), us);
        }
        self.add_piece(piece, dst);

        if moved_kind == PieceKind::Pawn || mov.is_capture() {
            new_state.halfmove_clock = 0;
        }

        if moved_kind == PieceKind::King {
            if new_state.castling.contains(CastlingRights::kingside(us)) {
                new_state.castling.remove(CastlingRights::kingside(us));
                crate::zobrist::modify_kingside_castle(&mut self.hash, us);
            }
            if new_state.castling.contains(CastlingRights::queenside(us)) {
                new_state.castling.remove(CastlingRights::queenside(us));
                crate::zobrist::modify_queenside_castle(&mut self.hash, us);
            }
        } else if moved_kind == PieceKind::Rook {
            if src == rook_home(us, true)
                && new_state.castling.contains(CastlingRights::kingside(us))
            {
                new_state.castling.remove(CastlingRights::kingside(us));
                crate::zobrist::modify_kingside_castle(&mut self.hash, us);
            } else if src == rook_home(us, false)
                && new_state.castling.contains(CastlingRights::queenside(us))
            {
                new_state.castling.remove(CastlingRights::queenside(us));
                crate::zobrist::modify_queenside_castle(&mut self.hash, us);
            }
        }

        if mov.is_double_pawn_push() {
            new_state.ep_square = Some(dst.towards(Direction::down(us)));
        }
        crate::zobrist::modify_en_passant(&mut self.hash, old_state.ep_square, new_state.ep_square);

        self.states.push(new_state);
        self.side_to_move = !us;
        crate::zobrist::modify_side_to_move(&mut self.hash);
        self.ply += 1;
    }

    /// Reverts `mov`, which must be the most recently made move.
    pub fn unmake_move(&mut self, mov: Move) {
        let popped = self.states.pop().expect("state stack is never empty");
        assert!(!self.states.is_empty(), "unmake without a matching make");
        let restored = *self.state();

        self.ply -= 1;
        self.side_to_move = !self.side_to_move;
        crate::zobrist::modify_side_to_move(&mut self.hash);
        let us = self.side_to_move;

        let src = mov.source();
        let dst = mov.destination();
        let mut piece = self.remove_piece(dst);
        if mov.is_promotion() {
            piece = Piece::new(PieceKind::Pawn, us);
        }
        self.add_piece(piece, src);

        if mov.is_capture() {
            let target = if mov.is_en_passant() {
                dst.towards(Direction::down(us))
            } else {
                dst
            };
            let captured = popped
                .captured_piece
                .expect("capture frame without a captured piece");
            self.add_piece(captured, target);
        }

        if mov.is_castle() {
            let kingside = mov.is_kingside_castle();
            let rook_castled = if kingside {
                dst.towards(Direction::West)
            } else {
                dst.towards(Direction::East)
            };
            let rook = self.remove_piece(rook_castled);
            assert!(
                rook.kind() == PieceKind::Rook && rook.color() == us,
                "unmaking a castle without the castled rook"
            );
            self.add_piece(rook, rook_home(us, kingside));
        }

        // Toggle back the key of every castling right this move cleared, and
        // swap the en-passant contribution back to the pre-move file.
        let cleared = restored.castling ^ popped.castling;
        if cleared.contains(CastlingRights::WHITE_KINGSIDE) {
            crate::zobrist::modify_kingside_castle(&mut self.hash, Color::White);
        }
        if cleared.contains(CastlingRights::WHITE_QUEENSIDE) {
            crate::zobrist::modify_queenside_castle(&mut self.hash, Color::White);
        }
        if cleared.contains(CastlingRights::BLACK_KINGSIDE) {
            crate::zobrist::modify_kingside_castle(&mut self.hash, Color::Black);
        }
        if cleared.contains(CastlingRights::BLACK_QUEENSIDE) {
            crate::zobrist::modify_queenside_castle(&mut self.hash, Color::Black);
        }
        crate::zobrist::modify_en_passant(&mut self.hash, popped.ep_square, restored.ep_square);
    }

    /// Recomputes the Zobrist hash from the board state alone. The
    /// incrementally maintained hash must always equal this.
    pub fn recompute_hash(&self) -> u64 {
        let mut hash = 0u64;
        for square in Square::all() {
            if let Some(piece) = self.piece_at(square) {
                crate::zobrist::modify_piece(&mut hash, square, piece);
            }
        }
        if self.side_to_move == Color::Black {
            crate::zobrist::modify_side_to_move(&mut hash);
        }
        for color in [Color::White, Color::Black] {
            if self.can_castle_kingside(color) {
                crate::zobrist::modify_kingside_castle(&mut hash, color);
            }
            if self.can_castle_queenside(color) {
                crate::zobrist::modify_queenside_castle(&mut hash, color);
            }
        }
        crate::zobrist::modify_en_passant(&mut hash, None, self.en_passant_square());
        hash
    }

    /// Parses a FEN string. The halfmove clock and fullmove number fields
    /// are optional; when absent they default to 0 and 1.
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or_else(|| FenError::new("empty string"))?;
        let side = fields
            .next()
            .ok_or_else(|| FenError::new("missing side to move"))?;
        let castling = fields
            .next()
            .ok_or_else(|| FenError::new("missing castling rights"))?;
        let ep = fields
            .next()
            .ok_or_else(|| FenError::new("missing en-passant square"))?;
        let halfmove = fields.next();
        let fullmove = fields.next();
        if fields.next().is_some() {
            return Err(FenError::new("trailing fields"));
        }

        let mut pos = Position::new();

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::new(format!(
                "expected 8 ranks, found {}",
                ranks.len()
            )));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = Rank::ALL[7 - i];
            let mut file = 0u32;
            for c in rank_str.chars() {
                if let Some(step) = c.to_digit(10) {
                    if !(1..=8).contains(&step) {
                        return Err(FenError::new(format!("bad digit '{c}' in placement")));
                    }
                    file += step;
                } else {
                    let piece = Piece::from_char(c)
                        .ok_or_else(|| FenError::new(format!("unknown piece character '{c}'")))?;
                    if file >= 8 {
                        return Err(FenError::new("rank does not sum to 8 files"));
                    }
                    let square = Square::of(crate::types::File::ALL[file as usize], rank);
                    pos.add_piece(piece, square);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::new("rank does not sum to 8 files"));
            }
        }

        pos.side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(FenError::new(format!("unknown side-to-move '{side}'"))),
        };
        if pos.side_to_move == Color::Black {
            crate::zobrist::modify_side_to_move(&mut pos.hash);
        }

        let mut rights = CastlingRights::NONE;
        if castling != "-" {
            for c in castling.chars() {
                match c {
                    'K' => rights.insert(CastlingRights::WHITE_KINGSIDE),
                    'Q' => rights.insert(CastlingRights::WHITE_QUEENSIDE),
                    'k' => rights.insert(CastlingRights::BLACK_KINGSIDE),
                    'q' => rights.insert(CastlingRights::BLACK_QUEENSIDE),
                    _ => return Err(FenError::new(format!("unknown castling character '{c}'"))),
                }
            }
        }
        pos.state_mut().castling = rights;
        for color in [Color::White, Color::Black] {
            if rights.contains(CastlingRights::kingside(color)) {
                crate::zobrist::modify_kingside_castle(&mut pos.hash, color);
            }
            if rights.contains(CastlingRights::queenside(color)) {
                crate::zobrist::modify_queenside_castle(&mut pos.hash, color);
            }
        }

        if ep != "-" {
            let square = Square::from_str(ep)
                .map_err(|_| FenError::new(format!("invalid en-passant square '{ep}'")))?;
            if square.rank() != Rank::R3 && square.rank() != Rank::R6 {
                return Err(FenError::new(format!("invalid en-passant rank in '{ep}'")));
            }
            pos.state_mut().ep_square = Some(square);
            crate::zobrist::modify_en_passant(&mut pos.hash, None, Some(square));
        }

        if let Some(halfmove) = halfmove {
            pos.state_mut().halfmove_clock = halfmove
                .parse()
                .map_err(|_| FenError::new(format!("invalid halfmove clock '{halfmove}'")))?;
        }
        let fullmove: u32 = match fullmove {
            Some(s) => s
                .parse()
                .map_err(|_| FenError::new(format!("invalid fullmove number '{s}'")))?,
            None => 1,
        };
        pos.ply = 2 * fullmove.saturating_sub(1)
            + if pos.side_to_move == Color::Black { 1 } else { 0 };

        Ok(pos)
    }

    /// Emits the position as a FEN string. Round-trips with [`from_fen`]:
    /// `Position::from_fen(s)?.fen() == s` for canonical `s`.
    ///
    /// [`from_fen`]: Position::from_fen
    pub fn fen(&self) -> String {
        let mut out = String::new();
        for i in 0..8 {
            let rank = Rank::ALL[7 - i];
            let mut empty = 0;
            for file in crate::types::File::ALL {
                match self.piece_at(Square::of(file, rank)) {
                    Some(piece) => {
                        if empty != 0 {
                            out.push(char::from_digit(empty, 10).expect("empty run is 1..=8"));
                            empty = 0;
                        }
                        out.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty != 0 {
                out.push(char::from_digit(empty, 10).expect("empty run is 1..=8"));
            }
            if i != 7 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });
        out.push(' ');
        out.push_str(&self.castling_rights().to_string());
        out.push(' ');
        match self.en_passant_square() {
            Some(sq) => out.push_str(&sq.to_string()),
            None => out.push('-'),
        }
        // Black-to-move positions sit on odd plies, which integer division
        // folds onto the same fullmove as the preceding white move.
        let fullmove = 1 + self.ply / 2;
        out.push_str(&format!(" {} {}", self.halfmove_clock(), fullmove));
        out
    }
}

const fn rook_home(color: Color, kingside: bool) -> Square {
    match (color, kingside) {
        (Color::White, true) => Square::H1,
        (Color::White, false) => Square::A1,
        (Color::Black, true) => Square::H8,
        (Color::Black, false) => Square::A8,
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Position, FenError> {
        Position::from_fen(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            for file in 0..8u8 {
                let square = Square::new(rank * 8 + file);
                match self.piece_at(square) {
                    Some(piece) => write!(f, "{} ", piece.to_char())?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
