//! Static evaluation: material plus piece-square tables, essentially
//! Tomasz Michniewski's simplified evaluation function.
//!
//! Tables are written from white's point of view with rank 1 in the first
//! row; black pieces read them through `horizontal_flip`.

use crate::position::Position;
use crate::types::{Color, PieceKind, Square};
use crate::value::Value;

#[rustfmt::skip]
const PAWN_TABLE: [i16; 64] = [
    //       a   b   c   d   e   f   g   h
    /* 1 */  0,  0,  0,  0,  0,  0,  0,  0,
    /* 2 */  5, 10, 10,-20,-20, 10, 10,  5,
    /* 3 */  5, -5,-10,  0,  0,-10, -5,  5,
    /* 4 */  0,  0,  0, 20, 20,  0,  0,  0,
    /* 5 */  5,  5, 10, 25, 25, 10,  5,  5,
    /* 6 */ 10, 10, 20, 30, 30, 20, 10, 10,
    /* 7 */ 50, 50, 50, 50, 50, 50, 50, 50,
    /* 8 */  0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_TABLE: [i16; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_TABLE: [i16; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_TABLE: [i16; 64] = [
      0,  0,  0,  5,  5,  0,  0,  0,
     -5,  0,  0,  0,  0,  0,  0, -5,
     -5,  0,  0,  0,  0,  0,  0, -5,
     -5,  0,  0,  0,  0,  0,  0, -5,
     -5,  0,  0,  0,  0,  0,  0, -5,
     -5,  0,  0,  0,  0,  0,  0, -5,
      5, 10, 10, 10, 10, 10, 10,  5,
      0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_TABLE: [i16; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -10,  5,  5,  5,  5,  5,  5,-10,
      0,  0,  5,  5,  5,  5,  0, -5,
     -5,  0,  5,  5,  5,  5,  0, -5,
    -10,  0,  5,  5,  5,  5,  0,-10,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_TABLE: [i16; 64] = [
     20, 30, 10,  0,  0, 10, 30, 20,
     20, 20,  0,  0,  0,  0, 20, 20,
    -10,-20,-20,-20,-20,-20,-20,-10,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
];

const PIECE_VALUES: [i16; 6] = [100, 320, 330, 500, 900, 10000];

fn evaluate_piece(pos: &Position, square: Square, side: Color) -> Value {
    let piece = pos
        .piece_at(square)
        .unwrap_or_else(|| panic!("no piece at {square} in evaluate_piece"));
    let kind = piece.kind();
    let normalized = match side {
        Color::White => square,
        Color::Black => square.horizontal_flip(),
    };
    let placement = match kind {
        PieceKind::Pawn => PAWN_TABLE[normalized.index()],
        PieceKind::Knight => KNIGHT_TABLE[normalized.index()],
        PieceKind::Bishop => BISHOP_TABLE[normalized.index()],
        PieceKind::Rook => ROOK_TABLE[normalized.index()],
        PieceKind::Queen => QUEEN_TABLE[normalized.index()],
        PieceKind::King => KING_TABLE[normalized.index()],
    };
    Value::centipawns(PIECE_VALUES[kind.index()] + placement)
}

/// Material-and-placement score from white's point of view.
pub fn evaluate(pos: &Position) -> Value {
    let mut white_total = Value::ZERO;
    let mut black_total = Value::ZERO;
    for square in pos.pieces(Color::White) {
        white_total += evaluate_piece(pos, square, Color::White);
    }
    for square in pos.pieces(Color::Black) {
        black_total += evaluate_piece(pos, square, Color::Black);
    }
    white_total - black_total
}
