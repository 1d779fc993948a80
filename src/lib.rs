//! Arrocco: the core of a bitboard chess engine.
//!
//! The crate provides the performance-critical pieces an alpha-beta engine
//! is built around: square/piece/bitboard primitives, precomputed leaper
//! and magic-bitboard slider attacks, a position with make/unmake and an
//! incrementally maintained Zobrist hash, pseudo-legal move generation, a
//! lock-striped transposition table, and a worker pool driven over a thin
//! UCI shell. The search itself is a perft driver, the canonical
//! correctness and throughput benchmark for all of the above.
//!
//! Call [`init`] once before any position operation; it builds the magic
//! slider tables.

pub mod attacks;
pub mod bitboard;
pub mod eval;
pub mod magic;
pub mod movegen;
pub mod moves;
pub mod position;
pub mod search;
pub mod types;
pub mod uci;
pub mod value;
pub mod zobrist;

pub use bitboard::Bitboard;
pub use moves::Move;
pub use position::{Position, START_FEN};
pub use types::{Color, Piece, PieceKind, Square};

/// One-time process-wide initialization of the attack tables.
pub fn init() {
    magic::init();
}
