//! Pseudo-legal move generation.
//!
//! Pseudo-legal means "legal except for self-check": the generator may emit
//! moves that leave the mover's own king attacked, and callers filter those
//! by making the move and testing `is_check` on the side that just moved.
//!
//! The pawn paths are monomorphized per color through a const-generic
//! parameter, standing in for the per-color template instantiation a
//! hot-path generator wants.

use crate::attacks;
use crate::bitboard;
use crate::moves::Move;
use crate::position::Position;
use crate::types::{Color, Direction, Piece, PieceKind, Square};

/// Upper bound on moves in any reachable position; callers reserve this
/// much so generation never reallocates.
pub const MAX_MOVES: usize = 224;

pub fn generate_pseudolegal(pos: &Position, moves: &mut Vec<Move>) {
    match pos.side_to_move() {
        Color::White => {
            generate_pawn_moves::<true>(pos, moves);
            generate_piece_moves(pos, Color::White, moves);
            generate_king_moves(pos, Color::White, moves);
        }
        Color::Black => {
            generate_pawn_moves::<false>(pos, moves);
            generate_piece_moves(pos, Color::Black, moves);
            generate_king_moves(pos, Color::Black, moves);
        }
    }
}

/// Fully legal moves: pseudo-legal minus the ones that leave the mover in
/// check, found by playing each move and probing the king.
pub fn generate_legal(pos: &mut Position) -> Vec<Move> {
    let mut pseudo = Vec::with_capacity(MAX_MOVES);
    generate_pseudolegal(pos, &mut pseudo);
    let mut legal = Vec::with_capacity(pseudo.len());
    for mov in pseudo {
        pos.make_move(mov);
        if !pos.is_check(!pos.side_to_move()) {
            legal.push(mov);
        }
        pos.unmake_move(mov);
    }
    legal
}

fn generate_pawn_moves<const WHITE: bool>(pos: &Position, moves: &mut Vec<Move>) {
    let us = if WHITE { Color::White } else { Color::Black };
    let up = Direction::up(us);
    let down = Direction::down(us);
    let promo_rank = if WHITE { bitboard::RANK_8 } else { bitboard::RANK_1 };
    let seventh_rank = promo_rank.shift(down);
    let third_rank = if WHITE { bitboard::RANK_3 } else { bitboard::RANK_6 };
    let (capture_west, capture_east) = if WHITE {
        (Direction::NorthWest, Direction::NorthEast)
    } else {
        (Direction::SouthWest, Direction::SouthEast)
    };

    let enemy = pos.pieces(!us);
    let empty = !pos.occupancy();
    let pawns = pos.pieces_of(us, PieceKind::Pawn);

    // Pawns one step from promotion generate four moves per destination and
    // are handled apart from all the others.
    let pawns_on_seventh = pawns & seventh_rank;
    let pawns_not_on_seventh = pawns & !seventh_rank;

    // Single and double advances. A double advance is a single advance that
    // landed on the third rank and can step once more into empty space.
    let advance = pawns_not_on_seventh.shift(up) & empty;
    let double_advance = (advance & third_rank).shift(up) & empty;
    for dst in advance {
        moves.push(Move::quiet(dst.towards(down), dst));
    }
    for dst in double_advance {
        moves.push(Move::double_pawn_push(dst.towards(down).towards(down), dst));
    }

    // Non-promotion captures.
    for dst in pawns_not_on_seventh.shift(capture_west) & enemy {
        moves.push(Move::capture(dst.towards(down).towards(Direction::East), dst));
    }
    for dst in pawns_not_on_seventh.shift(capture_east) & enemy {
        moves.push(Move::capture(dst.towards(down).towards(Direction::West), dst));
    }

    // Promotions, quiet and capturing, one move per piece choice.
    if !pawns_on_seventh.is_empty() {
        for dst in pawns_on_seventh.shift(up) & empty {
            for kind in PROMOTION_KINDS {
                moves.push(Move::promotion(dst.towards(down), dst, kind));
            }
        }
        for dst in pawns_on_seventh.shift(capture_west) & enemy {
            for kind in PROMOTION_KINDS {
                moves.push(Move::promotion_capture(
                    dst.towards(down).towards(Direction::East),
                    dst,
                    kind,
                ));
            }
        }
        for dst in pawns_on_seventh.shift(capture_east) & enemy {
            for kind in PROMOTION_KINDS {
                moves.push(Move::promotion_capture(
                    dst.towards(down).towards(Direction::West),
                    dst,
                    kind,
                ));
            }
        }
    }

    // En passant: any of our pawns attacking the en-passant square may take.
    if let Some(ep) = pos.en_passant_square() {
        for src in attacks::pawns(ep, !us) & pawns {
            moves.push(Move::en_passant(src, ep));
        }
    }
}

const PROMOTION_KINDS: [PieceKind; 4] = [
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
];

fn generate_piece_moves(pos: &Position, us: Color, moves: &mut Vec<Move>) {
    let allied = pos.pieces(us);
    let enemy = pos.pieces(!us);
    let occupancy = allied | enemy;

    for kind in [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ] {
        for src in pos.pieces_of(us, kind) {
            let destinations = attacks::pieces(kind, src, occupancy) & !allied;
            for dst in destinations {
                if enemy.test(dst) {
                    moves.push(Move::capture(src, dst));
                } else {
                    moves.push(Move::quiet(src, dst));
                }
            }
        }
    }
}

fn generate_king_moves(pos: &Position, us: Color, moves: &mut Vec<Move>) {
    let allied = pos.pieces(us);
    let enemy = pos.pieces(!us);
    let occupancy = allied | enemy;
    let king = pos.king_square(us);

    for dst in attacks::kings(king) & !allied {
        if enemy.test(dst) {
            moves.push(Move::capture(king, dst));
        } else {
            moves.push(Move::quiet(king, dst));
        }
    }

    // Castling. A king may not castle out of or through check; castling
    // into check is caught by the downstream self-check filter like any
    // other king move.
    if pos.is_check(us) {
        return;
    }
    let rook = Piece::new(PieceKind::Rook, us);

    if pos.can_castle_kingside(us) {
        let rook_home = if us == Color::White { Square::H1 } else { Square::H8 };
        if pos.piece_at(rook_home) == Some(rook) {
            let one = king.towards(Direction::East);
            let two = one.towards(Direction::East);
            if !occupancy.test(one)
                && !occupancy.test(two)
                && pos.squares_attacking(one, !us).is_empty()
                && pos.squares_attacking(two, !us).is_empty()
            {
                moves.push(Move::kingside_castle(king, two));
            }
        }
    }

    if pos.can_castle_queenside(us) {
        let rook_home = if us == Color::White { Square::A1 } else { Square::A8 };
        if pos.piece_at(rook_home) == Some(rook) {
            // The king crosses `one` and `two`; `three` is only traversed by
            // the rook and merely has to be empty.
            let one = king.towards(Direction::West);
            let two = one.towards(Direction::West);
            let three = two.towards(Direction::West);
            if !occupancy.test(one)
                && !occupancy.test(two)
                && !occupancy.test(three)
                && pos.squares_attacking(one, !us).is_empty()
                && pos.squares_attacking(two, !us).is_empty()
            {
                moves.push(Move::queenside_castle(king, two));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(fen: &str) -> Vec<Move> {
        crate::init();
        let pos = Position::from_fen(fen).expect("valid FEN");
        let mut moves = Vec::with_capacity(MAX_MOVES);
        generate_pseudolegal(&pos, &mut moves);
        moves
    }

    fn assert_moves(moves: &[Move], expected: &[Move]) {
        for mov in expected {
            assert!(
                moves.contains(mov),
                "expected move {} missing from generated set",
                mov.as_uci()
            );
        }
    }

    fn assert_not_moves(moves: &[Move], banned: &[Move]) {
        for mov in banned {
            assert!(
                !moves.contains(mov),
                "banned move {} present in generated set",
                mov.as_uci()
            );
        }
    }

    #[test]
    fn pawn_advance_smoke() {
        let moves = generated("4k3/8/8/8/8/4P3/8/1K6 w - - 0 1");
        assert_moves(&moves, &[Move::quiet(Square::E3, Square::E4)]);
        assert_not_moves(
            &moves,
            &[
                Move::quiet(Square::E3, Square::E5),
                Move::double_pawn_push(Square::E3, Square::E5),
            ],
        );
    }

    #[test]
    fn double_pawn_advance_only_from_start_rank() {
        let moves = generated("4k3/8/8/8/8/5P2/3P4/1K6 w - - 0 1");
        assert_moves(
            &moves,
            &[
                Move::quiet(Square::D2, Square::D3),
                Move::quiet(Square::F3, Square::F4),
                Move::double_pawn_push(Square::D2, Square::D4),
            ],
        );
        assert_not_moves(&moves, &[Move::double_pawn_push(Square::F3, Square::F5)]);
    }

    #[test]
    fn blocked_pawns_do_not_advance() {
        let moves = generated("4k3/8/8/8/4p3/4P3/8/1K6 w - - 0 1");
        assert_not_moves(&moves, &[Move::quiet(Square::E3, Square::E4)]);
    }

    #[test]
    fn pawn_captures_diagonally_only() {
        let moves = generated("2k5/8/8/6p1/2p2P2/3P4/8/1K6 w - - 0 1");
        assert_moves(
            &moves,
            &[
                Move::capture(Square::D3, Square::C4),
                Move::capture(Square::F4, Square::G5),
            ],
        );
        assert_not_moves(
            &moves,
            &[
                Move::capture(Square::D3, Square::E4),
                Move::capture(Square::F4, Square::E5),
            ],
        );
    }

    #[test]
    fn pawn_promotions_emit_all_four_pieces() {
        let moves = generated("3p2k1/2P5/8/8/8/8/8/1K6 w - - 0 1");
        for kind in PROMOTION_KINDS {
            assert_moves(
                &moves,
                &[
                    Move::promotion(Square::C7, Square::C8, kind),
                    Move::promotion_capture(Square::C7, Square::D8, kind),
                ],
            );
            assert_not_moves(
                &moves,
                &[Move::promotion_capture(Square::C7, Square::B8, kind)],
            );
        }
        assert_not_moves(&moves, &[Move::quiet(Square::C7, Square::C8)]);
        // Eight promotion moves and the two king-adjacent non-promotions.
        let promotions = moves.iter().filter(|m| m.is_promotion()).count();
        assert_eq!(promotions, 8);
    }

    #[test]
    fn en_passant_from_both_files() {
        let moves = generated("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        assert_moves(&moves, &[Move::en_passant(Square::E5, Square::D6)]);

        let moves = generated("4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1");
        assert_moves(&moves, &[Move::en_passant(Square::D4, Square::E3)]);
    }

    #[test]
    fn sliding_piece_smoke() {
        let moves = generated("4k3/8/8/8/8/8/4B3/1K6 w - - 0 1");
        assert_moves(
            &moves,
            &[
                Move::quiet(Square::E2, Square::F1),
                Move::quiet(Square::E2, Square::D3),
                Move::quiet(Square::E2, Square::C4),
                Move::quiet(Square::E2, Square::B5),
                Move::quiet(Square::E2, Square::A6),
                Move::quiet(Square::E2, Square::F3),
                Move::quiet(Square::E2, Square::G4),
                Move::quiet(Square::E2, Square::H5),
            ],
        );
    }

    #[test]
    fn sliders_stop_at_blockers_and_capture_them() {
        let moves = generated("4k3/8/8/4r3/8/8/4R3/1K6 w - - 0 1");
        assert_moves(
            &moves,
            &[
                Move::quiet(Square::E2, Square::E3),
                Move::quiet(Square::E2, Square::E4),
                Move::capture(Square::E2, Square::E5),
            ],
        );
        assert_not_moves(
            &moves,
            &[
                Move::quiet(Square::E2, Square::E6),
                Move::capture(Square::E2, Square::E8),
            ],
        );
    }

    #[test]
    fn castling_both_sides_when_clear() {
        let moves = generated("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        assert_moves(
            &moves,
            &[
                Move::kingside_castle(Square::E1, Square::G1),
                Move::queenside_castle(Square::E1, Square::C1),
            ],
        );
    }

    #[test]
    fn castling_requires_empty_transit() {
        let moves = generated("4k3/8/8/8/8/8/8/4KB1R w K - 0 1");
        assert_not_moves(&moves, &[Move::kingside_castle(Square::E1, Square::G1)]);
    }

    #[test]
    fn castling_blocked_out_of_and_through_check() {
        // Black rook on e8 gives check: no castling out of check.
        let moves = generated("4r1k1/8/8/8/8/8/8/4K2R w K - 0 1");
        assert_not_moves(&moves, &[Move::kingside_castle(Square::E1, Square::G1)]);

        // Black rook on f8 covers f1: no castling through check.
        let moves = generated("5rk1/8/8/8/8/8/8/4K2R w K - 0 1");
        assert_not_moves(&moves, &[Move::kingside_castle(Square::E1, Square::G1)]);

        // The queenside rook transit square b1 may be attacked; only the
        // king's path must be safe.
        let moves = generated("1r4k1/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert_moves(&moves, &[Move::queenside_castle(Square::E1, Square::C1)]);
    }

    #[test]
    fn castling_requires_rook_at_home() {
        let moves = generated("4k3/8/8/8/8/8/8/4K3 w KQ - 0 1");
        assert_not_moves(
            &moves,
            &[
                Move::kingside_castle(Square::E1, Square::G1),
                Move::queenside_castle(Square::E1, Square::C1),
            ],
        );
    }

    #[test]
    fn kingside_castle_roundtrips_through_make_unmake() {
        crate::init();
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let mut pos = Position::from_fen(fen).expect("valid FEN");
        let before = pos.clone();
        let mov = Move::kingside_castle(Square::E1, Square::G1);

        pos.make_move(mov);
        assert_eq!(pos.piece_at(Square::G1), Some(Piece::WhiteKing));
        assert_eq!(pos.piece_at(Square::F1), Some(Piece::WhiteRook));
        assert_eq!(pos.piece_at(Square::E1), None);
        assert_eq!(pos.piece_at(Square::H1), None);
        assert!(!pos.can_castle_kingside(Color::White));
        assert_eq!(pos.hash(), pos.recompute_hash());

        pos.unmake_move(mov);
        assert_eq!(pos, before);
    }

    #[test]
    fn startpos_has_twenty_moves() {
        crate::init();
        let mut pos = Position::startpos();
        assert_eq!(generate_legal(&mut pos).len(), 20);
    }

    #[test]
    fn legal_filter_removes_self_checks() {
        crate::init();
        // The e2 rook is pinned to the king by the e8 rook and may not leave
        // the file.
        let mut pos = Position::from_fen("4r2k/8/8/8/8/8/4R3/4K3 w - - 0 1").expect("valid FEN");
        let legal = generate_legal(&mut pos);
        assert!(!legal.contains(&Move::quiet(Square::E2, Square::D2)));
        assert!(legal.contains(&Move::quiet(Square::E2, Square::E5)));
        assert!(legal.contains(&Move::capture(Square::E2, Square::E8)));
    }

    #[test]
    fn hash_stays_consistent_across_generated_moves() {
        crate::init();
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let mut pos = Position::from_fen(fen).expect("valid FEN");
        let original = pos.clone();
        let mut moves = Vec::with_capacity(MAX_MOVES);
        generate_pseudolegal(&pos, &mut moves);
        for mov in moves {
            pos.make_move(mov);
            assert_eq!(
                pos.hash(),
                pos.recompute_hash(),
                "incremental hash diverged after {}",
                mov.as_uci()
            );
            pos.unmake_move(mov);
            assert_eq!(pos, original, "position not restored after {}", mov.as_uci());
        }
    }
}
