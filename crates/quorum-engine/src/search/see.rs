//! Static exchange evaluation.

use quorum_core::piece_rating;
use shakmaty::{Board, Color, Move, Square};

use crate::search::window::Rating;

/// Rate the material flow a move starts on its destination square.
///
/// The move is played on a scratch board, then both sides recapture with
/// their least valuable attacker, each free to stand pat once a further
/// exchange would lose material. Captures rate the victim minus the best
/// recapture chain; a quiet move to a defended square rates negative.
/// Castling never enters an exchange and rates 0.
pub fn exchange_rating(board: &Board, mv: Move) -> Rating {
    if mv.is_castle() {
        return 0;
    }
    let Some(from) = mv.from() else {
        return 0;
    };
    let to = mv.to();
    let Some(piece) = board.piece_at(from) else {
        return 0;
    };

    let gain = mv.capture().map_or(0, piece_rating);

    let mut scratch = board.clone();
    scratch.discard_piece_at(from);
    if mv.is_en_passant() {
        // the captured pawn is beside the destination, not on it
        let victim_sq = Square::from_coords(to.file(), from.rank());
        scratch.discard_piece_at(victim_sq);
    }
    scratch.set_piece_at(to, piece);

    gain - respond(&scratch, to, !piece.color)
}

/// Value `color` can extract by continuing the exchange on `target`,
/// declining when recapturing loses material.
fn respond(board: &Board, target: Square, color: Color) -> Rating {
    let attackers = board.attacks_to(target, color, board.occupied());
    let Some(attacker_sq) = attackers
        .into_iter()
        .min_by_key(|&sq| board.role_at(sq).map_or(Rating::MAX, piece_rating))
    else {
        return 0;
    };

    let attacker = board
        .piece_at(attacker_sq)
        .expect("attacker square is occupied");
    let victim = board
        .role_at(target)
        .expect("exchange target is occupied");

    let mut scratch = board.clone();
    scratch.discard_piece_at(attacker_sq);
    scratch.set_piece_at(target, attacker);

    (piece_rating(victim) - respond(&scratch, target, !color)).max(0)
}
