//! Centipawn piece ratings shared by exchange evaluation, move ordering
//! and the material evaluator.

use shakmaty::Role;

/// Material rating of a piece in centipawns.
///
/// The king's rating only matters inside exchange sequences, where it must
/// dominate every other piece.
pub const fn piece_rating(role: Role) -> i32 {
    match role {
        Role::Pawn => 100,
        Role::Knight => 320,
        Role::Bishop => 330,
        Role::Rook => 500,
        Role::Queen => 900,
        Role::King => 10_000,
    }
}
