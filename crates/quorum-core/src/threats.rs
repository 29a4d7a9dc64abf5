//! Attacker and blocking-ray computation for threat-aware move ordering.

use shakmaty::{Bitboard, Board, Color, Role, Square, attacks};

/// Attackers of a target square and the squares where their attacks can be
/// blocked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreatInfo {
    /// Squares of the `by`-colored pieces attacking the target.
    pub attackers: Bitboard,
    /// Squares strictly between each sliding attacker and the target.
    pub rays: Bitboard,
}

/// Compute every piece of color `by` attacking `target`, plus the blocking
/// squares of the sliding attacks among them.
///
/// Move ordering uses this to front-load replies to a threat: capturing an
/// attacker or interposing on a ray both land inside the returned sets.
pub fn calc_attackers(board: &Board, target: Square, by: Color) -> ThreatInfo {
    let attackers = board.attacks_to(target, by, board.occupied());

    let mut rays = Bitboard::EMPTY;
    for sq in attackers {
        if matches!(
            board.role_at(sq),
            Some(Role::Bishop | Role::Rook | Role::Queen)
        ) {
            rays |= attacks::between(sq, target);
        }
    }

    ThreatInfo { attackers, rays }
}
