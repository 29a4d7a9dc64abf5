//! Static position evaluation: material balance and piece placement.
//!
//! All ratings are from White's perspective (positive = White ahead),
//! matching the search's absolute-score orientation.

mod pst;

use quorum_core::SearchPosition;
use shakmaty::{Color, Role};

use crate::search::window::Rating;

/// Bonus awarded to a side owning two or more bishops.
const BISHOP_PAIR_BONUS: Rating = 50;

/// Material value used by the evaluator; the king carries none.
const fn material(role: Role) -> Rating {
    match role {
        Role::King => 0,
        other => quorum_core::piece_rating(other),
    }
}

/// Rate a position in centipawns from White's perspective.
///
/// This is the leaf rating of the search: weighted material plus
/// piece-square bonuses plus the bishop-pair bonus. Intentionally cheap:
/// it runs at every horizon node.
pub fn evaluate(pos: &SearchPosition) -> Rating {
    let board = pos.board();
    let mut rating = 0;

    for color in [Color::White, Color::Black] {
        let sign = if color == Color::White { 1 } else { -1 };
        let side = board.by_color(color);

        for role in Role::ALL {
            for sq in side & board.by_role(role) {
                rating += sign * (material(role) + pst::bonus(role, color, sq));
            }
        }

        if (side & board.by_role(Role::Bishop)).count() >= 2 {
            rating += sign * BISHOP_PAIR_BONUS;
        }
    }

    rating
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_is_balanced() {
        assert_eq!(evaluate(&SearchPosition::starting()), 0);
    }

    #[test]
    fn missing_black_queen_rates_white_ahead() {
        let pos = SearchPosition::from_fen(
            "rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        )
        .unwrap();
        let rating = evaluate(&pos);
        assert!(rating > 800, "queen odds should rate near +900, got {rating}");
    }

    #[test]
    fn missing_white_queen_rates_black_ahead() {
        let pos = SearchPosition::from_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB1KBNR w KQkq - 0 1",
        )
        .unwrap();
        let rating = evaluate(&pos);
        assert!(rating < -800, "queen odds should rate near -900, got {rating}");
    }

    #[test]
    fn mirrored_positions_negate() {
        // An asymmetric position and its color-flipped mirror.
        let white_up = SearchPosition::from_fen("4k3/8/8/8/8/8/8/QQ2K3 w - - 0 1").unwrap();
        let black_up = SearchPosition::from_fen("qq2k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(evaluate(&white_up), -evaluate(&black_up));
    }

    #[test]
    fn bishop_pair_counts_once_per_side() {
        let pair = SearchPosition::from_fen("4k3/8/8/8/8/8/8/2BBK3 w - - 0 1").unwrap();
        let single = SearchPosition::from_fen("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        let diff = evaluate(&pair) - evaluate(&single);
        assert!(
            diff > material(Role::Bishop),
            "second bishop should add its value plus the pair bonus, got {diff}"
        );
    }
}
