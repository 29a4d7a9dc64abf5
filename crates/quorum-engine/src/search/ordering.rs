//! Move ordering: exchange sort, principal variation, threat answers,
//! killers, and late-move reduction.
//!
//! The pipeline produces a single ordered list per node:
//!
//! 1. every legal move rated by static exchange, sorted best first;
//! 2. the principal-variation move swapped to the front;
//! 3. moves answering an enemy threat (good trades, capturing an attacker,
//!    blocking its ray) partitioned ahead of the rest, most valuable
//!    attacked piece first;
//! 4. killer moves ahead of what remains;
//! 5. the final tail searched at reduced depth, deeper cuts for later
//!    indices.

use quorum_core::{SearchPosition, calc_attackers, piece_rating};
use shakmaty::{Move, Role};

use crate::search::killers::KillerEntries;
use crate::search::node::Node;
use crate::search::see::exchange_rating;
use crate::search::window::Rating;

/// Threat targets are answered from the most valuable attacked piece down.
const MOST_VALUABLE_PIECES: [Role; 5] = [
    Role::Queen,
    Role::Rook,
    Role::Bishop,
    Role::Knight,
    Role::Pawn,
];

/// A candidate move with its exchange rating and the depth its subtree will
/// be searched at.
#[derive(Debug, Clone)]
pub struct MovePriority {
    mv: Move,
    exchange: Rating,
    search_depth: u8,
    full_depth: u8,
}

impl MovePriority {
    /// Rate `mv` for ordering in a node with `remaining_depth` plies left.
    pub fn new(pos: &SearchPosition, mv: Move, remaining_depth: u8) -> MovePriority {
        debug_assert!(remaining_depth > 0, "cannot order moves at a leaf");
        let full_depth = remaining_depth - 1;
        MovePriority {
            exchange: exchange_rating(pos.board(), mv),
            mv,
            search_depth: full_depth,
            full_depth,
        }
    }

    /// An untrimmed priority, used when re-searching a reduced move at full
    /// depth.
    pub fn full(mv: Move, remaining_depth: u8) -> MovePriority {
        debug_assert!(remaining_depth > 0);
        let full_depth = remaining_depth - 1;
        MovePriority {
            mv,
            exchange: 0,
            search_depth: full_depth,
            full_depth,
        }
    }

    pub fn mv(&self) -> Move {
        self.mv
    }

    pub fn exchange_rating(&self) -> Rating {
        self.exchange
    }

    /// Remaining depth assigned to the child subtree.
    pub fn search_depth(&self) -> u8 {
        self.search_depth
    }

    /// Reduce the subtree depth as a function of the ordering index.
    pub fn trim(&mut self, index: usize) {
        self.search_depth = self.full_depth.saturating_sub(reduction(index));
    }

    /// Whether this move searches shallower than the parent's depth allows.
    /// Trimmed moves must be re-searched at full depth before they can win a
    /// node.
    pub fn is_trimmed(&self) -> bool {
        self.search_depth < self.full_depth
    }
}

/// Non-decreasing reduction schedule over the ordering index: the first few
/// moves keep full depth, later ones lose plies logarithmically.
fn reduction(index: usize) -> u8 {
    if index < 4 {
        0
    } else {
        (index.ilog2() - 1) as u8
    }
}

/// Produce the ordered move priorities for `node`.
///
/// The output is a permutation of the legal moves; the PV move, when legal
/// here, ends up at index 0.
pub fn move_priorities(
    node: &Node,
    pv_move: Option<Move>,
    killers: Option<&KillerEntries>,
) -> Vec<MovePriority> {
    let pos = node.pos();
    let remaining_depth = node.remaining_depth();
    debug_assert!(remaining_depth > 0, "move ordering called on a leaf node");

    let legal = pos.legal_moves();
    let mut priorities: Vec<MovePriority> = legal
        .iter()
        .map(|&mv| MovePriority::new(pos, mv, remaining_depth))
        .collect();

    priorities.sort_unstable_by(|a, b| b.exchange.cmp(&a.exchange));

    // PV move to the front; everything after it is fair game for the
    // partitioning passes.
    let mut tail_start = 0;
    if let Some(pv) = pv_move
        && let Some(found) = priorities.iter().position(|p| p.mv == pv)
    {
        priorities.swap(0, found);
        tail_start = 1;
    }

    tail_start = order_threat_answers_first(node, &mut priorities, tail_start);

    if let Some(killers) = killers {
        tail_start += stable_partition(&mut priorities[tail_start..], |p| {
            killers.contains(p.mv)
        });
    }

    // Late-move reduction over the remaining tail. At depth 1 there is
    // nothing left to trim.
    if remaining_depth - 1 != 0 {
        for (index, priority) in priorities.iter_mut().enumerate().skip(tail_start) {
            priority.trim(index);
        }
    }

    debug_assert_eq!(priorities.len(), legal.len());
    priorities
}

/// For each of our attacked pieces (most valuable first, then by square),
/// partition the tail so that moves answering the threat come first: trades
/// at least as valuable as the attacked piece, captures of an attacker, or
/// interpositions on its ray.
fn order_threat_answers_first(
    node: &Node,
    priorities: &mut [MovePriority],
    mut tail_start: usize,
) -> usize {
    let pos = node.pos();
    let board = pos.board();
    let us = pos.turn();
    let enemy_attacks = pos.enemy_attacks();

    for role in MOST_VALUABLE_PIECES {
        let attacked = board.by_color(us) & board.by_role(role) & enemy_attacks;
        for target in attacked {
            let threat = calc_attackers(board, target, !us);
            let target_rating = piece_rating(role);
            tail_start += stable_partition(&mut priorities[tail_start..], |p| {
                p.exchange >= target_rating
                    || threat.attackers.contains(p.mv.to())
                    || threat.rays.contains(p.mv.to())
            });
        }
    }

    tail_start
}

/// Stably move every element satisfying `pred` to the front of `slice`;
/// returns how many matched.
fn stable_partition<T>(slice: &mut [T], pred: impl Fn(&T) -> bool) -> usize {
    let matched = slice.iter().filter(|item| pred(item)).count();
    slice.sort_by_key(|item| !pred(item));
    matched
}
