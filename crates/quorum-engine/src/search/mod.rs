//! Alpha-beta search with transposition short-circuiting, late-move
//! reduction, killer moves and iterative deepening.

pub mod ensemble;
pub mod killers;
pub mod node;
pub mod ordering;
pub mod see;
pub mod tt;
pub mod window;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use shakmaty::Move;

use quorum_core::{PackedMove, RepetitionMap, SearchPosition};

use crate::evaluate;
use killers::KillerTable;
use node::Node;
use ordering::{MovePriority, move_priorities};
use tt::{Bound, PositionEntry, PositionTable};
use window::{AlphaBeta, Rating, checkmated_rating, worst_rating};

/// Helper searchers shuffle move order at levels below this to spread the
/// ensemble over different parts of the tree.
const RANDOMIZATION_CUTOFF: u8 = 3;

/// Result of searching one subtree.
#[derive(Debug, Clone)]
pub struct MoveRating {
    /// Best move found; `None` at terminal, repeated or cancelled nodes.
    pub mv: Option<Move>,
    /// Subtree rating from White's perspective.
    pub rating: Rating,
    /// Keep this subtree's result out of the shared table. Set when a
    /// threefold repetition produced a path-dependent rating; never
    /// propagated past the node that stores (or skips storing) it.
    pub invalid_tt_entry: bool,
    /// Level at which a forced mate terminal was reached, if one was.
    pub checkmate_level: Option<u8>,
}

impl MoveRating {
    fn leaf(rating: Rating) -> MoveRating {
        MoveRating {
            mv: None,
            rating,
            invalid_tt_entry: false,
            checkmate_level: None,
        }
    }
}

/// One iterative-deepening alpha-beta searcher.
///
/// The primary searcher runs deterministically at the full requested depth.
/// Helpers add ensemble variance: they shuffle move order at shallow levels,
/// skip the table probe at the root, and may run one ply shallower.
pub struct Searcher {
    helper: bool,
    /// Iterative-deepening target, assigned by the ensemble before each run.
    pub depth: u8,
    stop: Arc<AtomicBool>,
    killers: KillerTable,
    rng: StdRng,
}

impl Searcher {
    pub fn new(helper: bool, stop: Arc<AtomicBool>) -> Searcher {
        Searcher {
            helper,
            depth: 1,
            stop,
            killers: KillerTable::new(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn is_helper(&self) -> bool {
        self.helper
    }

    /// Search `pos` by iterative deepening up to `self.depth`.
    ///
    /// Earlier iterations are run purely for their effect on the shared
    /// table (and the killer table); only the final iteration's result is
    /// returned.
    pub fn search(
        &mut self,
        table: &PositionTable,
        pos: &SearchPosition,
        repetition: &RepetitionMap,
    ) -> MoveRating {
        let maximizing = pos.is_white();
        for iter_depth in 1..self.depth {
            self.start_search(table, pos, iter_depth, repetition, maximizing);
        }
        self.start_search(table, pos, self.depth, repetition, maximizing)
    }

    fn start_search(
        &mut self,
        table: &PositionTable,
        pos: &SearchPosition,
        depth: u8,
        repetition: &RepetitionMap,
        maximizing: bool,
    ) -> MoveRating {
        let root = Node::root(pos.clone(), depth, repetition.clone());
        self.try_short_circuit(table, &root, AlphaBeta::new(), maximizing)
    }

    /// Node entry: resolve the node without expanding children when a
    /// terminal, a repetition, a cancellation, a usable table entry, or the
    /// depth horizon allows it; otherwise descend.
    fn try_short_circuit(
        &mut self,
        table: &PositionTable,
        node: &Node,
        mut window: AlphaBeta,
        maximizing: bool,
    ) -> MoveRating {
        if node.pos().legal_moves().is_empty() {
            if node.pos().is_check() {
                return MoveRating {
                    mv: None,
                    rating: checkmated_rating(maximizing),
                    invalid_tt_entry: false,
                    checkmate_level: Some(node.level()),
                };
            }
            return MoveRating::leaf(0); // stalemate
        }

        if node.repetition().count(node.pos()) >= 3 {
            return MoveRating {
                mv: None,
                rating: 0,
                invalid_tt_entry: true,
                checkmate_level: None,
            };
        }

        if self.stop.load(Ordering::Relaxed) {
            return MoveRating::leaf(evaluate(node.pos()));
        }

        // Helpers skip the probe at the root so the ensemble does not
        // collapse onto one cached line.
        let mut pv_move = None;
        if !(self.helper && node.level() == 0)
            && let Some(entry) = table.lookup(node.pos().hash())
        {
            // A colliding hash resolves to no legal move and is ignored.
            pv_move = node.pos().find_move(entry.best_move);
            if let Some(best) = pv_move
                && !would_make_repetition(node, best)
                && entry.depth >= node.remaining_depth()
            {
                match entry.bound {
                    Bound::InWindow => {
                        return MoveRating {
                            mv: Some(best),
                            rating: entry.rating,
                            invalid_tt_entry: false,
                            checkmate_level: None,
                        };
                    }
                    Bound::LowerBound => {
                        if entry.rating >= window.beta() {
                            return MoveRating {
                                mv: Some(best),
                                rating: entry.rating,
                                invalid_tt_entry: false,
                                checkmate_level: None,
                            };
                        }
                        window.raise_alpha(entry.rating);
                    }
                    Bound::UpperBound => {
                        if entry.rating <= window.alpha() {
                            return MoveRating {
                                mv: Some(best),
                                rating: entry.rating,
                                invalid_tt_entry: false,
                                checkmate_level: None,
                            };
                        }
                        window.lower_beta(entry.rating);
                    }
                }
            }
        }

        if node.is_leaf() {
            // never reached at the root: the root always has depth >= 1
            return MoveRating::leaf(evaluate(node.pos()));
        }

        self.best_child_position(table, node, pv_move, window, maximizing)
    }

    /// Expand the node's children in priority order, maintaining the window
    /// and the best child seen, then classify and store the result.
    fn best_child_position(
        &mut self,
        table: &PositionTable,
        node: &Node,
        pv_move: Option<Move>,
        mut window: AlphaBeta,
        maximizing: bool,
    ) -> MoveRating {
        let original = window;

        let mut priorities = move_priorities(node, pv_move, self.killers.at(node.level()));
        if self.helper && node.level() < RANDOMIZATION_CUTOFF {
            priorities.shuffle(&mut self.rng);
        }
        debug_assert!(!priorities.is_empty(), "non-terminal node without moves");

        let mut best = MoveRating {
            mv: None,
            rating: worst_rating(maximizing),
            invalid_tt_entry: false,
            checkmate_level: None,
        };
        let mut bound = Bound::InWindow;
        let mut pruned = false;

        for priority in &priorities {
            let child = node.child(priority);
            let mut child_rating =
                self.try_short_circuit(table, &child, window, !maximizing);

            // A trimmed move that looks good enough to enter the window must
            // be proven at full depth before it may win the node.
            if priority.is_trimmed() {
                let may_choose = if maximizing {
                    child_rating.rating >= window.alpha()
                } else {
                    child_rating.rating <= window.beta()
                };
                if may_choose {
                    let full = MovePriority::full(priority.mv(), node.remaining_depth());
                    let re_searched = node.child(&full);
                    child_rating =
                        self.try_short_circuit(table, &re_searched, window, !maximizing);
                }
            }

            let improves = if maximizing {
                child_rating.rating > best.rating
            } else {
                child_rating.rating < best.rating
            };
            if improves {
                best = child_rating.clone();
                best.mv = Some(priority.mv());
            }

            window.update(maximizing, best.rating);
            if window.can_prune() {
                if priority.mv().capture().is_none()
                    && let Some(ring) = self.killers.at_mut(node.level())
                {
                    ring.insert(priority.mv());
                }
                bound = if maximizing {
                    Bound::LowerBound
                } else {
                    Bound::UpperBound
                };
                pruned = true;
                break;
            }

            // The opponent is mated: no remaining sibling can do better.
            if child_rating.rating == checkmated_rating(!maximizing) {
                break;
            }
        }

        if !pruned {
            if maximizing && best.rating <= original.alpha() {
                bound = Bound::UpperBound;
            } else if !maximizing && best.rating >= original.beta() {
                bound = Bound::LowerBound;
            }
        }

        if !best.invalid_tt_entry
            && let Some(mv) = best.mv
        {
            table.store(
                node.pos().hash(),
                PositionEntry {
                    best_move: PackedMove::from(&mv),
                    rating: best.rating,
                    depth: node.remaining_depth(),
                    bound,
                },
            );
        }

        // Repetition taint is local to this subtree; the caller re-checks
        // cancellation itself.
        best.invalid_tt_entry = false;
        best
    }
}

/// Whether playing `mv` here walks into a position that would already be a
/// second occurrence: the opponent could then force the threefold, so a
/// table entry recommending it is not trusted for bounds.
fn would_make_repetition(node: &Node, mv: Move) -> bool {
    let child = node.pos().child(mv);
    // the child has not been pushed yet, count it by hand
    node.repetition().count(&child) + 1 >= 2
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher")
            .field("helper", &self.helper)
            .field("depth", &self.depth)
            .finish()
    }
}
