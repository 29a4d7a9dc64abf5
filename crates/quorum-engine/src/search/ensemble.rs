//! Searcher ensemble over a shared table, and the vote that merges their
//! answers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use shakmaty::Move;
use tracing::debug;

use quorum_core::{PackedMove, RepetitionMap, SearchPosition};

use crate::search::tt::PositionTable;
use crate::search::window::Rating;
use crate::search::{MoveRating, Searcher};

/// The search ensemble: one primary searcher plus helpers, all sharing one
/// transposition table and one stop flag.
///
/// Helpers diversify the ensemble instead of splitting the tree formally:
/// they shuffle shallow move ordering, skip the root table probe, and half
/// of them run one ply shallower. The vote then weighs their independent
/// answers.
pub struct AsyncSearch {
    table: PositionTable,
    stop: Arc<AtomicBool>,
    searchers: Mutex<Vec<Searcher>>,
}

impl AsyncSearch {
    /// Ensemble sized to the machine: one searcher per hardware thread.
    pub fn new(hash_mb: usize) -> AsyncSearch {
        let threads = thread::available_parallelism().map_or(1, |n| n.get());
        AsyncSearch::with_searchers(hash_mb, threads)
    }

    /// Ensemble with an explicit searcher count (>= 1). Searcher 0 is the
    /// primary; the rest are helpers.
    pub fn with_searchers(hash_mb: usize, count: usize) -> AsyncSearch {
        let stop = Arc::new(AtomicBool::new(false));
        let mut searchers = Vec::with_capacity(count.max(1));
        searchers.push(Searcher::new(false, Arc::clone(&stop)));
        for _ in 1..count {
            searchers.push(Searcher::new(true, Arc::clone(&stop)));
        }

        AsyncSearch {
            table: PositionTable::new(hash_mb),
            stop,
            searchers: Mutex::new(searchers),
        }
    }

    /// Ask every in-flight searcher to wind down. Cooperative: each worker
    /// surfaces at its next node entry.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Forget everything learned so far (new game).
    pub fn clear_table(&self) {
        self.table.clear();
    }

    /// Run every searcher to completion and vote on their answers.
    ///
    /// Returns `None` when any searcher came back without a move: the
    /// position is terminal, or the search was cancelled.
    pub fn find_best_move(
        &self,
        pos: &SearchPosition,
        depth: u8,
        repetition: &RepetitionMap,
    ) -> Option<Move> {
        debug_assert!(depth >= 1, "search depth must be at least 1");

        let mut searchers = self.searchers.lock().expect("searcher mutex poisoned");
        assign_depths(&mut searchers, depth);
        self.stop.store(false, Ordering::Release);

        let table = &self.table;
        let results: Vec<MoveRating> = thread::scope(|scope| {
            let handles: Vec<_> = searchers
                .iter_mut()
                .map(|searcher| scope.spawn(move || searcher.search(table, pos, repetition)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("searcher thread panicked"))
                .collect()
        });

        if results.iter().any(|result| result.mv.is_none()) {
            return None;
        }

        vote_for_best_move(&searchers, &results)
    }
}

impl std::fmt::Debug for AsyncSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSearch")
            .field("table", &self.table)
            .finish()
    }
}

/// The primary gets the full requested depth. Helpers alternate between the
/// full depth and one ply less to add variance, never dropping below 1.
fn assign_depths(searchers: &mut [Searcher], max_depth: u8) {
    debug_assert!(max_depth >= 1);
    for (index, searcher) in searchers.iter_mut().enumerate() {
        searcher.depth = if !searcher.is_helper() || max_depth == 1 {
            max_depth
        } else if index % 2 == 0 {
            max_depth - 1
        } else {
            max_depth
        };
    }
}

/// Merge the searchers' answers into one move.
///
/// Any discovered forced mate wins outright, shortest mate first. Otherwise
/// each searcher casts a weighted vote for its own move and the heaviest
/// total wins, earliest reaching searcher breaking ties.
fn vote_for_best_move(searchers: &[Searcher], results: &[MoveRating]) -> Option<Move> {
    if results.iter().any(|r| r.checkmate_level.is_some()) {
        let quickest = results
            .iter()
            .min_by_key(|r| r.checkmate_level.unwrap_or(u8::MAX))?;
        return quickest.mv;
    }

    let worst = results.iter().map(|r| r.rating).min()?;
    let best = results.iter().map(|r| r.rating).max()?;
    let spread = best - worst;

    let mut tallies: HashMap<PackedMove, f64> = HashMap::new();
    let mut best_move = None;
    let mut best_tally = 0.0;

    for (result, searcher) in results.iter().zip(searchers) {
        if let Some(level) = result.checkmate_level {
            debug!(level, "searcher reported a forced mate");
        }
        let mv = result.mv?;
        let tally = tallies.entry(PackedMove::from(&mv)).or_insert(0.0);
        *tally += voting_weight(searcher.depth, result, worst, spread);
        if *tally > best_tally {
            best_tally = *tally;
            best_move = Some(mv);
        }
    }

    best_move
}

/// One searcher's vote weight: a base growing with its depth, up to a 20%
/// uplift for a relatively strong rating, plus a bonus for shorter mates.
fn voting_weight(depth: u8, result: &MoveRating, worst: Rating, spread: Rating) -> f64 {
    debug_assert!(spread >= 0);

    let base = 1.0 + f64::powi(2.0, i32::from(depth));
    let mut weight = base;
    if spread != 0 {
        weight += 1.2 * f64::from(result.rating - worst) / f64::from(spread) * base;
    }
    if let Some(level) = result.checkmate_level {
        weight += weight / f64::from(level.max(1));
    }
    weight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn searcher_with_depth(depth: u8) -> Searcher {
        let mut searcher = Searcher::new(false, Arc::new(AtomicBool::new(false)));
        searcher.depth = depth;
        searcher
    }

    fn rating_for(mv: Move, rating: Rating) -> MoveRating {
        MoveRating {
            mv: Some(mv),
            rating,
            invalid_tt_entry: false,
            checkmate_level: None,
        }
    }

    #[test]
    fn depth_assignment_alternates_for_helpers() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut searchers = vec![
            Searcher::new(false, Arc::clone(&stop)),
            Searcher::new(true, Arc::clone(&stop)),
            Searcher::new(true, Arc::clone(&stop)),
            Searcher::new(true, Arc::clone(&stop)),
        ];
        assign_depths(&mut searchers, 6);

        let depths: Vec<u8> = searchers.iter().map(|s| s.depth).collect();
        assert_eq!(depths, vec![6, 6, 5, 6], "primary full, helpers alternating");
    }

    #[test]
    fn depth_assignment_never_drops_below_one() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut searchers = vec![
            Searcher::new(false, Arc::clone(&stop)),
            Searcher::new(true, Arc::clone(&stop)),
            Searcher::new(true, Arc::clone(&stop)),
        ];
        assign_depths(&mut searchers, 1);
        assert!(searchers.iter().all(|s| s.depth == 1));
    }

    #[test]
    fn deeper_searchers_vote_heavier() {
        let shallow = MoveRating {
            mv: None,
            rating: 50,
            invalid_tt_entry: false,
            checkmate_level: None,
        };
        assert!(
            voting_weight(6, &shallow, 0, 100) > voting_weight(3, &shallow, 0, 100),
            "2^depth base must dominate"
        );
    }

    #[test]
    fn better_ratings_get_up_to_twenty_percent_uplift() {
        let worst = rating_for(SearchPosition::starting().legal_moves()[0], 0);
        let best = rating_for(SearchPosition::starting().legal_moves()[1], 100);

        let base = voting_weight(4, &worst, 0, 100);
        let lifted = voting_weight(4, &best, 0, 100);
        assert!(lifted > base);
        assert!(
            (lifted - base * 2.2).abs() < 1e-9,
            "full uplift is 1.2x the base on top of it"
        );
    }

    #[test]
    fn zero_spread_skips_the_uplift() {
        let result = rating_for(SearchPosition::starting().legal_moves()[0], 70);
        assert_eq!(voting_weight(4, &result, 70, 0), 1.0 + 16.0);
    }

    #[test]
    fn vote_prefers_the_move_with_heavier_total() {
        let pos = SearchPosition::starting();
        let moves = pos.legal_moves();
        let (a, b) = (moves[0], moves[1]);

        // Two shallow searchers pick `a`, one deep searcher picks `b`.
        let searchers = vec![
            searcher_with_depth(2),
            searcher_with_depth(2),
            searcher_with_depth(6),
        ];
        let results = vec![rating_for(a, 10), rating_for(a, 10), rating_for(b, 10)];

        let winner = vote_for_best_move(&searchers, &results).unwrap();
        assert_eq!(winner, b, "one depth-6 vote outweighs two depth-2 votes");
    }

    #[test]
    fn accumulated_votes_beat_a_single_deeper_vote() {
        let pos = SearchPosition::starting();
        let moves = pos.legal_moves();
        let (a, b) = (moves[0], moves[1]);

        // Three depth-4 votes for `a` against one depth-5 vote for `b`.
        let searchers = vec![
            searcher_with_depth(4),
            searcher_with_depth(4),
            searcher_with_depth(4),
            searcher_with_depth(5),
        ];
        let results = vec![
            rating_for(a, 10),
            rating_for(a, 10),
            rating_for(a, 10),
            rating_for(b, 10),
        ];

        let winner = vote_for_best_move(&searchers, &results).unwrap();
        assert_eq!(winner, a, "3 * 17 outweighs 1 * 33");
    }

    #[test]
    fn any_checkmate_overrides_the_weighted_vote() {
        let pos = SearchPosition::starting();
        let moves = pos.legal_moves();
        let (a, b) = (moves[0], moves[1]);

        let searchers = vec![searcher_with_depth(8), searcher_with_depth(2)];
        let mate = MoveRating {
            mv: Some(b),
            rating: 29_000,
            invalid_tt_entry: false,
            checkmate_level: Some(3),
        };
        let results = vec![rating_for(a, 500), mate];

        let winner = vote_for_best_move(&searchers, &results).unwrap();
        assert_eq!(winner, b, "a found mate beats any material vote");
    }

    #[test]
    fn shortest_mate_wins_among_mates() {
        let pos = SearchPosition::starting();
        let moves = pos.legal_moves();
        let (a, b) = (moves[0], moves[1]);

        let searchers = vec![searcher_with_depth(4), searcher_with_depth(4)];
        let slow_mate = MoveRating {
            mv: Some(a),
            rating: 29_000,
            invalid_tt_entry: false,
            checkmate_level: Some(5),
        };
        let fast_mate = MoveRating {
            mv: Some(b),
            rating: 29_000,
            invalid_tt_entry: false,
            checkmate_level: Some(1),
        };

        let winner = vote_for_best_move(&searchers, &[slow_mate, fast_mate]).unwrap();
        assert_eq!(winner, b);
    }
}
