//! Integration tests for the voting search ensemble.
//!
//! Verifies correctness (legal moves, mate detection, terminal handling)
//! and robustness (cancellation, repetition taint) under various searcher
//! counts.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use quorum_core::{RepetitionMap, SearchPosition, uci_string};
use quorum_engine::AsyncSearch;

const SCHOLARS_MATE_FEN: &str =
    "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4";

const SICILIAN_FEN: &str =
    "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2";

const RUY_LOPEZ_FEN: &str =
    "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3";

const STALEMATE_FEN: &str = "k7/2K5/1Q6/8/8/8/8/8 b - - 0 1";

const ONLY_MOVE_FEN: &str = "8/8/8/8/8/1r6/2k5/K7 w - - 0 1";

/// Helper: search `fen` at `depth` with `searchers` ensemble members.
fn search_with(fen: &str, depth: u8, searchers: usize) -> Option<shakmaty::Move> {
    let pos = SearchPosition::from_fen(fen).unwrap();
    let mut repetition = RepetitionMap::new();
    repetition.push(&pos);

    let search = AsyncSearch::with_searchers(16, searchers);
    search.find_best_move(&pos, depth, &repetition)
}

fn assert_legal(fen: &str, mv: shakmaty::Move) {
    let pos = SearchPosition::from_fen(fen).unwrap();
    assert!(
        pos.legal_moves().contains(&mv),
        "{} is not legal in {fen}",
        uci_string(mv)
    );
}

// ── Basic correctness ────────────────────────────────────────────────────────

#[test]
fn single_searcher_returns_legal_opening_move() {
    let pos = SearchPosition::starting();
    let mut repetition = RepetitionMap::new();
    repetition.push(&pos);

    let search = AsyncSearch::with_searchers(16, 1);
    let mv = search
        .find_best_move(&pos, 3, &repetition)
        .expect("startpos is not terminal");
    assert!(pos.legal_moves().contains(&mv));
}

#[test]
fn ensemble_returns_legal_moves_across_positions() {
    for (name, fen) in [
        ("Sicilian Defence", SICILIAN_FEN),
        ("Ruy Lopez", RUY_LOPEZ_FEN),
    ] {
        let mv = search_with(fen, 3, 4)
            .unwrap_or_else(|| panic!("no move returned for {name}"));
        assert_legal(fen, mv);
    }
}

#[test]
fn depth_one_works() {
    let mv = search_with(SICILIAN_FEN, 1, 4).expect("depth 1 must still produce a move");
    assert_legal(SICILIAN_FEN, mv);
}

// ── Mate handling ────────────────────────────────────────────────────────────

#[test]
fn single_searcher_finds_mate_in_one() {
    let mv = search_with(SCHOLARS_MATE_FEN, 2, 1).expect("position is not terminal");
    assert_eq!(uci_string(mv), "h5f7", "should find Qxf7#");
}

#[test]
fn ensemble_finds_mate_in_one() {
    let mv = search_with(SCHOLARS_MATE_FEN, 2, 4).expect("position is not terminal");
    assert_eq!(uci_string(mv), "h5f7", "the mate vote must override material");
}

// ── Terminal positions ───────────────────────────────────────────────────────

#[test]
fn stalemate_returns_none() {
    assert!(search_with(STALEMATE_FEN, 3, 2).is_none());
}

#[test]
fn checkmated_position_returns_none() {
    assert!(search_with("7k/6Q1/5K2/8/8/8/8/8 b - - 0 1", 3, 2).is_none());
}

#[test]
fn forced_move_is_returned() {
    let mv = search_with(ONLY_MOVE_FEN, 4, 4).expect("one legal move exists");
    assert_eq!(uci_string(mv), "a1a2");
}

// ── Repetition ───────────────────────────────────────────────────────────────

#[test]
fn threefold_history_returns_none() {
    let pos = SearchPosition::starting();
    let mut repetition = RepetitionMap::new();
    repetition.push(&pos);
    repetition.push(&pos);
    repetition.push(&pos);

    let search = AsyncSearch::with_searchers(16, 2);
    assert!(
        search.find_best_move(&pos, 3, &repetition).is_none(),
        "a third occurrence is a draw, not a searchable position"
    );
}

// ── Cancellation ─────────────────────────────────────────────────────────────

#[test]
fn cancel_during_search_returns_promptly() {
    let pos = SearchPosition::from_fen(RUY_LOPEZ_FEN).unwrap();
    let mut repetition = RepetitionMap::new();
    repetition.push(&pos);

    let search = Arc::new(AsyncSearch::with_searchers(16, 4));
    let canceller = Arc::clone(&search);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        canceller.cancel();
    });

    let start = Instant::now();
    // Depth 99 cannot complete; only the cancel brings this back.
    let result = search.find_best_move(&pos, 99, &repetition);
    handle.join().unwrap();

    assert!(result.is_none(), "a cancelled search yields no move");
    assert!(
        start.elapsed() < Duration::from_secs(30),
        "cancellation must surface within a bounded delay"
    );
}

#[test]
fn search_is_reusable_after_cancellation() {
    let pos = SearchPosition::starting();
    let mut repetition = RepetitionMap::new();
    repetition.push(&pos);

    let search = Arc::new(AsyncSearch::with_searchers(16, 2));
    let canceller = Arc::clone(&search);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        canceller.cancel();
    });
    let _ = search.find_best_move(&pos, 99, &repetition);
    handle.join().unwrap();

    // The next request clears the stop flag and searches normally.
    let mv = search
        .find_best_move(&pos, 2, &repetition)
        .expect("the ensemble must recover after a cancel");
    assert!(pos.legal_moves().contains(&mv));
}

// ── Table reuse ──────────────────────────────────────────────────────────────

#[test]
fn repeated_searches_stay_legal_with_a_warm_table() {
    let pos = SearchPosition::from_fen(SICILIAN_FEN).unwrap();
    let mut repetition = RepetitionMap::new();
    repetition.push(&pos);

    let search = AsyncSearch::with_searchers(16, 4);
    for round in 0..3 {
        let mv = search
            .find_best_move(&pos, 3, &repetition)
            .unwrap_or_else(|| panic!("round {round} returned no move"));
        assert!(pos.legal_moves().contains(&mv), "round {round} returned an illegal move");
    }
}

#[test]
fn clear_table_resets_between_games() {
    let pos = SearchPosition::starting();
    let mut repetition = RepetitionMap::new();
    repetition.push(&pos);

    let search = AsyncSearch::with_searchers(16, 2);
    let first = search.find_best_move(&pos, 3, &repetition);
    search.clear_table();
    let second = search.find_best_move(&pos, 3, &repetition);
    assert!(first.is_some());
    assert!(second.is_some());
}
