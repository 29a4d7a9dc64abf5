//! The long-lived search worker: idle, pondering, or calculating.

use std::io::Write;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, info};

use quorum_core::{RepetitionMap, SearchPosition, uci_string};
use quorum_engine::AsyncSearch;

/// Depth used when thinking on the opponent's time. Effectively unbounded;
/// only cancellation ends a ponder search.
const PONDER_DEPTH: u8 = 255;

/// Transposition table size in megabytes.
const HASH_MB: usize = 64;

/// Position, requested depth, and repetition history for one calculation.
#[derive(Debug, Clone)]
struct GameState {
    pos: SearchPosition,
    depth: u8,
    repetition: RepetitionMap,
}

/// State shared between the worker thread and the command surface.
struct Shared {
    state: GameState,
    should_ponder: bool,
    calculation_requested: bool,
    quit: bool,
}

/// One worker thread wrapped around one [`AsyncSearch`].
///
/// The thread idles until told to ponder or calculate. A calculation prints
/// `bestmove <uci>` to stdout and, unless a new request raced in, starts
/// pondering the expected reply position immediately instead of waiting for
/// the GUI. Every command cancels any in-flight search before updating state
/// and signalling the condition variable; flag changes are re-checked under
/// the mutex after every wait, so a racing `stop` can never corrupt the game
/// state.
pub struct SearchThread {
    search: Arc<AsyncSearch>,
    shared: Arc<(Mutex<Shared>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl SearchThread {
    /// Spawn the worker, initially idle on the starting position.
    pub fn new(default_depth: u8) -> SearchThread {
        let pos = SearchPosition::starting();
        let mut repetition = RepetitionMap::new();
        repetition.push(&pos);

        let search = Arc::new(AsyncSearch::new(HASH_MB));
        let shared = Arc::new((
            Mutex::new(Shared {
                state: GameState {
                    pos,
                    depth: default_depth.max(1),
                    repetition,
                },
                should_ponder: false,
                calculation_requested: false,
                quit: false,
            }),
            Condvar::new(),
        ));

        let worker_search = Arc::clone(&search);
        let worker_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("quorum-search".to_string())
            .spawn(move || run(&worker_search, &worker_shared))
            .expect("failed to spawn search thread");

        SearchThread {
            search,
            shared,
            handle: Some(handle),
        }
    }

    /// Install a new position (and its history), then ponder it.
    pub fn set_position(&self, pos: SearchPosition, repetition: RepetitionMap) {
        {
            let mut shared = self.lock();
            shared.should_ponder = true;
            shared.state.pos = pos;
            shared.state.repetition = repetition;
        }
        self.search.cancel(); // in case we are searching
        self.notify();
    }

    /// Request a calculation, optionally changing the configured depth.
    pub fn go(&self, depth: Option<u8>) {
        {
            let mut shared = self.lock();
            shared.calculation_requested = true;
            shared.should_ponder = false;
            if let Some(depth) = depth {
                shared.state.depth = depth.max(1);
            }
        }
        self.search.cancel();
        self.notify();
    }

    /// Cancel whatever is running and fall back to idle.
    pub fn stop(&self) {
        self.search.cancel(); // internally synchronized
        {
            let mut shared = self.lock();
            shared.should_ponder = false;
        }
        self.notify();
    }

    /// Forget learned state between games.
    pub fn new_game(&self) {
        self.search.clear_table();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.0.lock().expect("search state mutex poisoned")
    }

    fn notify(&self) {
        self.shared.1.notify_one();
    }
}

impl Drop for SearchThread {
    fn drop(&mut self) {
        {
            let mut shared = self.lock();
            shared.quit = true;
            shared.should_ponder = false;
        }
        self.search.cancel(); // in case we are stuck in find_best_move
        self.notify();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Worker loop: alternate between the idle/ponder phase and calculations.
fn run(search: &AsyncSearch, shared: &(Mutex<Shared>, Condvar)) {
    let (mutex, condvar) = shared;

    loop {
        // Idle/ponder until a calculation is requested.
        loop {
            let mut guard = mutex.lock().expect("search state mutex poisoned");
            let state = loop {
                if guard.quit {
                    return;
                }
                if guard.calculation_requested {
                    break None;
                }
                if guard.should_ponder {
                    break Some(guard.state.clone());
                }
                guard = condvar.wait(guard).expect("search state mutex poisoned");
            };
            drop(guard);

            let Some(state) = state else {
                break; // a calculation is pending
            };

            debug!("pondering on the opponent's time");
            if search
                .find_best_move(&state.pos, PONDER_DEPTH, &state.repetition)
                .is_none()
            {
                // Terminal position or a cancel. Stop pondering unless a
                // calculation raced in and wants the state kept.
                let mut guard = mutex.lock().expect("search state mutex poisoned");
                if !guard.calculation_requested {
                    guard.should_ponder = false;
                }
            }
        }

        let state = {
            let mut guard = mutex.lock().expect("search state mutex poisoned");
            if guard.quit {
                return;
            }
            guard.calculation_requested = false;
            guard.state.clone()
        };

        debug!(depth = state.depth, "calculating");
        match search.find_best_move(&state.pos, state.depth, &state.repetition) {
            Some(best) => {
                println!("bestmove {}", uci_string(best));
                let _ = std::io::stdout().flush();

                // Think ahead on the reply position instead of waiting for
                // the GUI, unless it already asked for the next calculation.
                let mut guard = mutex.lock().expect("search state mutex poisoned");
                if !guard.calculation_requested {
                    let child = state.pos.child(best);
                    guard.state.repetition = state.repetition.clone();
                    guard.state.repetition.push(&child);
                    guard.state.pos = child;
                    guard.should_ponder = true;
                }
            }
            None => {
                // Cancelled, or the GUI sent a position with no legal moves.
                info!("no move available");
                let mut guard = mutex.lock().expect("search state mutex poisoned");
                if !guard.calculation_requested {
                    guard.should_ponder = false;
                }
            }
        }
    }
}
