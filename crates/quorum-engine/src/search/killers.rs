//! Killer move bookkeeping.
//!
//! A killer is a non-capturing move that caused a beta cut at some level;
//! sibling subtrees at the same level try it early. Entries are indexed by
//! level (plies from root), not by remaining depth; killers at the same ply
//! stay correlated across iterative-deepening rounds.

use shakmaty::Move;

use crate::search::node::MAX_LEVELS;

/// Killer slots kept per level.
pub const MAX_KILLER_MOVES: usize = 3;

/// Ring of the most recent quiet cutoff moves at one level.
#[derive(Debug, Clone, Default)]
pub struct KillerEntries {
    moves: [Option<Move>; MAX_KILLER_MOVES],
    index: usize,
}

impl KillerEntries {
    /// Record a cutoff move, evicting the oldest entry.
    pub fn insert(&mut self, mv: Move) {
        self.moves[self.index] = Some(mv);
        self.index = if self.index + 1 == MAX_KILLER_MOVES {
            0
        } else {
            self.index + 1
        };
    }

    /// Whether `mv` is one of the remembered killers.
    pub fn contains(&self, mv: Move) -> bool {
        self.moves.iter().flatten().any(|&killer| killer == mv)
    }
}

/// Per-searcher killer table, one ring per level.
#[derive(Debug, Clone)]
pub struct KillerTable {
    levels: [KillerEntries; MAX_LEVELS],
}

impl KillerTable {
    pub fn new() -> KillerTable {
        KillerTable {
            levels: std::array::from_fn(|_| KillerEntries::default()),
        }
    }

    /// Killer ring for a level, `None` beyond the table's reach.
    pub fn at(&self, level: u8) -> Option<&KillerEntries> {
        self.levels.get(usize::from(level))
    }

    pub fn at_mut(&mut self, level: u8) -> Option<&mut KillerEntries> {
        self.levels.get_mut(usize::from(level))
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}
