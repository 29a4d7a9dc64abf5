//! Board, repetition and threat primitives consumed by the quorum search.
//!
//! Move generation, legality and bitboard geometry are delegated to
//! [`shakmaty`]; this crate wraps them in the narrow interfaces the search
//! actually uses: a hash-cached position, a forkable repetition history,
//! attacker/ray computation for move ordering, and a compact move encoding
//! for table entries.

mod packed_move;
mod position;
mod repetition;
mod threats;
mod value;

pub use packed_move::PackedMove;
pub use position::{PositionError, SearchPosition, uci_string};
pub use repetition::RepetitionMap;
pub use threats::{ThreatInfo, calc_attackers};
pub use value::piece_rating;
