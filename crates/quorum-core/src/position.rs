//! Hash-cached position wrapper.

use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{
    Bitboard, Board, CastlingMode, Chess, Color, EnPassantMode, Move, MoveList, Position, attacks,
};

use crate::packed_move::PackedMove;

/// Errors when building a position from external input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// The FEN string could not be parsed.
    #[error("invalid FEN: {fen}")]
    InvalidFen {
        /// The offending FEN string.
        fen: String,
    },
    /// The FEN parsed but describes an illegal position.
    #[error("illegal position: {fen}")]
    IllegalPosition {
        /// The offending FEN string.
        fen: String,
    },
}

/// The immutable board state at one ply.
///
/// Wraps a [`shakmaty::Chess`] and caches its 64-bit Zobrist hash, which the
/// transposition table and repetition history key on. Child positions are
/// built by value; nothing here is ever mutated in place.
#[derive(Debug, Clone)]
pub struct SearchPosition {
    inner: Chess,
    hash: u64,
}

impl SearchPosition {
    /// The standard starting position.
    pub fn starting() -> SearchPosition {
        SearchPosition::from_inner(Chess::default())
    }

    /// Parse a FEN string into a position.
    pub fn from_fen(fen: &str) -> Result<SearchPosition, PositionError> {
        let parsed: Fen = fen.parse().map_err(|_| PositionError::InvalidFen {
            fen: fen.to_string(),
        })?;
        let inner = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|_| PositionError::IllegalPosition {
                fen: fen.to_string(),
            })?;
        Ok(SearchPosition::from_inner(inner))
    }

    fn from_inner(inner: Chess) -> SearchPosition {
        let hash = inner.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0;
        SearchPosition { inner, hash }
    }

    /// Stable 64-bit Zobrist hash of this position.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Side to move.
    pub fn turn(&self) -> Color {
        self.inner.turn()
    }

    /// `true` when White is to move (White maximises in the search).
    pub fn is_white(&self) -> bool {
        self.inner.turn() == Color::White
    }

    /// All legal moves in this position.
    pub fn legal_moves(&self) -> MoveList {
        self.inner.legal_moves()
    }

    /// Whether the side to move is in check.
    pub fn is_check(&self) -> bool {
        self.inner.is_check()
    }

    /// The underlying piece placement.
    pub fn board(&self) -> &Board {
        self.inner.board()
    }

    /// Child position after playing `mv`, which must be legal here.
    pub fn child(&self, mv: Move) -> SearchPosition {
        let mut inner = self.inner.clone();
        inner.play_unchecked(mv);
        SearchPosition::from_inner(inner)
    }

    /// Parse a UCI move string ("e2e4", "e7e8q") against this position.
    pub fn parse_uci_move(&self, s: &str) -> Option<Move> {
        let uci: UciMove = s.parse().ok()?;
        uci.to_move(&self.inner).ok()
    }

    /// Resolve a packed move back to a legal move of this position.
    ///
    /// Returns `None` when no legal move matches: the normal outcome when a
    /// table entry written for a colliding hash is probed here.
    pub fn find_move(&self, packed: PackedMove) -> Option<Move> {
        self.legal_moves()
            .into_iter()
            .find(|mv| PackedMove::from(mv) == packed)
    }

    /// Union of the destination squares reachable by every enemy piece.
    ///
    /// Seeds the move-ordering threat scan: our pieces inside this set are
    /// under attack.
    pub fn enemy_attacks(&self) -> Bitboard {
        let board = self.board();
        let occupied = board.occupied();
        let mut dest = Bitboard::EMPTY;
        for sq in board.by_color(!self.turn()) {
            let piece = board.piece_at(sq).expect("square from by_color is occupied");
            dest |= attacks::attacks(sq, piece, occupied);
        }
        dest
    }
}

/// UCI text for a move ("e2e4", "e7e8q").
pub fn uci_string(mv: Move) -> String {
    mv.to_uci(CastlingMode::Standard).to_string()
}
