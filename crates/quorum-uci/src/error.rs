//! UCI protocol errors.

/// Errors that can occur while handling UCI input.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// The `position` command carried neither `startpos` nor `fen`.
    #[error("malformed position command: expected startpos or fen")]
    MalformedPosition,

    /// The `position fen` payload did not describe a legal position.
    #[error("unusable FEN: {fen}")]
    BadFen {
        /// The FEN string as received.
        fen: String,
    },

    /// A move in the `position ... moves` list was not legal at its turn.
    #[error("illegal move in position command: {uci_move}")]
    IllegalMove {
        /// The offending move string.
        uci_move: String,
    },

    /// The `go depth` value was missing or not a number in 1..=255.
    #[error("invalid go depth: {value}")]
    InvalidDepth {
        /// The offending value, or "" when the value was missing.
        value: String,
    },

    /// Reading from stdin failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
