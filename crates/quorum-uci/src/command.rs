//! UCI command parsing.

use quorum_core::{RepetitionMap, SearchPosition};

use crate::error::UciError;

/// A parsed UCI command.
#[derive(Debug)]
pub enum Command {
    /// `uci` -- identify the engine.
    Uci,
    /// `isready` -- synchronisation ping.
    IsReady,
    /// `ucinewgame` -- forget learned state.
    UciNewGame,
    /// `position` -- the position to think about, with the repetition
    /// history of every position traversed to reach it.
    Position {
        /// The resulting position.
        pos: SearchPosition,
        /// Occurrence counts for the whole move sequence, `pos` included.
        repetition: RepetitionMap,
    },
    /// `go [depth n]` -- start calculating.
    Go {
        /// Requested depth; `None` keeps the configured default.
        depth: Option<u8>,
    },
    /// `stop` -- cancel the current search.
    Stop,
    /// `quit` -- exit.
    Quit,
    /// Anything else (ignored per UCI convention).
    Unknown(String),
}

/// Parse one line of UCI input.
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&first) = tokens.first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match first {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "position" => parse_position(&tokens[1..]),
        "go" => parse_go(&tokens[1..]),
        other => Ok(Command::Unknown(other.to_string())),
    }
}

/// Parse `position startpos|fen <fen> [moves ...]`, replaying the move list
/// to build both the final position and its repetition history.
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    let (mut pos, rest) = match tokens.first() {
        Some(&"startpos") => (SearchPosition::starting(), &tokens[1..]),
        Some(&"fen") => {
            // a FEN is 6 space-separated fields
            if tokens.len() < 7 {
                return Err(UciError::BadFen {
                    fen: tokens[1..].join(" "),
                });
            }
            let fen = tokens[1..7].join(" ");
            let pos = SearchPosition::from_fen(&fen)
                .map_err(|_| UciError::BadFen { fen })?;
            (pos, &tokens[7..])
        }
        _ => return Err(UciError::MalformedPosition),
    };

    let mut repetition = RepetitionMap::new();
    repetition.push(&pos);

    if let Some(&"moves") = rest.first() {
        for uci in &rest[1..] {
            let mv = pos
                .parse_uci_move(uci)
                .ok_or_else(|| UciError::IllegalMove {
                    uci_move: uci.to_string(),
                })?;
            pos = pos.child(mv);
            repetition.push(&pos);
        }
    }

    Ok(Command::Position { pos, repetition })
}

/// Parse `go [depth n]`. Unknown tokens are skipped per UCI convention;
/// time-control tokens are among them -- this engine searches by depth only.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut depth = None;

    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] == "depth" {
            let value = tokens.get(i + 1).ok_or_else(|| UciError::InvalidDepth {
                value: String::new(),
            })?;
            let parsed: u8 = value.parse().map_err(|_| UciError::InvalidDepth {
                value: value.to_string(),
            })?;
            if parsed == 0 {
                return Err(UciError::InvalidDepth {
                    value: value.to_string(),
                });
            }
            depth = Some(parsed);
            i += 2;
        } else {
            i += 1;
        }
    }

    Ok(Command::Go { depth })
}
