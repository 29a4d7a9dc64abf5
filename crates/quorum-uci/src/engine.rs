//! The UCI front-end loop.

use std::io::{self, BufRead};

use tracing::{debug, info, warn};

use crate::command::{Command, parse_command};
use crate::error::UciError;
use crate::search_thread::SearchThread;

/// Depth used when the binary is started without an explicit depth.
pub const DEFAULT_DEPTH: u8 = 8;

/// Run the UCI loop: read commands from stdin until `quit` or the stream
/// closes, dispatching to a [`SearchThread`].
///
/// Handshake replies go straight to stdout; `bestmove` lines are printed by
/// the search thread itself when a calculation completes.
pub fn run_uci(default_depth: u8) -> Result<(), UciError> {
    let thread = SearchThread::new(default_depth);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!(cmd = %line, "received UCI command");

        match parse_command(line) {
            Ok(Command::Uci) => {
                println!("id name quorum");
                println!("id author the quorum authors");
                println!("uciok");
            }
            Ok(Command::IsReady) => println!("readyok"),
            Ok(Command::UciNewGame) => thread.new_game(),
            Ok(Command::Position { pos, repetition }) => {
                thread.set_position(pos, repetition);
            }
            Ok(Command::Go { depth }) => thread.go(depth),
            Ok(Command::Stop) => thread.stop(),
            Ok(Command::Quit) => break,
            Ok(Command::Unknown(cmd)) => debug!(cmd = %cmd, "ignoring unknown command"),
            Err(error) => warn!(error = %error, "UCI parse error"),
        }
    }

    info!("quorum shutting down");
    Ok(())
}
