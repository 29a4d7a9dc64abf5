//! quorum: a parallel voting alpha-beta chess engine.

use std::time::Instant;

use anyhow::{Result, bail};
use tracing::info;

use quorum_core::{RepetitionMap, SearchPosition, uci_string};
use quorum_engine::AsyncSearch;
use quorum_uci::{DEFAULT_DEPTH, run_uci};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => {
            info!(depth = DEFAULT_DEPTH, "quorum starting in UCI mode");
            run_uci(DEFAULT_DEPTH)?;
        }
        Some("uci") => {
            let depth = match args.get(1) {
                None => DEFAULT_DEPTH,
                Some(raw) => raw
                    .parse()
                    .map_err(|_| anyhow::anyhow!("could not parse depth argument: {raw}"))?,
            };
            if depth < 1 {
                bail!("depth must be at least 1");
            }
            info!(depth, "quorum starting in UCI mode");
            run_uci(depth)?;
        }
        Some("measure_move_time") => measure_move_time(),
        Some("help") => print_options(),
        Some(other) => {
            eprintln!("invalid command line argument: {other}");
            print_options();
        }
    }

    Ok(())
}

/// Time the ensemble on the starting position at increasing depths.
fn measure_move_time() {
    let search = AsyncSearch::new(64);
    let pos = SearchPosition::starting();
    let mut repetition = RepetitionMap::new();
    repetition.push(&pos);

    for depth in 1..=6 {
        let start = Instant::now();
        let best = search.find_best_move(&pos, depth, &repetition);
        let elapsed = start.elapsed();
        match best {
            Some(mv) => println!("depth {depth}: {} in {elapsed:?}", uci_string(mv)),
            None => println!("depth {depth}: no move in {elapsed:?}"),
        }
    }
}

fn print_options() {
    println!("Options:");
    println!("(none)            - start the engine in UCI mode (default depth = {DEFAULT_DEPTH})");
    println!("uci [depth]       - start the engine in UCI mode with the given depth");
    println!("measure_move_time - time the ensemble on the starting position");
    println!("help              - print this list");
}
