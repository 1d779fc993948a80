//! UCI entry point for the arrocco chess engine.

use std::io;

use clap::Parser;

use arrocco::uci::UciEngine;

#[derive(Parser, Debug)]
#[command(author, version, about = "Bitboard chess engine core speaking UCI", long_about = None)]
struct Args {
    /// Run the built-in perft benchmark script and exit.
    #[arg(value_parser = ["bench"])]
    command: Option<String>,
}

fn main() -> io::Result<()> {
    env_logger::init();
    arrocco::init();

    let args = Args::parse();
    let mut engine = UciEngine::new();
    if args.command.as_deref() == Some("bench") {
        engine.bench();
        return Ok(());
    }
    engine.run()
}
