//! Differential perft: runs our move generator and shakmaty's side by side
//! on the same position and reports node counts and throughput.

use clap::Parser;

use arrocco::position::{Position, START_FEN};
use arrocco::search::perft;
use shakmaty::fen::Fen;
use shakmaty::{Chess, Position as _};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = String::from(START_FEN))]
    fen: String,
    #[arg(short, long, default_value_t = 5)]
    depth: u32,
}

fn perft_shakmaty(pos: &Chess, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut nodes = 0;
    for m in pos.legal_moves() {
        let mut next = pos.clone();
        next.play_unchecked(&m);
        nodes += perft_shakmaty(&next, depth - 1);
    }
    nodes
}

fn main() {
    env_logger::init();
    arrocco::init();
    let args = Args::parse();

    println!("perft on '{}' at depth {}", args.fen, args.depth);

    let fen: Fen = args.fen.parse().expect("FEN should parse");
    let oracle: Chess = fen
        .into_position(shakmaty::CastlingMode::Standard)
        .expect("position should be playable");
    let start = std::time::Instant::now();
    let oracle_nodes = perft_shakmaty(&oracle, args.depth);
    let oracle_time = start.elapsed();

    let mut pos = Position::from_fen(&args.fen).expect("FEN should parse");
    let start = std::time::Instant::now();
    let our_nodes = perft(&mut pos, args.depth);
    let our_time = start.elapsed();

    println!(
        "shakmaty: {} nodes in {} ms ({:.2} Mnps)",
        oracle_nodes,
        oracle_time.as_millis(),
        oracle_nodes as f64 / oracle_time.as_micros() as f64
    );
    println!(
        "arrocco:  {} nodes in {} ms ({:.2} Mnps)",
        our_nodes,
        our_time.as_millis(),
        our_nodes as f64 / our_time.as_micros() as f64
    );
    if our_nodes == oracle_nodes {
        println!("counts match");
    } else {
        println!(
            "MISMATCH: difference = {}",
            our_nodes as i64 - oracle_nodes as i64
        );
        std::process::exit(1);
    }
}
