//! The UCI shell: a thin state machine between standard input and the
//! engine core. Parse errors are reported as `info string` lines and the
//! offending command is discarded with the position unchanged.

pub mod options;
pub mod output;
pub mod parser;

use std::io::{self, BufRead};
use std::sync::Arc;

use crate::movegen;
use crate::moves::Move;
use crate::position::{Position, START_FEN};
use crate::search::{SearchLimits, TranspositionTable, WorkerPool};
use crate::uci_println;

use self::options::EngineOptions;
use self::parser::{parse_command, UciCommand};

pub const ENGINE_NAME: &str = concat!("arrocco ", env!("CARGO_PKG_VERSION"));
pub const ENGINE_AUTHOR: &str = "the arrocco developers";

pub struct UciEngine {
    pos: Position,
    pool: WorkerPool,
    tt: Arc<TranspositionTable>,
    options: EngineOptions,
    running: bool,
}

impl Default for UciEngine {
    fn default() -> UciEngine {
        UciEngine::new()
    }
}

impl UciEngine {
    pub fn new() -> UciEngine {
        let options = EngineOptions::default();
        UciEngine {
            pos: Position::startpos(),
            pool: WorkerPool::new(options.threads),
            tt: Arc::new(TranspositionTable::new(options.hash_mb)),
            options,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn handle_line(&mut self, line: &str) {
        log::debug!("received: {line}");
        let cmd = parse_command(line);
        self.handle_command(cmd);
    }

    fn handle_command(&mut self, cmd: UciCommand) {
        match cmd {
            UciCommand::Uci => {
                uci_println!("id name {ENGINE_NAME}");
                uci_println!("id author {ENGINE_AUTHOR}");
                uci_println!(
                    "option name Hash type spin default {} min {} max {}",
                    options::HASH_DEFAULT_MB,
                    options::HASH_MIN_MB,
                    options::HASH_MAX_MB
                );
                uci_println!(
                    "option name Threads type spin default {} min {} max {}",
                    options::THREADS_DEFAULT,
                    options::THREADS_MIN,
                    options::THREADS_MAX
                );
                uci_println!("uciok");
            }
            UciCommand::IsReady => {
                self.pool.wait_until_idle();
                uci_println!("readyok");
            }
            UciCommand::NewGame => {
                self.pool.wait_until_idle();
                self.pos = Position::startpos();
            }
            UciCommand::Position { fen, moves } => self.set_position(fen, moves),
            UciCommand::Go { perft } => match perft {
                Some(depth) if depth > 0 => {
                    self.pool.go(&self.pos, SearchLimits { perft: depth });
                }
                _ => uci_println!("info string only 'go perft <depth>' is supported"),
            },
            UciCommand::Stop => self.pool.stop(),
            UciCommand::Bench => self.bench(),
            UciCommand::SetOption { name, value } => self.set_option(&name, value.as_deref()),
            UciCommand::Quit => {
                self.pool.stop();
                self.pool.wait_until_idle();
                self.running = false;
            }
            UciCommand::Unknown(line) => {
                if !line.is_empty() {
                    log::warn!("unknown command: {line}");
                    uci_println!("info string unknown command: {line}");
                }
            }
        }
    }

    /// Builds the requested position on the side, so an invalid FEN or an
    /// illegal move in the list leaves the current position untouched.
    fn set_position(&mut self, fen: Option<String>, moves: Vec<String>) {
        let fen = fen.unwrap_or_else(|| START_FEN.to_string());
        let mut pos = match Position::from_fen(&fen) {
            Ok(pos) => pos,
            Err(err) => {
                log::warn!("rejected position command: {err}");
                uci_println!("info string {err}");
                return;
            }
        };
        for uci in &moves {
            match find_move(&mut pos, uci) {
                Some(mov) => pos.make_move(mov),
                None => {
                    log::warn!("rejected position command: illegal move {uci}");
                    uci_println!("info string illegal move: {uci}");
                    return;
                }
            }
        }
        self.pool.wait_until_idle();
        self.pos = pos;
    }

    fn set_option(&mut self, name: &str, value: Option<&str>) {
        let Some(value) = value else {
            uci_println!("info string option {name} needs a value");
            return;
        };
        match name {
            "Hash" => match options::parse_hash_mb(value) {
                Ok(mb) => {
                    if mb != self.options.hash_mb {
                        // The table may only be replaced while no worker can
                        // touch it.
                        self.pool.wait_until_idle();
                        self.tt = Arc::new(TranspositionTable::new(mb));
                        self.options.hash_mb = mb;
                    }
                    log::info!("Hash set to {mb} MB ({} slots)", self.tt.capacity());
                }
                Err(err) => uci_println!("info string {err}"),
            },
            "Threads" => match options::parse_threads(value) {
                Ok(threads) => {
                    if threads != self.options.threads {
                        self.pool.wait_until_idle();
                        self.pool = WorkerPool::new(threads);
                        self.options.threads = threads;
                    }
                    log::info!("Threads set to {threads}");
                }
                Err(err) => uci_println!("info string {err}"),
            },
            _ => uci_println!("info string unknown option: {name}"),
        }
    }

    /// The fixed benchmark script: perft on the start position and on the
    /// castling/promotion-heavy middlegame position.
    pub fn bench(&mut self) {
        self.handle_line("position startpos");
        self.handle_line("go perft 4");
        self.pool.wait_until_idle();
        self.handle_line(
            "position fen r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        );
        self.handle_line("go perft 5");
        self.pool.wait_until_idle();
    }

    /// Reads commands from standard input until `quit` or EOF.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut line = String::new();
        while self.running {
            line.clear();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            self.handle_line(trimmed);
        }
        Ok(())
    }
}

/// Resolves a UCI move string against the legal moves of `pos`.
pub fn find_move(pos: &mut Position, uci: &str) -> Option<Move> {
    movegen::generate_legal(pos)
        .into_iter()
        .find(|mov| mov.as_uci() == uci)
}
