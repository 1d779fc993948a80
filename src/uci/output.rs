//! Protocol output: every line goes to standard output under one
//! process-wide lock and is flushed immediately, so lines from concurrent
//! search workers and the command loop never interleave.

use std::fmt::Arguments;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

static OUTPUT_LOCK: Mutex<()> = Mutex::new(());

/// Writes one line. Prefer the [`uci_println!`] macro.
///
/// [`uci_println!`]: crate::uci_println
pub fn emit(args: Arguments<'_>) {
    let _guard = OUTPUT_LOCK
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let mut out = io::stdout().lock();
    // A GUI that closed our stdout is about to send quit anyway; swallowing
    // the error beats unwinding out of a search thread.
    let _ = out.write_fmt(args);
    let _ = out.write_all(b"\n");
    let _ = out.flush();
}

/// Writes one flushed protocol line under the process-wide output lock.
#[macro_export]
macro_rules! uci_println {
    ($($arg:tt)*) => {
        $crate::uci::output::emit(format_args!($($arg)*))
    };
}
