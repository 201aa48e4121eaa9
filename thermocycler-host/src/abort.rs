//! Operator abort from the console
//!
//! A background thread reads stdin; typing `q`, `quit` or `abort`
//! followed by Enter raises the cancel flag the sequencer polls.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Check if a console line requests an abort
pub fn is_abort_command(line: &str) -> bool {
    matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "q" | "quit" | "abort"
    )
}

/// Raise `cancel` when an abort command appears on `input`
///
/// Returns when the command is seen or the input ends.
pub fn watch<R: BufRead>(input: R, cancel: &AtomicBool) {
    for line in input.lines() {
        let Ok(line) = line else {
            break;
        };
        if is_abort_command(&line) {
            log::warn!("Abort requested, stopping after the current read");
            cancel.store(true, Ordering::Release);
            break;
        }
    }
}

/// Spawn the stdin watcher
///
/// The thread is detached in practice: it ends with the process.
pub fn spawn_watcher(cancel: Arc<AtomicBool>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("abort-watcher".to_string())
        .spawn(move || watch(io::stdin().lock(), &cancel))
}
