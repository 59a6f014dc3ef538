//! Console progress for `compare`.

use std::io::Write;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use utxolink_core::{OutPoint, RoundStats, SearchObserver, SearchSummary};

fn stop_line(hops: u64, matches: usize) -> String {
    format!("stopped after {hops} hops: {matches} match(es) found")
}

/// Completed hops and matches so far, readable from outside the search task.
#[derive(Debug, Default)]
pub struct Progress {
    hops_completed: AtomicU64,
    matches: AtomicUsize,
}

impl Progress {
    /// The final line as of the last completed hop.
    pub fn stop_line(&self) -> String {
        stop_line(
            self.hops_completed.load(Ordering::Relaxed),
            self.matches.load(Ordering::Relaxed),
        )
    }
}

/// Prints one line per search event to `out`.
pub struct ConsoleReporter<W: Write> {
    out: W,
    progress: Arc<Progress>,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            progress: Arc::default(),
        }
    }

    pub fn progress(&self) -> Arc<Progress> {
        Arc::clone(&self.progress)
    }

    /// Final line after the search was interrupted.
    pub fn finish(&mut self, summary: &SearchSummary) {
        let line = stop_line(summary.hops_completed, summary.matches.len());
        self.emit(format_args!("{line}"));
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    // A broken stdout must not stop the search; the event is still logged.
    fn emit(&mut self, line: std::fmt::Arguments<'_>) {
        if let Err(err) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %err, line = %line, "failed to write progress");
        }
    }
}

impl<W: Write> SearchObserver for ConsoleReporter<W> {
    fn on_round_begin(&mut self, hop: u64) {
        self.emit(format_args!("beginning hop {hop}"));
    }

    fn on_found(&mut self, outpoint: &OutPoint, hop: u64) {
        self.progress.matches.fetch_add(1, Ordering::Relaxed);
        self.emit(format_args!("found {outpoint} at hop {hop}"));
    }

    fn on_round_end(&mut self, round: &RoundStats) {
        self.progress
            .hops_completed
            .store(round.hop + 1, Ordering::Relaxed);
        self.emit(format_args!(
            "hop {}: processed={}, new={}",
            round.hop, round.processed, round.new_in_round
        ));
        if round.new_in_round == 0 {
            self.emit(format_args!("hop {}: nothing found", round.hop));
        }
    }
}
