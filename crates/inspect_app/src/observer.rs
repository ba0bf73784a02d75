use std::io::{self, Write};

use inspect_core::{Accumulator, Progress};
use inspect_engine::RunObserver;

/// Prints one line per checked URL, e.g. `3/40 (7%) done: https://... --> Submitted and indexed`.
pub struct ConsoleProgress<W: Write + Send> {
    out: W,
}

impl ConsoleProgress<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> ConsoleProgress<W> {
    #[cfg(test)]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> RunObserver for ConsoleProgress<W> {
    fn on_progress(&mut self, progress: &Progress) {
        let percent = (progress.fraction() * 100.0).floor() as u32;
        let Progress {
            completed,
            total,
            identifier,
            outcome,
        } = progress;
        // Output errors (closed pipe) must not stop the run.
        let _ = writeln!(
            self.out,
            "{completed}/{total} ({percent}%) done: {identifier} --> {outcome}"
        );
    }

    fn on_checkpoint(&mut self, _accumulator: &Accumulator) {}
}
