//! Where completion events come from.

mod replay;
mod tracefs;

use std::{fmt::Debug, io::BufRead, thread::JoinHandle};

use biopattern_counters::{Classifier, CompletionEvent, ParseEventError};
use crossbeam_channel::Sender;

pub use self::{
    replay::ReplaySource,
    tracefs::{TracefsSource, TracepointGuard},
};

/// A message that wakes the reporting loop before its interval is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The operator asked to stop.
    Interrupt,
    /// The event source has nothing more to deliver.
    SourceFinished,
}

/// Delivers block I/O completion events to a [`Classifier`].
pub trait EventSource: Debug {
    /// Start delivering events on background threads.
    ///
    /// A source that runs dry sends [`Signal::SourceFinished`] on `signals`.
    fn start(
        self: Box<Self>,
        classifier: Classifier,
        signals: Sender<Signal>,
    ) -> Result<SourceHandle, anyhow::Error>;
}

/// Keeps a running [`EventSource`] alive.
///
/// Dropping the handle releases whatever the source set up (for example the
/// kernel tracepoint it enabled). Reader threads are detached; they may be
/// parked in a blocking read that only returns once more data shows up.
#[derive(Debug)]
pub struct SourceHandle {
    readers: Vec<JoinHandle<()>>,
    tracepoint: Option<TracepointGuard>,
}

impl SourceHandle {
    pub(crate) fn new(readers: Vec<JoinHandle<()>>, tracepoint: Option<TracepointGuard>) -> Self {
        SourceHandle {
            readers,
            tracepoint,
        }
    }

    /// Number of reader threads that are still running.
    pub fn active_readers(&self) -> usize {
        self.readers.iter().filter(|r| !r.is_finished()).count()
    }

    /// Stop tracing and detach the readers.
    pub fn shutdown(mut self) {
        drop(self.tracepoint.take());
        tracing::debug!(active = self.active_readers(), "event source shut down");
    }
}

/// Feed every trace line from `reader` into `classifier`, returning the
/// number of completion events handled.
///
/// Lines are split on raw bytes and decoded lossily, since task names in
/// trace output are arbitrary bytes.
pub(crate) fn pump(mut reader: impl BufRead, classifier: &Classifier) -> std::io::Result<u64> {
    let mut handled = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(handled);
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        match line.parse::<CompletionEvent>() {
            Ok(event) => {
                classifier.handle(&event);
                handled += 1;
            }
            Err(ParseEventError::OtherEvent) => {}
            Err(e) => tracing::trace!(error = %e, %line, "skipping trace line"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use biopattern_counters::Variant;

    use super::*;

    #[test]
    fn pump_skips_noise() {
        let classifier = Classifier::new(Arc::default(), Variant::Classic, None);
        let lines = "\
# tracer: nop
dd-1 [000] 1.0: block_rq_issue: 8,0 R 4096 () 0 + 8 [dd]
dd-1 [000] 1.1: block_rq_complete: 8,0 R () 0 + 8 [0]
dd-1 [000] 1.2: block_rq_complete: 8,0 R () 8 + 8 [0]
dd-1 [000] 1.3: block_rq_complete: 8,0 R () garbage
";

        assert_eq!(pump(lines.as_bytes(), &classifier).unwrap(), 2);
        assert_eq!(classifier.table().snapshot()[0].1.sequential, 1);
    }

    #[test]
    fn invalid_utf8_task_name_does_not_stop_the_pump() {
        let classifier = Classifier::new(Arc::default(), Variant::Classic, None);
        let mut lines = Vec::new();
        lines.extend_from_slice(b"fio-7 [000] 1.0: block_rq_complete: 8,0 W () 0 + 8 [0]\n");
        lines.extend_from_slice(b"\xff\xfe-8 [000] 1.1: block_rq_issue: 8,0 W 4096 () 8 + 8 [\xff\xfe]\n");
        lines.extend_from_slice(b"fio-7 [000] 1.2: block_rq_complete: 8,0 W () 8 + 8 [0]\r\n");
        lines.extend_from_slice(b"\xff\xfe-8 [000] 1.3: block_rq_complete: 8,0 W () 16 + 8 [0]");

        assert_eq!(pump(lines.as_slice(), &classifier).unwrap(), 3);
        let snapshot = classifier.table().snapshot()[0].1;
        assert_eq!((snapshot.sequential, snapshot.random), (2, 0));
    }
}
