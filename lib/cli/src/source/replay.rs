use std::{
    fs::File,
    io::{BufReader, Read},
    path::PathBuf,
};

use anyhow::Context;
use biopattern_counters::Classifier;
use crossbeam_channel::Sender;

use super::{pump, EventSource, Signal, SourceHandle};

/// Replays trace lines recorded from `trace_pipe`, e.g. with
/// `cat /sys/kernel/tracing/trace_pipe > block.trace`.
///
/// Reaching the end of the recording counts as a request to stop, so the
/// reporting loop prints its final interval and exits.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    input: PathBuf,
}

impl ReplaySource {
    /// Replay the file at `input`, or standard input when it is `-`.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        ReplaySource {
            input: input.into(),
        }
    }

    fn open(&self) -> Result<Box<dyn Read + Send>, anyhow::Error> {
        if self.input.as_os_str() == "-" {
            return Ok(Box::new(std::io::stdin()));
        }
        let file = File::open(&self.input)
            .with_context(|| format!("Unable to open \"{}\"", self.input.display()))?;
        Ok(Box::new(file))
    }
}

impl EventSource for ReplaySource {
    fn start(
        self: Box<Self>,
        classifier: Classifier,
        signals: Sender<Signal>,
    ) -> Result<SourceHandle, anyhow::Error> {
        let input = self.open()?;
        let path = self.input.clone();

        let reader = std::thread::Builder::new()
            .name("biopattern-replay".to_string())
            .spawn(move || {
                match pump(BufReader::new(input), &classifier) {
                    Ok(handled) => tracing::debug!(handled, path = %path.display(), "replay finished"),
                    Err(e) => tracing::warn!(
                        error = &e as &dyn std::error::Error,
                        path = %path.display(),
                        "replay aborted"
                    ),
                }
                let _ = signals.send(Signal::SourceFinished);
            })
            .context("Unable to spawn the replay thread")?;

        Ok(SourceHandle::new(vec![reader], None))
    }
}
