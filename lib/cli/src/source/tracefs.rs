use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context;
use biopattern_counters::Classifier;
use crossbeam_channel::Sender;

use super::{pump, EventSource, Signal, SourceHandle};

/// Candidate tracefs mount points, in order of preference.
pub const TRACEFS_MOUNTS: [&str; 2] = ["/sys/kernel/tracing", "/sys/kernel/debug/tracing"];

const ENABLE: &str = "events/block/block_rq_complete/enable";

/// Traces `block:block_rq_complete` through tracefs, with one reader thread
/// per CPU so that events are handled on as many contexts as the kernel
/// produces them on.
#[derive(Debug, Clone)]
pub struct TracefsSource {
    root: PathBuf,
}

impl TracefsSource {
    /// Use the tracefs mounted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        TracefsSource { root: root.into() }
    }

    /// Find a mounted tracefs.
    pub fn detect() -> Result<Self, anyhow::Error> {
        TRACEFS_MOUNTS
            .iter()
            .map(Path::new)
            .find(|root| root.join(ENABLE).exists())
            .map(TracefsSource::new)
            .with_context(|| {
                format!(
                    "Unable to find the block_rq_complete tracepoint under {}",
                    TRACEFS_MOUNTS.join(" or ")
                )
            })
    }

    /// The per-CPU `trace_pipe` files, ordered by CPU number.
    fn cpu_pipes(&self) -> Result<Vec<(u32, PathBuf)>, anyhow::Error> {
        let per_cpu = self.root.join("per_cpu");
        let entries = std::fs::read_dir(&per_cpu)
            .with_context(|| format!("Unable to list \"{}\"", per_cpu.display()))?;

        let mut pipes = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(cpu) = name
                .to_str()
                .and_then(|name| name.strip_prefix("cpu"))
                .and_then(|cpu| cpu.parse().ok())
            else {
                continue;
            };
            pipes.push((cpu, entry.path().join("trace_pipe")));
        }
        pipes.sort();

        anyhow::ensure!(!pipes.is_empty(), "No CPUs found under \"{}\"", per_cpu.display());
        Ok(pipes)
    }
}

impl EventSource for TracefsSource {
    fn start(
        self: Box<Self>,
        classifier: Classifier,
        signals: Sender<Signal>,
    ) -> Result<SourceHandle, anyhow::Error> {
        let pipes = self
            .cpu_pipes()?
            .into_iter()
            .map(|(cpu, pipe)| {
                File::open(&pipe)
                    .map(|file| (cpu, file))
                    .with_context(|| format!("Unable to open \"{}\"", pipe.display()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let tracepoint = TracepointGuard::enable(self.root.join(ENABLE))?;

        let mut readers = Vec::with_capacity(pipes.len());
        for (cpu, file) in pipes {
            let classifier = classifier.clone();
            let signals = signals.clone();

            let reader = std::thread::Builder::new()
                .name(format!("biopattern-cpu{cpu}"))
                .spawn(move || {
                    let _span = tracing::debug_span!("trace_pipe", cpu).entered();
                    match pump(BufReader::new(file), &classifier) {
                        Ok(handled) => tracing::debug!(handled, "trace pipe closed"),
                        Err(e) => tracing::warn!(
                            error = &e as &dyn std::error::Error,
                            "trace pipe read failed"
                        ),
                    }
                    // a reader only stops when tracing itself broke
                    let _ = signals.send(Signal::SourceFinished);
                })
                .context("Unable to spawn a trace pipe reader")?;
            readers.push(reader);
        }

        tracing::info!(
            root = %self.root.display(),
            cpus = readers.len(),
            "tracing block_rq_complete"
        );
        Ok(SourceHandle::new(readers, Some(tracepoint)))
    }
}

/// Enables a tracepoint for as long as it is alive.
#[derive(Debug)]
pub struct TracepointGuard {
    enable: PathBuf,
}

impl TracepointGuard {
    /// Write `1` to the tracepoint's `enable` file.
    pub fn enable(enable: PathBuf) -> Result<Self, anyhow::Error> {
        std::fs::write(&enable, "1").with_context(|| {
            format!(
                "Unable to enable the tracepoint at \"{}\" (tracing needs root)",
                enable.display()
            )
        })?;
        Ok(TracepointGuard { enable })
    }
}

impl Drop for TracepointGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::write(&self.enable, "0") {
            tracing::warn!(
                path = %self.enable.display(),
                error = &e as &dyn std::error::Error,
                "Unable to disable the tracepoint"
            );
        }
    }
}
