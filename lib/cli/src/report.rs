//! The reporting loop: wait, drain, print, repeat.

use std::{
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use biopattern_counters::{CounterTable, DeviceReport, DrainStrategy, Variant};
use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::{partitions::Partitions, source::Signal};

/// How long to wait between reports and how many to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Schedule {
    /// Time between reports; zero reports back to back. `None` waits for a
    /// [`Signal`] and reports once.
    pub interval: Option<Duration>,
    /// Number of reports before exiting. `None` runs until interrupted.
    pub count: Option<u64>,
}

/// Where the loop is in its cycle.
#[derive(Debug)]
enum State {
    Waiting,
    Draining,
    Reporting(biopattern_counters::drain::Drained),
}

/// Periodically drains a [`CounterTable`] and prints one line per active
/// device.
#[derive(Debug)]
pub struct Reporter<W> {
    table: Arc<CounterTable>,
    strategy: Box<dyn DrainStrategy>,
    partitions: Partitions,
    variant: Variant,
    schedule: Schedule,
    signals: Receiver<Signal>,
    clock: fn() -> String,
    out: W,
}

fn local_time() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

impl<W: Write> Reporter<W> {
    /// Create a reporter that prints to `out`.
    pub fn new(
        table: Arc<CounterTable>,
        strategy: Box<dyn DrainStrategy>,
        variant: Variant,
        signals: Receiver<Signal>,
        out: W,
    ) -> Self {
        Reporter {
            table,
            strategy,
            partitions: Partitions::default(),
            variant,
            schedule: Schedule::default(),
            signals,
            clock: local_time,
            out,
        }
    }

    /// Set the names devices are shown with.
    pub fn with_partitions(self, partitions: Partitions) -> Self {
        Reporter { partitions, ..self }
    }

    /// Set the interval and repeat count.
    pub fn with_schedule(self, schedule: Schedule) -> Self {
        Reporter { schedule, ..self }
    }

    /// Replace the wall clock used for the `TIME` column.
    pub fn with_clock(self, clock: fn() -> String) -> Self {
        Reporter { clock, ..self }
    }

    /// Run until the repeat count is used up or a [`Signal`] arrives, and
    /// hand the output back.
    ///
    /// A signal never cuts an interval short without reporting it: the loop
    /// drains and prints once more before returning.
    pub fn run(mut self) -> io::Result<W> {
        write_header(&mut self.out, self.variant)?;
        self.out.flush()?;

        let mut remaining = self.schedule.count;
        let mut exiting = false;
        let mut state = State::Waiting;

        loop {
            state = match state {
                State::Waiting => {
                    if self.wait() {
                        exiting = true;
                    }
                    State::Draining
                }
                State::Draining => State::Reporting(self.strategy.drain(&self.table)),
                State::Reporting(drained) => {
                    self.report(drained)?;

                    remaining = remaining.map(|n| n.saturating_sub(1));
                    if exiting || remaining == Some(0) {
                        return Ok(self.out);
                    }
                    State::Waiting
                }
            };
        }
    }

    /// Sleep for one interval. Returns `true` if the loop should stop after
    /// the next report.
    fn wait(&self) -> bool {
        let signal = match self.schedule.interval {
            Some(interval) => match self.signals.recv_timeout(interval) {
                Ok(signal) => Some(signal),
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => None,
            },
            None => self.signals.recv().ok(),
        };

        tracing::debug!(?signal, "stopping after this interval");
        true
    }

    fn report(&mut self, drained: biopattern_counters::drain::Drained) -> io::Result<()> {
        let time = (self.clock)();
        let mut active = 0;

        for (dev, snapshot) in &drained {
            let Some(report) = DeviceReport::from_snapshot(snapshot, self.variant) else {
                continue;
            };
            write_line(
                &mut self.out,
                &time,
                self.partitions.name(*dev),
                &report,
                self.variant,
            )?;
            active += 1;
        }
        self.out.flush()?;

        tracing::debug!(
            drained = drained.len(),
            active,
            dropped = self.table.dropped(),
            "interval reported"
        );
        Ok(())
    }
}

/// Print the column headings.
pub fn write_header(out: &mut impl Write, variant: Variant) -> io::Result<()> {
    write!(out, "{:<9} {:<7} {:>5} {:>5}", "TIME", "DISK", "%RND", "%SEQ")?;
    for heading in variant.headings() {
        write!(out, " {heading:>width$}", width = heading.len() + 1)?;
    }
    writeln!(out, " {:>8} {:>10}", "COUNT", "KBYTES")
}

/// Print one device's figures.
pub fn write_line(
    out: &mut impl Write,
    time: &str,
    name: &str,
    report: &DeviceReport,
    variant: Variant,
) -> io::Result<()> {
    write!(
        out,
        "{:<9} {:<7} {:>5} {:>5}",
        time, name, report.random_pct, report.sequential_pct
    )?;
    for (heading, value) in variant.headings().iter().zip(report.ops.values()) {
        write!(out, " {value:>width$}", width = heading.len() + 1)?;
    }
    writeln!(out, " {:>8} {:>10}", report.count, report.kbytes)
}
