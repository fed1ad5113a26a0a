//! The `biopattern` command line.

use std::{io::Write, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use biopattern_counters::{
    drain, Classifier, CounterTable, DrainMode, TableOptions, Variant, DEFAULT_MAX_ENTRIES,
};
use clap::Parser;

use crate::{
    disk,
    partitions::{Partitions, PROC_PARTITIONS},
    report::{Reporter, Schedule},
    source::{EventSource, ReplaySource, Signal, TracefsSource},
};

/// Command-line arguments for `biopattern`.
#[derive(Parser, Debug)]
#[clap(author, version)]
#[clap(disable_version_flag = true)] // handled manually
#[clap(
    name = "biopattern",
    about = concat!("biopattern ", env!("CARGO_PKG_VERSION")),
)]
pub struct BiopatternCmd {
    /// Print version info and exit.
    #[clap(short = 'V', long)]
    version: bool,
    #[clap(flatten)]
    output: crate::logging::Output,
    /// Only trace this disk (e.g. sdb or nvme0n1p2).
    #[clap(short, long, value_name = "NAME")]
    disk: Option<String>,
    /// Which operation kinds to break requests down by.
    #[clap(long, default_value_t = Variant::Classic, value_name = "classic|sync")]
    variant: Variant,
    /// How to empty the counter table at the end of each interval.
    #[clap(long, default_value = "auto", value_name = "auto|batch|snapshot")]
    drain: DrainMode,
    /// Treat the counter table as lacking atomic batch operations.
    #[clap(long)]
    no_batch_ops: bool,
    /// Maximum number of devices tracked at once.
    #[clap(long, default_value_t = DEFAULT_MAX_ENTRIES, value_name = "N")]
    max_devices: usize,
    /// Read recorded trace_pipe lines instead of tracing the kernel ("-" for
    /// stdin).
    #[clap(long, value_name = "FILE")]
    replay: Option<PathBuf>,
    /// Where tracefs is mounted.
    #[clap(long, env = "BIOPATTERN_TRACEFS", value_name = "DIR")]
    tracefs: Option<PathBuf>,
    /// The partition table used to name devices.
    #[clap(long, env = "BIOPATTERN_PARTITIONS", default_value = PROC_PARTITIONS)]
    partitions: PathBuf,
    /// Where device nodes are looked up.
    #[clap(long, env = "BIOPATTERN_DEV_DIR", default_value = disk::DEFAULT_DEV_DIR, hide = true)]
    dev_dir: PathBuf,
    /// Seconds between reports (0 doesn't wait). Without it, a single report
    /// is printed once interrupted.
    interval: Option<u64>,
    /// Number of reports to print.
    #[clap(value_parser = clap::value_parser!(u64).range(1..))]
    count: Option<u64>,
}

impl BiopatternCmd {
    fn execute(self) -> Result<(), anyhow::Error> {
        self.output.initialize_logging();

        if self.version {
            return print_version(self.output.is_verbose());
        }

        let filter = self
            .disk
            .as_deref()
            .map(|name| disk::resolve(name, &self.dev_dir))
            .transpose()?;

        let partitions = Partitions::load(&self.partitions).unwrap_or_else(|e| {
            tracing::warn!(
                error = &*e as &dyn std::error::Error,
                "unable to load device names, every disk will show as \"{}\"",
                crate::partitions::UNKNOWN
            );
            Partitions::default()
        });

        let table = Arc::new(CounterTable::new(TableOptions {
            max_entries: self.max_devices,
            batch_ops: !self.no_batch_ops,
        }));
        let strategy = drain::select(self.drain, &table)?;
        let classifier = Classifier::new(Arc::clone(&table), self.variant, filter);

        let (signals, wakeup) = crossbeam_channel::unbounded();
        let interrupt = signals.clone();
        ctrlc::set_handler(move || {
            let _ = interrupt.send(Signal::Interrupt);
        })
        .context("Unable to install the Ctrl-C handler")?;

        let source: Box<dyn EventSource> = match (&self.replay, &self.tracefs) {
            (Some(replay), _) => Box::new(ReplaySource::new(replay)),
            (None, Some(root)) => Box::new(TracefsSource::new(root)),
            (None, None) => Box::new(TracefsSource::detect()?),
        };
        tracing::debug!(?source, variant = %self.variant, ?filter, "starting");
        let handle = source.start(classifier, signals)?;

        let schedule = Schedule {
            interval: self.interval.map(Duration::from_secs),
            count: self.count,
        };
        let stdout = std::io::stdout().lock();
        let result = Reporter::new(table, strategy, self.variant, wakeup, stdout)
            .with_partitions(partitions)
            .with_schedule(schedule)
            .run();

        handle.shutdown();
        result.context("Unable to write the report")?.flush()?;
        Ok(())
    }

    /// The main function for the `biopattern` binary.
    pub fn run() -> Result<(), anyhow::Error> {
        match BiopatternCmd::try_parse() {
            Ok(args) => args.execute(),
            Err(e) => e.exit(),
        }
    }
}

fn print_version(verbose: bool) -> Result<(), anyhow::Error> {
    if !verbose {
        println!("biopattern {}", env!("CARGO_PKG_VERSION"));
    } else {
        println!(
            "biopattern {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("BIOPATTERN_BUILD_GIT_HASH_SHORT"),
            env!("BIOPATTERN_BUILD_DATE")
        );
        println!("binary: {}", env!("CARGO_PKG_NAME"));
        println!("commit-hash: {}", env!("BIOPATTERN_BUILD_GIT_HASH"));
        println!("commit-date: {}", env!("BIOPATTERN_BUILD_DATE"));
        println!("host: {}-{}", std::env::consts::ARCH, std::env::consts::OS);
    }
    Ok(())
}
