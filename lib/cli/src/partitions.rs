//! Device names from the kernel's partition table.

use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use anyhow::Context;
use biopattern_counters::DeviceId;

/// Where the kernel publishes its partition table.
pub const PROC_PARTITIONS: &str = "/proc/partitions";

/// The name shown for devices missing from the table.
pub const UNKNOWN: &str = "Unknown";

/// Maps device identifiers to names such as `sda` or `nvme0n1p1`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Partitions {
    names: HashMap<DeviceId, String>,
}

impl Partitions {
    /// Read the table at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Unable to open \"{}\"", path.display()))?;
        Partitions::from_reader(file)
            .with_context(|| format!("Unable to read \"{}\"", path.display()))
    }

    /// Parse a table in the `/proc/partitions` format.
    ///
    /// The first two lines are a header and a blank line. Every other line
    /// holds `major minor #blocks name`; malformed lines are skipped.
    pub fn from_reader(reader: impl Read) -> Result<Self, std::io::Error> {
        let mut names = HashMap::new();

        for line in BufReader::new(reader).lines().skip(2) {
            let line = line?;
            let mut columns = line.split_whitespace();
            let (Some(major), Some(minor), Some(_blocks), Some(name)) = (
                columns.next(),
                columns.next(),
                columns.next(),
                columns.next(),
            ) else {
                continue;
            };
            let (Ok(major), Ok(minor)) = (major.parse(), minor.parse()) else {
                tracing::trace!(%line, "skipping malformed partition entry");
                continue;
            };

            names.insert(DeviceId::new(major, minor), name.to_string());
        }

        Ok(Partitions { names })
    }

    /// The name of `dev`, or [`UNKNOWN`].
    pub fn name(&self, dev: DeviceId) -> &str {
        self.names.get(&dev).map(String::as_str).unwrap_or(UNKNOWN)
    }

    /// Number of known devices.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no device is known.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
