use std::{fmt::Debug, ops::Deref, str::FromStr};

use crate::{device::DeviceId, record::CounterSnapshot, table::CounterTable};

/// Records removed from a table, ordered by device.
pub type Drained = Vec<(DeviceId, CounterSnapshot)>;

/// Empties a [`CounterTable`] and hands back what it contained.
///
/// ## Assumptions
///
/// Exactly one caller drains a given table at a time, while any number of
/// classifier contexts may keep recording into it. Implementations differ in
/// what happens to updates racing with the drain: see [`BatchDrain`] and
/// [`SnapshotDrain`].
///
/// [`BatchDrain`]: crate::drain::BatchDrain
/// [`SnapshotDrain`]: crate::drain::SnapshotDrain
pub trait DrainStrategy: Debug + Send + Sync {
    /// Remove every record from `table`, returning them sorted by device.
    fn drain(&self, table: &CounterTable) -> Drained;
}

impl<D, S> DrainStrategy for D
where
    D: Deref<Target = S> + Debug + Send + Sync,
    S: DrainStrategy + ?Sized,
{
    fn drain(&self, table: &CounterTable) -> Drained {
        (**self).drain(table)
    }
}

/// How the reporting loop should drain the table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DrainMode {
    /// Batch when the table supports it, snapshot otherwise.
    #[default]
    Auto,
    /// Always take the whole table atomically.
    Batch,
    /// Always read then clear.
    Snapshot,
}

impl FromStr for DrainMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(DrainMode::Auto),
            "batch" => Ok(DrainMode::Batch),
            "snapshot" => Ok(DrainMode::Snapshot),
            other => Err(format!(
                "unknown drain mode \"{other}\", expected auto, batch or snapshot"
            )),
        }
    }
}

/// Errors from choosing a [`DrainStrategy`].
#[derive(Debug, thiserror::Error)]
pub enum DrainError {
    /// Batch draining was requested but the table can't do it.
    #[error("batch draining was requested but the counter table has no batch operations")]
    BatchUnavailable,
}
