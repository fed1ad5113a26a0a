use crate::{
    drain::{DrainStrategy, Drained},
    table::CounterTable,
};

/// Reads every record, then clears the table as a separate step.
///
/// An update landing between the read and the clear is lost. It is never
/// carried over into the next interval.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapshotDrain;

impl DrainStrategy for SnapshotDrain {
    fn drain(&self, table: &CounterTable) -> Drained {
        let mut drained = table.snapshot();
        table.clear();
        drained.sort_unstable_by_key(|(dev, _)| *dev);
        drained
    }
}
