use crate::{
    drain::{DrainStrategy, Drained},
    table::CounterTable,
};

/// Takes the whole table in one atomic step.
///
/// Every update that completed before the drain is included and every update
/// that starts after it is left for the next interval; nothing is lost or
/// counted twice.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchDrain;

impl DrainStrategy for BatchDrain {
    fn drain(&self, table: &CounterTable) -> Drained {
        let mut drained = match table.take_all() {
            Ok(drained) => drained,
            Err(e) => {
                // only reachable if the strategy was picked by hand
                tracing::warn!(error = %e, "falling back to a snapshot drain");
                let drained = table.snapshot();
                table.clear();
                drained
            }
        };
        drained.sort_unstable_by_key(|(dev, _)| *dev);
        drained
    }
}
