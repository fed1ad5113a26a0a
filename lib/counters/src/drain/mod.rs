//! Ways of emptying a [`CounterTable`] at a reporting boundary.

mod batch;
mod snapshot;
mod types;

pub use self::{
    batch::BatchDrain,
    snapshot::SnapshotDrain,
    types::{DrainError, DrainMode, DrainStrategy, Drained},
};

use crate::table::CounterTable;

/// Pick the [`DrainStrategy`] for `table`.
///
/// [`DrainMode::Auto`] uses [`BatchDrain`] whenever the table supports batch
/// operations and falls back to [`SnapshotDrain`] otherwise. Asking for
/// [`DrainMode::Batch`] on a table without that capability is an error.
pub fn select(
    mode: DrainMode,
    table: &CounterTable,
) -> Result<Box<dyn DrainStrategy>, DrainError> {
    let batch = table.supports_batch_ops();
    let strategy: Box<dyn DrainStrategy> = match mode {
        DrainMode::Auto if batch => Box::new(BatchDrain),
        DrainMode::Auto | DrainMode::Snapshot => Box::new(SnapshotDrain),
        DrainMode::Batch if batch => Box::new(BatchDrain),
        DrainMode::Batch => return Err(DrainError::BatchUnavailable),
    };

    tracing::debug!(?mode, strategy = ?strategy, "selected drain strategy");
    Ok(strategy)
}
