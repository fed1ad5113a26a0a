use std::sync::Arc;

use crate::{
    device::DeviceId,
    event::CompletionEvent,
    ops::{decode_rwbs, Variant},
    table::CounterTable,
};

/// Records completion events into a shared [`CounterTable`].
///
/// A classifier is cheap to share between threads; each event source context
/// (typically one per CPU) calls [`Classifier::handle()`] directly.
#[derive(Debug, Clone)]
pub struct Classifier {
    table: Arc<CounterTable>,
    variant: Variant,
    filter: Option<DeviceId>,
}

impl Classifier {
    /// Create a classifier. When `filter` is set, events for every other
    /// device are ignored.
    pub fn new(table: Arc<CounterTable>, variant: Variant, filter: Option<DeviceId>) -> Self {
        Classifier {
            table,
            variant,
            filter,
        }
    }

    /// The table events are recorded into.
    pub fn table(&self) -> &Arc<CounterTable> {
        &self.table
    }

    /// Which operation kinds are tallied.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Record one completion event.
    ///
    /// Returns `false` if the event was filtered out or dropped because the
    /// table has no room for another device.
    pub fn handle(&self, event: &CompletionEvent) -> bool {
        if self.filter.is_some_and(|dev| dev != event.dev) {
            return false;
        }

        let ops = decode_rwbs(event.rwbs(), self.variant);
        self.table
            .lookup_or_try_init(event.dev, |record| {
                record.record(event.sector, event.nr_sector, ops)
            })
            .is_some()
    }
}
