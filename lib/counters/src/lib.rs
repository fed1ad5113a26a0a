//! Per-device block I/O access pattern counters.
//!
//! Completion events are fed to a [`Classifier`], which tags each request as
//! sequential or random relative to the previous request on the same device
//! and tallies it in a shared [`CounterTable`]. A reporting loop periodically
//! empties the table through a [`DrainStrategy`] and turns every drained
//! record into a [`DeviceReport`].
//!
//! ```rust
//! use std::sync::Arc;
//! use biopattern_counters::{
//!     drain::{self, DrainMode},
//!     Classifier, CompletionEvent, CounterTable, DeviceId, DeviceReport, Variant,
//! };
//!
//! let table = Arc::new(CounterTable::default());
//! let classifier = Classifier::new(Arc::clone(&table), Variant::Classic, None);
//! let dev = DeviceId::new(8, 0);
//!
//! for sector in [100, 108, 116, 400] {
//!     classifier.handle(&CompletionEvent::new(dev, sector, 8, "R"));
//! }
//!
//! let strategy = drain::select(DrainMode::Auto, &table).unwrap();
//! let (_, snapshot) = strategy.drain(&table).remove(0);
//! let report = DeviceReport::from_snapshot(&snapshot, Variant::Classic).unwrap();
//! assert_eq!(report.count, 3);
//! assert_eq!(report.random_pct, 33);
//! assert_eq!(report.sequential_pct, 67);
//! ```

#![deny(
    missing_docs,
    dead_code,
    nonstandard_style,
    unused_mut,
    unused_variables,
    unused_unsafe,
    unreachable_patterns
)]

mod classifier;
mod device;
pub mod drain;
mod event;
mod metrics;
mod ops;
mod record;
mod table;

pub use crate::{
    classifier::Classifier,
    device::DeviceId,
    drain::{DrainMode, DrainStrategy},
    event::{CompletionEvent, ParseEventError},
    metrics::{DeviceReport, OpPercentages},
    ops::{decode_rwbs, OpSet, Variant, RWBS_LEN},
    record::{CounterRecord, CounterSnapshot, OpSlot},
    table::{CounterTable, TableError, TableOptions, DEFAULT_MAX_ENTRIES},
};

/// Size of one sector as reported by the block layer, in bytes.
pub const SECTOR_SIZE: u64 = 512;
