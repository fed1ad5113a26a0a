use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::RwLock;

use crate::{
    device::DeviceId,
    record::{CounterRecord, CounterSnapshot},
};

/// Default capacity of a [`CounterTable`], the same as a kernel hash map
/// created without an explicit size.
pub const DEFAULT_MAX_ENTRIES: usize = 10240;

/// Construction options for a [`CounterTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    /// Maximum number of devices tracked at once.
    pub max_entries: usize,
    /// Whether [`CounterTable::take_all()`] is available.
    pub batch_ops: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            max_entries: DEFAULT_MAX_ENTRIES,
            batch_ops: true,
        }
    }
}

/// Errors returned by [`CounterTable`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// The table was built without batch operations.
    #[error("batch lookup-and-delete is not supported by this table")]
    BatchUnsupported,
}

/// The table of per-device counters shared between the classifier and the
/// reporting loop.
///
/// Records are sharded across a [`DashMap`], so concurrent updates only
/// contend when they hit the same shard, and a record's counters are atomics
/// that are updated under a shared shard guard. The map itself sits behind an
/// epoch lock which every update holds in shared mode. Only
/// [`CounterTable::take_all()`] takes it exclusively, for as long as it takes
/// to swap in an empty map.
#[derive(Debug)]
pub struct CounterTable {
    records: RwLock<DashMap<DeviceId, CounterRecord>>,
    len: AtomicUsize,
    dropped: AtomicU64,
    options: TableOptions,
}

impl Default for CounterTable {
    fn default() -> Self {
        CounterTable::new(TableOptions::default())
    }
}

impl CounterTable {
    /// Create an empty table.
    pub fn new(options: TableOptions) -> Self {
        CounterTable {
            records: RwLock::new(DashMap::new()),
            len: AtomicUsize::new(0),
            dropped: AtomicU64::new(0),
            options,
        }
    }

    /// The options this table was built with.
    pub fn options(&self) -> TableOptions {
        self.options
    }

    /// Whether the table can hand over all of its records atomically.
    pub fn supports_batch_ops(&self) -> bool {
        self.options.batch_ops
    }

    /// Number of devices currently tracked.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Whether no device is currently tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of events turned away because the table was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Run `f` against the record for `dev`, creating a zeroed record first
    /// if the device has not been seen since the last drain.
    ///
    /// Returns `None`, without calling `f`, when a new record would exceed
    /// the table's capacity.
    pub fn lookup_or_try_init<R>(
        &self,
        dev: DeviceId,
        f: impl FnOnce(&CounterRecord) -> R,
    ) -> Option<R> {
        let records = self.records.read();

        if let Some(record) = records.get(&dev) {
            return Some(f(record.value()));
        }

        let record = match records.entry(dev) {
            Entry::Occupied(entry) => entry.into_ref().downgrade(),
            Entry::Vacant(entry) => {
                let max = self.options.max_entries;
                if self
                    .len
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        (n < max).then_some(n + 1)
                    })
                    .is_err()
                {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
                entry.insert(CounterRecord::default()).downgrade()
            }
        };

        Some(f(record.value()))
    }

    /// Atomically remove every record and return their final values.
    ///
    /// An update that finished before this call is always part of the result,
    /// and an update that starts afterwards always lands in the fresh table.
    pub fn take_all(&self) -> Result<Vec<(DeviceId, CounterSnapshot)>, TableError> {
        if !self.options.batch_ops {
            return Err(TableError::BatchUnsupported);
        }

        let taken = {
            let mut records = self.records.write();
            let taken = std::mem::take(&mut *records);
            self.len.store(0, Ordering::Release);
            taken
        };

        Ok(taken
            .into_iter()
            .map(|(dev, record)| (dev, record.into_snapshot()))
            .collect())
    }

    /// Read every record without removing anything.
    ///
    /// Records are read one at a time, so the result is not a consistent
    /// picture of the whole table while updates are still coming in.
    pub fn snapshot(&self) -> Vec<(DeviceId, CounterSnapshot)> {
        self.records
            .read()
            .iter()
            .map(|entry| (*entry.key(), entry.value().snapshot()))
            .collect()
    }

    /// Remove every record.
    pub fn clear(&self) {
        let records = self.records.read();
        records.clear();
        self.len.store(records.len(), Ordering::Release);
    }
}
