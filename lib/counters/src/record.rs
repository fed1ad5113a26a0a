use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::{ops::OpSet, SECTOR_SIZE};

/// Index of an operation kind inside a record's tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpSlot {
    /// Reads.
    Read = 0,
    /// Writes.
    Write,
    /// Discards.
    Discard,
    /// Flushes.
    Flush,
    /// Synchronous requests.
    Sync,
}

impl OpSlot {
    /// Number of slots.
    pub const COUNT: usize = 5;

    const ALL: [(OpSlot, OpSet); OpSlot::COUNT] = [
        (OpSlot::Read, OpSet::READ),
        (OpSlot::Write, OpSet::WRITE),
        (OpSlot::Discard, OpSet::DISCARD),
        (OpSlot::Flush, OpSet::FLUSH),
        (OpSlot::Sync, OpSet::SYNC),
    ];

    /// The slots set in `ops`.
    pub fn of(ops: OpSet) -> impl Iterator<Item = OpSlot> {
        OpSlot::ALL
            .into_iter()
            .filter(move |(_, flag)| ops.contains(*flag))
            .map(|(slot, _)| slot)
    }
}

/// Live counters for one device.
///
/// Every field is updated with atomic read-modify-write operations so that
/// completions for the same device can be recorded from several CPUs at once
/// without a lock.
#[derive(Debug, Default)]
pub struct CounterRecord {
    last_sector_end: AtomicU64,
    bytes: AtomicU64,
    sequential: AtomicU32,
    random: AtomicU32,
    ops: [AtomicU32; OpSlot::COUNT],
}

impl CounterRecord {
    /// Record a completed request.
    ///
    /// The first request seen by a record only establishes where the next one
    /// is expected to start. Every later request is classified as sequential
    /// when it starts exactly there and random otherwise.
    pub fn record(&self, sector: u64, nr_sector: u32, ops: OpSet) {
        let end = sector.wrapping_add(u64::from(nr_sector));
        let previous = self.last_sector_end.swap(end, Ordering::AcqRel);
        if previous == 0 {
            return;
        }

        if previous == sector {
            self.sequential.fetch_add(1, Ordering::Relaxed);
        } else {
            self.random.fetch_add(1, Ordering::Relaxed);
        }
        for slot in OpSlot::of(ops) {
            self.ops[slot as usize].fetch_add(1, Ordering::Relaxed);
        }
        self.bytes
            .fetch_add(u64::from(nr_sector) * SECTOR_SIZE, Ordering::Relaxed);
    }

    /// Copy the current values out.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            last_sector_end: self.last_sector_end.load(Ordering::Acquire),
            bytes: self.bytes.load(Ordering::Relaxed),
            sequential: self.sequential.load(Ordering::Relaxed),
            random: self.random.load(Ordering::Relaxed),
            ops: std::array::from_fn(|i| self.ops[i].load(Ordering::Relaxed)),
        }
    }

    /// Consume the record, reading its final values.
    pub fn into_snapshot(self) -> CounterSnapshot {
        CounterSnapshot {
            last_sector_end: self.last_sector_end.into_inner(),
            bytes: self.bytes.into_inner(),
            sequential: self.sequential.into_inner(),
            random: self.random.into_inner(),
            ops: self.ops.map(AtomicU32::into_inner),
        }
    }
}

/// A point-in-time copy of a [`CounterRecord`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// The sector right after the last completed request, `0` if none.
    pub last_sector_end: u64,
    /// Bytes transferred by classified requests.
    pub bytes: u64,
    /// Requests that started where the previous one ended.
    pub sequential: u32,
    /// Requests that did not.
    pub random: u32,
    /// Per-kind tallies, indexed by [`OpSlot`].
    pub ops: [u32; OpSlot::COUNT],
}

impl CounterSnapshot {
    /// Number of classified requests.
    pub fn total(&self) -> u32 {
        self.sequential + self.random
    }

    /// The tally for one operation kind.
    pub fn op(&self, slot: OpSlot) -> u32 {
        self.ops[slot as usize]
    }
}
