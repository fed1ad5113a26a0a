use crate::{
    ops::Variant,
    record::{CounterSnapshot, OpSlot},
};

/// The figures printed for one device at the end of an interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReport {
    /// Share of random requests.
    pub random_pct: i64,
    /// Share of sequential requests, always `100 - random_pct`.
    pub sequential_pct: i64,
    /// Per-kind shares.
    pub ops: OpPercentages,
    /// Number of classified requests.
    pub count: u32,
    /// Kilobytes transferred, truncated.
    pub kbytes: u64,
}

/// Per-kind percentages. The last figure of each group is whatever is left
/// of 100 after the others, so it absorbs every rounding error and may even
/// be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpPercentages {
    /// Figures for [`Variant::Classic`].
    Classic {
        /// `%READ`
        read: i64,
        /// `%WRITE`
        write: i64,
        /// `%DISCARD`
        discard: i64,
        /// `%FLUSH`, the remainder.
        flush: i64,
    },
    /// Figures for [`Variant::Sync`].
    Sync {
        /// `%READ`
        read: i64,
        /// `%WRITE`
        write: i64,
        /// `%OTHER`, the remainder of the read/write group.
        other: i64,
        /// `%SYNC`
        sync: i64,
        /// `%ASYNC`, the remainder of the sync group.
        async_: i64,
    },
}

impl OpPercentages {
    /// The figures in column order, matching [`Variant::headings()`].
    pub fn values(&self) -> Vec<i64> {
        match *self {
            OpPercentages::Classic {
                read,
                write,
                discard,
                flush,
            } => vec![read, write, discard, flush],
            OpPercentages::Sync {
                read,
                write,
                other,
                sync,
                async_,
            } => vec![read, write, other, sync, async_],
        }
    }
}

/// `part * 100 / total` rounded to the nearest integer, ties to even.
///
/// `total` must not be zero.
fn percent(part: u32, total: u32) -> i64 {
    let scaled = u64::from(part) * 100;
    let total = u64::from(total);
    let (quotient, remainder) = (scaled / total, scaled % total);

    let rounded = match (remainder * 2).cmp(&total) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => quotient + (quotient & 1),
    };
    rounded as i64
}

impl DeviceReport {
    /// Compute the report for a drained record, or `None` when no request
    /// was classified during the interval.
    pub fn from_snapshot(snapshot: &CounterSnapshot, variant: Variant) -> Option<Self> {
        let total = snapshot.total();
        if total == 0 {
            return None;
        }

        let random_pct = percent(snapshot.random, total);
        let share = |slot| percent(snapshot.op(slot), total);

        let ops = match variant {
            Variant::Classic => {
                let read = share(OpSlot::Read);
                let write = share(OpSlot::Write);
                let discard = share(OpSlot::Discard);
                OpPercentages::Classic {
                    read,
                    write,
                    discard,
                    flush: 100 - read - write - discard,
                }
            }
            Variant::Sync => {
                let read = share(OpSlot::Read);
                let write = share(OpSlot::Write);
                let sync = share(OpSlot::Sync);
                OpPercentages::Sync {
                    read,
                    write,
                    other: 100 - read - write,
                    sync,
                    async_: 100 - sync,
                }
            }
        };

        Some(DeviceReport {
            random_pct,
            sequential_pct: 100 - random_pct,
            ops,
            count: total,
            kbytes: snapshot.bytes / 1024,
        })
    }
}
