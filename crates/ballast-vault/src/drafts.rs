// crates/ballast-vault/src/drafts.rs
//
// Era-versioned draft queues: pending withdrawals with cumulative amounts
// and release timestamps.
//
// Each (era, account) pair owns an append-only sequence of entries. An
// entry stores the cumulative draft units up to and including itself, so
// "how much is redeemable as of now" is a binary search over the
// monotonic `available_at` field plus one subtraction — O(log n), never a
// scan. Entries are never removed: withdrawal advances a cursor past a
// prefix, and cancellation zeroes a single entry's delta by re-basing the
// suffix.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use ballast_core::AccountId;

use crate::pool::DraftPool;

/// One pending withdrawal record.
///
/// Invariants within a queue: `cumulative` is non-decreasing and
/// `available_at` is non-decreasing (enforced at append time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEntry {
    /// Draft units in this entry plus every earlier entry.
    pub cumulative: u128,
    /// Host timestamp at which this entry becomes withdrawable.
    pub available_at: u64,
}

/// An account's draft queue within one era.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftQueue {
    entries: Vec<DraftEntry>,
    /// Index of the oldest entry not yet withdrawn.
    cursor: usize,
}

impl DraftQueue {
    /// Total number of entries ever appended (withdrawn or not).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries have ever been appended.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the oldest entry not yet withdrawn.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The stored entries (for inspection).
    pub fn entries(&self) -> &[DraftEntry] {
        &self.entries
    }

    /// Cumulative draft units over the whole queue.
    pub fn last_cumulative(&self) -> u128 {
        self.entries.last().map(|e| e.cumulative).unwrap_or(0)
    }

    /// Release timestamp of the newest entry, if any.
    pub fn last_available_at(&self) -> Option<u64> {
        self.entries.last().map(|e| e.available_at)
    }

    /// Append an entry with a precomputed cumulative total. Returns the new
    /// entry's index.
    pub fn append(&mut self, cumulative: u128, available_at: u64) -> usize {
        debug_assert!(cumulative >= self.last_cumulative());
        debug_assert!(available_at >= self.last_available_at().unwrap_or(0));
        self.entries.push(DraftEntry {
            cumulative,
            available_at,
        });
        self.entries.len() - 1
    }

    /// The largest prefix end-index whose entries are all available at
    /// `now`. Binary search over the monotonic `available_at` field.
    pub fn end_id_available(&self, now: u64) -> usize {
        self.entries.partition_point(|e| e.available_at <= now)
    }

    /// Draft units covered by the half-open index range `[start, end)`.
    /// Caller guarantees `start < end <= len`.
    pub fn units_between(&self, start: usize, end: usize) -> u128 {
        let upper = self.entries[end - 1].cumulative;
        let lower = if start == 0 {
            0
        } else {
            self.entries[start - 1].cumulative
        };
        upper - lower
    }

    /// Draft units carried by the single entry at `index`.
    pub fn delta_at(&self, index: usize) -> u128 {
        let prev = if index == 0 {
            0
        } else {
            self.entries[index - 1].cumulative
        };
        self.entries[index].cumulative - prev
    }

    /// Advance the cursor to `end` after a withdrawal.
    pub fn advance(&mut self, end: usize) {
        debug_assert!(end >= self.cursor && end <= self.entries.len());
        self.cursor = end;
    }

    /// Remove the single entry at `index` from the queue's totals by
    /// re-basing every later cumulative value. The entry itself stays in
    /// place with a zero delta, so the queue remains append-only and both
    /// monotonic invariants hold. Returns the removed delta.
    pub fn cancel_at(&mut self, index: usize) -> u128 {
        let delta = self.delta_at(index);
        if delta > 0 {
            for entry in &mut self.entries[index..] {
                entry.cumulative -= delta;
            }
        }
        delta
    }
}

/// One era of the draft side: its pool counters and every account's queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftEraState {
    /// Draft units outstanding and their grain backing.
    pub pool: DraftPool,
    queues: HashMap<AccountId, DraftQueue>,
}

impl DraftEraState {
    /// The queue for `account`, if it ever unstaked in this era.
    pub fn queue(&self, account: &AccountId) -> Option<&DraftQueue> {
        self.queues.get(account)
    }

    /// The queue for `account`, created empty on first use.
    pub fn queue_mut(&mut self, account: &AccountId) -> &mut DraftQueue {
        self.queues.entry(*account).or_default()
    }
}
