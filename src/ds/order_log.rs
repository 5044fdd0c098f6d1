//! Insertion-order log with a lazily advanced head and periodic compaction.
//!
//! Records keys in the order they were first inserted so an owning cache can
//! evict oldest-first. Removing a key from the owner does **not** touch the
//! log: the slot simply goes stale and is skipped when the head reaches it.
//! Slots behind the head are cleared (`None`) but stay in the vector until
//! [`maybe_compact`](OrderLog::maybe_compact) shifts the live tail forward.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           OrderLog<K> Layout                            │
//! │                                                                         │
//! │   slots: Vec<Option<K>>                                                 │
//! │                                                                         │
//! │     0      1      2      3      4      5      6      7                  │
//! │   ┌──────┬──────┬──────┬──────┬──────┬──────┬──────┬──────┐             │
//! │   │ None │ None │ None │ (a,3)│ (a,4)│ (b,1)│ (a,6)│ (b,2)│             │
//! │   └──────┴──────┴──────┴──────┴──────┴──────┴──────┴──────┘             │
//! │    ◄──── dead prefix ────► ▲                                            │
//! │                            head = 3                                     │
//! │                                                                         │
//! │   pending() = len() - head = 5   (live or stale, owner decides)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//!
//! Pop Flow
//! ────────
//!   pop_front():
//!     slot = slots[head].take()   (drop the reference)
//!     head += 1
//!     return slot
//!
//! Compaction
//! ──────────
//!   maybe_compact():
//!     if head > 0 && head >= len / 2:
//!       slots.drain(..head)       (live tail moves to the front)
//!       head = 0
//! ```
//!
//! ## Operations
//!
//! | Operation       | Description                               | Complexity   |
//! |-----------------|-------------------------------------------|--------------|
//! | `push`          | Append key at the tail                    | Amortized O(1) |
//! | `pop_front`     | Take key at head, advance head            | O(1)         |
//! | `maybe_compact` | Drop dead prefix when it is half the log  | Amortized O(1) |
//! | `retain_pending` | Filter pending keys, drop dead prefix   | O(n)         |
//! | `iter_pending`  | Walk slots from head to tail              | O(n)         |
//!
//! Compacting only once the dead prefix reaches half of the vector means each
//! moved slot is paid for by at least one earlier `pop_front`.
//!
//! ## Thread Safety
//!
//! `OrderLog` is not thread-safe. It is owned by
//! [`GroupedFifoCore`](crate::policy::grouped_fifo::GroupedFifoCore), which is
//! in turn guarded by a single `RwLock`.
//!
//! ## Example Usage
//!
//! ```
//! use cappedcache::ds::OrderLog;
//!
//! let mut log = OrderLog::new();
//! log.push(("general", 1));
//! log.push(("general", 2));
//! log.push(("random", 7));
//!
//! assert_eq!(log.pop_front(), Some(("general", 1)));
//! assert_eq!(log.head(), 1);
//!
//! // Dead prefix (1 slot) is at least half of 3 / 2 = 1 slot: compact.
//! assert_eq!(log.maybe_compact(), 1);
//! assert_eq!(log.head(), 0);
//! assert_eq!(log.len(), 2);
//! ```

use crate::error::InvariantError;

/// Insertion-ordered key log with lazy head advancement.
///
/// See the [module documentation](self) for the layout.
#[derive(Debug, Clone)]
pub struct OrderLog<K> {
    slots: Vec<Option<K>>,
    head: usize,
}

impl<K> OrderLog<K> {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: 0,
        }
    }

    /// Creates an empty log with room for `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
        }
    }

    /// Total number of slots, including the dead prefix before the head.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no slot remains at or after the head.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    /// Index of the first slot that may still be relevant.
    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    /// Number of slots at or after the head (live or stale).
    #[inline]
    pub fn pending(&self) -> usize {
        self.slots.len() - self.head
    }

    /// Appends `key` at the tail.
    #[inline]
    pub fn push(&mut self, key: K) {
        self.slots.push(Some(key));
    }

    /// Takes the key at the head, clears its slot and advances the head.
    ///
    /// Returns `None` once the head has reached the tail.
    pub fn pop_front(&mut self) -> Option<K> {
        while self.head < self.slots.len() {
            let slot = self.slots[self.head].take();
            self.head += 1;
            if slot.is_some() {
                return slot;
            }
        }
        None
    }

    /// Compacts the log if the dead prefix is at least half of it.
    ///
    /// Returns the number of reclaimed slots (0 if nothing was done).
    pub fn maybe_compact(&mut self) -> usize {
        if self.head == 0 || self.head < self.slots.len() / 2 {
            return 0;
        }
        let reclaimed = self.head;
        self.slots.drain(..reclaimed);
        self.head = 0;
        reclaimed
    }

    /// Iterates keys from the head to the tail, oldest first.
    pub fn iter_pending(&self) -> impl Iterator<Item = &K> + '_ {
        self.slots[self.head..].iter().flatten()
    }

    /// Removes every slot and resets the head.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }

    /// Reserves room for at least `additional` more slots.
    pub fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
    }

    /// Drops the dead prefix and every pending key for which `keep` is false.
    ///
    /// `keep` sees pending keys oldest first; survivors keep their relative
    /// order and the head resets to 0. Returns the number of removed slots.
    pub fn retain_pending<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        let before = self.slots.len();
        self.slots.drain(..self.head);
        self.head = 0;
        self.slots.retain(|slot| slot.as_ref().is_some_and(&mut keep));
        before - self.slots.len()
    }

    /// Verifies that the dead prefix is cleared and the pending region is not.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.head > self.slots.len() {
            return Err(InvariantError::new(format!(
                "order log head {} beyond length {}",
                self.head,
                self.slots.len()
            )));
        }
        if let Some(idx) = self.slots[..self.head].iter().position(Option::is_some) {
            return Err(InvariantError::new(format!(
                "order log slot {idx} before head {} was not cleared",
                self.head
            )));
        }
        if let Some(idx) = self.slots[self.head..].iter().position(Option::is_none) {
            return Err(InvariantError::new(format!(
                "order log slot {} after head is empty",
                self.head + idx
            )));
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    /// Returns a debug snapshot of head and length.
    pub fn debug_snapshot(&self) -> OrderLogSnapshot {
        OrderLogSnapshot {
            len: self.len(),
            head: self.head,
        }
    }
}

#[cfg(any(test, debug_assertions))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLogSnapshot {
    pub len: usize,
    pub head: usize,
}

impl<K> Default for OrderLog<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_log_pops_in_insertion_order() {
        let mut log = OrderLog::new();
        log.push(1);
        log.push(2);
        log.push(3);

        assert_eq!(log.pop_front(), Some(1));
        assert_eq!(log.pop_front(), Some(2));
        assert_eq!(log.pop_front(), Some(3));
        assert_eq!(log.pop_front(), None);
        assert!(log.is_empty());
    }

    #[test]
    fn order_log_pop_clears_slot_and_keeps_length() {
        let mut log = OrderLog::new();
        log.push("a");
        log.push("b");
        log.push("c");
        log.push("d");

        log.pop_front();
        assert_eq!(log.debug_snapshot(), OrderLogSnapshot { len: 4, head: 1 });
        assert_eq!(log.pending(), 3);
        log.check_invariants().unwrap();
    }

    #[test]
    fn order_log_compacts_at_half() {
        let mut log = OrderLog::new();
        for i in 0..10 {
            log.push(i);
        }

        for _ in 0..4 {
            log.pop_front();
        }
        // head 4 < 10 / 2
        assert_eq!(log.maybe_compact(), 0);
        assert_eq!(log.head(), 4);

        log.pop_front();
        assert_eq!(log.maybe_compact(), 5);
        assert_eq!(log.head(), 0);
        assert_eq!(log.len(), 5);
        assert_eq!(log.iter_pending().copied().collect::<Vec<_>>(), vec![5, 6, 7, 8, 9]);
        log.check_invariants().unwrap();
    }

    #[test]
    fn order_log_compact_noop_at_zero_head() {
        let mut log: OrderLog<u32> = OrderLog::new();
        assert_eq!(log.maybe_compact(), 0);
        log.push(1);
        assert_eq!(log.maybe_compact(), 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn order_log_fully_drained_compacts_to_empty() {
        let mut log = OrderLog::new();
        log.push(1);
        log.push(2);
        log.pop_front();
        log.pop_front();
        assert_eq!(log.maybe_compact(), 2);
        assert_eq!(log.len(), 0);
        assert!(log.is_empty());
    }

    #[test]
    fn order_log_clear_resets_head() {
        let mut log = OrderLog::with_capacity(8);
        log.push(1);
        log.push(2);
        log.pop_front();
        log.clear();
        assert_eq!(log.len(), 0);
        assert_eq!(log.head(), 0);
        assert_eq!(log.pop_front(), None);
    }

    #[test]
    fn order_log_push_after_drain_is_reachable() {
        let mut log = OrderLog::new();
        log.push(1);
        assert_eq!(log.pop_front(), Some(1));
        assert_eq!(log.pop_front(), None);
        log.push(2);
        assert_eq!(log.pop_front(), Some(2));
    }

    #[test]
    fn order_log_retain_pending_keeps_order() {
        let mut log = OrderLog::new();
        for i in 0..8 {
            log.push(i);
        }
        log.pop_front();
        log.pop_front();

        assert_eq!(log.retain_pending(|k| k % 3 != 0), 4);
        assert_eq!(log.head(), 0);
        assert_eq!(log.iter_pending().copied().collect::<Vec<_>>(), vec![2, 4, 5, 7]);
        log.check_invariants().unwrap();
    }
}
