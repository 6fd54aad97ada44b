//! Clock Ring Module
//!
//! The slot arrays of the CLOCK caches and the eviction scan over them.
//!
//! A cache of capacity `N` owns two arrays of length `N`:
//! - [`SlotRing`] maps each slot to the key occupying it and carries the
//!   scan hand. It is only touched by writers holding the cache lock.
//! - [`ReferenceFlags`] holds one "referenced" bit per slot. Readers set and
//!   clear bits without any lock, so a bit can be lost, or land on a slot
//!   that was just handed to another key. The bits are an eviction hint only;
//!   the lookup table alone decides whether a key is present.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::cache::Slot;

// == Reference Flags ==
/// Per-slot referenced bits, readable and writable without the cache lock.
#[derive(Debug)]
pub(crate) struct ReferenceFlags {
    flags: Box<[AtomicBool]>,
}

impl ReferenceFlags {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            flags: (0..capacity).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Marks the slot as recently used.
    pub(crate) fn mark(&self, slot: Slot) {
        self.flags[slot.index()].store(true, Ordering::Relaxed);
    }

    /// Demotes the slot so the next scan reaching it evicts it.
    pub(crate) fn unmark(&self, slot: Slot) {
        self.flags[slot.index()].store(false, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn is_marked(&self, slot: Slot) -> bool {
        self.flags[slot.index()].load(Ordering::Relaxed)
    }

    /// Clears the bit, returning whether it was set.
    fn take(&self, index: usize) -> bool {
        self.flags[index].swap(false, Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        for flag in self.flags.iter() {
            flag.store(false, Ordering::Relaxed);
        }
    }
}

// == Slot Ring ==
/// Slot-to-key array plus the clock hand. Guarded by the cache lock.
#[derive(Debug)]
pub(crate) struct SlotRing<K> {
    /// Key occupying each slot, None = empty
    keys: Vec<Option<K>>,
    /// Next slot the scan inspects
    hand: usize,
    /// Probes before the slot under the hand is evicted regardless of its bit
    scan_limit: usize,
}

impl<K> SlotRing<K> {
    pub(crate) fn new(capacity: usize, scan_limit: usize) -> Self {
        let mut keys = Vec::with_capacity(capacity);
        keys.resize_with(capacity, || None);
        Self {
            keys,
            hand: 0,
            scan_limit: scan_limit.max(1),
        }
    }

    #[cfg(test)]
    pub(crate) fn hand(&self) -> usize {
        self.hand
    }

    fn advance(&self, index: usize) -> usize {
        if index + 1 == self.keys.len() {
            0
        } else {
            index + 1
        }
    }

    // == Sweep ==
    /// Finds the slot to fill with a new key.
    ///
    /// Starting at the hand, referenced slots get their bit cleared and are
    /// skipped; the first unreferenced slot is chosen. After `scan_limit`
    /// probes the slot under the hand is chosen whatever its bit says.
    /// The hand stays on the chosen slot until [`SlotRing::install`].
    pub(crate) fn sweep(&mut self, refs: &ReferenceFlags) -> Slot {
        let mut hand = self.hand;
        let mut probes = 0;
        while refs.take(hand) {
            hand = self.advance(hand);
            probes += 1;
            if probes >= self.scan_limit {
                refs.unmark(Slot::new(hand));
                trace!(slot = hand, probes, "Scan limit reached, forcing eviction");
                break;
            }
        }
        self.hand = hand;
        Slot::new(hand)
    }

    // == Install ==
    /// Puts `key` into `slot`, moves the hand past it and returns the key
    /// that previously occupied the slot.
    pub(crate) fn install(&mut self, slot: Slot, key: K) -> Option<K> {
        let previous = self.keys[slot.index()].replace(key);
        self.hand = self.advance(slot.index());
        previous
    }

    pub(crate) fn reset(&mut self) {
        for key in self.keys.iter_mut() {
            *key = None;
        }
        self.hand = 0;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn fill(ring: &mut SlotRing<&'static str>, refs: &ReferenceFlags, keys: &[&'static str]) {
        for key in keys {
            let slot = ring.sweep(refs);
            ring.install(slot, *key);
        }
    }

    #[test]
    fn test_sweep_fills_empty_slots_in_order() {
        let refs = ReferenceFlags::new(3);
        let mut ring = SlotRing::new(3, 107);

        let s0 = ring.sweep(&refs);
        assert_eq!(ring.install(s0, "a"), None);
        let s1 = ring.sweep(&refs);
        assert_eq!(ring.install(s1, "b"), None);

        assert_eq!(s0.index(), 0);
        assert_eq!(s1.index(), 1);
        assert_eq!(ring.hand(), 2);
    }

    #[test]
    fn test_sweep_skips_referenced_and_clears_them() {
        let refs = ReferenceFlags::new(3);
        let mut ring = SlotRing::new(3, 107);
        fill(&mut ring, &refs, &["a", "b", "c"]);

        refs.mark(Slot::new(0));
        refs.mark(Slot::new(1));

        let target = ring.sweep(&refs);
        assert_eq!(target.index(), 2);
        assert!(!refs.is_marked(Slot::new(0)));
        assert!(!refs.is_marked(Slot::new(1)));
        assert_eq!(ring.install(target, "d"), Some("c"));
        assert_eq!(ring.hand(), 0);
    }

    #[test]
    fn test_sweep_wraps_when_everything_referenced() {
        let refs = ReferenceFlags::new(2);
        let mut ring = SlotRing::new(2, 107);
        fill(&mut ring, &refs, &["a", "b"]);
        refs.mark(Slot::new(0));
        refs.mark(Slot::new(1));

        // Full lap clears both bits, then the hand is back on slot 0
        let target = ring.sweep(&refs);
        assert_eq!(target.index(), 0);
    }

    #[test]
    fn test_sweep_forces_eviction_at_scan_limit() {
        let refs = ReferenceFlags::new(8);
        let mut ring = SlotRing::new(8, 3);
        fill(&mut ring, &refs, &["a", "b", "c", "d", "e", "f", "g", "h"]);
        for i in 0..8 {
            refs.mark(Slot::new(i));
        }

        let target = ring.sweep(&refs);
        assert_eq!(target.index(), 3);
        assert!(!refs.is_marked(Slot::new(3)));
        // Slots beyond the forced one keep their bits
        assert!(refs.is_marked(Slot::new(4)));
    }

    #[test]
    fn test_reset_empties_ring() {
        let refs = ReferenceFlags::new(2);
        let mut ring = SlotRing::new(2, 107);
        fill(&mut ring, &refs, &["a"]);
        refs.mark(Slot::new(0));

        ring.reset();
        refs.reset();

        assert_eq!(ring.hand(), 0);
        assert!(!refs.is_marked(Slot::new(0)));
        let slot = ring.sweep(&refs);
        assert_eq!(ring.install(slot, "b"), None);
    }

    #[test]
    fn test_zero_scan_limit_is_coerced() {
        let ring: SlotRing<u8> = SlotRing::new(4, 0);
        assert_eq!(ring.scan_limit, 1);
        assert_eq!(ring.keys.len(), 4);
    }
}
