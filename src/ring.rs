//! Circular descriptor ring shared between software and the DMA engine.
//!
//! A [`DescriptorRing`] owns a fixed array of descriptors plus the cursors
//! that track the producer/consumer protocol:
//!
//! - `head`: next slot to populate and hand to hardware
//! - `tail`: next slot to reclaim from hardware
//! - `in_flight`: slots currently between `tail` and `head`
//!
//! Invariants the ring enforces: `in_flight <= N`; both cursors advance
//! strictly in ring order modulo `N`; a slot inside the `[tail, head)`
//! window is hardware-owned or pending reclaim, a slot outside it is free
//! for software reuse. Hardware consumes descriptors in index order, so
//! reclaim is strictly tail-first; out-of-order reclaim is not supported.
//!
//! The cursors themselves are plain fields mutated through `&mut self`:
//! exactly one driver context may drive a ring at a time (see the crate
//! docs for the interrupt/deferred split).

use crate::constants::MAX_RING_CAPACITY;
use crate::descriptor::Descriptor;
use crate::error::{ConfigError, ConfigResult, RingError, RingResult};

/// Fixed-capacity circular descriptor ring.
///
/// `N` is the slot count, fixed at compile time so rings can live in static
/// storage. Power-of-two capacities make the modulo cheap but any capacity
/// within the hardware maximum is accepted.
pub struct DescriptorRing<const N: usize> {
    /// Descriptor slots
    slots: [Descriptor; N],
    /// Next slot to hand to hardware
    head: usize,
    /// Next slot to reclaim from hardware
    tail: usize,
    /// Slots currently handed out
    in_flight: usize,
}

impl<const N: usize> DescriptorRing<N> {
    /// Create a ring with cleared, software-owned slots.
    ///
    /// Const, suitable for static initialization. Call
    /// [`DescriptorRing::initialize`] before use.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [const { Descriptor::new() }; N],
            head: 0,
            tail: 0,
            in_flight: 0,
        }
    }

    /// Validate the capacity and reset every slot and cursor.
    ///
    /// # Errors
    /// - `CapacityInvalid` - capacity is zero or exceeds
    ///   [`MAX_RING_CAPACITY`]
    pub fn initialize(&mut self) -> ConfigResult<()> {
        if N == 0 || N > MAX_RING_CAPACITY {
            return Err(ConfigError::CapacityInvalid);
        }

        for slot in &self.slots {
            slot.clear();
        }
        self.head = 0;
        self.tail = 0;
        self.in_flight = 0;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Slot count of the ring.
    #[inline(always)]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Slots currently handed out (hardware-owned or pending reclaim).
    #[inline(always)]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Slots free for software reuse.
    #[inline(always)]
    #[must_use]
    pub fn free_slots(&self) -> usize {
        N - self.in_flight
    }

    /// Check if every slot is handed out.
    #[inline(always)]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.in_flight == N
    }

    /// Check if no slot is handed out.
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_flight == 0
    }

    /// Current head index.
    #[inline(always)]
    #[must_use]
    pub fn head_index(&self) -> usize {
        self.head
    }

    /// Current tail index.
    #[inline(always)]
    #[must_use]
    pub fn tail_index(&self) -> usize {
        self.tail
    }

    /// Base pointer of the descriptor array, for the port's list registers.
    #[inline(always)]
    #[must_use]
    pub fn base_ptr(&self) -> *const Descriptor {
        self.slots.as_ptr()
    }

    /// Get the slot at `index` (wrapping).
    #[inline(always)]
    #[must_use]
    pub fn slot(&self, index: usize) -> &Descriptor {
        &self.slots[index % N]
    }

    /// Iterate over all slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.slots.iter()
    }

    // =========================================================================
    // Producer Side
    // =========================================================================

    /// The slot at `head`, ready to populate.
    ///
    /// # Errors
    /// - `Full` - every slot is handed out (back-pressure; retry after the
    ///   next completion)
    pub fn next_free_slot(&self) -> RingResult<&Descriptor> {
        if self.is_full() {
            return Err(RingError::Full);
        }
        Ok(&self.slots[self.head])
    }

    /// Advance `head` past a populated slot being handed to hardware.
    ///
    /// Call only after the slot returned by
    /// [`DescriptorRing::next_free_slot`] is fully populated.
    pub fn advance_head(&mut self) {
        debug_assert!(self.in_flight < N);
        self.head = (self.head + 1) % N;
        self.in_flight += 1;
    }

    // =========================================================================
    // Consumer Side
    // =========================================================================

    /// Reclaim the slot at `tail` if hardware has finished with it.
    ///
    /// Non-blocking: returns `None` when nothing is in flight or the tail
    /// slot is still hardware-owned. On success the slot is removed from the
    /// in-flight window and returned for status extraction; the acquire load
    /// inside the ownership check makes hardware's status writes visible.
    pub fn reclaim_next_if_ready(&mut self) -> Option<&Descriptor> {
        if self.in_flight == 0 {
            return None;
        }

        let idx = self.tail;
        if self.slots[idx].is_hardware_owned() {
            return None;
        }

        self.tail = (idx + 1) % N;
        self.in_flight -= 1;
        Some(&self.slots[idx])
    }

    /// Forcibly reclaim every in-flight slot for teardown.
    ///
    /// The DMA engine must already be halted. Hardware-owned slots have
    /// their ownership reset without status processing; `f` is invoked for
    /// each reclaimed slot so the caller can discard its buffers through
    /// the teardown path. Cursors are reset afterwards.
    pub fn force_reclaim_all<F>(&mut self, mut f: F)
    where
        F: FnMut(&Descriptor),
    {
        while self.in_flight > 0 {
            let idx = self.tail;
            let slot = &self.slots[idx];
            if slot.is_hardware_owned() {
                slot.release();
            }
            f(slot);
            self.tail = (idx + 1) % N;
            self.in_flight -= 1;
        }
        self.head = 0;
        self.tail = 0;
    }
}

impl<const N: usize> Default for DescriptorRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
