//! Testing utilities and mock implementations
//!
//! Mock collaborators for exercising the engine on the host without
//! hardware: a DMA port model, a recording buffer provider, a recording
//! completion sink, and helpers that play the hardware side of the
//! descriptor handshake.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::descriptor::{Descriptor, FrameErrors};
use crate::driver::engine::RingEngine;
use crate::driver::hooks::{BufferProvider, CompletionSink, Fault};
use crate::error::IoResult;
use crate::frame::{BufferHandle, FrameHandle, Timestamp};
use crate::hal::dma::DmaPort;
use crate::hal::mdio::MdioBus;
use crate::ring::DescriptorRing;

// =============================================================================
// Mock DMA Port
// =============================================================================

/// Observable state of the [`MockDmaPort`].
#[derive(Debug, Default)]
pub struct MockDmaState {
    /// Engine running
    pub started: bool,
    /// `kick_tx` invocations
    pub tx_kicks: usize,
    /// `kick_rx` invocations
    pub rx_kicks: usize,
    /// Event word handed out by the next `pending_events` call
    pub staged_events: u32,
    /// Attached transmit ring (base, len)
    pub tx_ring: Option<(*const Descriptor, usize)>,
    /// Attached receive ring (base, len)
    pub rx_ring: Option<(*const Descriptor, usize)>,
    /// Complete every hardware-owned TX descriptor on each `kick_tx`
    pub auto_complete_tx: bool,
}

/// DMA port model for host tests.
///
/// Records control calls and, with `auto_complete_tx` set, plays an
/// instantly-completing engine by walking the attached transmit ring.
pub struct MockDmaPort {
    state: Rc<RefCell<MockDmaState>>,
}

impl MockDmaPort {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockDmaState::default())),
        }
    }

    /// Shared handle for inspecting and staging state from the test body.
    pub fn handle(&self) -> Rc<RefCell<MockDmaState>> {
        Rc::clone(&self.state)
    }
}

impl Default for MockDmaPort {
    fn default() -> Self {
        Self::new()
    }
}

impl DmaPort for MockDmaPort {
    fn attach_tx_ring(&mut self, base: *const Descriptor, len: usize) {
        self.state.borrow_mut().tx_ring = Some((base, len));
    }

    fn attach_rx_ring(&mut self, base: *const Descriptor, len: usize) {
        self.state.borrow_mut().rx_ring = Some((base, len));
    }

    fn start(&mut self) {
        self.state.borrow_mut().started = true;
    }

    fn stop(&mut self) {
        self.state.borrow_mut().started = false;
    }

    fn kick_tx(&mut self) {
        let (auto, ring) = {
            let mut state = self.state.borrow_mut();
            state.tx_kicks += 1;
            (state.auto_complete_tx, state.tx_ring)
        };

        if auto {
            if let Some((base, len)) = ring {
                for i in 0..len {
                    // Pointer registered by the engine and valid for its
                    // lifetime, mirroring a real engine's list registers.
                    let slot = unsafe { &*base.add(i) };
                    if slot.is_hardware_owned() {
                        slot.complete_transmit(FrameErrors::NONE, None);
                    }
                }
            }
        }
    }

    fn kick_rx(&mut self) {
        self.state.borrow_mut().rx_kicks += 1;
    }

    fn pending_events(&mut self) -> u32 {
        let mut state = self.state.borrow_mut();
        core::mem::take(&mut state.staged_events)
    }
}

// =============================================================================
// Mock Buffer Provider
// =============================================================================

/// Observable state of the [`MockProvider`].
#[derive(Debug, Default)]
pub struct ProviderState {
    /// Next handle token to mint
    pub next_handle: u32,
    /// Remaining allocations; `None` means unlimited
    pub available: Option<usize>,
    /// Every handle handed out by `allocate_receive_buffer`, in order
    pub allocated: Vec<BufferHandle>,
    /// Handle sequences passed to `free_transmit_buffers`
    pub freed: Vec<Vec<BufferHandle>>,
    /// Segment sequences passed to `link_receive_segments`
    pub linked: Vec<Vec<BufferHandle>>,
    /// Handles returned through `reclaim_on_teardown`
    pub discarded: Vec<BufferHandle>,
    /// Next frame token to mint
    pub next_frame: u32,
}

/// Recording buffer provider for host tests.
pub struct MockProvider {
    state: Rc<RefCell<ProviderState>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ProviderState::default())),
        }
    }

    /// Shared handle for inspecting state from the test body.
    pub fn handle(&self) -> Rc<RefCell<ProviderState>> {
        Rc::clone(&self.state)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferProvider for MockProvider {
    fn allocate_receive_buffer(&mut self) -> Option<BufferHandle> {
        let mut state = self.state.borrow_mut();

        match state.available {
            Some(0) => return None,
            Some(ref mut n) => *n -= 1,
            None => {}
        }

        let handle = BufferHandle::new(state.next_handle);
        state.next_handle += 1;
        state.allocated.push(handle);
        Some(handle)
    }

    fn link_receive_segments(&mut self, segments: &[BufferHandle]) -> FrameHandle {
        let mut state = self.state.borrow_mut();
        state.linked.push(segments.to_vec());
        let frame = FrameHandle::new(state.next_frame);
        state.next_frame += 1;
        frame
    }

    fn free_transmit_buffers(&mut self, handles: &[BufferHandle]) {
        self.state.borrow_mut().freed.push(handles.to_vec());
    }

    fn reclaim_on_teardown(&mut self, handle: BufferHandle) {
        self.state.borrow_mut().discarded.push(handle);
    }
}

// =============================================================================
// Recording Sink
// =============================================================================

/// One notification observed by the [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    TxComplete {
        handles: Vec<BufferHandle>,
        errors: FrameErrors,
        timestamp: Option<Timestamp>,
    },
    RxComplete {
        frame: FrameHandle,
        length: usize,
        errors: FrameErrors,
        timestamp: Option<Timestamp>,
    },
    Fault(Fault),
}

/// Observable state of the [`RecordingSink`].
#[derive(Debug, Default)]
pub struct SinkState {
    /// Notifications in delivery order
    pub events: Vec<SinkEvent>,
}

/// Completion sink that records every notification.
pub struct RecordingSink {
    state: Rc<RefCell<SinkState>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SinkState::default())),
        }
    }

    /// Shared handle for inspecting events from the test body.
    pub fn handle(&self) -> Rc<RefCell<SinkState>> {
        Rc::clone(&self.state)
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSink for RecordingSink {
    fn on_transmit_complete(
        &mut self,
        handles: &[BufferHandle],
        errors: FrameErrors,
        timestamp: Option<Timestamp>,
    ) {
        self.state.borrow_mut().events.push(SinkEvent::TxComplete {
            handles: handles.to_vec(),
            errors,
            timestamp,
        });
    }

    fn on_receive_complete(
        &mut self,
        frame: FrameHandle,
        length: usize,
        errors: FrameErrors,
        timestamp: Option<Timestamp>,
    ) {
        self.state.borrow_mut().events.push(SinkEvent::RxComplete {
            frame,
            length,
            errors,
            timestamp,
        });
    }

    fn on_error(&mut self, fault: Fault) {
        self.state.borrow_mut().events.push(SinkEvent::Fault(fault));
    }
}

// =============================================================================
// Mock MDIO Bus
// =============================================================================

/// Mock MDIO bus for testing PHY access without hardware.
#[derive(Debug, Default)]
pub struct MockMdioBus {
    /// Register values: (phy_addr, reg_addr) -> value
    registers: HashMap<(u8, u8), u16>,
}

impl MockMdioBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register value
    pub fn set_register(&mut self, phy_addr: u8, reg_addr: u8, value: u16) {
        self.registers.insert((phy_addr, reg_addr), value);
    }

    /// Get the current value of a register (for test verification)
    pub fn get_register(&self, phy_addr: u8, reg_addr: u8) -> Option<u16> {
        self.registers.get(&(phy_addr, reg_addr)).copied()
    }
}

impl MdioBus for MockMdioBus {
    fn read(&mut self, phy_addr: u8, reg_addr: u8) -> IoResult<u16> {
        Ok(self
            .registers
            .get(&(phy_addr, reg_addr))
            .copied()
            .unwrap_or(0))
    }

    fn write(&mut self, phy_addr: u8, reg_addr: u8, value: u16) -> IoResult<()> {
        self.registers.insert((phy_addr, reg_addr), value);
        Ok(())
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Delay provider that only accounts for time instead of sleeping.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total simulated sleep time in microseconds
    pub slept_us: u32,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.slept_us += ns / 1_000;
    }
}

// =============================================================================
// Model Hardware Helpers
// =============================================================================

/// Complete the oldest hardware-owned transmit slot, in ring order.
///
/// Returns `false` when no slot is hardware-owned.
pub fn complete_next_tx<const N: usize>(
    ring: &DescriptorRing<N>,
    errors: FrameErrors,
    timestamp: Option<Timestamp>,
) -> bool {
    for offset in 0..N {
        let slot = ring.slot(ring.tail_index() + offset);
        if slot.is_hardware_owned() {
            slot.complete_transmit(errors, timestamp);
            return true;
        }
    }
    false
}

/// Fill the oldest armed receive slot with one frame segment.
///
/// Returns `false` when no slot is armed.
pub fn complete_next_rx<const N: usize>(
    ring: &DescriptorRing<N>,
    first: bool,
    last: bool,
    produced: u32,
    errors: FrameErrors,
    timestamp: Option<Timestamp>,
) -> bool {
    for offset in 0..N {
        let slot = ring.slot(ring.tail_index() + offset);
        if slot.is_hardware_owned() {
            slot.complete_receive(first, last, produced, errors, timestamp);
            return true;
        }
    }
    false
}

/// Deliver one received frame across consecutive armed slots.
///
/// Segment lengths arrive in ring order; errors and the timestamp land on
/// the last segment, as a completing engine reports them.
pub fn deliver_rx_frame<const N: usize>(
    ring: &DescriptorRing<N>,
    segment_lens: &[u32],
    errors: FrameErrors,
    timestamp: Option<Timestamp>,
) -> bool {
    let count = segment_lens.len();
    for (i, &len) in segment_lens.iter().enumerate() {
        let first = i == 0;
        let last = i + 1 == count;
        let seg_errors = if last { errors } else { FrameErrors::NONE };
        let seg_ts = if last { timestamp } else { None };
        if !complete_next_rx(ring, first, last, len, seg_errors, seg_ts) {
            return false;
        }
    }
    true
}

// =============================================================================
// Engine Factory
// =============================================================================

/// Build an engine wired to fresh mocks.
pub fn new_engine<const TX_N: usize, const RX_N: usize>()
-> RingEngine<MockDmaPort, MockProvider, RecordingSink, TX_N, RX_N> {
    RingEngine::new(MockDmaPort::new(), MockProvider::new(), RecordingSink::new())
}

// =============================================================================
// Deterministic PRNG
// =============================================================================

/// Small linear congruential generator for interleaving tests.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }
}
