//! DMA descriptor: the per-slot record shared with the DMA engine.
//!
//! Each descriptor describes one transfer segment (buffer handles, length,
//! control flags) and carries the ownership handshake that coordinates the
//! driver with the autonomous DMA engine. Completion status (error flags,
//! produced length, timestamp) is written by hardware and may be read only
//! after ownership reverts to software.
//!
//! # Ownership protocol
//!
//! [`Ownership`] is the single synchronization point between the two sides.
//! The descriptor memory is mutated by a non-CPU agent, so the handoff is an
//! explicit atomic with release/acquire ordering rather than a plain flag:
//! [`Descriptor::publish`] is a release store making every prior field write
//! visible to the consumer, and ownership checks are acquire loads so status
//! reads after reclaim observe everything hardware wrote. All other fields
//! live in [`VolatileCell`]s to keep the compiler from caching or reordering
//! accesses to shared descriptor memory.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::frame::{BufferHandle, Timestamp};

// =============================================================================
// Volatile Cell
// =============================================================================

/// Volatile cell wrapper for descriptor fields
///
/// Ensures all accesses are volatile to prevent compiler optimization
/// from reordering or caching descriptor field accesses.
#[repr(transparent)]
pub struct VolatileCell<T: Copy> {
    value: core::cell::UnsafeCell<T>,
}

// Safety: descriptor fields are only accessed by the side that currently
// holds ownership; the atomic ownership handoff orders those accesses.
unsafe impl<T: Copy> Sync for VolatileCell<T> {}

impl<T: Copy> VolatileCell<T> {
    /// Create a new volatile cell with the given initial value
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self {
            value: core::cell::UnsafeCell::new(value),
        }
    }

    /// Read the value (volatile read)
    #[inline(always)]
    pub fn get(&self) -> T {
        unsafe { core::ptr::read_volatile(self.value.get()) }
    }

    /// Write a value (volatile write)
    #[inline(always)]
    pub fn set(&self, value: T) {
        unsafe { core::ptr::write_volatile(self.value.get(), value) }
    }

    /// Update the value using a function (read-modify-write)
    #[inline(always)]
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(T) -> T,
    {
        let old = self.get();
        self.set(f(old));
    }
}

impl<T: Copy + Default> Default for VolatileCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

// =============================================================================
// Control Flags
// =============================================================================

/// First Segment - descriptor holds the first segment of a frame
pub const DESC_FIRST_SEGMENT: u32 = 1 << 0;
/// Last Segment - descriptor holds the last segment of a frame
pub const DESC_LAST_SEGMENT: u32 = 1 << 1;
/// Interrupt on Completion - raise the completion event for this descriptor
pub const DESC_INTERRUPT_ON_COMPLETE: u32 = 1 << 2;
/// Timestamp Enable - capture a hardware timestamp on completion
pub const DESC_TIMESTAMP_EN: u32 = 1 << 3;
/// Context Descriptor - carries side-band state, not frame data
pub const DESC_CONTEXT: u32 = 1 << 4;
/// Checksum Insertion Control shift (2 bits)
pub const DESC_CHECKSUM_SHIFT: u32 = 5;
/// Checksum Insertion Control mask
pub const DESC_CHECKSUM_MASK: u32 = 0x3 << DESC_CHECKSUM_SHIFT;

/// Checksum insertion modes for transmit offload.
///
/// The ring protocol only transports the mode; the bit encoding a given MAC
/// expects for it is the port layer's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum ChecksumMode {
    /// Checksum insertion disabled
    #[default]
    Disabled = 0,
    /// Insert IP header checksum only
    IpHeader = 1,
    /// Insert IP header and payload checksum (no pseudo-header)
    IpHeaderAndPayload = 2,
    /// Insert IP header and payload checksum with pseudo-header
    Full = 3,
}

impl ChecksumMode {
    /// Encode into the descriptor control field.
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        (self as u32) << DESC_CHECKSUM_SHIFT
    }

    /// Decode from a descriptor control field.
    #[must_use]
    pub const fn from_bits(flags: u32) -> Self {
        match (flags & DESC_CHECKSUM_MASK) >> DESC_CHECKSUM_SHIFT {
            1 => ChecksumMode::IpHeader,
            2 => ChecksumMode::IpHeaderAndPayload,
            3 => ChecksumMode::Full,
            _ => ChecksumMode::Disabled,
        }
    }
}

// =============================================================================
// Frame Error Flags
// =============================================================================

/// Per-frame hardware error flags, aggregated across a frame's segments.
///
/// These are completion data, not driver errors: a frame that failed in
/// hardware is still delivered to the application, tagged with its errors,
/// so the caller decides discard-vs-inspect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameErrors(u32);

impl FrameErrors {
    /// No errors.
    pub const NONE: Self = Self(0);
    /// CRC mismatch on reception
    pub const CRC: Self = Self(1 << 0);
    /// Frame shorter than the minimum legal size
    pub const RUNT: Self = Self(1 << 1);
    /// Frame longer than the maximum legal size
    pub const OVERSIZE: Self = Self(1 << 2);
    /// Receive FIFO overflow while the frame was arriving
    pub const OVERFLOW: Self = Self(1 << 3);
    /// Receive watchdog expired mid-frame
    pub const WATCHDOG: Self = Self(1 << 4);
    /// Length field inconsistent with the received byte count
    pub const LENGTH: Self = Self(1 << 5);
    /// Transmit FIFO ran dry mid-frame
    pub const UNDERFLOW: Self = Self(1 << 6);
    /// Collision after the slot time (half duplex)
    pub const LATE_COLLISION: Self = Self(1 << 7);
    /// More than the legal number of collisions (half duplex)
    pub const EXCESSIVE_COLLISION: Self = Self(1 << 8);
    /// Carrier absent during transmission
    pub const NO_CARRIER: Self = Self(1 << 9);

    /// Receive errors that make the frame unusable as delivered.
    const FATAL_MASK: u32 = Self::CRC.0
        | Self::RUNT.0
        | Self::OVERSIZE.0
        | Self::OVERFLOW.0
        | Self::WATCHDOG.0;

    /// Build from a raw status word.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw status word.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Logical OR with another flag set.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether all of `other`'s flags are set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check whether any flag is set.
    #[must_use]
    pub const fn any(self) -> bool {
        self.0 != 0
    }

    /// Check for a fatal per-frame receive error (CRC, runt, oversize,
    /// overflow, watchdog). The frame is still delivered; this tags it.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        (self.0 & Self::FATAL_MASK) != 0
    }
}

// =============================================================================
// Ownership
// =============================================================================

/// Which side of the handshake may access a descriptor's payload fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum Ownership {
    /// Software may populate or read the descriptor
    Software = 0,
    /// The DMA engine owns the descriptor; software must not touch it
    Hardware = 1,
}

// =============================================================================
// Descriptor
// =============================================================================

/// One descriptor-ring slot.
///
/// Describes a single DMA transfer segment: up to two buffer handles (split
/// header/payload support), the byte counts they carry, control flags, and
/// the completion status hardware reports back. The exact word layout a MAC
/// expects is the port layer's concern; this type models the protocol.
pub struct Descriptor {
    /// Ownership handshake; see the module docs for the ordering contract
    own: AtomicU32,
    /// Control flags (`DESC_*` bits); hardware adds first/last on receive
    flags: VolatileCell<u32>,
    /// Primary buffer handle
    buffer1: VolatileCell<Option<BufferHandle>>,
    /// Primary buffer byte count
    len1: VolatileCell<u32>,
    /// Secondary buffer handle (split header/payload)
    buffer2: VolatileCell<Option<BufferHandle>>,
    /// Secondary buffer byte count
    len2: VolatileCell<u32>,
    /// Error flags written by hardware on completion
    errors: VolatileCell<u32>,
    /// Bytes produced into this segment (receive completion)
    produced: VolatileCell<u32>,
    /// Raw timestamp capture; zero means not captured
    timestamp: VolatileCell<u64>,
}

impl Descriptor {
    /// Create a cleared, software-owned descriptor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            own: AtomicU32::new(Ownership::Software as u32),
            flags: VolatileCell::new(0),
            buffer1: VolatileCell::new(None),
            len1: VolatileCell::new(0),
            buffer2: VolatileCell::new(None),
            len2: VolatileCell::new(0),
            errors: VolatileCell::new(0),
            produced: VolatileCell::new(0),
            timestamp: VolatileCell::new(0),
        }
    }

    // =========================================================================
    // Ownership Handshake
    // =========================================================================

    /// Current owner of the descriptor.
    #[inline(always)]
    pub fn ownership(&self) -> Ownership {
        if self.own.load(Ordering::Acquire) == Ownership::Hardware as u32 {
            Ownership::Hardware
        } else {
            Ownership::Software
        }
    }

    /// Check if the DMA engine currently owns this descriptor.
    #[inline(always)]
    #[must_use]
    pub fn is_hardware_owned(&self) -> bool {
        self.ownership() == Ownership::Hardware
    }

    /// Hand the populated descriptor to the DMA engine.
    ///
    /// Release store: every field written before this call is visible to
    /// the engine once it observes the ownership flip.
    #[inline(always)]
    pub fn publish(&self) {
        self.own
            .store(Ownership::Hardware as u32, Ordering::Release);
    }

    /// Return the descriptor to software.
    ///
    /// The hardware side of the handshake, used by DMA models and by forced
    /// teardown reclaim. Release store for the same visibility contract as
    /// [`Descriptor::publish`].
    #[inline(always)]
    pub fn release(&self) {
        self.own
            .store(Ownership::Software as u32, Ordering::Release);
    }

    // =========================================================================
    // Software-Side Population
    // =========================================================================

    /// Reset every field; the descriptor ends software-owned.
    pub fn clear(&self) {
        self.flags.set(0);
        self.buffer1.set(None);
        self.len1.set(0);
        self.buffer2.set(None);
        self.len2.set(0);
        self.errors.set(0);
        self.produced.set(0);
        self.timestamp.set(0);
        self.release();
    }

    /// Set the control flags.
    #[inline(always)]
    pub fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    /// Get the control flags.
    #[inline(always)]
    #[must_use]
    pub fn flags(&self) -> u32 {
        self.flags.get()
    }

    /// Attach the primary buffer.
    pub fn set_primary_buffer(&self, handle: BufferHandle, len: u32) {
        self.buffer1.set(Some(handle));
        self.len1.set(len);
    }

    /// Attach the secondary buffer of a split segment.
    pub fn set_secondary_buffer(&self, handle: BufferHandle, len: u32) {
        self.buffer2.set(Some(handle));
        self.len2.set(len);
    }

    /// Primary buffer handle and byte count, if attached.
    #[must_use]
    pub fn primary_buffer(&self) -> Option<(BufferHandle, u32)> {
        self.buffer1.get().map(|h| (h, self.len1.get()))
    }

    /// Secondary buffer handle and byte count, if attached.
    #[must_use]
    pub fn secondary_buffer(&self) -> Option<(BufferHandle, u32)> {
        self.buffer2.get().map(|h| (h, self.len2.get()))
    }

    /// Set the checksum insertion mode, preserving the other flags.
    pub fn set_checksum_mode(&self, mode: ChecksumMode) {
        self.flags
            .update(|f| (f & !DESC_CHECKSUM_MASK) | mode.to_bits());
    }

    /// Get the checksum insertion mode.
    #[must_use]
    pub fn checksum_mode(&self) -> ChecksumMode {
        ChecksumMode::from_bits(self.flags.get())
    }

    /// Reset the slot and attach an empty receive buffer.
    ///
    /// The caller publishes separately once the slot is ready for hardware.
    pub fn arm_receive(&self, handle: BufferHandle, capacity: u32) {
        self.flags.set(0);
        self.buffer1.set(Some(handle));
        self.len1.set(capacity);
        self.buffer2.set(None);
        self.len2.set(0);
        self.errors.set(0);
        self.produced.set(0);
        self.timestamp.set(0);
    }

    // =========================================================================
    // Flag Queries
    // =========================================================================

    /// Check the first-segment flag.
    #[inline(always)]
    #[must_use]
    pub fn is_first_segment(&self) -> bool {
        (self.flags.get() & DESC_FIRST_SEGMENT) != 0
    }

    /// Check the last-segment flag.
    #[inline(always)]
    #[must_use]
    pub fn is_last_segment(&self) -> bool {
        (self.flags.get() & DESC_LAST_SEGMENT) != 0
    }

    /// Check the timestamp-enable flag.
    #[inline(always)]
    #[must_use]
    pub fn wants_timestamp(&self) -> bool {
        (self.flags.get() & DESC_TIMESTAMP_EN) != 0
    }

    /// Check the context-descriptor flag.
    #[inline(always)]
    #[must_use]
    pub fn is_context(&self) -> bool {
        (self.flags.get() & DESC_CONTEXT) != 0
    }

    // =========================================================================
    // Completion Status
    // =========================================================================
    // Valid only after ownership has reverted to software.

    /// Error flags reported for this segment.
    #[inline(always)]
    #[must_use]
    pub fn errors(&self) -> FrameErrors {
        FrameErrors::from_raw(self.errors.get())
    }

    /// Bytes produced into this segment (receive).
    #[inline(always)]
    #[must_use]
    pub fn produced_len(&self) -> usize {
        self.produced.get() as usize
    }

    /// Captured timestamp, if the clock was running.
    #[inline(always)]
    #[must_use]
    pub fn timestamp(&self) -> Option<Timestamp> {
        Timestamp::from_raw(self.timestamp.get())
    }

    // =========================================================================
    // Hardware-Side Completion
    // =========================================================================
    // The DMA engine's half of the protocol. Exercised by DMA models in
    // host tests; a real port never calls these from software.

    /// Complete a transmit segment: write status, then return ownership.
    pub fn complete_transmit(&self, errors: FrameErrors, timestamp: Option<Timestamp>) {
        self.errors.set(errors.raw());
        self.timestamp
            .set(timestamp.map_or(0, Timestamp::to_raw));
        self.release();
    }

    /// Complete a receive segment: write segment framing and status, then
    /// return ownership.
    pub fn complete_receive(
        &self,
        first: bool,
        last: bool,
        produced: u32,
        errors: FrameErrors,
        timestamp: Option<Timestamp>,
    ) {
        let mut framing = 0;
        if first {
            framing |= DESC_FIRST_SEGMENT;
        }
        if last {
            framing |= DESC_LAST_SEGMENT;
        }
        self.flags.update(|f| f | framing);
        self.produced.set(produced);
        self.errors.set(errors.raw());
        self.timestamp
            .set(timestamp.map_or(0, Timestamp::to_raw));
        self.release();
    }
}

impl Default for Descriptor {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Ownership Tests
    // =========================================================================

    #[test]
    fn descriptor_new_is_software_owned() {
        let desc = Descriptor::new();
        assert_eq!(desc.ownership(), Ownership::Software);
        assert!(!desc.is_hardware_owned());
    }

    #[test]
    fn descriptor_publish_hands_to_hardware() {
        let desc = Descriptor::new();
        desc.publish();
        assert!(desc.is_hardware_owned());
    }

    #[test]
    fn descriptor_release_returns_to_software() {
        let desc = Descriptor::new();
        desc.publish();
        desc.release();
        assert!(!desc.is_hardware_owned());
    }

    #[test]
    fn descriptor_handoff_across_threads() {
        extern crate std;

        // One full handshake cycle per iteration: software publishes, a
        // model-hardware thread writes status and releases, software reads
        // the status it wrote. Exercises the release/acquire pairing.
        let desc = Descriptor::new();

        std::thread::scope(|s| {
            let hw = s.spawn(|| {
                for i in 1..=100u32 {
                    while !desc.is_hardware_owned() {
                        core::hint::spin_loop();
                    }
                    desc.complete_receive(true, true, i, FrameErrors::NONE, None);
                }
            });

            for i in 1..=100u32 {
                desc.arm_receive(BufferHandle::new(i), 256);
                desc.publish();
                while desc.is_hardware_owned() {
                    core::hint::spin_loop();
                }
                assert_eq!(desc.produced_len(), i as usize);
            }

            hw.join().unwrap();
        });
    }

    // =========================================================================
    // Population Tests
    // =========================================================================

    #[test]
    fn descriptor_buffers() {
        let desc = Descriptor::new();
        assert_eq!(desc.primary_buffer(), None);
        assert_eq!(desc.secondary_buffer(), None);

        desc.set_primary_buffer(BufferHandle::new(7), 100);
        desc.set_secondary_buffer(BufferHandle::new(8), 1400);

        assert_eq!(desc.primary_buffer(), Some((BufferHandle::new(7), 100)));
        assert_eq!(desc.secondary_buffer(), Some((BufferHandle::new(8), 1400)));
    }

    #[test]
    fn descriptor_flag_queries() {
        let desc = Descriptor::new();
        desc.set_flags(DESC_FIRST_SEGMENT | DESC_TIMESTAMP_EN);

        assert!(desc.is_first_segment());
        assert!(!desc.is_last_segment());
        assert!(desc.wants_timestamp());
        assert!(!desc.is_context());
    }

    #[test]
    fn descriptor_checksum_mode_roundtrip() {
        let desc = Descriptor::new();
        desc.set_flags(DESC_FIRST_SEGMENT | DESC_LAST_SEGMENT);

        for mode in [
            ChecksumMode::Disabled,
            ChecksumMode::IpHeader,
            ChecksumMode::IpHeaderAndPayload,
            ChecksumMode::Full,
        ] {
            desc.set_checksum_mode(mode);
            assert_eq!(desc.checksum_mode(), mode);
            // Other flags survive the mode update
            assert!(desc.is_first_segment());
            assert!(desc.is_last_segment());
        }
    }

    #[test]
    fn descriptor_clear_resets_everything() {
        let desc = Descriptor::new();
        desc.set_primary_buffer(BufferHandle::new(1), 64);
        desc.set_flags(DESC_FIRST_SEGMENT | DESC_LAST_SEGMENT);
        desc.publish();
        desc.complete_transmit(FrameErrors::UNDERFLOW, None);

        desc.clear();

        assert!(!desc.is_hardware_owned());
        assert_eq!(desc.flags(), 0);
        assert_eq!(desc.primary_buffer(), None);
        assert!(!desc.errors().any());
        assert_eq!(desc.timestamp(), None);
    }

    #[test]
    fn descriptor_arm_receive_clears_stale_status() {
        let desc = Descriptor::new();
        desc.complete_receive(true, true, 100, FrameErrors::CRC, None);

        desc.arm_receive(BufferHandle::new(5), 1600);

        assert_eq!(desc.flags(), 0);
        assert_eq!(desc.primary_buffer(), Some((BufferHandle::new(5), 1600)));
        assert!(!desc.errors().any());
        assert_eq!(desc.produced_len(), 0);
    }

    // =========================================================================
    // Completion Tests
    // =========================================================================

    #[test]
    fn descriptor_complete_transmit_writes_status() {
        let desc = Descriptor::new();
        desc.set_flags(DESC_LAST_SEGMENT | DESC_TIMESTAMP_EN);
        desc.publish();

        let ts = Timestamp {
            seconds: 1,
            nanoseconds: 500,
        };
        desc.complete_transmit(FrameErrors::LATE_COLLISION, Some(ts));

        assert!(!desc.is_hardware_owned());
        assert!(desc.errors().contains(FrameErrors::LATE_COLLISION));
        assert_eq!(desc.timestamp(), Some(ts));
    }

    #[test]
    fn descriptor_complete_receive_sets_framing() {
        let desc = Descriptor::new();
        desc.arm_receive(BufferHandle::new(1), 1600);
        desc.publish();

        desc.complete_receive(true, false, 1600, FrameErrors::NONE, None);

        assert!(!desc.is_hardware_owned());
        assert!(desc.is_first_segment());
        assert!(!desc.is_last_segment());
        assert_eq!(desc.produced_len(), 1600);
        assert_eq!(desc.timestamp(), None);
    }

    // =========================================================================
    // FrameErrors Tests
    // =========================================================================

    #[test]
    fn frame_errors_none_is_empty() {
        assert!(!FrameErrors::NONE.any());
        assert!(!FrameErrors::NONE.is_fatal());
    }

    #[test]
    fn frame_errors_merge_is_logical_or() {
        let merged = FrameErrors::CRC.merge(FrameErrors::OVERFLOW);
        assert!(merged.contains(FrameErrors::CRC));
        assert!(merged.contains(FrameErrors::OVERFLOW));
        assert!(!merged.contains(FrameErrors::RUNT));
    }

    #[test]
    fn frame_errors_fatal_classification() {
        for fatal in [
            FrameErrors::CRC,
            FrameErrors::RUNT,
            FrameErrors::OVERSIZE,
            FrameErrors::OVERFLOW,
            FrameErrors::WATCHDOG,
        ] {
            assert!(fatal.is_fatal(), "{:?} should be fatal", fatal);
        }

        // Length mismatch and tx-side errors are reported but not fatal
        assert!(!FrameErrors::LENGTH.is_fatal());
        assert!(!FrameErrors::LATE_COLLISION.is_fatal());
        assert!(!FrameErrors::NO_CARRIER.is_fatal());
    }

    #[test]
    fn frame_errors_raw_roundtrip() {
        let errs = FrameErrors::CRC.merge(FrameErrors::WATCHDOG);
        assert_eq!(FrameErrors::from_raw(errs.raw()), errs);
    }

    // =========================================================================
    // ChecksumMode Tests
    // =========================================================================

    #[test]
    fn checksum_mode_bits_roundtrip() {
        for mode in [
            ChecksumMode::Disabled,
            ChecksumMode::IpHeader,
            ChecksumMode::IpHeaderAndPayload,
            ChecksumMode::Full,
        ] {
            assert_eq!(ChecksumMode::from_bits(mode.to_bits()), mode);
        }
    }
}
