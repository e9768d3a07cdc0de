//! Capability interfaces consumed by the ring engine.
//!
//! The application/board layer implements these two traits and hands them to
//! the engine at construction. They replace the C-style registered callback
//! pattern (function pointers keyed by ID enums): the buffer provider owns
//! buffer lifetime, the completion sink receives the engine's notifications.

use crate::descriptor::FrameErrors;
use crate::frame::{BufferHandle, FrameHandle, Timestamp};

// =============================================================================
// Engine Faults
// =============================================================================

/// Fatal engine faults.
///
/// Not recoverable by the ring itself: the affected engine must be stopped
/// and re-initialized. Delivered through [`CompletionSink::on_error`] and
/// mirrored in the typed error return of the operation that detected them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// The DMA engine reported an unrecoverable bus error
    BusError,
    /// A descriptor chain violated the first/last segment protocol
    ChainCorrupt,
    /// A received frame spans more segments than the configured maximum
    SegmentLimitExceeded,
}

impl core::fmt::Display for Fault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Fault {
    /// Returns a human-readable description of the fault
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Fault::BusError => "DMA bus error",
            Fault::ChainCorrupt => "descriptor chain corrupt",
            Fault::SegmentLimitExceeded => "segments-per-frame limit exceeded",
        }
    }
}

// =============================================================================
// Buffer Provider
// =============================================================================

/// Supplies and reclaims the memory backing descriptors.
///
/// The engine treats every handle as opaque: created here before a
/// descriptor is handed to hardware, returned here after ownership reverts.
/// Payload bytes are never touched by the engine (zero-copy).
pub trait BufferProvider {
    /// Allocate an empty buffer for a receive slot.
    ///
    /// `None` means the pool is dry; the slot stays unarmed and the engine
    /// retries on the next replenish pass. A fully unarmed receive ring
    /// drops incoming frames at the hardware level.
    fn allocate_receive_buffer(&mut self) -> Option<BufferHandle>;

    /// Chain the segments of a received frame, without copying payload.
    ///
    /// `segments` is in ring order, first segment first. The returned frame
    /// handle is passed to [`CompletionSink::on_receive_complete`].
    fn link_receive_segments(&mut self, segments: &[BufferHandle]) -> FrameHandle;

    /// Release a transmitted frame's buffers.
    ///
    /// `handles` is the frame's original submission sequence; called only
    /// after every constituent descriptor's ownership reverted to software.
    fn free_transmit_buffers(&mut self, handles: &[BufferHandle]);

    /// Take back a buffer discarded during teardown or fault recovery.
    ///
    /// Distinct from the free/allocate callbacks so in-flight buffers
    /// thrown away by `stop()` are not double-counted against completed
    /// frames.
    fn reclaim_on_teardown(&mut self, handle: BufferHandle);
}

// =============================================================================
// Completion Sink
// =============================================================================

/// Receives the engine's completion and fault notifications.
///
/// Invoked from the deferred context that drives `poll()`, never from
/// `service_interrupt()`.
pub trait CompletionSink {
    /// A transmitted frame fully completed.
    ///
    /// `handles` is the frame's buffer sequence in submission order;
    /// `errors` aggregates the hardware error flags across its segments;
    /// `timestamp` is present only when the frame requested capture and the
    /// clock was running.
    fn on_transmit_complete(
        &mut self,
        handles: &[BufferHandle],
        errors: FrameErrors,
        timestamp: Option<Timestamp>,
    );

    /// A received frame was reassembled and linked.
    ///
    /// Delivered even when `errors` carries a fatal flag; the receiver
    /// decides whether to discard. `length` is the total payload byte count
    /// across segments.
    fn on_receive_complete(
        &mut self,
        frame: FrameHandle,
        length: usize,
        errors: FrameErrors,
        timestamp: Option<Timestamp>,
    );

    /// A fatal engine fault was detected; stop and re-initialize.
    fn on_error(&mut self, fault: Fault);
}

// =============================================================================
// Unit Tests
// =============================================================================
