//! Frame-level types shared by the transmit and receive pipelines.
//!
//! Buffers are never touched by this crate. Each one is represented by an
//! opaque [`BufferHandle`] minted by the application's buffer provider; the
//! engine only moves handles between descriptors and callbacks. Assembled
//! receive frames are likewise represented by an opaque [`FrameHandle`].

use crate::descriptor::ChecksumMode;

// =============================================================================
// Opaque Handles
// =============================================================================

/// Opaque token identifying one externally owned buffer.
///
/// Created by the buffer provider before a descriptor is handed to hardware
/// and consumed after ownership reverts to software. The engine never
/// interprets the contents, only the lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferHandle(u32);

impl BufferHandle {
    /// Create a handle from a raw provider token.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw provider token back.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Opaque token identifying one assembled receive frame.
///
/// Minted by the buffer provider's link callback when the segments of a
/// received frame are chained together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameHandle(u32);

impl FrameHandle {
    /// Create a handle from a raw provider token.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw provider token back.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

// =============================================================================
// Hardware Timestamp
// =============================================================================

/// Hardware-captured timestamp attached to a transmitted or received frame.
///
/// The raw 64-bit capture encodes seconds in the high word and nanoseconds in
/// the low word. A raw value of zero means the timestamping clock was not
/// running when the frame completed; it decodes to `None` so callers must
/// treat timestamps as optional even when the capability is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp {
    /// Seconds portion of the capture.
    pub seconds: u32,
    /// Nanoseconds portion of the capture.
    pub nanoseconds: u32,
}

impl Timestamp {
    /// Decode a raw descriptor capture. Zero means "not captured".
    #[must_use]
    pub const fn from_raw(raw: u64) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(Self {
                seconds: (raw >> 32) as u32,
                nanoseconds: raw as u32,
            })
        }
    }

    /// Encode back into the raw descriptor representation.
    #[must_use]
    pub const fn to_raw(self) -> u64 {
        ((self.seconds as u64) << 32) | (self.nanoseconds as u64)
    }
}

// =============================================================================
// Transmit Segments
// =============================================================================

/// One scatter-gather segment of an outgoing frame.
///
/// Maps onto a single descriptor. A segment carries either one buffer or a
/// split header/payload buffer pair (both slots of the same descriptor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxSegment {
    head: (BufferHandle, u32),
    tail: Option<(BufferHandle, u32)>,
}

impl TxSegment {
    /// Create a single-buffer segment.
    #[must_use]
    pub const fn new(buffer: BufferHandle, len: u32) -> Self {
        Self {
            head: (buffer, len),
            tail: None,
        }
    }

    /// Create a split segment: header and payload in separate buffers.
    #[must_use]
    pub const fn split(
        header: BufferHandle,
        header_len: u32,
        payload: BufferHandle,
        payload_len: u32,
    ) -> Self {
        Self {
            head: (header, header_len),
            tail: Some((payload, payload_len)),
        }
    }

    /// The primary (or only) buffer of this segment.
    #[must_use]
    pub const fn head(&self) -> (BufferHandle, u32) {
        self.head
    }

    /// The payload buffer of a split segment, if any.
    #[must_use]
    pub const fn tail(&self) -> Option<(BufferHandle, u32)> {
        self.tail
    }

    /// Total byte count carried by this segment.
    #[must_use]
    pub const fn total_len(&self) -> u32 {
        match self.tail {
            Some((_, tail_len)) => self.head.1 + tail_len,
            None => self.head.1,
        }
    }
}

// =============================================================================
// Transmit Options
// =============================================================================

/// Per-frame transmit options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxOptions {
    /// Capture a hardware timestamp when the frame completes.
    pub request_timestamp: bool,
    /// Checksum insertion override; `None` uses the engine default.
    pub checksum: Option<ChecksumMode>,
}

impl TxOptions {
    /// Create options with the engine defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            request_timestamp: false,
            checksum: None,
        }
    }

    /// Request a hardware timestamp for this frame.
    #[must_use]
    pub const fn with_timestamp(mut self) -> Self {
        self.request_timestamp = true;
        self
    }

    /// Override the checksum insertion mode for this frame.
    #[must_use]
    pub const fn with_checksum(mut self, mode: ChecksumMode) -> Self {
        self.checksum = Some(mode);
        self
    }
}

// =============================================================================
// Segment Run Scratch
// =============================================================================

/// Fixed-capacity handle accumulator for an in-progress frame run.
///
/// Used while reclaiming transmit frames and reassembling receive frames.
/// Overflow is the caller's corruption signal, not a panic.
pub(crate) struct SegmentRun<const CAP: usize> {
    handles: [BufferHandle; CAP],
    len: usize,
}

impl<const CAP: usize> SegmentRun<CAP> {
    pub(crate) const fn new() -> Self {
        Self {
            handles: [BufferHandle::new(0); CAP],
            len: 0,
        }
    }

    /// Append a handle; returns `false` when the run is full.
    pub(crate) fn push(&mut self, handle: BufferHandle) -> bool {
        if self.len == CAP {
            return false;
        }
        self.handles[self.len] = handle;
        self.len += 1;
        true
    }

    pub(crate) fn as_slice(&self) -> &[BufferHandle] {
        &self.handles[..self.len]
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
