//! Shared driver constants.
//!
//! Limits that stand in for the hardware-imposed ring constraints (base
//! address alignment and index field width) plus the crate-wide defaults
//! used by [`EngineConfig`](crate::driver::config::EngineConfig).

/// Maximum descriptor count per ring.
///
/// Stands in for the index-width and base-alignment ceiling a real MAC
/// imposes on its descriptor list registers.
pub const MAX_RING_CAPACITY: usize = 1024;

/// Hard upper bound on descriptors per frame.
///
/// Sizes the fixed reassembly scratch; the per-frame limit enforced at
/// runtime is `EngineConfig::max_frame_segments`, which may not exceed this.
pub const MAX_SEGMENTS_PER_FRAME: usize = 16;

/// Hard upper bound on buffer handles per frame.
///
/// Twice the segment bound: every transmit segment may carry a split
/// header/payload buffer pair.
pub const MAX_FRAME_BUFFERS: usize = 2 * MAX_SEGMENTS_PER_FRAME;

/// Default per-frame segment limit.
pub const DEFAULT_MAX_FRAME_SEGMENTS: usize = 8;

/// Default capacity (in bytes) advertised to hardware for each receive buffer.
pub const DEFAULT_RX_BUFFER_CAPACITY: u32 = 1600;

/// Default PHY address used for MDIO access at link bring-up.
pub const DEFAULT_PHY_ADDRESS: u8 = 0;

/// Poll pacing for the blocking transmit helper, in microseconds.
pub const BLOCKING_POLL_INTERVAL_US: u32 = 10;
