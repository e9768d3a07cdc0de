//! Ethernet MAC DMA Descriptor-Ring Engine
//!
//! A `no_std`, `no_alloc` implementation of the descriptor-ring
//! transmit/receive pipeline shared by DWMAC-style Ethernet controllers:
//! the zero-copy producer/consumer protocol between a software driver and
//! an autonomous DMA engine.
//!
//! # Architecture
//!
//! The crate is organized around the descriptor life cycle:
//!
//! 1. **Descriptor Layer** ([`descriptor`]): One ring slot with its buffer
//!    handles, control flags, completion status, and the atomic ownership
//!    handshake
//! 2. **Ring Layer** ([`ring`]): The fixed-capacity circular buffer with
//!    head/tail cursors and the in-flight accounting invariant
//! 3. **Driver Layer** ([`driver`]): The [`RingEngine`] with transmit
//!    scatter-gather mapping, receive reassembly, replenishment, polling
//!    and interrupt entry points
//! 4. **HAL Layer** ([`hal`]): Narrow traits for the external MAC/DMA
//!    collaborator and the MDIO bus
//!
//! Hardware-specific concerns (register layouts, clock trees, pin muxing,
//! board bring-up) stay outside: a port implements [`DmaPort`] over the
//! target's register block, and the clock/reset provider must be ready
//! before ring initialization.
//!
//! # Data Flow
//!
//! Application frame → [`RingEngine::transmit`] writes N descriptors → the
//! last-written slot's ownership flips to hardware first, the frame's first
//! slot last → the DMA engine consumes asynchronously → on completion
//! ownership reverts → [`RingEngine::poll`] reclaims in ring order →
//! [`CompletionSink`] callbacks fire and the [`BufferProvider`] reclaims or
//! replenishes buffers. The payload is never copied by the engine.
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for public types and driver logging
//! - `critical-section`: Enable the ISR-safe `SharedRingEngine` wrapper
//!
//! # Example
//!
//! ```ignore
//! use eth_dma_ring::{EngineConfig, RingEngine, TxOptions, TxSegment};
//!
//! // Port, pool and stack are the application's DmaPort, BufferProvider
//! // and CompletionSink implementations.
//! let mut engine: RingEngine<Port, Pool, Stack, 8, 8> =
//!     RingEngine::new(port, pool, stack);
//!
//! engine.init(EngineConfig::new().with_max_frame_segments(4))?;
//! engine.start()?;
//!
//! let frame = [TxSegment::new(buffer, 1514)];
//! engine.transmit(&frame, TxOptions::new())?;
//!
//! loop {
//!     let status = engine.poll()?;
//!     if status.tx_frames > 0 {
//!         break;
//!     }
//! }
//! ```
//!
//! # Concurrency Model
//!
//! The engine has no internal scheduling. Exactly one context may drive the
//! mutating operations at a time: a polling task, or an interrupt handler
//! that calls only [`RingEngine::service_interrupt`] and defers the rest to
//! a non-interrupt context. The ownership handoff itself uses
//! release/acquire atomics, since the descriptor memory is concurrently
//! mutated by a non-CPU agent.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod constants;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod frame;
pub mod hal;
pub mod ring;

#[cfg(feature = "critical-section")]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use descriptor::{ChecksumMode, Descriptor, FrameErrors, Ownership, VolatileCell};
pub use driver::config::{EngineConfig, State};
pub use driver::engine::{EngineStats, PollStatus, RingEngine};
pub use driver::hooks::{BufferProvider, CompletionSink, Fault};
pub use driver::interrupt::InterruptStatus;
pub use error::{
    ConfigError, ConfigResult, Error, IoError, IoResult, Result, RingError, RingResult,
};
pub use frame::{BufferHandle, FrameHandle, Timestamp, TxOptions, TxSegment};
pub use hal::dma::DmaPort;
pub use hal::mdio::MdioBus;
pub use ring::DescriptorRing;

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::{CriticalSectionCell, SharedRingEngine};
