//! Core driver components for the descriptor-ring engine.
//!
//! This module contains the building blocks for configuring and operating
//! the transmit/receive pipelines:
//!
//! - [`config`] - Configuration types and builder patterns
//! - [`engine`] - The main [`RingEngine`](engine::RingEngine) implementation
//! - [`hooks`] - Capability interfaces (buffer provider, completion sink)
//! - [`interrupt`] - Interrupt event parsing
//! - [`tx`] / [`rx`] - The transmit and receive pipelines
//!
//! # Example
//!
//! ```ignore
//! use eth_dma_ring::driver::{EngineConfig, RingEngine};
//!
//! let config = EngineConfig::new().with_max_frame_segments(4);
//! ```

// Submodules
pub mod config;
pub mod engine;
pub mod hooks;
pub mod interrupt;
pub mod rx;
pub mod tx;

// Re-exports for convenience
pub use config::{EngineConfig, State};
pub use engine::{EngineStats, PollStatus, RingEngine};
pub use hooks::{BufferProvider, CompletionSink, Fault};
pub use interrupt::InterruptStatus;
