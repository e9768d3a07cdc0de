//! Core ring engine implementation.
//!
//! This module contains the main [`RingEngine`] structure and its lifecycle
//! operations:
//!
//! - Initialization and configuration
//! - Start/stop control with forced teardown reclaim
//! - The `poll()` entry point that drives reclaim, reassembly, and
//!   replenishment in one call
//! - The minimal ISR step `service_interrupt()`
//! - MDIO/PHY register access for link bring-up
//!
//! Transmit operations live in the [`tx`](super::tx) module, receive
//! operations in [`rx`](super::rx).
//!
//! # Context rules
//!
//! The engine has no internal scheduling. Exactly one context may drive the
//! mutating operations at a time: either a single polling thread/task, or an
//! interrupt handler that calls only `service_interrupt()` and defers
//! everything else to a non-interrupt context. When both contexts touch one
//! engine, wrap it in `SharedRingEngine` (feature `critical-section`) so the
//! deferred operations run with the device's interrupt masked.

use crate::descriptor::FrameErrors;
use crate::error::{ConfigError, IoError, Result, RingError};
use crate::frame::SegmentRun;
use crate::constants::{MAX_FRAME_BUFFERS, MAX_SEGMENTS_PER_FRAME};
use crate::hal::dma::DmaPort;
use crate::hal::mdio::MdioBus;
use crate::ring::DescriptorRing;

use super::config::{EngineConfig, State};
use super::hooks::{BufferProvider, CompletionSink, Fault};
use super::interrupt::InterruptStatus;

// =============================================================================
// Status Types
// =============================================================================

/// Work performed by one `poll()` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollStatus {
    /// Transmit frames reclaimed and reported
    pub tx_frames: usize,
    /// Receive frames reassembled and delivered
    pub rx_frames: usize,
    /// Receive slots re-armed with fresh buffers
    pub rx_replenished: usize,
}

/// Cumulative engine counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineStats {
    /// Frames accepted by `transmit`
    pub tx_frames_submitted: u32,
    /// Frames fully reclaimed and reported complete
    pub tx_frames_completed: u32,
    /// Frames reassembled and delivered to the sink
    pub rx_frames_delivered: u32,
}

// =============================================================================
// Ring Engine
// =============================================================================

/// Descriptor-ring transmit/receive engine.
///
/// Owns one ring per direction plus the three collaborators: the DMA port
/// (hardware), the buffer provider, and the completion sink. All memory is
/// statically sized through const generics, so an engine can live in a
/// `static`.
///
/// # Type Parameters
/// * `DMA` - external MAC/DMA collaborator
/// * `P` - buffer provider
/// * `S` - completion sink
/// * `TX_N` - transmit ring capacity
/// * `RX_N` - receive ring capacity
///
/// # Example
/// ```ignore
/// let mut engine: RingEngine<MyPort, MyPool, MyStack, 8, 8> =
///     RingEngine::new(port, pool, stack);
///
/// engine.init(EngineConfig::new())?;
/// engine.start()?;
///
/// loop {
///     let status = engine.poll()?;
///     // ...
/// }
/// ```
pub struct RingEngine<DMA, P, S, const TX_N: usize, const RX_N: usize>
where
    DMA: DmaPort,
    P: BufferProvider,
    S: CompletionSink,
{
    /// External MAC/DMA collaborator
    pub(crate) dma: DMA,
    /// Buffer provider
    pub(crate) provider: P,
    /// Completion sink
    pub(crate) sink: S,
    /// Active configuration
    pub(crate) config: EngineConfig,
    /// Lifecycle state
    state: State,
    /// Transmit descriptor ring
    pub(crate) tx_ring: DescriptorRing<TX_N>,
    /// Receive descriptor ring
    pub(crate) rx_ring: DescriptorRing<RX_N>,
    /// Handles of the transmit frame currently being reclaimed
    pub(crate) tx_run: SegmentRun<MAX_FRAME_BUFFERS>,
    /// Aggregated errors of the transmit frame being reclaimed
    pub(crate) tx_run_errors: FrameErrors,
    /// Handles of the receive frame currently being reassembled
    pub(crate) rx_run: SegmentRun<MAX_SEGMENTS_PER_FRAME>,
    /// Aggregated errors of the receive frame being reassembled
    pub(crate) rx_run_errors: FrameErrors,
    /// Byte count of the receive frame being reassembled
    pub(crate) rx_run_len: usize,
    /// Event bits latched by `service_interrupt`, consumed by `poll`
    pub(crate) latched_events: u32,
    /// Cumulative counters
    pub(crate) stats: EngineStats,
}

impl<DMA, P, S, const TX_N: usize, const RX_N: usize> RingEngine<DMA, P, S, TX_N, RX_N>
where
    DMA: DmaPort,
    P: BufferProvider,
    S: CompletionSink,
{
    /// Create an engine in the `Uninitialized` state.
    ///
    /// Const, suitable for static initialization when the collaborators are
    /// const-constructible.
    pub const fn new(dma: DMA, provider: P, sink: S) -> Self {
        Self {
            dma,
            provider,
            sink,
            config: EngineConfig::new(),
            state: State::Uninitialized,
            tx_ring: DescriptorRing::new(),
            rx_ring: DescriptorRing::new(),
            tx_run: SegmentRun::new(),
            tx_run_errors: FrameErrors::NONE,
            rx_run: SegmentRun::new(),
            rx_run_errors: FrameErrors::NONE,
            rx_run_len: 0,
            latched_events: 0,
            stats: EngineStats {
                tx_frames_submitted: 0,
                tx_frames_completed: 0,
                rx_frames_delivered: 0,
            },
        }
    }

    // =========================================================================
    // State Accessors
    // =========================================================================

    /// Get the current state.
    #[inline(always)]
    pub fn state(&self) -> State {
        self.state
    }

    /// Get the active configuration.
    #[inline(always)]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the cumulative counters.
    #[inline(always)]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Transmit descriptors currently in flight.
    pub fn tx_in_flight(&self) -> usize {
        self.tx_ring.in_flight()
    }

    /// Receive descriptors currently armed or pending reclaim.
    pub fn rx_in_flight(&self) -> usize {
        self.rx_ring.in_flight()
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize the engine with the given configuration.
    ///
    /// Validates the configuration, resets both rings, and latches their
    /// base addresses with the DMA port. The caller must have brought the
    /// MAC's clock/reset provider up before this call.
    ///
    /// The port holds the ring base addresses from here on, so the engine
    /// must not move between `init()` and `stop()`; keep it in a `static`
    /// or another fixed location for the lifetime of the device.
    ///
    /// Permitted from `Uninitialized` (first bring-up) and `Stopped`
    /// (rebuild after a fatal fault).
    ///
    /// # Errors
    /// - `AlreadyInitialized` - engine is initialized or running
    /// - `CapacityInvalid` - a ring capacity is zero or above the maximum
    /// - `InvalidConfig` / `InvalidPhyAddress` - bad configuration values
    pub fn init(&mut self, config: EngineConfig) -> Result<()> {
        match self.state {
            State::Uninitialized | State::Stopped => {}
            State::Initialized | State::Running => {
                return Err(ConfigError::AlreadyInitialized.into());
            }
        }

        config.validate()?;
        self.config = config;

        self.tx_ring.initialize()?;
        self.rx_ring.initialize()?;

        self.dma.attach_tx_ring(self.tx_ring.base_ptr(), TX_N);
        self.dma.attach_rx_ring(self.rx_ring.base_ptr(), RX_N);

        self.tx_run.clear();
        self.tx_run_errors = FrameErrors::NONE;
        self.rx_run.clear();
        self.rx_run_errors = FrameErrors::NONE;
        self.rx_run_len = 0;
        self.latched_events = 0;

        self.state = State::Initialized;

        #[cfg(feature = "defmt")]
        defmt::info!("ring engine initialized: {} tx, {} rx slots", TX_N, RX_N);

        Ok(())
    }

    // =========================================================================
    // Start / Stop
    // =========================================================================

    /// Start the engine.
    ///
    /// Primes the receive ring with buffers from the provider, then starts
    /// the DMA port. A provider that cannot fill a single slot leaves the
    /// receive side starved; incoming frames drop in hardware until a later
    /// replenish succeeds.
    ///
    /// # Errors
    /// - `InvalidState` - engine is not initialized
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            State::Initialized | State::Stopped => {}
            State::Running => return Ok(()),
            State::Uninitialized => return Err(IoError::InvalidState.into()),
        }

        self.replenish_rx()?;
        self.dma.start();
        self.state = State::Running;

        #[cfg(feature = "defmt")]
        defmt::info!("ring engine started");

        Ok(())
    }

    /// Stop the engine and discard in-flight work.
    ///
    /// Halts the DMA port first, then forcibly reclaims every in-flight
    /// descriptor on both rings. Discarded buffers are returned through
    /// `BufferProvider::reclaim_on_teardown`, never the normal
    /// free/allocate callbacks, so the provider's accounting stays intact.
    /// No completion notifications are raised for discarded frames.
    ///
    /// # Errors
    /// - `InvalidState` - engine is not running
    pub fn stop(&mut self) -> Result<()> {
        if self.state != State::Running {
            return Err(IoError::InvalidState.into());
        }

        self.dma.stop();

        let provider = &mut self.provider;
        self.tx_ring.force_reclaim_all(|slot| {
            if let Some((handle, _)) = slot.primary_buffer() {
                provider.reclaim_on_teardown(handle);
            }
            if let Some((handle, _)) = slot.secondary_buffer() {
                provider.reclaim_on_teardown(handle);
            }
        });
        self.rx_ring.force_reclaim_all(|slot| {
            if let Some((handle, _)) = slot.primary_buffer() {
                provider.reclaim_on_teardown(handle);
            }
        });

        // Partially accumulated frame runs are in-flight work too.
        for &handle in self.tx_run.as_slice() {
            self.provider.reclaim_on_teardown(handle);
        }
        self.tx_run.clear();
        self.tx_run_errors = FrameErrors::NONE;

        for &handle in self.rx_run.as_slice() {
            self.provider.reclaim_on_teardown(handle);
        }
        self.rx_run.clear();
        self.rx_run_errors = FrameErrors::NONE;
        self.rx_run_len = 0;

        self.latched_events = 0;
        self.state = State::Stopped;

        #[cfg(feature = "defmt")]
        defmt::info!("ring engine stopped");

        Ok(())
    }

    // =========================================================================
    // Polling / Interrupt Entry Points
    // =========================================================================

    /// Drive one full service pass.
    ///
    /// Delivers any latched fatal fault, reclaims completed transmit
    /// descriptors, reassembles and delivers completed receive frames, then
    /// re-arms free receive slots. This is the deferred counterpart of
    /// `service_interrupt()` and the whole loop body for polling-mode use.
    ///
    /// # Errors
    /// - `InvalidState` - engine is not running
    /// - `BusError` - the port reported a fatal bus error (also raised on
    ///   the sink); stop and re-initialize
    /// - `ChainCorrupt` / `SegmentLimitExceeded` - protocol violations
    ///   detected during reclaim
    pub fn poll(&mut self) -> Result<PollStatus> {
        if self.state != State::Running {
            return Err(IoError::InvalidState.into());
        }

        let events = self.latched_events | self.dma.pending_events();
        self.latched_events = 0;

        if InterruptStatus::from_raw(events).bus_error {
            #[cfg(feature = "defmt")]
            defmt::warn!("fatal DMA bus error");

            self.sink.on_error(Fault::BusError);
            return Err(RingError::BusError.into());
        }

        let tx_frames = self.reclaim_tx_completed()?;
        let rx_frames = self.consume_rx_completed()?;
        let rx_replenished = self.replenish_rx()?;

        Ok(PollStatus {
            tx_frames,
            rx_frames,
            rx_replenished,
        })
    }

    /// Minimal ISR-safe step: latch pending events for the next `poll()`.
    ///
    /// Reads and clears the port's event word and returns the parsed status
    /// so the handler can decide what to wake. No callbacks are invoked
    /// here; all completion work is deferred.
    pub fn service_interrupt(&mut self) -> InterruptStatus {
        let events = self.dma.pending_events();
        self.latched_events |= events;
        InterruptStatus::from_raw(events)
    }

    // =========================================================================
    // MDIO / PHY Interface
    // =========================================================================

    /// Read a PHY register via the MDIO bus at the configured PHY address.
    ///
    /// Used once at link bring-up; the ring protocol itself never touches
    /// the PHY.
    ///
    /// # Errors
    /// - `PhyError` - the bus transaction failed
    pub fn read_phy_register<M: MdioBus>(&mut self, mdio: &mut M, reg: u8) -> Result<u16> {
        let value = mdio.read(self.config.phy_address, reg)?;
        Ok(value)
    }

    /// Write a PHY register via the MDIO bus at the configured PHY address.
    ///
    /// # Errors
    /// - `PhyError` - the bus transaction failed
    pub fn write_phy_register<M: MdioBus>(
        &mut self,
        mdio: &mut M,
        reg: u8,
        value: u16,
    ) -> Result<()> {
        mdio.write(self.config.phy_address, reg, value)?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
