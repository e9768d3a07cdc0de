//! Interrupt event parsing.
//!
//! This module provides the [`InterruptStatus`] structure for parsing the
//! raw event word a [`DmaPort`](crate::hal::dma::DmaPort) reports.

use crate::hal::dma::{
    EV_BUS_ERROR, EV_RX_COMPLETE, EV_RX_OVERFLOW, EV_RX_RING_STARVED, EV_RX_STOPPED,
    EV_TX_COMPLETE, EV_TX_RING_EMPTY, EV_TX_STOPPED, EV_TX_UNDERFLOW,
};

// =============================================================================
// Interrupt Status
// =============================================================================

/// Interrupt events parsed from the DMA port's event word.
///
/// Returned by `service_interrupt()` so an ISR can decide what to defer
/// without touching raw bits.
///
/// # Example
///
/// ```ignore
/// let status = engine.service_interrupt();
/// if status.rx_complete {
///     // Wake the deferred context; it will call poll()
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptStatus {
    /// TX complete - a frame finished transmitting
    pub tx_complete: bool,
    /// TX stopped - the TX engine halted
    pub tx_stopped: bool,
    /// TX ring empty - no hardware-owned TX descriptors remain
    pub tx_ring_empty: bool,
    /// TX underflow - the TX FIFO ran dry
    pub tx_underflow: bool,
    /// RX complete - a frame landed in the RX ring
    pub rx_complete: bool,
    /// RX stopped - the RX engine halted
    pub rx_stopped: bool,
    /// RX ring starved - no hardware-owned RX descriptors remain
    pub rx_ring_starved: bool,
    /// RX overflow - the RX FIFO overflowed
    pub rx_overflow: bool,
    /// Fatal bus error - unrecoverable; stop and re-initialize
    pub bus_error: bool,
}

impl InterruptStatus {
    /// Create from a raw event word (`EV_*` bits).
    #[inline]
    #[must_use]
    pub fn from_raw(events: u32) -> Self {
        Self {
            tx_complete: (events & EV_TX_COMPLETE) != 0,
            tx_stopped: (events & EV_TX_STOPPED) != 0,
            tx_ring_empty: (events & EV_TX_RING_EMPTY) != 0,
            tx_underflow: (events & EV_TX_UNDERFLOW) != 0,
            rx_complete: (events & EV_RX_COMPLETE) != 0,
            rx_stopped: (events & EV_RX_STOPPED) != 0,
            rx_ring_starved: (events & EV_RX_RING_STARVED) != 0,
            rx_overflow: (events & EV_RX_OVERFLOW) != 0,
            bus_error: (events & EV_BUS_ERROR) != 0,
        }
    }

    /// Convert back to the raw event word.
    #[inline]
    #[must_use]
    pub fn to_raw(&self) -> u32 {
        let mut val = 0u32;
        if self.tx_complete {
            val |= EV_TX_COMPLETE;
        }
        if self.tx_stopped {
            val |= EV_TX_STOPPED;
        }
        if self.tx_ring_empty {
            val |= EV_TX_RING_EMPTY;
        }
        if self.tx_underflow {
            val |= EV_TX_UNDERFLOW;
        }
        if self.rx_complete {
            val |= EV_RX_COMPLETE;
        }
        if self.rx_stopped {
            val |= EV_RX_STOPPED;
        }
        if self.rx_ring_starved {
            val |= EV_RX_RING_STARVED;
        }
        if self.rx_overflow {
            val |= EV_RX_OVERFLOW;
        }
        if self.bus_error {
            val |= EV_BUS_ERROR;
        }
        val
    }

    /// Check if any event occurred.
    #[inline]
    #[must_use]
    pub fn any(&self) -> bool {
        self.tx_complete
            || self.tx_stopped
            || self.tx_ring_empty
            || self.tx_underflow
            || self.rx_complete
            || self.rx_stopped
            || self.rx_ring_starved
            || self.rx_overflow
            || self.bus_error
    }

    /// Check if an error event occurred.
    #[inline]
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.tx_underflow || self.rx_overflow || self.bus_error
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
