//! Receive pipeline.
//!
//! Keeps the receive ring populated with hardware-owned empty buffers and,
//! on completion, reassembles possibly-chained segments into one logical
//! frame without copying payload: the segments' buffer handles are chained
//! through the provider's link callback and the frame handle is delivered
//! to the sink.

use crate::descriptor::FrameErrors;
use crate::error::{ConfigError, Result, RingError};
use crate::hal::dma::DmaPort;

use super::engine::RingEngine;
use super::hooks::{BufferProvider, CompletionSink, Fault};

impl<DMA, P, S, const TX_N: usize, const RX_N: usize> RingEngine<DMA, P, S, TX_N, RX_N>
where
    DMA: DmaPort,
    P: BufferProvider,
    S: CompletionSink,
{
    // =========================================================================
    // Replenishment
    // =========================================================================

    /// Arm every free receive slot with a fresh buffer.
    ///
    /// Idempotent: a second pass with no intervening consumption allocates
    /// nothing. A dry provider stops the pass early; the affected slots are
    /// retried on the next call. An entirely unarmed ring drops incoming
    /// frames at the hardware level, which is an operational hazard rather
    /// than a software error, so it is not an error return here.
    ///
    /// Returns the number of slots armed.
    pub(crate) fn replenish_rx(&mut self) -> Result<usize> {
        let mut armed = 0usize;

        while !self.rx_ring.is_full() {
            let Some(handle) = self.provider.allocate_receive_buffer() else {
                #[cfg(feature = "defmt")]
                if self.rx_ring.is_empty() {
                    defmt::warn!("rx ring starved: buffer provider is dry");
                }
                break;
            };

            {
                let slot = self.rx_ring.next_free_slot()?;
                slot.arm_receive(handle, self.config.rx_buffer_capacity);
                slot.publish();
            }
            self.rx_ring.advance_head();
            armed += 1;
        }

        if armed > 0 {
            self.dma.kick_rx();
        }
        Ok(armed)
    }

    /// Free receive slots currently awaiting a buffer.
    pub fn rx_free_slots(&self) -> usize {
        self.rx_ring.free_slots()
    }

    // =========================================================================
    // Consumption
    // =========================================================================

    /// Reclaim completed receive descriptors and deliver assembled frames.
    ///
    /// Segments between a first-segment and the next last-segment slot are
    /// accumulated in ring order; error flags are ORed and produced lengths
    /// summed across the run. On the last segment the provider links the
    /// handles into a frame and the sink is notified. Frames carrying fatal
    /// per-frame errors are still delivered, tagged through their error
    /// flags, so the receiver decides discard policy.
    ///
    /// Returns the number of frames delivered.
    ///
    /// # Errors
    /// - `ChainCorrupt` - segment framing violated the protocol
    /// - `SegmentLimitExceeded` - a frame spans more slots than the
    ///   configured maximum; the ring must be reset (`stop` + `init`)
    pub(crate) fn consume_rx_completed(&mut self) -> Result<usize> {
        let mut frames = 0usize;

        loop {
            let (buffer, first, last, produced, errors, timestamp) = {
                let Some(slot) = self.rx_ring.reclaim_next_if_ready() else {
                    break;
                };
                (
                    slot.primary_buffer(),
                    slot.is_first_segment(),
                    slot.is_last_segment(),
                    slot.produced_len(),
                    slot.errors(),
                    slot.timestamp(),
                )
            };

            let Some((handle, _)) = buffer else {
                // An armed slot always carries a buffer.
                return self.fail_rx_chain(None, Fault::ChainCorrupt);
            };

            if first != self.rx_run.is_empty() {
                // Either a first segment landed while a run was open, or a
                // continuation arrived with no frame in progress.
                return self.fail_rx_chain(Some(handle), Fault::ChainCorrupt);
            }

            if self.rx_run.len() == self.config.max_frame_segments {
                // Replenishment outpaced consumption and the frame spans
                // more slots than configured; no partial recovery.
                return self.fail_rx_chain(Some(handle), Fault::SegmentLimitExceeded);
            }

            let _ = self.rx_run.push(handle);
            self.rx_run_errors = self.rx_run_errors.merge(errors);
            self.rx_run_len += produced;

            if last {
                let ts = if self.config.rx_timestamp {
                    timestamp
                } else {
                    None
                };
                let frame = self.provider.link_receive_segments(self.rx_run.as_slice());
                self.sink
                    .on_receive_complete(frame, self.rx_run_len, self.rx_run_errors, ts);

                self.rx_run.clear();
                self.rx_run_errors = FrameErrors::NONE;
                self.rx_run_len = 0;
                frames += 1;
                self.stats.rx_frames_delivered = self.stats.rx_frames_delivered.wrapping_add(1);
            }
        }

        Ok(frames)
    }

    /// Discard the open run (and the offending slot's buffer) through the
    /// teardown path, then report the fault.
    fn fail_rx_chain(
        &mut self,
        offending: Option<crate::frame::BufferHandle>,
        fault: Fault,
    ) -> Result<usize> {
        if let Some(handle) = offending {
            self.provider.reclaim_on_teardown(handle);
        }
        for &handle in self.rx_run.as_slice() {
            self.provider.reclaim_on_teardown(handle);
        }
        self.rx_run.clear();
        self.rx_run_errors = FrameErrors::NONE;
        self.rx_run_len = 0;

        #[cfg(feature = "defmt")]
        defmt::warn!("rx fault: {}", fault);

        self.sink.on_error(fault);
        match fault {
            Fault::SegmentLimitExceeded => Err(ConfigError::SegmentLimitExceeded.into()),
            _ => Err(RingError::ChainCorrupt.into()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
