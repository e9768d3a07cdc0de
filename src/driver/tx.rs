//! Transmit pipeline.
//!
//! Maps an outgoing frame (a scatter-gather list of [`TxSegment`]s) onto a
//! run of ring slots, hands the run to hardware in the safe publish order,
//! and reclaims completed slots back into completion notifications.

use embedded_hal::delay::DelayNs;

use crate::constants::BLOCKING_POLL_INTERVAL_US;
use crate::descriptor::{
    DESC_FIRST_SEGMENT, DESC_INTERRUPT_ON_COMPLETE, DESC_LAST_SEGMENT, DESC_TIMESTAMP_EN,
    FrameErrors,
};
use crate::error::{ConfigError, IoError, Result, RingError};
use crate::frame::{BufferHandle, TxOptions, TxSegment};
use crate::hal::dma::DmaPort;

use super::config::State;
use super::engine::RingEngine;
use super::hooks::{BufferProvider, CompletionSink, Fault};

impl<DMA, P, S, const TX_N: usize, const RX_N: usize> RingEngine<DMA, P, S, TX_N, RX_N>
where
    DMA: DmaPort,
    P: BufferProvider,
    S: CompletionSink,
{
    // =========================================================================
    // Submission
    // =========================================================================

    /// Submit a frame for transmission.
    ///
    /// Each segment maps onto one ring slot. The slots are populated in
    /// order and handed to hardware as they are written, except the first:
    /// its ownership flips last, after every other slot in the frame is
    /// fully populated, so the engine never starts reading a partially
    /// written chain. Returns the number of slots consumed.
    ///
    /// Buffers stay owned by the caller's provider until the completion
    /// callback frees them; the payload is never copied.
    ///
    /// # Errors
    /// - `InvalidState` - engine is not running
    /// - `InvalidLength` - empty segment list or zero-length segment
    /// - `SegmentLimitExceeded` - more segments than the configured maximum
    /// - `Full` - not enough free slots; retry after a completion. No slot
    ///   is touched in this case.
    pub fn transmit(&mut self, segments: &[TxSegment], options: TxOptions) -> Result<usize> {
        if self.state() != State::Running {
            return Err(IoError::InvalidState.into());
        }
        if segments.is_empty() {
            return Err(RingError::InvalidLength.into());
        }
        if segments.iter().any(|seg| seg.total_len() == 0) {
            return Err(RingError::InvalidLength.into());
        }
        if segments.len() > self.config.max_frame_segments {
            return Err(ConfigError::SegmentLimitExceeded.into());
        }
        if self.tx_ring.free_slots() < segments.len() {
            return Err(RingError::Full.into());
        }

        let count = segments.len();
        let first_index = self.tx_ring.head_index();

        for (i, segment) in segments.iter().enumerate() {
            {
                let slot = self.tx_ring.next_free_slot()?;
                slot.clear();

                let (buffer, len) = segment.head();
                slot.set_primary_buffer(buffer, len);
                if let Some((buffer, len)) = segment.tail() {
                    slot.set_secondary_buffer(buffer, len);
                }

                let mut flags = 0;
                if i == 0 {
                    flags |= DESC_FIRST_SEGMENT;
                    flags |= options.checksum.unwrap_or(self.config.checksum).to_bits();
                }
                if i + 1 == count {
                    flags |= DESC_LAST_SEGMENT | DESC_INTERRUPT_ON_COMPLETE;
                    if options.request_timestamp {
                        flags |= DESC_TIMESTAMP_EN;
                    }
                }
                slot.set_flags(flags);

                if i != 0 {
                    slot.publish();
                }
            }
            self.tx_ring.advance_head();
        }

        // First descriptor last: only now may the engine see the chain.
        self.tx_ring.slot(first_index).publish();
        self.dma.kick_tx();

        self.stats.tx_frames_submitted = self.stats.tx_frames_submitted.wrapping_add(1);
        Ok(count)
    }

    /// Submit a frame and busy-poll until it completes.
    ///
    /// Paces the reclaim polling with `delay` and gives up after
    /// `timeout_us` microseconds. On timeout the frame is NOT forcibly
    /// reclaimed: it may still complete later, so the caller must not
    /// resubmit the same buffers until a subsequent reclaim frees them.
    ///
    /// # Errors
    /// - everything `transmit` returns
    /// - `Timeout` - the frame did not complete within `timeout_us`
    pub fn transmit_blocking<D: DelayNs>(
        &mut self,
        segments: &[TxSegment],
        options: TxOptions,
        delay: &mut D,
        timeout_us: u32,
    ) -> Result<()> {
        self.transmit(segments, options)?;
        let target = self.stats().tx_frames_submitted;

        let mut elapsed = 0u32;
        loop {
            self.reclaim_tx_completed()?;
            // Reclaim is strictly in order, so our frame is done once the
            // completed count catches up with the submission count.
            if self.stats().tx_frames_completed >= target {
                return Ok(());
            }
            if elapsed >= timeout_us {
                return Err(IoError::Timeout.into());
            }
            delay.delay_us(BLOCKING_POLL_INTERVAL_US);
            elapsed = elapsed.saturating_add(BLOCKING_POLL_INTERVAL_US);
        }
    }

    /// Free transmit slots currently available.
    pub fn tx_free_slots(&self) -> usize {
        self.tx_ring.free_slots()
    }

    // =========================================================================
    // Reclaim
    // =========================================================================

    /// Reclaim completed transmit descriptors.
    ///
    /// Walks the ring tail-first, accumulating each frame's buffer handles
    /// and ORing its error flags. When a last-segment slot reclaims, the
    /// sink is notified (with the captured timestamp if the frame requested
    /// one) and the provider's free callback receives the frame's original
    /// handle sequence. Returns the number of frames completed.
    pub(crate) fn reclaim_tx_completed(&mut self) -> Result<usize> {
        let mut frames = 0usize;

        loop {
            let (primary, secondary, last, wants_ts, errors, timestamp) = {
                let Some(slot) = self.tx_ring.reclaim_next_if_ready() else {
                    break;
                };
                (
                    slot.primary_buffer(),
                    slot.secondary_buffer(),
                    slot.is_last_segment(),
                    slot.wants_timestamp(),
                    slot.errors(),
                    slot.timestamp(),
                )
            };

            self.tx_run_errors = self.tx_run_errors.merge(errors);

            for (handle, _) in [primary, secondary].into_iter().flatten() {
                if !self.tx_run.push(handle) {
                    return self.fail_tx_chain(handle);
                }
            }

            if last {
                let ts = if wants_ts { timestamp } else { None };
                self.sink
                    .on_transmit_complete(self.tx_run.as_slice(), self.tx_run_errors, ts);
                self.provider.free_transmit_buffers(self.tx_run.as_slice());
                self.tx_run.clear();
                self.tx_run_errors = FrameErrors::NONE;
                frames += 1;
                self.stats.tx_frames_completed = self.stats.tx_frames_completed.wrapping_add(1);
            }
        }

        Ok(frames)
    }

    /// A reclaim run overflowed without seeing a last segment: the chain is
    /// corrupt. Discard everything accumulated and report the fault.
    fn fail_tx_chain(&mut self, overflow: BufferHandle) -> Result<usize> {
        self.provider.reclaim_on_teardown(overflow);
        for &handle in self.tx_run.as_slice() {
            self.provider.reclaim_on_teardown(handle);
        }
        self.tx_run.clear();
        self.tx_run_errors = FrameErrors::NONE;

        self.sink.on_error(Fault::ChainCorrupt);
        Err(RingError::ChainCorrupt.into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
