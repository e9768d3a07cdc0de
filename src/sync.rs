//! ISR-safe engine sharing built on critical sections.
//!
//! The ring requires at-most-one-writer-at-a-time on its index state. When
//! an interrupt handler and a deferred context share one engine, wrap it in
//! [`SharedRingEngine`]: every access runs inside `critical_section::with()`,
//! masking interrupts for the duration of the closure so the deferred
//! operations cannot race the ISR's `service_interrupt()` step.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::driver::engine::RingEngine;
use crate::driver::hooks::{BufferProvider, CompletionSink};
use crate::hal::dma::DmaPort;

// =============================================================================
// Critical Section Cell
// =============================================================================

/// Cell providing interior mutability with critical section protection.
///
/// Combines `critical_section::Mutex` with `RefCell` for safe mutable access
/// from both normal code and interrupt handlers.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Execute a closure with exclusive mutable access.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow_ref_mut(cs);
            f(&mut value)
        })
    }

    /// Try to execute a closure, returning `None` if already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            self.inner
                .borrow(cs)
                .try_borrow_mut()
                .ok()
                .map(|mut value| f(&mut value))
        })
    }
}

// SAFETY: CriticalSectionCell uses critical sections to protect all access.
unsafe impl<T> Sync for CriticalSectionCell<T> {}

// =============================================================================
// Shared Ring Engine
// =============================================================================

/// ISR-safe engine wrapper using critical sections.
///
/// All access goes through `critical_section::with()`, disabling interrupts
/// for the duration of the closure.
///
/// # Example
///
/// ```ignore
/// static ENGINE: SharedRingEngine<Port, Pool, Stack, 8, 8> =
///     SharedRingEngine::new(RingEngine::new(Port::new(), Pool::new(), Stack::new()));
///
/// // ISR:
/// ENGINE.with(|engine| {
///     let _ = engine.service_interrupt();
/// });
///
/// // Deferred context:
/// ENGINE.with(|engine| {
///     engine.poll().ok();
/// });
/// ```
pub struct SharedRingEngine<DMA, P, S, const TX_N: usize, const RX_N: usize>
where
    DMA: DmaPort,
    P: BufferProvider,
    S: CompletionSink,
{
    inner: CriticalSectionCell<RingEngine<DMA, P, S, TX_N, RX_N>>,
}

impl<DMA, P, S, const TX_N: usize, const RX_N: usize> SharedRingEngine<DMA, P, S, TX_N, RX_N>
where
    DMA: DmaPort,
    P: BufferProvider,
    S: CompletionSink,
{
    /// Wrap an engine (const, suitable for static initialization when the
    /// collaborators are const-constructible).
    pub const fn new(engine: RingEngine<DMA, P, S, TX_N, RX_N>) -> Self {
        Self {
            inner: CriticalSectionCell::new(engine),
        }
    }

    /// Execute a closure with exclusive access to the engine.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut RingEngine<DMA, P, S, TX_N, RX_N>) -> R,
    {
        self.inner.with(f)
    }

    /// Try to execute a closure, returning `None` if already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut RingEngine<DMA, P, S, TX_N, RX_N>) -> R,
    {
        self.inner.try_with(f)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::config::State;
    use crate::testing::{MockDmaPort, MockProvider, RecordingSink, new_engine};

    type TestShared = SharedRingEngine<MockDmaPort, MockProvider, RecordingSink, 4, 4>;

    fn shared() -> TestShared {
        SharedRingEngine::new(new_engine::<4, 4>())
    }

    #[test]
    fn with_returns_closure_value() {
        let engine = shared();
        assert_eq!(engine.with(|_| 42), 42);
    }

    #[test]
    fn with_can_read_state() {
        let engine = shared();
        assert_eq!(engine.with(|e| e.state()), State::Uninitialized);
    }

    #[test]
    fn try_with_returns_some_when_free() {
        let engine = shared();
        assert_eq!(engine.try_with(|_| 123), Some(123));
    }

    #[test]
    fn sequential_with_calls() {
        let engine = shared();
        let r1 = engine.with(|_| 1);
        let r2 = engine.try_with(|_| 2);
        let r3 = engine.with(|_| 3);

        assert_eq!((r1, r2, r3), (1, Some(2), 3));
    }

    #[test]
    fn critical_section_cell_mutates_in_place() {
        let cell = CriticalSectionCell::new(0u32);
        cell.with(|v| *v += 5);
        assert_eq!(cell.with(|v| *v), 5);
    }
}
