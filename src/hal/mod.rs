//! Hardware abstraction for the external MAC/DMA collaborator.
//!
//! The ring engine never touches registers itself. Everything
//! hardware-specific sits behind two narrow traits:
//!
//! - [`dma::DmaPort`] - the MAC/DMA engine: ring attachment, start/stop,
//!   poll-demand kicks, and the interrupt event word
//! - [`mdio::MdioBus`] - PHY register access, used once at link bring-up
//!
//! The clock/reset provider is a precondition, not an interface: it must
//! have brought the MAC out of reset before ring initialization.

pub mod dma;
pub mod mdio;

pub use dma::DmaPort;
pub use mdio::MdioBus;
