//! Configuration types for the ring engine.

use crate::constants::{
    DEFAULT_MAX_FRAME_SEGMENTS, DEFAULT_PHY_ADDRESS, DEFAULT_RX_BUFFER_CAPACITY,
    MAX_SEGMENTS_PER_FRAME,
};
use crate::descriptor::ChecksumMode;
use crate::error::{ConfigError, ConfigResult};
use crate::hal::mdio::MAX_PHY_ADDR;

// =============================================================================
// Engine State
// =============================================================================

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Created but not initialized
    #[default]
    Uninitialized,
    /// Rings initialized; call `start()` to begin
    Initialized,
    /// Actively transmitting and receiving
    Running,
    /// Halted; `start()` resumes, `init()` rebuilds after a fault
    Stopped,
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Ring engine configuration.
///
/// Built with the `with_*` methods:
///
/// ```ignore
/// let config = EngineConfig::new()
///     .with_max_frame_segments(4)
///     .with_rx_timestamp(true);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Maximum descriptors one frame may span (1..=[`MAX_SEGMENTS_PER_FRAME`])
    pub max_frame_segments: usize,
    /// Byte capacity advertised to hardware for each receive buffer
    pub rx_buffer_capacity: u32,
    /// Capture a hardware timestamp for every received frame
    pub rx_timestamp: bool,
    /// Default transmit checksum insertion mode
    pub checksum: ChecksumMode,
    /// PHY address for MDIO access at link bring-up
    pub phy_address: u8,
}

impl EngineConfig {
    /// Create a configuration with the crate defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_frame_segments: DEFAULT_MAX_FRAME_SEGMENTS,
            rx_buffer_capacity: DEFAULT_RX_BUFFER_CAPACITY,
            rx_timestamp: false,
            checksum: ChecksumMode::Disabled,
            phy_address: DEFAULT_PHY_ADDRESS,
        }
    }

    /// Set the per-frame segment limit.
    #[must_use]
    pub const fn with_max_frame_segments(mut self, max: usize) -> Self {
        self.max_frame_segments = max;
        self
    }

    /// Set the receive buffer capacity in bytes.
    #[must_use]
    pub const fn with_rx_buffer_capacity(mut self, capacity: u32) -> Self {
        self.rx_buffer_capacity = capacity;
        self
    }

    /// Enable or disable receive timestamping (ring-wide capability).
    #[must_use]
    pub const fn with_rx_timestamp(mut self, enable: bool) -> Self {
        self.rx_timestamp = enable;
        self
    }

    /// Set the default transmit checksum insertion mode.
    #[must_use]
    pub const fn with_checksum(mut self, mode: ChecksumMode) -> Self {
        self.checksum = mode;
        self
    }

    /// Set the PHY address used for MDIO access.
    #[must_use]
    pub const fn with_phy_address(mut self, addr: u8) -> Self {
        self.phy_address = addr;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// - `InvalidConfig` - segment limit out of range or zero buffer capacity
    /// - `InvalidPhyAddress` - PHY address exceeds the 5-bit field
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.max_frame_segments == 0 || self.max_frame_segments > MAX_SEGMENTS_PER_FRAME {
            return Err(ConfigError::InvalidConfig);
        }
        if self.rx_buffer_capacity == 0 {
            return Err(ConfigError::InvalidConfig);
        }
        if self.phy_address > MAX_PHY_ADDR {
            return Err(ConfigError::InvalidPhyAddress);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::new().validate().is_ok());
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let config = EngineConfig::new()
            .with_max_frame_segments(4)
            .with_rx_buffer_capacity(2048)
            .with_rx_timestamp(true)
            .with_checksum(ChecksumMode::Full)
            .with_phy_address(1);

        assert_eq!(config.max_frame_segments, 4);
        assert_eq!(config.rx_buffer_capacity, 2048);
        assert!(config.rx_timestamp);
        assert_eq!(config.checksum, ChecksumMode::Full);
        assert_eq!(config.phy_address, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_segments() {
        let config = EngineConfig::new().with_max_frame_segments(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidConfig));
    }

    #[test]
    fn validate_rejects_oversized_segment_limit() {
        let config = EngineConfig::new().with_max_frame_segments(MAX_SEGMENTS_PER_FRAME + 1);
        assert_eq!(config.validate(), Err(ConfigError::InvalidConfig));
    }

    #[test]
    fn validate_rejects_zero_buffer_capacity() {
        let config = EngineConfig::new().with_rx_buffer_capacity(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidConfig));
    }

    #[test]
    fn validate_rejects_bad_phy_address() {
        let config = EngineConfig::new().with_phy_address(32);
        assert_eq!(config.validate(), Err(ConfigError::InvalidPhyAddress));
    }

    #[test]
    fn state_default_is_uninitialized() {
        assert_eq!(State::default(), State::Uninitialized);
    }
}
