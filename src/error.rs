//! Error types for the descriptor-ring engine.
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Configuration failures, fatal at the call site
//! - [`RingError`]: Descriptor ring conditions, from transient back-pressure
//!   ([`RingError::Full`]) to fatal engine faults
//! - [`IoError`]: Runtime operation failures
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most engine methods. Per-frame hardware errors are not part of this
//! taxonomy: they are data, carried on completions as
//! [`FrameErrors`](crate::descriptor::FrameErrors).

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration errors.
///
/// Fatal at the call site with no partial state mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Ring capacity is zero or exceeds the hardware maximum
    CapacityInvalid,
    /// Frame spans more segments than the configured maximum
    SegmentLimitExceeded,
    /// Engine already initialized
    AlreadyInitialized,
    /// Invalid configuration parameter
    InvalidConfig,
    /// Invalid PHY address (must be 0-31)
    InvalidPhyAddress,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::CapacityInvalid => "ring capacity invalid",
            ConfigError::SegmentLimitExceeded => "segments-per-frame limit exceeded",
            ConfigError::AlreadyInitialized => "already initialized",
            ConfigError::InvalidConfig => "invalid configuration",
            ConfigError::InvalidPhyAddress => "invalid PHY address",
        }
    }
}

// =============================================================================
// Ring Errors
// =============================================================================

/// Descriptor ring errors.
///
/// [`RingError::Full`] is transient back-pressure: retry after the next
/// completion frees a slot. [`RingError::ChainCorrupt`] and
/// [`RingError::BusError`] are fatal to the affected ring and require
/// `stop()` followed by re-initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RingError {
    /// No free descriptor slots (back-pressure; retry after a completion)
    Full,
    /// Empty segment list or zero-length segment
    InvalidLength,
    /// Descriptor chain violated the first/last segment protocol
    ChainCorrupt,
    /// Fatal DMA bus error reported by the engine
    BusError,
}

impl core::fmt::Display for RingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RingError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RingError::Full => "ring full",
            RingError::InvalidLength => "invalid frame length",
            RingError::ChainCorrupt => "descriptor chain corrupt",
            RingError::BusError => "fatal DMA bus error",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Runtime operation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Operation timed out
    Timeout,
    /// Invalid state for operation (e.g., not running)
    InvalidState,
    /// PHY communication error (MDIO failure)
    PhyError,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::Timeout => "operation timed out",
            IoError::InvalidState => "invalid state for operation",
            IoError::PhyError => "PHY communication error",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Ring(RingError::Full)) => { /* retry after a completion */ }
///     Err(Error::Config(ConfigError::SegmentLimitExceeded)) => { /* ring reset */ }
///     Err(Error::Io(IoError::Timeout)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// Ring error
    Ring(RingError),
    /// I/O error
    Io(IoError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Ring(e) => write!(f, "ring: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

// From impls for automatic conversion
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<RingError> for Error {
    fn from(e: RingError) -> Self {
        Error::Ring(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for engine operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for ring operations
pub type RingResult<T> = core::result::Result<T, RingError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================
