//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FeederService (domain)
//! ```
//!
//! Driven adapters (inputs, lid servo, indicator, storage, event sinks)
//! implement these traits.  The [`FeederService`](super::service::FeederService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! Blocking waits go through [`embedded_hal::delay::DelayNs`] rather than a
//! port of our own; the time adapter implements both that and [`ClockPort`].
//!
//! All port errors are typed; callers must handle every variant explicitly.

use crate::config::FeederConfig;

// ───────────────────────────────────────────────────────────────
// Clock port (read-only time source)
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Never goes backwards.
pub trait ClockPort {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Level inputs sampled from the main loop.
///
/// Both inputs are wired active-low with pull-ups; adapters translate the
/// electrical level so that `true` always means "occupied" / "pressed".
/// The token sensor is not here: it arrives through the interrupt-fed
/// [`TokenLatch`](crate::events::TokenLatch).
pub trait InputPort {
    /// Current perch level: `true` while something sits on the perch.
    fn perch_occupied(&mut self) -> bool;

    /// Current phase-select button level: `true` while held down.
    fn phase_button_pressed(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Lid servo port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Position-controlled hobby servo driving the reward lid.
pub trait LidServoPort {
    /// Start emitting control pulses.  Idempotent.
    fn attach(&mut self);

    /// Stop emitting pulses; the servo goes limp.  Idempotent.
    fn detach(&mut self);

    /// Whether pulses are currently being emitted.
    fn is_attached(&self) -> bool;

    /// Command an absolute position in degrees (0–180).
    fn write_angle(&mut self, degrees: u8);
}

// ───────────────────────────────────────────────────────────────
// Indicator port
// ───────────────────────────────────────────────────────────────

/// The single status LED.
pub trait IndicatorPort {
    fn set_indicator(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Reset port
// ───────────────────────────────────────────────────────────────

/// Restarts the whole controller.  On hardware this does not return.
pub trait ResetPort {
    fn request_reset(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / observers)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// camera trigger, test collector).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ non-volatile bytes)
// ───────────────────────────────────────────────────────────────

/// Byte-addressable non-volatile storage, EEPROM style.
///
/// Writes MUST be durable once they return `Ok`.  Reads past
/// [`capacity`](Self::capacity) fail with [`StorageError::OutOfBounds`].
pub trait StoragePort {
    /// Fill `buf` with the bytes starting at `addr`.
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Persist `data` starting at `addr`.
    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError>;

    /// Total addressable bytes.
    fn capacity(&self) -> usize;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ tuning overrides)
// ───────────────────────────────────────────────────────────────

/// Loads and persists tuning overrides.
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load the stored configuration.
    /// Returns [`FeederConfig::default()`] if nothing is stored.
    fn load(&self) -> Result<FeederConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &FeederConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Access outside the addressable range.
    OutOfBounds,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "address out of bounds"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
