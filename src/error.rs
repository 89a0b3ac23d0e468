//! Fatal error conditions for the PerchFeed firmware.
//!
//! Two kinds of failure exist.  [`FatalError`] ends the control loop: the
//! safety halt blinks its code on the indicator until an external reset.
//! Everything else (storage hiccups, rejected tuning) stays in the port
//! error types of [`crate::app::ports`] and is only logged.  Debounce
//! rejections and an empty deposit queue are normal control flow and
//! never reach this module.

use core::fmt;

// ---------------------------------------------------------------------------
// Fatal conditions
// ---------------------------------------------------------------------------

/// Conditions that put the feeder into the terminal halt state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FatalError {
    /// Training phase loaded or computed outside 1–4.
    InvalidPhase = 4,
    /// Persistent store still invalid after one reinitialisation attempt.
    ConfigCorrupt = 5,
}

impl FatalError {
    /// Number of indicator blinks per halt cycle.
    pub const fn blink_code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPhase => write!(f, "invalid training phase"),
            Self::ConfigCorrupt => write!(f, "persistent store corrupt"),
        }
    }
}
