//! Outbound application events and the observer bus.
//!
//! The [`FeederService`](super::service::FeederService) applies its own
//! phase policy first, then publishes what happened through the
//! [`EventBus`].  Observers registered on the bus see every event in
//! registration order, whether they log it or trigger a camera.

use heapless::Vec;
use log::warn;

use super::ports::EventSink;
use crate::fsm::TrainingPhase;

/// Maximum number of registered observers.
pub const MAX_OBSERVERS: usize = 4;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Boot finished; the control loop is about to start.
    Started { phase: TrainingPhase },

    /// The subject landed on the perch.
    PerchArrived { at_ms: u64 },

    /// The subject left the perch after `stayed_ms`.
    PerchDeparted { at_ms: u64, stayed_ms: u64 },

    /// A token deposit passed the debounce and was queued.
    DepositAccepted { queued: u16 },

    /// A queued deposit was exchanged for a lid opening.
    DepositRedeemed { remaining: u16 },

    LidOpened,

    LidClosed,

    /// The lid will close by itself at `deadline_ms`.
    AutoCloseScheduled { deadline_ms: u64 },

    /// Start recording, or keep recording, for at least `duration_ms`.
    RecordingRequested { duration_ms: u32 },

    /// The last recording window has elapsed.
    RecordingStopped,

    /// The operator advanced the phase; a restart follows.
    PhaseAdvanced {
        from: TrainingPhase,
        to: TrainingPhase,
    },
}

/// Returned when the bus is already at [`MAX_OBSERVERS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFull;

impl core::fmt::Display for BusFull {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "observer bus full ({} max)", MAX_OBSERVERS)
    }
}

/// Ordered fan-out of [`AppEvent`]s to registered observers.
pub struct EventBus {
    observers: Vec<Box<dyn EventSink>, MAX_OBSERVERS>,
}

impl EventBus {
    pub const fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Append an observer.  Observers are called in registration order.
    pub fn register(&mut self, sink: Box<dyn EventSink>) -> Result<(), BusFull> {
        self.observers.push(sink).map_err(|_| {
            warn!("BUS: observer rejected, {} already registered", MAX_OBSERVERS);
            BusFull
        })
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventBus {
    fn emit(&mut self, event: &AppEvent) {
        for observer in &mut self.observers {
            observer.emit(event);
        }
    }
}
