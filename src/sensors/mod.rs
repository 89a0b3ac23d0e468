//! Debounced input layer.
//!
//! Three inputs, each with its own debounce strategy:
//!
//! | Input        | Kind            | Debounce                              |
//! |--------------|-----------------|---------------------------------------|
//! | Perch        | level, sampled  | the loop cadence itself               |
//! | Token sensor | falling edge    | 1 s lockout in [`TokenLatch`]         |
//! | Phase button | level, polled   | block until release, one event/press  |

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::app::ports::InputPort;
use crate::events::TokenLatch;

/// Turns raw inputs into clean per-iteration events.
pub struct InputLayer {
    latch: &'static TokenLatch,
    button_poll_ms: u32,
}

impl InputLayer {
    pub fn new(latch: &'static TokenLatch, button_poll_ms: u32) -> Self {
        Self {
            latch,
            button_poll_ms,
        }
    }

    /// The latch shared with the token interrupt.
    pub fn latch(&self) -> &'static TokenLatch {
        self.latch
    }

    /// Fresh perch sample.  Edge detection is the consumer's job.
    pub fn poll_perch(&self, input: &mut impl InputPort) -> bool {
        input.perch_occupied()
    }

    /// Consume one accepted token edge, if any.
    pub fn take_pending_token_event(&self) -> bool {
        self.latch.take()
    }

    /// If the phase button is down, wait for release and report one press.
    pub fn poll_phase_advance_button(
        &self,
        input: &mut impl InputPort,
        delay: &mut impl DelayNs,
    ) -> bool {
        if !input.phase_button_pressed() {
            return false;
        }
        debug!("INPUT: phase button down, waiting for release");
        while input.phase_button_pressed() {
            delay.delay_ms(self.button_poll_ms);
        }
        true
    }
}
