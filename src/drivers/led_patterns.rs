//! Blink codes for the single status LED.
//!
//! The indicator has two jobs:
//!
//! | Pattern       | Count         | On / off     | Pause   | Repeats  |
//! |---------------|---------------|--------------|---------|----------|
//! | Phase ack     | phase (1–4)   | 250 / 250 ms | none    | once     |
//! | Fatal code    | code (4 or 5) | 500 / 500 ms | 1000 ms | forever  |
//!
//! Patterns are plain data; [`play`] runs one repetition with blocking
//! delays.

use embedded_hal::delay::DelayNs;

use crate::app::ports::IndicatorPort;
use crate::config::FeederConfig;

/// One repetition of a blink code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkPattern {
    pub count: u8,
    pub on_ms: u32,
    pub off_ms: u32,
    /// Extra dark time after the last blink.
    pub pause_ms: u32,
}

impl BlinkPattern {
    /// Acknowledge the selected phase.
    pub fn phase_ack(phase: u8, config: &FeederConfig) -> Self {
        Self {
            count: phase,
            on_ms: config.phase_blink_ms,
            off_ms: config.phase_blink_ms,
            pause_ms: 0,
        }
    }

    /// One cycle of a fatal error code.
    pub fn fatal(code: u8, config: &FeederConfig) -> Self {
        Self {
            count: code,
            on_ms: config.fault_blink_ms,
            off_ms: config.fault_blink_ms,
            pause_ms: config.fault_pause_ms,
        }
    }

    /// Length of one repetition.
    pub fn period_ms(&self) -> u32 {
        u32::from(self.count) * (self.on_ms + self.off_ms) + self.pause_ms
    }
}

/// Run one repetition of `pattern`, blocking for its full length.
/// The LED is left off.
pub fn play(pattern: &BlinkPattern, led: &mut impl IndicatorPort, delay: &mut impl DelayNs) {
    for _ in 0..pattern.count {
        led.set_indicator(true);
        delay.delay_ms(pattern.on_ms);
        led.set_indicator(false);
        delay.delay_ms(pattern.off_ms);
    }
    if pattern.pause_ms > 0 {
        delay.delay_ms(pattern.pause_ms);
    }
}
