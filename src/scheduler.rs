//! Control-loop pacing.
//!
//! Each iteration runs to completion and is then padded with a blocking
//! delay up to the configured minimum period.  Iterations that already
//! took longer (a lid close takes seconds) are not padded and are not
//! "caught up" either: the next iteration simply starts late.
//!
//! ```text
//!  ├── work ──┤── pad ──┤── work ────────────────────┤── work ──┤── pad ──┤
//!  0          8         20                           11_300     11_309    11_320
//! ```

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::app::ports::ClockPort;

/// Pads iterations up to a fixed minimum period.
pub struct LoopPacer {
    period_ms: u32,
    /// Iterations that needed no padding.
    overruns: u32,
}

impl LoopPacer {
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            overruns: 0,
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Number of iterations that ran past the period.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /// How long to pad an iteration that started at `started_ms`.
    pub fn remaining(&self, started_ms: u64, now_ms: u64) -> u32 {
        let elapsed = now_ms.saturating_sub(started_ms);
        u64::from(self.period_ms).saturating_sub(elapsed) as u32
    }

    /// Block until `period_ms` has passed since `started_ms`.
    /// Returns the padding applied.
    pub fn pad(&mut self, started_ms: u64, time: &mut (impl ClockPort + DelayNs)) -> u32 {
        let pad = self.remaining(started_ms, time.now_ms());
        if pad == 0 {
            self.overruns = self.overruns.wrapping_add(1);
            debug!("LOOP: iteration overran {} ms period", self.period_ms);
        } else {
            time.delay_ms(pad);
        }
        pad
    }
}
