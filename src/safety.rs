//! Terminal fault handling.
//!
//! A [`FatalError`] ends normal operation.  The lid is left exactly where
//! it is (no actuation without a known-good configuration) and the status
//! LED repeats the error's blink code until someone power-cycles or
//! resets the board.
//!
//! ```text
//!   ●   ●   ●   ●   ─────   ●   ●   ●   ●   ─────  ...
//!   └ code blinks ┘ pause
//! ```

use embedded_hal::delay::DelayNs;
use log::error;

use crate::app::ports::IndicatorPort;
use crate::config::FeederConfig;
use crate::drivers::led_patterns::{self, BlinkPattern};
use crate::error::FatalError;

/// One full cycle of the blink code for `fault`.
pub fn run_fault_cycle(
    fault: FatalError,
    config: &FeederConfig,
    led: &mut impl IndicatorPort,
    delay: &mut impl DelayNs,
) {
    let pattern = BlinkPattern::fatal(fault.blink_code(), config);
    led_patterns::play(&pattern, led, delay);
}

/// Blink `fault` forever.
pub fn halt(
    fault: FatalError,
    config: &FeederConfig,
    led: &mut impl IndicatorPort,
    delay: &mut impl DelayNs,
) -> ! {
    error!("SAFETY: halted, {} (code {})", fault, fault.blink_code());
    loop {
        run_fault_cycle(fault, config, led, delay);
    }
}
