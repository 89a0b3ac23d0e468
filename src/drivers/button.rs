//! Active-low switch inputs (perch microswitch, phase button).
//!
//! Both switches pull the line LOW when closed.  Reads are level
//! samples; any debounce lives in the input layer above.

use crate::drivers::hw_init;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveLowInput {
    gpio: i32,
}

impl ActiveLowInput {
    pub const fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    /// GPIO pin this switch is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// True while the switch is closed.
    pub fn is_active(&self) -> bool {
        Self::level_to_active(hw_init::gpio_read(self.gpio))
    }

    pub const fn level_to_active(level_high: bool) -> bool {
        !level_high
    }
}
