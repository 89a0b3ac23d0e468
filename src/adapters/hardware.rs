//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the switch inputs, the lid servo and the status LED, exposing
//! them through [`InputPort`], [`LidServoPort`], [`IndicatorPort`] and
//! [`ResetPort`].  This is the only module in the system that touches
//! actual hardware.  On non-espidf targets, the underlying drivers use
//! cfg-gated simulation stubs.

use crate::app::ports::{IndicatorPort, InputPort, LidServoPort, ResetPort};
use crate::drivers::button::ActiveLowInput;
use crate::drivers::servo::ServoDriver;
use crate::drivers::status_led::StatusLed;
use crate::pins;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    perch: ActiveLowInput,
    phase_button: ActiveLowInput,
    servo: ServoDriver,
    led: StatusLed,
    resets_requested: u32,
}

impl HardwareAdapter {
    pub fn new(servo: ServoDriver, led: StatusLed) -> Self {
        Self {
            perch: ActiveLowInput::new(pins::PERCH_GPIO),
            phase_button: ActiveLowInput::new(pins::PHASE_BUTTON_GPIO),
            servo,
            led,
            resets_requested: 0,
        }
    }

    /// Resets requested so far.  Only ever non-zero in simulation.
    pub fn resets_requested(&self) -> u32 {
        self.resets_requested
    }
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new(ServoDriver::new(), StatusLed::new())
    }
}

// ── InputPort ─────────────────────────────────────────────────

impl InputPort for HardwareAdapter {
    fn perch_occupied(&mut self) -> bool {
        self.perch.is_active()
    }

    fn phase_button_pressed(&mut self) -> bool {
        self.phase_button.is_active()
    }
}

// ── LidServoPort ──────────────────────────────────────────────

impl LidServoPort for HardwareAdapter {
    fn attach(&mut self) {
        self.servo.attach();
    }

    fn detach(&mut self) {
        self.servo.detach();
    }

    fn is_attached(&self) -> bool {
        self.servo.is_attached()
    }

    fn write_angle(&mut self, degrees: u8) {
        self.servo.write_angle(degrees);
    }
}

// ── IndicatorPort ─────────────────────────────────────────────

impl IndicatorPort for HardwareAdapter {
    fn set_indicator(&mut self, on: bool) {
        self.led.set(on);
    }
}

// ── ResetPort ─────────────────────────────────────────────────

impl ResetPort for HardwareAdapter {
    #[cfg(target_os = "espidf")]
    fn request_reset(&mut self) {
        self.servo.detach();
        self.led.off();
        // SAFETY: esp_restart never returns; all state is reloaded on boot.
        unsafe { esp_idf_svc::sys::esp_restart() };
    }

    #[cfg(not(target_os = "espidf"))]
    fn request_reset(&mut self) {
        self.resets_requested += 1;
        log::warn!("hardware(sim): reset requested, continuing without restart");
    }
}
