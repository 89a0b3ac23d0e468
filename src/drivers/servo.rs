//! Hobby servo driver for the lid.
//!
//! One LEDC channel at 50 Hz.  Angle maps linearly onto a 500–2500 µs
//! pulse; "detached" means duty 0, so the horn is unpowered and can be
//! back-driven.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes the LEDC duty register via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

/// Highest angle the servo accepts.
pub const MAX_ANGLE_DEG: u8 = 180;

/// Pulse width for `angle_deg`, clamped to the servo range.
pub fn angle_to_pulse_us(angle_deg: u8) -> u32 {
    let angle = u32::from(angle_deg.min(MAX_ANGLE_DEG));
    let span = pins::SERVO_MAX_PULSE_US - pins::SERVO_MIN_PULSE_US;
    pins::SERVO_MIN_PULSE_US + angle * span / u32::from(MAX_ANGLE_DEG)
}

/// LEDC duty counts for a pulse of `pulse_us`.
pub fn pulse_to_duty(pulse_us: u32) -> u32 {
    let frame_us = 1_000_000 / pins::SERVO_PWM_FREQ_HZ;
    let full_scale = 1u32 << pins::SERVO_PWM_RESOLUTION_BITS;
    pulse_us.min(frame_us) * full_scale / frame_us
}

pub struct ServoDriver {
    attached: bool,
    angle_deg: Option<u8>,
}

impl ServoDriver {
    pub fn new() -> Self {
        Self {
            attached: false,
            angle_deg: None,
        }
    }

    /// Start driving pulses at the last commanded angle, if any.
    pub fn attach(&mut self) {
        self.attached = true;
        if let Some(angle) = self.angle_deg {
            self.set_duty_hw(angle);
        }
    }

    /// Stop driving pulses.
    pub fn detach(&mut self) {
        hw_init::ledc_set_raw(hw_init::LEDC_CH_SERVO, 0);
        self.attached = false;
    }

    pub fn write_angle(&mut self, angle_deg: u8) {
        let angle = angle_deg.min(MAX_ANGLE_DEG);
        self.angle_deg = Some(angle);
        if self.attached {
            self.set_duty_hw(angle);
        }
    }

    fn set_duty_hw(&self, angle_deg: u8) {
        let duty = pulse_to_duty(angle_to_pulse_us(angle_deg));
        hw_init::ledc_set_raw(hw_init::LEDC_CH_SERVO, duty);
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Last commanded angle.
    pub fn angle(&self) -> Option<u8> {
        self.angle_deg
    }
}

impl Default for ServoDriver {
    fn default() -> Self {
        Self::new()
    }
}
