//! Actuator and input drivers, hardware initialisation, and blink patterns.

pub mod button;
pub mod hw_init;
pub mod led_patterns;
pub mod servo;
pub mod status_led;
