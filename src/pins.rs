//! GPIO / peripheral pin assignments for the feeder main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Inputs (all active-low with pull-up)
// ---------------------------------------------------------------------------

/// Perch microswitch.  LOW = something on the perch.
pub const PERCH_GPIO: i32 = 4;

/// Token slot sensor.  Falling edge = deposit passing.
pub const TOKEN_GPIO: i32 = 5;

/// Phase-select push-button.  LOW = pressed.
pub const PHASE_BUTTON_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Lid servo signal line.
pub const LID_SERVO_GPIO: i32 = 9;

/// Status LED (active HIGH).
pub const STATUS_LED_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Servo PWM configuration
// ---------------------------------------------------------------------------

/// Hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC duty resolution for the servo channel (bits).
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
/// Pulse width commanding 0°.
pub const SERVO_MIN_PULSE_US: u32 = 500;
/// Pulse width commanding 180°.
pub const SERVO_MAX_PULSE_US: u32 = 2500;
