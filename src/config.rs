//! System configuration parameters
//!
//! All tunable timings and servo geometry for the feeder.
//! Defaults match the deployed hardware; individual values can be
//! overridden through the [`ConfigPort`](crate::app::ports::ConfigPort).
//!
//! Think carefully before changing the close parameters.  The stepped
//! close gives an animal time to withdraw before the lid seats.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeederConfig {
    // --- Control loop ---
    /// Minimum duration of one control-loop iteration (milliseconds).
    pub loop_period_ms: u32,

    // --- Inputs ---
    /// Token edges closer together than this are contact bounce.
    pub token_dedupe_ms: u32,
    /// Poll interval while waiting for the phase button to be released.
    pub button_poll_ms: u32,

    // --- Lid servo geometry (degrees) ---
    /// Servo angle with the lid fully open.
    pub lid_open_deg: u8,
    /// Servo angle with the lid fully closed.
    pub lid_closed_deg: u8,
    /// Servo angle used while parking the lid at boot.
    pub lid_midpoint_deg: u8,

    // --- Lid timing ---
    /// Number of equal steps from open to closed.
    pub close_steps: u8,
    /// Wait after each close step (milliseconds).
    pub close_step_delay_ms: u32,
    /// Travel time allowed for a full move to the open extreme.
    pub open_settle_ms: u32,
    /// Wait after forcing the closed extreme at the end of a close.
    pub close_final_settle_ms: u32,
    /// Wait between the boot parking moves.
    pub boot_park_settle_ms: u32,
    /// Quiet period at the end of boot before the first iteration.
    pub boot_final_settle_ms: u32,

    // --- Protocol ---
    /// How long a reward stays accessible before auto-close.
    pub remain_open_ms: u32,
    /// Recording length requested when a subject arrives.
    pub record_on_arrival_ms: u32,
    /// Recording length requested when a deposit is redeemed.
    pub record_on_deposit_ms: u32,

    // --- Indicator ---
    /// On/off half-period of the phase acknowledgment blink.
    pub phase_blink_ms: u32,
    /// On/off half-period of the fatal error blink.
    pub fault_blink_ms: u32,
    /// Pause between repetitions of the fatal blink code.
    pub fault_pause_ms: u32,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            // Control loop
            loop_period_ms: 20, // ~50 iterations per second

            // Inputs
            token_dedupe_ms: 1000,
            button_poll_ms: 10,

            // Servo geometry
            lid_open_deg: 180,
            lid_closed_deg: 0,
            lid_midpoint_deg: 90,

            // Lid timing
            close_steps: 15,          // 12° per step
            close_step_delay_ms: 750, // ~11 s full close
            open_settle_ms: 1000,
            close_final_settle_ms: 400,
            boot_park_settle_ms: 1500,
            boot_final_settle_ms: 1000,

            // Protocol
            remain_open_ms: 15_000,
            record_on_arrival_ms: 15_000,
            record_on_deposit_ms: 10_000,

            // Indicator
            phase_blink_ms: 250,
            fault_blink_ms: 500,
            fault_pause_ms: 1000,
        }
    }
}

impl FeederConfig {
    /// Angular distance between the open and closed extremes.
    pub fn travel_deg(&self) -> u8 {
        self.lid_open_deg.abs_diff(self.lid_closed_deg)
    }

    /// Degrees moved by each close step.
    pub fn close_step_deg(&self) -> u8 {
        self.travel_deg() / self.close_steps.max(1)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(10..=200).contains(&self.loop_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "loop_period_ms must be 10–200",
            ));
        }
        if !(100..=10_000).contains(&self.token_dedupe_ms) {
            return Err(ConfigError::ValidationFailed(
                "token_dedupe_ms must be 100–10000",
            ));
        }
        if !(1..=100).contains(&self.button_poll_ms) {
            return Err(ConfigError::ValidationFailed(
                "button_poll_ms must be 1–100",
            ));
        }
        if self.lid_open_deg > 180 || self.lid_open_deg <= self.lid_closed_deg {
            return Err(ConfigError::ValidationFailed(
                "lid_open_deg must be above lid_closed_deg and at most 180",
            ));
        }
        if !(self.lid_closed_deg..=self.lid_open_deg).contains(&self.lid_midpoint_deg) {
            return Err(ConfigError::ValidationFailed(
                "lid_midpoint_deg must lie between the lid extremes",
            ));
        }
        if self.close_steps == 0 {
            return Err(ConfigError::ValidationFailed("close_steps must be > 0"));
        }
        if self.travel_deg() % self.close_steps != 0 {
            return Err(ConfigError::ValidationFailed(
                "lid travel must be evenly divisible by close_steps",
            ));
        }
        if !(100..=5000).contains(&self.close_step_delay_ms) {
            return Err(ConfigError::ValidationFailed(
                "close_step_delay_ms must be 100–5000",
            ));
        }
        if self.open_settle_ms == 0 || self.close_final_settle_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "settle durations must be non-zero",
            ));
        }
        if !(1000..=600_000).contains(&self.remain_open_ms) {
            return Err(ConfigError::ValidationFailed(
                "remain_open_ms must be 1000–600000",
            ));
        }
        if self.phase_blink_ms == 0 || self.fault_blink_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "blink periods must be non-zero",
            ));
        }
        Ok(())
    }
}
