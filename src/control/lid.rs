//! Lid actuator controller.
//!
//! `open()` is a single move.  `close()` is the safety-critical one: the
//! lid first goes to the open extreme (its position may be unknown), then
//! walks down in equal steps with a pause after each so that anything
//! under the lid is pushed gently rather than pinched, and finally seats
//! at the exact closed extreme.
//!
//! ```text
//!  Unknown ──open()──▶ Open ──close()──▶ Closing{1..N} ──▶ Closed
//!     │                  ▲                                   │
//!     └────close()───────┼───────────────────────────────────┤
//!                        └──────────────open()───────────────┘
//! ```
//!
//! Both moves block for their settle times.  There is no position
//! feedback, so a jammed lid is not detected.

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::app::ports::LidServoPort;
use crate::config::FeederConfig;

/// Position of the lid as far as the controller knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LidState {
    /// Before the first actuation.
    Unknown,
    Open,
    Closed,
    /// Mid-close, after step `step` of the configured count.
    Closing { step: u8 },
}

/// Angles visited by a stepped close, excluding the starting open extreme.
///
/// Yields `open - travel * k / steps` for `k = 1..=steps`, so the sequence
/// is strictly decreasing and, with `travel` divisible by `steps`, ends
/// exactly on the closed extreme.
#[derive(Debug, Clone)]
pub struct CloseSequence {
    open: u8,
    travel: u16,
    steps: u8,
    k: u8,
}

impl CloseSequence {
    pub fn new(open_deg: u8, closed_deg: u8, steps: u8) -> Self {
        Self {
            open: open_deg,
            travel: u16::from(open_deg.saturating_sub(closed_deg)),
            steps: steps.max(1),
            k: 0,
        }
    }
}

impl Iterator for CloseSequence {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.k >= self.steps {
            return None;
        }
        self.k += 1;
        let down = self.travel * u16::from(self.k) / u16::from(self.steps);
        Some(self.open - down as u8)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::from(self.steps - self.k);
        (left, Some(left))
    }
}

impl ExactSizeIterator for CloseSequence {}

/// Drives the lid servo and owns the single auto-close slot.
pub struct LidController {
    config: FeederConfig,
    state: LidState,
    /// Deadline (ms) after which an open lid closes by itself.
    close_deadline: Option<u64>,
}

impl LidController {
    pub fn new(config: FeederConfig) -> Self {
        Self {
            config,
            state: LidState::Unknown,
            close_deadline: None,
        }
    }

    pub fn state(&self) -> LidState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == LidState::Open
    }

    pub fn close_deadline(&self) -> Option<u64> {
        self.close_deadline
    }

    pub fn close_pending(&self) -> bool {
        self.close_deadline.is_some()
    }

    /// Move to the open extreme.  Returns `false` if already open.
    pub fn open(&mut self, servo: &mut impl LidServoPort, delay: &mut impl DelayNs) -> bool {
        if self.state == LidState::Open {
            return false;
        }
        info!("LID: opening");
        servo.attach();
        servo.write_angle(self.config.lid_open_deg);
        delay.delay_ms(self.config.open_settle_ms);
        servo.detach();
        self.state = LidState::Open;
        true
    }

    /// Stepped safety close.  Returns `false` if already closed.
    ///
    /// Clears any pending auto-close; a closed lid has nothing left to
    /// close.
    pub fn close(&mut self, servo: &mut impl LidServoPort, delay: &mut impl DelayNs) -> bool {
        if self.state == LidState::Closed {
            return false;
        }
        let cfg = &self.config;
        info!(
            "LID: closing in {} steps of {} deg",
            cfg.close_steps,
            cfg.close_step_deg()
        );
        servo.attach();
        servo.write_angle(cfg.lid_open_deg);
        delay.delay_ms(cfg.open_settle_ms);

        let steps = CloseSequence::new(cfg.lid_open_deg, cfg.lid_closed_deg, cfg.close_steps);
        for (i, angle) in steps.enumerate() {
            self.state = LidState::Closing { step: i as u8 + 1 };
            debug!("LID: step {} -> {} deg", i + 1, angle);
            servo.write_angle(angle);
            delay.delay_ms(cfg.close_step_delay_ms);
        }

        servo.write_angle(cfg.lid_closed_deg);
        delay.delay_ms(cfg.close_final_settle_ms);
        self.state = LidState::Closed;
        self.close_deadline = None;
        servo.detach();
        info!("LID: closed");
        true
    }

    /// Boot parking: midpoint, then open extreme, leaving the lid Open.
    pub fn park(&mut self, servo: &mut impl LidServoPort, delay: &mut impl DelayNs) {
        info!("LID: parking");
        servo.attach();
        servo.write_angle(self.config.lid_midpoint_deg);
        delay.delay_ms(self.config.boot_park_settle_ms);
        servo.write_angle(self.config.lid_open_deg);
        delay.delay_ms(self.config.boot_park_settle_ms);
        self.state = LidState::Open;
    }

    /// Arm the auto-close slot.  Overwrites any earlier deadline.
    pub fn schedule_close_after(&mut self, now_ms: u64, delay_ms: u32) {
        let deadline = now_ms + u64::from(delay_ms);
        debug!("LID: auto-close at {} ms", deadline);
        self.close_deadline = Some(deadline);
    }

    pub fn cancel_scheduled_close(&mut self) {
        if self.close_deadline.take().is_some() {
            debug!("LID: auto-close cancelled");
        }
    }

    /// Close if the lid is open and its deadline has passed.
    /// Returns whether a close ran.
    pub fn service_auto_close(
        &mut self,
        now_ms: u64,
        servo: &mut impl LidServoPort,
        delay: &mut impl DelayNs,
    ) -> bool {
        match self.close_deadline {
            Some(deadline) if self.state == LidState::Open && now_ms >= deadline => {
                info!("LID: auto-close due");
                self.close_deadline = None;
                self.close(servo, delay)
            }
            _ => false,
        }
    }
}
