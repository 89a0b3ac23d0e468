//! Interrupt-fed token latch.
//!
//! The token sensor fires a falling-edge interrupt each time a deposit
//! passes the slot.  The contacts bounce, so one physical deposit can
//! produce several edges within a few hundred milliseconds.
//!
//! ```text
//! ┌─────────────┐  on_edge(now)   ┌──────────────┐  take()   ┌───────────┐
//! │ Token ISR   │────────────────▶│  TokenLatch  │──────────▶│ Main loop │
//! │ (producer)  │                 │  (atomics)   │           │ (consumer)│
//! └─────────────┘                 └──────────────┘           └───────────┘
//! ```
//!
//! The ISR side only reads the clock it is handed, compares against the
//! last accepted timestamp and bumps a counter.  It never blocks, logs
//! or touches storage.  The main loop drains the counter once per
//! iteration with an atomic read-modify-write.
//!
//! Pending deposits are counted rather than flagged so that a deposit
//! made while the main loop is blocked in a lid close is not lost.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

/// Lock-free single-producer / single-consumer deposit latch.
pub struct TokenLatch {
    /// Accepted edges not yet taken by the main loop.
    pending: AtomicU16,
    /// Timestamp (ms, truncated) of the last accepted edge.
    /// Written by the ISR only, after the boot-time seed.
    last_accepted_ms: AtomicU32,
    /// False until the first accepted edge or the boot seed.
    seeded: AtomicBool,
    /// Edges closer than this to the last accepted one are bounce.
    window_ms: AtomicU32,
}

impl TokenLatch {
    /// Default bounce window.
    pub const DEFAULT_WINDOW_MS: u32 = 1000;

    pub const fn new() -> Self {
        Self {
            pending: AtomicU16::new(0),
            last_accepted_ms: AtomicU32::new(0),
            seeded: AtomicBool::new(false),
            window_ms: AtomicU32::new(Self::DEFAULT_WINDOW_MS),
        }
    }

    /// Change the bounce window.  Call before the interrupt is armed.
    pub fn set_window_ms(&self, window_ms: u32) {
        self.window_ms.store(window_ms, Ordering::Relaxed);
    }

    /// Current bounce window.
    pub fn window_ms(&self) -> u32 {
        self.window_ms.load(Ordering::Relaxed)
    }

    /// Treat `now_ms` as the last accepted edge.
    ///
    /// Called once by the main loop at boot, before the interrupt is
    /// armed, so that edges during the first window count as bounce.
    pub fn seed(&self, now_ms: u32) {
        self.last_accepted_ms.store(now_ms, Ordering::Relaxed);
        self.seeded.store(true, Ordering::Release);
    }

    /// Interrupt-side entry point.  Returns whether the edge was accepted.
    ///
    /// Safe to call from ISR context: atomics only, no allocation.
    pub fn on_edge(&self, now_ms: u32) -> bool {
        if self.seeded.load(Ordering::Acquire) {
            let last = self.last_accepted_ms.load(Ordering::Relaxed);
            if now_ms.wrapping_sub(last) < self.window_ms.load(Ordering::Relaxed) {
                return false;
            }
        }
        self.last_accepted_ms.store(now_ms, Ordering::Relaxed);
        self.seeded.store(true, Ordering::Release);
        // Saturate rather than wrap; 65k unredeemed deposits is a jam.
        let _ = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_add(1));
        true
    }

    /// Consume one pending edge.  Returns `false` when none is pending.
    pub fn take(&self) -> bool {
        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Pending edges not yet taken.
    pub fn pending(&self) -> u16 {
        self.pending.load(Ordering::Acquire)
    }

    /// Timestamp of the last accepted edge, if any.
    pub fn last_accepted_ms(&self) -> Option<u32> {
        if self.seeded.load(Ordering::Acquire) {
            Some(self.last_accepted_ms.load(Ordering::Relaxed))
        } else {
            None
        }
    }
}

impl Default for TokenLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// The latch shared with the token-sensor interrupt.
pub static TOKEN_LATCH: TokenLatch = TokenLatch::new();

/// ISR handler: register this on the token GPIO falling edge.
pub fn token_isr_handler(now_ms: u32) {
    TOKEN_LATCH.on_edge(now_ms);
}
