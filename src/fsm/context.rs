//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that phase handlers read from and
//! write to: the fresh perch sample, the presence record, the deposit
//! queue, a view of the lid, and the commands the handlers issue.
//! Think of it as the "blackboard" in a blackboard architecture.

use crate::config::FeederConfig;

// ---------------------------------------------------------------------------
// Presence record
// ---------------------------------------------------------------------------

/// When the subject last landed on and left the perch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceRecord {
    pub landed_at: Option<u64>,
    pub departed_at: Option<u64>,
}

impl PresenceRecord {
    /// Present iff the last landing is newer than the last departure.
    /// "Never" orders before every timestamp.
    pub fn is_present(&self) -> bool {
        match (self.landed_at, self.departed_at) {
            (Some(landed), Some(departed)) => landed > departed,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// How long the subject has been on the perch, if it is there.
    pub fn time_present(&self, now_ms: u64) -> Option<u64> {
        if self.is_present() {
            self.landed_at.map(|t| now_ms.saturating_sub(t))
        } else {
            None
        }
    }

    /// How long the perch has been empty since the last departure.
    pub fn time_absent(&self, now_ms: u64) -> Option<u64> {
        if self.is_present() {
            None
        } else {
            self.departed_at.map(|t| now_ms.saturating_sub(t))
        }
    }
}

/// A change in presence detected this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerchEdge {
    Arrived,
    Departed,
}

// ---------------------------------------------------------------------------
// Deposit queue
// ---------------------------------------------------------------------------

/// Accepted but not yet redeemed deposits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepositQueue {
    pub pending: u16,
}

impl DepositQueue {
    pub fn accept(&mut self) {
        self.pending = self.pending.saturating_add(1);
    }

    /// Take one deposit.  Returns `false` if the queue is empty.
    pub fn redeem(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        self.pending -= 1;
        true
    }
}

// ---------------------------------------------------------------------------
// Protocol commands (written by phase handlers; applied by the service)
// ---------------------------------------------------------------------------

/// What the phase handler wants done with the lid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LidCommand {
    /// Leave the lid alone.
    #[default]
    Hold,
    /// Open the lid; optionally schedule an auto-close after the delay.
    Open { close_after_ms: Option<u32> },
    /// Run the stepped safety close.
    Close,
}

/// Commands issued during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolCommands {
    pub lid: LidCommand,
    /// Drop any pending auto-close.
    pub cancel_scheduled_close: bool,
    /// Start or extend a recording for this long.
    pub record_for_ms: Option<u32>,
}

impl ProtocolCommands {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every phase handler.
pub struct FsmContext {
    // -- Timing --
    /// Clock reading taken at the start of this iteration.
    pub now_ms: u64,

    // -- Inputs --
    /// Fresh perch sample for this iteration.
    pub perch_occupied: bool,
    /// Presence bookkeeping, updated by the handlers on perch edges.
    pub presence: PresenceRecord,
    /// Deposit queue, filled from the token latch before each tick.
    pub deposits: DepositQueue,

    // -- Lid view --
    /// Whether the lid is known to be open.
    pub lid_open: bool,
    /// Whether an auto-close deadline is pending.
    pub close_pending: bool,

    // -- Outputs --
    pub commands: ProtocolCommands,
    /// Perch edge detected this tick, if any.
    pub edge: Option<PerchEdge>,
    /// A deposit was redeemed this tick.
    pub redeemed: bool,

    // -- Configuration --
    pub config: FeederConfig,
}

impl FsmContext {
    pub fn new(config: FeederConfig) -> Self {
        Self {
            now_ms: 0,
            perch_occupied: false,
            presence: PresenceRecord::default(),
            deposits: DepositQueue::default(),
            lid_open: false,
            close_pending: false,
            commands: ProtocolCommands::default(),
            edge: None,
            redeemed: false,
            config,
        }
    }

    /// Refresh inputs and clear last tick's outputs.
    pub fn begin_tick(&mut self, now_ms: u64, perch_occupied: bool, lid_open: bool, close_pending: bool) {
        self.now_ms = now_ms;
        self.perch_occupied = perch_occupied;
        self.lid_open = lid_open;
        self.close_pending = close_pending;
        self.commands.clear();
        self.edge = None;
        self.redeemed = false;
    }

    /// Compare the fresh sample against the presence record and stamp
    /// any edge.  The loop cadence is the only debounce.
    pub fn track_presence(&mut self) -> Option<PerchEdge> {
        let present = self.presence.is_present();
        let edge = match (present, self.perch_occupied) {
            (false, true) => {
                self.presence.landed_at = Some(self.now_ms);
                Some(PerchEdge::Arrived)
            }
            (true, false) => {
                self.presence.departed_at = Some(self.now_ms);
                Some(PerchEdge::Departed)
            }
            _ => None,
        };
        self.edge = edge;
        edge
    }
}
