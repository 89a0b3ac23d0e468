//! Concrete phase handler functions and table builder.
//!
//! Each phase is defined by plain `fn` pointers, so the table needs
//! neither closures nor heap.
//!
//! ```text
//!  DISCOVERY ──[button]──▶ REWARD_ON_ARRIVAL ──[button]──▶ DEPOSIT_ASSISTED
//!      ▲                                                          │
//!      │                                                      [button]
//!      │                                                          ▼
//!      └──────────────────────[button]─────────────────── DEPOSIT_SOLO
//! ```
//!
//! | Phase | Lid default | Arrival                  | Deposit                   |
//! |-------|-------------|--------------------------|---------------------------|
//! | 1     | forced open | record                   | ignored                   |
//! | 2     | closed      | record, open, auto-close | ignored                   |
//! | 3, 4  | closed      | bookkeeping only         | open, auto-close, record  |

use super::context::{FsmContext, LidCommand, PerchEdge};
use super::{StateDescriptor, TrainingPhase};
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static phase table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; TrainingPhase::COUNT] {
    [
        // Index 0 = phase 1
        StateDescriptor {
            id: TrainingPhase::Discovery,
            name: "Discovery",
            on_enter: Some(discovery_enter),
            on_exit: None,
            on_update: discovery_update,
        },
        // Index 1 = phase 2
        StateDescriptor {
            id: TrainingPhase::RewardOnArrival,
            name: "RewardOnArrival",
            on_enter: Some(reward_phase_enter),
            on_exit: None,
            on_update: arrival_update,
        },
        // Index 2 = phase 3
        StateDescriptor {
            id: TrainingPhase::DepositAssisted,
            name: "DepositAssisted",
            on_enter: Some(reward_phase_enter),
            on_exit: None,
            on_update: deposit_update,
        },
        // Index 3 = phase 4
        StateDescriptor {
            id: TrainingPhase::DepositSolo,
            name: "DepositSolo",
            on_enter: Some(reward_phase_enter),
            on_exit: None,
            on_update: deposit_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared entry rule for phases 2–4
// ═══════════════════════════════════════════════════════════════════════════

/// The lid rests closed in reward phases.  A lid left open by phase 1
/// with nothing scheduled to close it gets closed on entry.
fn reward_phase_enter(ctx: &mut FsmContext) {
    if ctx.lid_open && !ctx.close_pending {
        info!("PHASE: lid open on entry, closing");
        ctx.commands.lid = LidCommand::Close;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Phase 1: Discovery
// ═══════════════════════════════════════════════════════════════════════════

fn discovery_enter(_ctx: &mut FsmContext) {
    info!("DISCOVERY: lid held open");
}

fn discovery_update(ctx: &mut FsmContext) {
    if !ctx.lid_open {
        ctx.commands.lid = LidCommand::Open {
            close_after_ms: None,
        };
    }
    if ctx.close_pending {
        ctx.commands.cancel_scheduled_close = true;
    }

    if let Some(PerchEdge::Arrived) = ctx.track_presence() {
        debug!("DISCOVERY: arrival at {} ms", ctx.now_ms);
        ctx.commands.record_for_ms = Some(ctx.config.record_on_arrival_ms);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Phase 2: Reward on arrival
// ═══════════════════════════════════════════════════════════════════════════

fn arrival_update(ctx: &mut FsmContext) {
    if let Some(PerchEdge::Arrived) = ctx.track_presence() {
        info!("ARRIVAL: subject landed, opening for {} ms", ctx.config.remain_open_ms);
        ctx.commands.record_for_ms = Some(ctx.config.record_on_arrival_ms);
        ctx.commands.lid = LidCommand::Open {
            close_after_ms: Some(ctx.config.remain_open_ms),
        };
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Phases 3 and 4: Reward on deposit
// ═══════════════════════════════════════════════════════════════════════════

fn deposit_update(ctx: &mut FsmContext) {
    ctx.track_presence();

    // One redemption per lid cycle: deposits made while the lid is open
    // stay queued until it has closed again.
    if ctx.lid_open || ctx.deposits.pending == 0 {
        return;
    }
    if ctx.deposits.redeem() {
        info!(
            "DEPOSIT: redeemed, {} left, opening for {} ms",
            ctx.deposits.pending, ctx.config.remain_open_ms
        );
        ctx.redeemed = true;
        ctx.commands.record_for_ms = Some(ctx.config.record_on_deposit_ms);
        ctx.commands.lid = LidCommand::Open {
            close_after_ms: Some(ctx.config.remain_open_ms),
        };
    }
}
