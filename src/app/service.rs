//! Application service: the hexagonal core.
//!
//! [`FeederService`] owns every piece of feeder state together with the
//! hardware, time and storage handles it drives.  There is no global
//! core object; `main` builds one service and loops on it.
//!
//! ```text
//!  InputPort ─────▶ ┌──────────────────────────────┐ ──▶ EventBus
//!  TokenLatch ────▶ │        FeederService          │
//!  ClockPort ─────▶ │  InputLayer · FSM · Lid       │ ──▶ LidServoPort
//!  StoragePort ◀──▶ │  PhaseStore · LoopPacer       │ ──▶ IndicatorPort
//!                   └──────────────────────────────┘ ──▶ ResetPort
//! ```
//!
//! Per-iteration order is fixed: auto-close check → inputs → protocol
//! dispatch → recording deadline → phase-select check, then pad to the
//! loop period.

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::config::FeederConfig;
use crate::control::lid::{LidController, LidState};
use crate::drivers::led_patterns::{self, BlinkPattern};
use crate::error::FatalError;
use crate::events::TokenLatch;
use crate::fsm::context::{FsmContext, LidCommand, PerchEdge, PresenceRecord};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, TrainingPhase};
use crate::scheduler::LoopPacer;
use crate::sensors::InputLayer;
use crate::store::PhaseStore;

use super::events::{AppEvent, BusFull, EventBus};
use super::ports::{
    ClockPort, EventSink, IndicatorPort, InputPort, LidServoPort, ResetPort, StoragePort,
};

// ───────────────────────────────────────────────────────────────
// FeederService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct FeederService<H, T, S>
where
    H: InputPort + LidServoPort + IndicatorPort + ResetPort,
    T: ClockPort + DelayNs,
    S: StoragePort,
{
    hw: H,
    time: T,
    store: PhaseStore<S>,
    config: FeederConfig,
    input: InputLayer,
    lid: LidController,
    fsm: Fsm,
    ctx: FsmContext,
    bus: EventBus,
    pacer: LoopPacer,
    /// When the current recording window ends.
    recording_until: Option<u64>,
    tick_count: u64,
    booted: bool,
}

impl<H, T, S> FeederService<H, T, S>
where
    H: InputPort + LidServoPort + IndicatorPort + ResetPort,
    T: ClockPort + DelayNs,
    S: StoragePort,
{
    /// Construct the service.  Nothing moves until [`boot`](Self::boot).
    pub fn new(hw: H, time: T, storage: S, config: FeederConfig, latch: &'static TokenLatch) -> Self {
        latch.set_window_ms(config.token_dedupe_ms);
        Self {
            hw,
            time,
            store: PhaseStore::new(storage),
            input: InputLayer::new(latch, config.button_poll_ms),
            lid: LidController::new(config.clone()),
            fsm: Fsm::new(build_state_table(), TrainingPhase::Discovery),
            ctx: FsmContext::new(config.clone()),
            bus: EventBus::new(),
            pacer: LoopPacer::new(config.loop_period_ms),
            recording_until: None,
            tick_count: 0,
            booted: false,
            config,
        }
    }

    /// Add an observer.  Observers see events after the built-in policy
    /// has acted, in registration order.
    pub fn register_observer(&mut self, sink: Box<dyn EventSink>) -> Result<(), BusFull> {
        self.bus.register(sink)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load the phase, park and close the lid, acknowledge the phase on
    /// the indicator, and start the protocol.
    ///
    /// A fatal error leaves the lid untouched; the caller should hand it
    /// to [`safety::halt`](crate::safety::halt).
    pub fn boot(&mut self) -> Result<TrainingPhase, FatalError> {
        let phase = self.store.load()?;
        info!("BOOT: phase {}", phase.number());
        self.fsm = Fsm::new(build_state_table(), phase);

        self.lid.park(&mut self.hw, &mut self.time);
        if self.lid.close(&mut self.hw, &mut self.time) {
            self.bus.emit(&AppEvent::LidClosed);
        }

        // Edges in the first window after boot are treated as bounce.
        self.input.latch().seed(self.time.now_ms() as u32);

        self.blink_phase(phase);
        self.time.delay_ms(self.config.boot_final_settle_ms);

        let now = self.time.now_ms();
        self.ctx
            .begin_tick(now, false, self.lid.is_open(), self.lid.close_pending());
        self.fsm.start(&mut self.ctx);
        self.apply_commands();

        self.booted = true;
        self.bus.emit(&AppEvent::Started { phase });
        info!("BOOT: ready");
        Ok(phase)
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// One control iteration followed by padding to the loop period.
    pub fn run_iteration(&mut self) {
        let started = self.time.now_ms();
        self.tick();
        self.pacer.pad(started, &mut self.time);
    }

    /// One control iteration without padding.
    pub fn tick(&mut self) {
        if !self.booted {
            warn!("SERVICE: tick before boot ignored");
            return;
        }
        self.tick_count += 1;

        // 1. Auto-close, independent of phase.
        let now = self.time.now_ms();
        if self.lid.service_auto_close(now, &mut self.hw, &mut self.time) {
            self.bus.emit(&AppEvent::LidClosed);
        }

        // 2. Inputs.  A close may have blocked, so re-read the clock.
        let now = self.time.now_ms();
        let perch = self.input.poll_perch(&mut self.hw);
        while self.input.take_pending_token_event() {
            self.ctx.deposits.accept();
            self.bus.emit(&AppEvent::DepositAccepted {
                queued: self.ctx.deposits.pending,
            });
        }

        // 3. Protocol dispatch.
        let presence_before = self.ctx.presence;
        self.ctx
            .begin_tick(now, perch, self.lid.is_open(), self.lid.close_pending());
        self.fsm.tick(&mut self.ctx);
        self.publish_protocol_events(presence_before);
        self.apply_commands();

        // 4. Recording deadline.
        self.service_recording();

        // 5. Phase select.
        if self
            .input
            .poll_phase_advance_button(&mut self.hw, &mut self.time)
        {
            self.advance_phase();
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> TrainingPhase {
        self.fsm.current_phase()
    }

    pub fn lid_state(&self) -> LidState {
        self.lid.state()
    }

    pub fn close_deadline(&self) -> Option<u64> {
        self.lid.close_deadline()
    }

    pub fn queued_deposits(&self) -> u16 {
        self.ctx.deposits.pending
    }

    pub fn presence(&self) -> PresenceRecord {
        self.ctx.presence
    }

    /// How long the subject has been on the perch, if present.
    pub fn time_present(&self) -> Option<u64> {
        self.ctx.presence.time_present(self.time.now_ms())
    }

    /// How long the perch has been empty, if it was ever vacated.
    pub fn time_absent(&self) -> Option<u64> {
        self.ctx.presence.time_absent(self.time.now_ms())
    }

    pub fn recording_until(&self) -> Option<u64> {
        self.recording_until
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &FeederConfig {
        &self.config
    }

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn time(&self) -> &T {
        &self.time
    }

    pub fn storage(&self) -> &S {
        self.store.storage()
    }

    /// Split out the indicator, delay and config for the fatal halt.
    pub fn halt_parts(&mut self) -> (&FeederConfig, &mut H, &mut T) {
        (&self.config, &mut self.hw, &mut self.time)
    }

    // ── Internal ──────────────────────────────────────────────

    fn publish_protocol_events(&mut self, before: PresenceRecord) {
        match self.ctx.edge {
            Some(PerchEdge::Arrived) => self.bus.emit(&AppEvent::PerchArrived {
                at_ms: self.ctx.now_ms,
            }),
            Some(PerchEdge::Departed) => {
                let stayed_ms = before
                    .landed_at
                    .map_or(0, |t| self.ctx.now_ms.saturating_sub(t));
                self.bus.emit(&AppEvent::PerchDeparted {
                    at_ms: self.ctx.now_ms,
                    stayed_ms,
                });
            }
            None => {}
        }
        if self.ctx.redeemed {
            self.bus.emit(&AppEvent::DepositRedeemed {
                remaining: self.ctx.deposits.pending,
            });
        }
    }

    /// Translate the FSM's commands into lid moves and bookkeeping.
    fn apply_commands(&mut self) {
        let cmds = self.ctx.commands;
        self.ctx.commands.clear();

        if cmds.cancel_scheduled_close {
            self.lid.cancel_scheduled_close();
        }

        match cmds.lid {
            LidCommand::Hold => {}
            LidCommand::Open { close_after_ms } => {
                if self.lid.open(&mut self.hw, &mut self.time) {
                    self.bus.emit(&AppEvent::LidOpened);
                }
                if let Some(after) = close_after_ms {
                    self.lid.schedule_close_after(self.time.now_ms(), after);
                    if let Some(deadline_ms) = self.lid.close_deadline() {
                        self.bus.emit(&AppEvent::AutoCloseScheduled { deadline_ms });
                    }
                }
            }
            LidCommand::Close => {
                if self.lid.close(&mut self.hw, &mut self.time) {
                    self.bus.emit(&AppEvent::LidClosed);
                }
            }
        }

        if let Some(duration_ms) = cmds.record_for_ms {
            self.request_recording(duration_ms);
        }
    }

    /// Start a recording window or stretch the current one.
    fn request_recording(&mut self, duration_ms: u32) {
        let until = self.time.now_ms() + u64::from(duration_ms);
        self.recording_until = Some(self.recording_until.map_or(until, |u| u.max(until)));
        self.bus.emit(&AppEvent::RecordingRequested { duration_ms });
    }

    fn service_recording(&mut self) {
        if let Some(until) = self.recording_until {
            if self.time.now_ms() >= until {
                self.recording_until = None;
                self.bus.emit(&AppEvent::RecordingStopped);
            }
        }
    }

    fn advance_phase(&mut self) {
        let now = self.time.now_ms();
        let perch = self.ctx.perch_occupied;
        self.ctx
            .begin_tick(now, perch, self.lid.is_open(), self.lid.close_pending());
        let (from, to) = self.fsm.advance(&mut self.ctx);
        info!("PHASE: {} -> {}", from.number(), to.number());

        // Persist before anything moves: the entry close below can block
        // for the whole stepped descent.
        match self.store.save(to) {
            Ok(true) => {}
            Ok(false) => warn!("PHASE: {} already stored", to.number()),
            Err(e) => error!("PHASE: persisting {} failed: {}", to.number(), e),
        }

        self.blink_phase(to);
        self.bus.emit(&AppEvent::PhaseAdvanced { from, to });
        info!("PHASE: restarting");
        self.hw.request_reset();

        // Only reached when the reset returns (host builds).  On hardware
        // the next boot parks and closes the lid instead.
        self.apply_commands();
    }

    fn blink_phase(&mut self, phase: TrainingPhase) {
        let pattern = BlinkPattern::phase_ack(phase.number(), &self.config);
        led_patterns::play(&pattern, &mut self.hw, &mut self.time);
    }
}
