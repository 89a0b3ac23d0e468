//! Mock adapters for integration tests.
//!
//! Records every servo, LED and reset call so tests can assert on the
//! full command history.  Time only moves when something waits on it,
//! or when a test advances it explicitly.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use perchfeed::app::events::AppEvent;
use perchfeed::app::ports::{
    ClockPort, EventSink, IndicatorPort, InputPort, LidServoPort, ResetPort, StorageError,
    StoragePort,
};
use perchfeed::app::service::FeederService;
use perchfeed::config::FeederConfig;
use perchfeed::events::TokenLatch;
use perchfeed::store::{MAGIC, PHASE_ADDR};

// ── ManualTime ────────────────────────────────────────────────

/// Shared simulated clock.  Clones see the same time.
#[derive(Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<u64>>,
}

#[allow(dead_code)]
impl ManualTime {
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl ClockPort for ManualTime {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

impl DelayNs for ManualTime {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(u64::from(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

// ── MockHw ────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockHw {
    pub perch: bool,
    /// Reads left before the phase button reports released.
    pub button_reads: u32,
    pub attached: bool,
    pub angles: Vec<u8>,
    pub led: Vec<bool>,
    pub resets: u32,
    /// Servo moves recorded when each reset was requested.
    pub angles_at_reset: Vec<usize>,
    /// Clock reading at each servo move, when a clock is attached.
    pub angle_times: Vec<u64>,
    pub clock: Option<ManualTime>,
}

#[allow(dead_code)]
impl MockHw {
    /// Press and hold the phase button for a couple of polls.
    pub fn press_button(&mut self) {
        self.button_reads = 3;
    }

    pub fn led_blinks(&self) -> usize {
        self.led.iter().filter(|&&on| on).count()
    }
}

impl InputPort for MockHw {
    fn perch_occupied(&mut self) -> bool {
        self.perch
    }

    fn phase_button_pressed(&mut self) -> bool {
        if self.button_reads > 0 {
            self.button_reads -= 1;
            true
        } else {
            false
        }
    }
}

impl LidServoPort for MockHw {
    fn attach(&mut self) {
        self.attached = true;
    }

    fn detach(&mut self) {
        self.attached = false;
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn write_angle(&mut self, degrees: u8) {
        assert!(self.attached, "servo written while detached");
        self.angles.push(degrees);
        if let Some(clock) = &self.clock {
            self.angle_times.push(clock.now_ms());
        }
    }
}

impl IndicatorPort for MockHw {
    fn set_indicator(&mut self, on: bool) {
        self.led.push(on);
    }
}

impl ResetPort for MockHw {
    fn request_reset(&mut self) {
        self.resets += 1;
        self.angles_at_reset.push(self.angles.len());
    }
}

// ── MemStorage ────────────────────────────────────────────────

pub struct MemStorage {
    pub bytes: Vec<u8>,
    pub writes: usize,
    pub read_only: bool,
    /// Clock reading at each successful write, when a clock is attached.
    pub written_at: Vec<u64>,
    pub clock: Option<ManualTime>,
}

#[allow(dead_code)]
impl MemStorage {
    /// Never-written EEPROM.
    pub fn erased() -> Self {
        Self {
            bytes: vec![0xFF; 64],
            writes: 0,
            read_only: false,
            written_at: Vec::new(),
            clock: None,
        }
    }

    /// Initialised store holding `phase`.
    pub fn with_phase(phase: u8) -> Self {
        let mut s = Self::erased();
        s.bytes[..MAGIC.len()].copy_from_slice(&MAGIC);
        s.bytes[PHASE_ADDR] = phase;
        s
    }

    pub fn phase_byte(&self) -> u8 {
        self.bytes[PHASE_ADDR]
    }
}

impl StoragePort for MemStorage {
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let src = self
            .bytes
            .get(addr..addr + buf.len())
            .ok_or(StorageError::OutOfBounds)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::IoError);
        }
        let dst = self
            .bytes
            .get_mut(addr..addr + data.len())
            .ok_or(StorageError::OutOfBounds)?;
        dst.copy_from_slice(data);
        self.writes += 1;
        if let Some(clock) = &self.clock {
            self.written_at.push(clock.now_ms());
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

// ── CollectingSink ────────────────────────────────────────────

pub struct CollectingSink(pub Rc<RefCell<Vec<AppEvent>>>);

impl EventSink for CollectingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.0.borrow_mut().push(*event);
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type Feeder = FeederService<MockHw, ManualTime, MemStorage>;

/// A service wired to mocks, plus handles on the shared pieces.
pub struct Rig {
    pub svc: Feeder,
    pub clock: ManualTime,
    pub latch: &'static TokenLatch,
    events: Rc<RefCell<Vec<AppEvent>>>,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(mut storage: MemStorage) -> Self {
        let clock = ManualTime::default();
        storage.clock = Some(clock.clone());
        let hw = MockHw {
            clock: Some(clock.clone()),
            ..MockHw::default()
        };
        let latch: &'static TokenLatch = Box::leak(Box::new(TokenLatch::new()));
        let mut svc = FeederService::new(
            hw,
            clock.clone(),
            storage,
            FeederConfig::default(),
            latch,
        );
        let events = Rc::new(RefCell::new(Vec::new()));
        svc.register_observer(Box::new(CollectingSink(events.clone())))
            .expect("bus has room");
        Self {
            svc,
            clock,
            latch,
            events,
        }
    }

    /// Booted in `phase`, with the boot history cleared.
    pub fn booted(phase: u8) -> Self {
        let mut rig = Self::new(MemStorage::with_phase(phase));
        rig.svc.boot().expect("boot");
        rig.clear();
        rig
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn tick(&mut self) {
        self.svc.tick();
    }

    pub fn set_perch(&mut self, occupied: bool) {
        self.svc.hw_mut().perch = occupied;
    }

    /// A token edge at the current time, as the interrupt would see it.
    pub fn deposit(&self) -> bool {
        self.latch.on_edge(self.now() as u32)
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.events.borrow().clone()
    }

    /// Forget recorded events, servo moves and LED history.
    pub fn clear(&mut self) {
        self.events.borrow_mut().clear();
        let hw = self.svc.hw_mut();
        hw.angles.clear();
        hw.angle_times.clear();
        hw.led.clear();
    }
}
