//! PerchFeed Firmware: Main Entry Point
//!
//! Hexagonal architecture around a fixed-period control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink   NvsAdapter   Esp32Time  │
//! │  (Input+Lid+LED+Reset)  (EventSink)    (Storage+    (Clock+    │
//! │                                         Config)      Delay)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              FeederService (pure logic)                │    │
//! │  │  InputLayer · Phase FSM · LidController · PhaseStore   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Token ISR ──▶ TokenLatch (lock-free) ──▶ FeederService        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{error, info, warn};

use perchfeed::adapters::hardware::HardwareAdapter;
use perchfeed::adapters::log_sink::LogEventSink;
use perchfeed::adapters::nvs::NvsAdapter;
use perchfeed::adapters::time::Esp32TimeAdapter;
use perchfeed::app::ports::ConfigPort;
use perchfeed::app::service::FeederService;
use perchfeed::config::FeederConfig;
use perchfeed::drivers::servo::ServoDriver;
use perchfeed::drivers::status_led::StatusLed;
use perchfeed::error::FatalError;
use perchfeed::events::TOKEN_LATCH;
use perchfeed::{drivers, safety};

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PerchFeed v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = drivers::hw_init::init_peripherals() {
        // Nothing can move safely without configured pins.
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    let mut hw = HardwareAdapter::new(ServoDriver::new(), StatusLed::new());
    let mut time = Esp32TimeAdapter::new();

    // ── 3. Storage + tuning ───────────────────────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            error!("NVS init failed ({}), phase cannot be loaded", e);
            safety::halt(FatalError::ConfigCorrupt, &FeederConfig::default(), &mut hw, &mut time);
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            FeederConfig::default()
        }
    };

    // ── 4. Application service ────────────────────────────────
    let mut service = FeederService::new(hw, time, nvs, config, &TOKEN_LATCH);
    if let Err(e) = service.register_observer(Box::new(LogEventSink::new())) {
        warn!("Log sink not registered: {}", e);
    }

    if let Err(fault) = service.boot() {
        let (config, hw, time) = service.halt_parts();
        safety::halt(fault, config, hw, time);
    }

    // Armed only after boot seeded the latch.
    if let Err(e) = drivers::hw_init::init_isr_service() {
        error!("ISR service init failed: {}, deposits will not register", e);
    }

    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        service.run_iteration();
    }
}
