//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A camera trigger or radio uplink would implement the same trait.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { phase } => {
                info!("START | phase={}", phase.number());
            }
            AppEvent::PerchArrived { at_ms } => {
                info!("PERCH | arrived t={}ms", at_ms);
            }
            AppEvent::PerchDeparted { at_ms, stayed_ms } => {
                info!("PERCH | departed t={}ms stayed={}ms", at_ms, stayed_ms);
            }
            AppEvent::DepositAccepted { queued } => {
                info!("TOKEN | accepted, queued={}", queued);
            }
            AppEvent::DepositRedeemed { remaining } => {
                info!("TOKEN | redeemed, remaining={}", remaining);
            }
            AppEvent::LidOpened => {
                info!("LID   | open");
            }
            AppEvent::LidClosed => {
                info!("LID   | closed");
            }
            AppEvent::AutoCloseScheduled { deadline_ms } => {
                info!("LID   | auto-close at t={}ms", deadline_ms);
            }
            AppEvent::RecordingRequested { duration_ms } => {
                info!("REC   | start {}ms", duration_ms);
            }
            AppEvent::RecordingStopped => {
                info!("REC   | stop");
            }
            AppEvent::PhaseAdvanced { from, to } => {
                info!("PHASE | {} -> {}", from.number(), to.number());
            }
        }
    }
}
