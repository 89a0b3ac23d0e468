//! Application core: pure domain logic, zero I/O.
//!
//! The business rules of the feeder: boot sequence, per-iteration
//! orchestration of inputs, protocol FSM and lid, and event publication.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
