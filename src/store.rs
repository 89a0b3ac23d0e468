//! Persistent phase store.
//!
//! Layout at the start of the byte store:
//!
//! ```text
//! addr  0   1   2   3   4
//!     ┌───┬───┬───┬───┬───────┐
//!     │ C │ r │ O │ S │ phase │
//!     └───┴───┴───┴───┴───────┘
//! ```
//!
//! The header is checked once at boot.  A missing or foreign header is
//! rewritten with phase 1 exactly once; if it still fails to read back,
//! the store is treated as corrupt.

use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};
use crate::error::FatalError;
use crate::fsm::TrainingPhase;

/// Header identifying an initialised store.
pub const MAGIC: [u8; 4] = *b"CrOS";
/// Address of the header.
pub const MAGIC_ADDR: usize = 0;
/// Address of the phase byte.
pub const PHASE_ADDR: usize = MAGIC_ADDR + MAGIC.len();
/// Bytes occupied by the layout.
pub const LAYOUT_LEN: usize = PHASE_ADDR + 1;

/// Validates, loads and saves the training phase.
pub struct PhaseStore<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> PhaseStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Validate the header and return the stored phase.
    ///
    /// Uninitialised storage comes back as phase 1.
    pub fn load(&mut self) -> Result<TrainingPhase, FatalError> {
        if !self.header_valid() {
            warn!("STORE: header missing, initialising");
            self.initialise().map_err(|e| {
                warn!("STORE: initialisation failed: {}", e);
                FatalError::ConfigCorrupt
            })?;
            if !self.header_valid() {
                return Err(FatalError::ConfigCorrupt);
            }
        }

        let mut phase = [0u8; 1];
        self.storage
            .read(PHASE_ADDR, &mut phase)
            .map_err(|_| FatalError::ConfigCorrupt)?;
        let phase = TrainingPhase::from_u8(phase[0])?;
        info!("STORE: loaded phase {}", phase.number());
        Ok(phase)
    }

    /// Persist `phase`.  Returns `Ok(false)` when it was already stored
    /// and no write happened.
    pub fn save(&mut self, phase: TrainingPhase) -> Result<bool, StorageError> {
        let mut current = [0u8; 1];
        self.storage.read(PHASE_ADDR, &mut current)?;
        if current[0] == phase.number() {
            return Ok(false);
        }
        self.storage.write(PHASE_ADDR, &[phase.number()])?;
        info!("STORE: saved phase {}", phase.number());
        Ok(true)
    }

    /// The underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn header_valid(&self) -> bool {
        let mut header = [0u8; MAGIC.len()];
        match self.storage.read(MAGIC_ADDR, &mut header) {
            Ok(()) => header == MAGIC,
            Err(_) => false,
        }
    }

    fn initialise(&mut self) -> Result<(), StorageError> {
        self.storage.write(MAGIC_ADDR, &MAGIC)?;
        self.storage
            .write(PHASE_ADDR, &[TrainingPhase::Discovery.number()])
    }
}
