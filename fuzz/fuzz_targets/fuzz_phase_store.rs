//! Fuzz target: `PhaseStore` load / save
//!
//! The first bytes seed the EEPROM image; the rest are a sequence of
//! phase saves interleaved with reloads.  Asserts that:
//! - load never panics and only fails with a typed fault
//! - a successful load always leaves a valid header behind
//! - after any successful save, load returns the saved phase
//!
//! cargo fuzz run fuzz_phase_store

#![no_main]

use libfuzzer_sys::fuzz_target;
use perchfeed::app::ports::{StorageError, StoragePort};
use perchfeed::fsm::TrainingPhase;
use perchfeed::store::{LAYOUT_LEN, MAGIC, PhaseStore};

// ── In-memory StoragePort for fuzz testing ────────────────────

struct MemStore(Vec<u8>);

impl StoragePort for MemStore {
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let src = self.0.get(addr..addr + buf.len()).ok_or(StorageError::OutOfBounds)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        let dst = self.0.get_mut(addr..addr + data.len()).ok_or(StorageError::OutOfBounds)?;
        dst.copy_from_slice(data);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.0.len()
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < LAYOUT_LEN {
        return;
    }
    let (image, ops) = data.split_at(LAYOUT_LEN);
    let mut store = PhaseStore::new(MemStore(image.to_vec()));

    if store.load().is_err() {
        return;
    }
    assert_eq!(&store.storage().0[..MAGIC.len()], &MAGIC);

    for &op in ops {
        let Ok(phase) = TrainingPhase::from_u8(op % 4 + 1) else {
            return;
        };
        if store.save(phase).is_err() {
            return;
        }
        assert_eq!(store.load(), Ok(phase));
    }
});
