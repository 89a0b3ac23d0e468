//! Boot sequence: phase load, lid parking and close, indicator ack.

use perchfeed::app::events::AppEvent;
use perchfeed::control::lid::LidState;
use perchfeed::error::FatalError;
use perchfeed::fsm::TrainingPhase;
use perchfeed::store::MAGIC;

use super::mock_hw::{MemStorage, Rig};

#[test]
fn fresh_storage_boots_into_discovery() {
    let mut rig = Rig::new(MemStorage::erased());
    assert_eq!(rig.svc.boot(), Ok(TrainingPhase::Discovery));

    let storage = rig.svc.storage();
    assert_eq!(&storage.bytes[..4], &MAGIC);
    assert_eq!(storage.phase_byte(), 1);
    assert_eq!(storage.writes, 2);
}

#[test]
fn stored_phase_is_restored_without_writes() {
    let mut rig = Rig::new(MemStorage::with_phase(3));
    assert_eq!(rig.svc.boot(), Ok(TrainingPhase::DepositAssisted));
    assert_eq!(rig.svc.phase(), TrainingPhase::DepositAssisted);
    assert_eq!(rig.svc.storage().writes, 0);
}

#[test]
fn out_of_range_phase_is_fatal_before_any_motion() {
    let mut rig = Rig::new(MemStorage::with_phase(9));
    assert_eq!(rig.svc.boot(), Err(FatalError::InvalidPhase));
    assert!(rig.svc.hw().angles.is_empty());
    assert_eq!(rig.svc.lid_state(), LidState::Unknown);
    assert!(rig.events().is_empty());
}

#[test]
fn unwritable_blank_storage_is_corrupt() {
    let mut storage = MemStorage::erased();
    storage.read_only = true;
    let mut rig = Rig::new(storage);
    assert_eq!(rig.svc.boot(), Err(FatalError::ConfigCorrupt));
    assert!(rig.svc.hw().angles.is_empty());
}

#[test]
fn boot_parks_then_closes_the_lid() {
    let mut rig = Rig::new(MemStorage::with_phase(1));
    rig.svc.boot().unwrap();

    let angles = &rig.svc.hw().angles;
    assert_eq!(&angles[..3], &[90, 180, 180]);
    assert_eq!(angles[3], 168);
    assert_eq!(angles.len(), 19);
    assert_eq!(&angles[angles.len() - 2..], &[0, 0]);

    assert_eq!(rig.svc.lid_state(), LidState::Closed);
    assert!(!rig.svc.hw().attached);
    assert_eq!(rig.svc.close_deadline(), None);
}

#[test]
fn boot_blinks_phase_and_takes_fixed_time() {
    for phase in 1..=4u8 {
        let mut rig = Rig::new(MemStorage::with_phase(phase));
        rig.svc.boot().unwrap();
        assert_eq!(rig.svc.hw().led_blinks(), usize::from(phase));
        assert_eq!(rig.svc.hw().led.last(), Some(&false));
        // park 3000 + close 12650 + blinks + settle 1000
        assert_eq!(rig.now(), 16_650 + 500 * u64::from(phase));
    }
}

#[test]
fn boot_publishes_close_then_started() {
    let mut rig = Rig::new(MemStorage::with_phase(2));
    rig.svc.boot().unwrap();
    assert_eq!(
        rig.events(),
        vec![
            AppEvent::LidClosed,
            AppEvent::Started {
                phase: TrainingPhase::RewardOnArrival
            }
        ]
    );
}

#[test]
fn token_bounce_right_after_seed_is_ignored() {
    let mut rig = Rig::new(MemStorage::with_phase(3));
    rig.svc.boot().unwrap();
    // Seeded when the close finished; blinks + settle are 2500 ms later.
    let seeded_at = rig.latch.last_accepted_ms().unwrap();
    assert_eq!(u64::from(seeded_at), rig.now() - 2500);
    assert!(!rig.latch.on_edge(seeded_at + 999));
    assert!(rig.latch.on_edge(seeded_at + 1000));
}

#[test]
fn tick_before_boot_does_nothing() {
    let mut rig = Rig::new(MemStorage::with_phase(2));
    rig.set_perch(true);
    rig.tick();
    assert_eq!(rig.svc.tick_count(), 0);
    assert!(rig.events().is_empty());
    assert!(rig.svc.hw().angles.is_empty());
}

#[test]
fn foreign_header_is_reinitialised_to_phase_one() {
    let mut storage = MemStorage::with_phase(3);
    storage.bytes[..4].copy_from_slice(b"XXXX");
    let mut rig = Rig::new(storage);
    assert_eq!(rig.svc.boot(), Ok(TrainingPhase::Discovery));
    assert_eq!(&rig.svc.storage().bytes[..4], &MAGIC);
    assert_eq!(rig.svc.storage().phase_byte(), 1);
}
