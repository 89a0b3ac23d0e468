//! Lid motion as seen through the service: stepped close timing,
//! servo power, and loop pacing around long moves.

use perchfeed::app::events::AppEvent;
use perchfeed::control::lid::LidState;

use super::mock_hw::Rig;

/// Open the lid in the arrival phase and return the close deadline.
fn open_by_arrival(rig: &mut Rig) -> u64 {
    rig.set_perch(true);
    rig.tick();
    rig.svc.close_deadline().expect("auto-close armed")
}

#[test]
fn auto_close_walks_down_in_equal_steps() {
    let mut rig = Rig::booted(2);
    let deadline = open_by_arrival(&mut rig);
    rig.clear();

    rig.clock.advance(deadline - rig.now());
    let started = rig.now();
    rig.tick();

    let expected: Vec<u8> = std::iter::once(180)
        .chain((1..=15).map(|k| 180 - 12 * k))
        .chain(std::iter::once(0))
        .collect();
    assert_eq!(rig.svc.hw().angles, expected);
    // settle 1000 + 15 x 750 + final 400
    assert_eq!(rig.now() - started, 12_650);
    assert!(!rig.svc.hw().attached);
}

#[test]
fn servo_is_unpowered_between_moves() {
    let mut rig = Rig::booted(2);
    open_by_arrival(&mut rig);
    assert_eq!(rig.svc.lid_state(), LidState::Open);
    assert!(!rig.svc.hw().attached);
}

#[test]
fn close_does_not_fire_before_deadline() {
    let mut rig = Rig::booted(2);
    let deadline = open_by_arrival(&mut rig);
    rig.clear();

    rig.clock.advance(deadline - rig.now() - 1);
    rig.tick();
    assert_eq!(rig.svc.lid_state(), LidState::Open);
    assert!(rig.events().is_empty());
}

#[test]
fn late_tick_still_closes() {
    let mut rig = Rig::booted(2);
    let deadline = open_by_arrival(&mut rig);
    rig.set_perch(false);
    rig.clock.advance(deadline - rig.now() + 30_000);
    rig.tick();
    assert_eq!(rig.svc.lid_state(), LidState::Closed);
}

#[test]
fn advancing_with_close_pending_keeps_the_schedule() {
    let mut rig = Rig::booted(2);
    let deadline = open_by_arrival(&mut rig);
    rig.clear();

    rig.svc.hw_mut().press_button();
    rig.tick();
    assert_eq!(rig.svc.lid_state(), LidState::Open);
    assert_eq!(rig.svc.close_deadline(), Some(deadline));
    assert!(!rig.events().contains(&AppEvent::LidClosed));
}

// ── Loop pacing ───────────────────────────────────────────────

#[test]
fn idle_iteration_is_padded_to_period() {
    let mut rig = Rig::booted(3);
    let t = rig.now();
    rig.svc.run_iteration();
    assert_eq!(rig.now(), t + 20);
    rig.svc.run_iteration();
    assert_eq!(rig.now(), t + 40);
    assert_eq!(rig.svc.tick_count(), 2);
}

#[test]
fn long_iteration_is_not_padded() {
    let mut rig = Rig::booted(3);
    rig.deposit();
    let t = rig.now();
    rig.svc.run_iteration();
    // open settle only, no extra padding
    assert_eq!(rig.now(), t + 1000);
}
