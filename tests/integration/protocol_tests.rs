//! Per-phase protocol behaviour driven through the full service.

use perchfeed::app::events::AppEvent;
use perchfeed::control::lid::LidState;
use perchfeed::fsm::TrainingPhase;

use super::mock_hw::Rig;

fn count(events: &[AppEvent], pred: impl Fn(&AppEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

// ── Phase 1: discovery ────────────────────────────────────────

#[test]
fn discovery_opens_lid_and_keeps_it_open() {
    let mut rig = Rig::booted(1);
    rig.tick();
    assert_eq!(rig.events(), vec![AppEvent::LidOpened]);
    assert_eq!(rig.svc.lid_state(), LidState::Open);
    assert_eq!(rig.svc.close_deadline(), None);

    rig.clock.advance(60_000);
    rig.tick();
    assert_eq!(rig.svc.lid_state(), LidState::Open);
    assert_eq!(rig.events().len(), 1);
}

#[test]
fn discovery_arrival_records_without_moving_lid() {
    let mut rig = Rig::booted(1);
    rig.tick();
    rig.clear();

    rig.set_perch(true);
    let t = rig.now();
    rig.tick();
    assert_eq!(
        rig.events(),
        vec![
            AppEvent::PerchArrived { at_ms: t },
            AppEvent::RecordingRequested { duration_ms: 15_000 },
        ]
    );
    assert!(rig.svc.hw().angles.is_empty());
    assert_eq!(rig.svc.recording_until(), Some(t + 15_000));

    rig.clock.advance(15_000);
    rig.tick();
    assert_eq!(rig.events().last(), Some(&AppEvent::RecordingStopped));
    assert_eq!(rig.svc.recording_until(), None);
}

// ── Phase 2: reward on arrival ────────────────────────────────

#[test]
fn arrival_opens_then_auto_closes() {
    let mut rig = Rig::booted(2);
    let t0 = rig.now();
    rig.set_perch(true);
    rig.tick();
    assert_eq!(
        rig.events(),
        vec![
            AppEvent::PerchArrived { at_ms: t0 },
            AppEvent::LidOpened,
            AppEvent::AutoCloseScheduled {
                deadline_ms: t0 + 16_000
            },
            AppEvent::RecordingRequested { duration_ms: 15_000 },
        ]
    );
    assert_eq!(rig.svc.time_present(), Some(1000));

    // Leaving does not close the lid early.
    rig.clear();
    rig.set_perch(false);
    rig.clock.advance(4000);
    rig.tick();
    assert_eq!(
        rig.events(),
        vec![AppEvent::PerchDeparted {
            at_ms: t0 + 5000,
            stayed_ms: 5000
        }]
    );
    assert_eq!(rig.svc.lid_state(), LidState::Open);
    assert_eq!(rig.svc.time_absent(), Some(0));

    rig.clear();
    rig.clock.advance(11_000);
    rig.tick();
    assert_eq!(rig.events(), vec![AppEvent::LidClosed]);
    assert_eq!(rig.svc.lid_state(), LidState::Closed);
    assert_eq!(rig.svc.close_deadline(), None);
}

#[test]
fn re_arrival_while_open_extends_the_window() {
    let mut rig = Rig::booted(2);
    let t0 = rig.now();
    rig.set_perch(true);
    rig.tick();
    rig.set_perch(false);
    rig.tick();

    rig.clear();
    rig.clock.advance(5000);
    rig.set_perch(true);
    rig.tick();
    assert_eq!(
        rig.events(),
        vec![
            AppEvent::PerchArrived { at_ms: t0 + 6000 },
            AppEvent::AutoCloseScheduled {
                deadline_ms: t0 + 21_000
            },
            AppEvent::RecordingRequested { duration_ms: 15_000 },
        ]
    );
    assert!(rig.svc.hw().angles.is_empty());
}

#[test]
fn deposits_do_not_open_in_arrival_phase() {
    let mut rig = Rig::booted(2);
    assert!(rig.deposit());
    rig.tick();
    assert_eq!(rig.events(), vec![AppEvent::DepositAccepted { queued: 1 }]);
    assert_eq!(rig.svc.lid_state(), LidState::Closed);
    assert_eq!(rig.svc.queued_deposits(), 1);
}

// ── Phases 3 and 4: reward on deposit ─────────────────────────

#[test]
fn deposit_opens_with_auto_close() {
    for phase in [3u8, 4] {
        let mut rig = Rig::booted(phase);
        let t0 = rig.now();
        assert!(rig.deposit());
        rig.tick();
        assert_eq!(
            rig.events(),
            vec![
                AppEvent::DepositAccepted { queued: 1 },
                AppEvent::DepositRedeemed { remaining: 0 },
                AppEvent::LidOpened,
                AppEvent::AutoCloseScheduled {
                    deadline_ms: t0 + 16_000
                },
                AppEvent::RecordingRequested { duration_ms: 10_000 },
            ]
        );
        assert_eq!(rig.svc.queued_deposits(), 0);
    }
}

#[test]
fn perch_alone_does_not_open_deposit_phase() {
    let mut rig = Rig::booted(3);
    rig.set_perch(true);
    rig.tick();
    assert_eq!(rig.events(), vec![AppEvent::PerchArrived { at_ms: rig.now() }]);
    assert_eq!(rig.svc.lid_state(), LidState::Closed);
}

#[test]
fn token_bounce_counts_once() {
    let mut rig = Rig::booted(3);
    assert!(rig.deposit());
    assert!(!rig.deposit());
    rig.clock.advance(999);
    assert!(!rig.deposit());
    rig.tick();
    let events = rig.events();
    assert_eq!(
        count(&events, |e| matches!(e, AppEvent::DepositAccepted { .. })),
        1
    );
}

#[test]
fn deposit_while_open_is_redeemed_after_close() {
    let mut rig = Rig::booted(3);
    let t0 = rig.now();
    rig.deposit();
    rig.tick();

    // Second deposit while the lid is open stays queued.
    rig.clear();
    rig.clock.advance(2000);
    assert!(rig.deposit());
    rig.tick();
    assert_eq!(rig.events(), vec![AppEvent::DepositAccepted { queued: 1 }]);
    assert_eq!(rig.svc.queued_deposits(), 1);

    // Deadline passes: close, then the queued deposit reopens.
    rig.clear();
    rig.clock.advance(t0 + 16_000 - rig.now());
    rig.tick();
    let after = rig.now();
    assert_eq!(
        rig.events(),
        vec![
            AppEvent::LidClosed,
            AppEvent::DepositRedeemed { remaining: 0 },
            AppEvent::LidOpened,
            AppEvent::AutoCloseScheduled {
                deadline_ms: after + 15_000
            },
            AppEvent::RecordingRequested { duration_ms: 10_000 },
        ]
    );
    assert_eq!(rig.svc.queued_deposits(), 0);
}

#[test]
fn several_queued_deposits_redeem_one_per_cycle() {
    let mut rig = Rig::booted(4);
    for _ in 0..3 {
        assert!(rig.deposit());
        rig.clock.advance(1000);
    }
    rig.tick();
    assert_eq!(rig.svc.queued_deposits(), 2);
    let events = rig.events();
    assert_eq!(
        count(&events, |e| matches!(e, AppEvent::DepositAccepted { .. })),
        3
    );
    assert_eq!(count(&events, |e| *e == AppEvent::LidOpened), 1);
}

// ── Phase select ──────────────────────────────────────────────

#[test]
fn button_advances_persists_and_resets() {
    let mut rig = Rig::booted(1);
    rig.tick();
    rig.clear();

    rig.svc.hw_mut().press_button();
    rig.tick();
    assert_eq!(
        rig.events(),
        vec![
            AppEvent::PhaseAdvanced {
                from: TrainingPhase::Discovery,
                to: TrainingPhase::RewardOnArrival,
            },
            AppEvent::LidClosed,
        ]
    );
    assert_eq!(rig.svc.phase(), TrainingPhase::RewardOnArrival);
    assert_eq!(rig.svc.storage().phase_byte(), 2);
    assert_eq!(rig.svc.storage().writes, 1);
    assert_eq!(rig.svc.hw().led_blinks(), 2);
    assert_eq!(rig.svc.hw().resets, 1);
}

#[test]
fn advance_persists_and_resets_before_the_lid_moves() {
    let mut rig = Rig::booted(1);
    rig.tick();
    assert_eq!(rig.svc.lid_state(), LidState::Open);
    rig.clear();
    let writes_before = rig.svc.storage().written_at.len();

    rig.svc.hw_mut().press_button();
    rig.tick();

    let written_at = rig.svc.storage().written_at[writes_before..].to_vec();
    assert_eq!(written_at.len(), 1);
    let first_move = rig.svc.hw().angle_times[0];
    let blink_ms = 2 * 2 * u64::from(rig.svc.config().phase_blink_ms);
    assert!(written_at[0] + blink_ms <= first_move);

    // The reset was raised with no servo move since the press.
    assert_eq!(rig.svc.hw().angles_at_reset, vec![0]);
    assert_eq!(rig.svc.lid_state(), LidState::Closed);
}

#[test]
fn button_wraps_from_last_phase_to_first() {
    let mut rig = Rig::booted(4);
    rig.svc.hw_mut().press_button();
    rig.tick();
    assert_eq!(
        rig.events(),
        vec![AppEvent::PhaseAdvanced {
            from: TrainingPhase::DepositSolo,
            to: TrainingPhase::Discovery,
        }]
    );
    assert_eq!(rig.svc.storage().phase_byte(), 1);
    assert_eq!(rig.svc.hw().led_blinks(), 1);
}

#[test]
fn held_button_advances_once() {
    let mut rig = Rig::booted(2);
    rig.svc.hw_mut().button_reads = 50;
    let t = rig.now();
    rig.tick();
    let events = rig.events();
    assert_eq!(
        count(&events, |e| matches!(e, AppEvent::PhaseAdvanced { .. })),
        1
    );
    assert_eq!(rig.svc.hw().button_reads, 0);
    // 49 polls of 10 ms while held, then 3 blinks of 500 ms.
    assert_eq!(rig.now(), t + 490 + 1500);
}
