//! End-to-end shift scenarios against the fake world.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::test_support::{
    FakeWorld, employed_session, holding, run_ticks, seated_in_work_vehicle,
};
use super::*;
use crate::error::{EquipmentError, RentalError, UploadError};
use crate::world::{PaymentSource, PresentationCue};

const STEP: Duration = Duration::from_millis(250);

fn on_air(world: &FakeWorld, session: &mut JobSession, now: Instant) -> Instant {
    holding(world, session, EquipmentKind::Camera, now);
    assert_eq!(session.broadcast_state(), Some(BroadcastState::Idle));

    session.toggle_shoulder(now).unwrap();
    let now = run_ticks(session, now, 2, STEP);
    assert_eq!(session.broadcast_state(), Some(BroadcastState::Shouldered));

    session.toggle_on_air(now).unwrap();
    let now = run_ticks(session, now, 2, STEP);
    assert!(session.broadcast_state().is_some_and(|b| b.is_on_air()));
    now
}

#[test]
fn test_sixty_five_seconds_on_air_records_one_minute_five() {
    let (world, mut session) = employed_session();
    let now = on_air(&world, &mut session, Instant::now());
    world.update(|state| state.snapshot.observers_nearby = true);

    run_ticks(&mut session, now, 65 * 4, STEP);

    assert_eq!(
        session.work_time(),
        WorkTime {
            minutes: 1,
            seconds: 5
        }
    );
}

#[test]
fn test_damage_on_air_drops_camera_next_cycle() {
    let (world, mut session) = employed_session();
    let now = on_air(&world, &mut session, Instant::now());
    let prop = session.equipment().prop().unwrap();

    world.update(|state| state.snapshot.health -= 10);
    let cause = session.tick(now + STEP);

    assert_eq!(cause, Some(InterruptionCause::Injured));
    assert_eq!(session.held_kind(), None);
    assert_eq!(session.broadcast_state(), None);
    assert!(!session.zoom_active());
    let state = world.state();
    assert_eq!(state.props[&prop].attached, None);
    assert!(!state.props[&prop].deleted);
    assert!(state.cues.contains(&PresentationCue::NewsOverlay { visible: false }));
    assert!(state.cues.contains(&PresentationCue::ClearPose));
}

#[test]
fn test_every_interruption_resets_within_one_cycle() {
    let conditions: [fn(&mut crate::world::ActorSnapshot); 5] = [
        |s| s.in_scenario = true,
        |s| s.restrained = true,
        |s| s.submerged = true,
        |s| s.climbing = true,
        |s| s.airborne = true,
    ];

    for condition in conditions {
        let (world, mut session) = employed_session();
        let now = on_air(&world, &mut session, Instant::now());

        world.update(|state| condition(&mut state.snapshot));
        assert!(session.tick(now + STEP).is_some());
        assert_eq!(session.equipment(), &EquipmentHeld::None);
    }

    let (world, mut session) = employed_session();
    let now = Instant::now();
    holding(&world, &mut session, EquipmentKind::Microphone, now);
    session.toggle_statement(now).unwrap();
    world.update(|state| state.snapshot.submerged = true);
    assert_eq!(session.tick(now + STEP), Some(InterruptionCause::Submerged));
    assert_eq!(session.speech_state(), None);
}

#[test]
fn test_random_storage_sequences_never_hold_two_items() {
    let mut rng = StdRng::seed_from_u64(42);
    let (world, mut session) = employed_session();
    let now = Instant::now();
    super::test_support::at_storage(&world, &mut session, now);

    for _ in 0..200 {
        let before = session.held_kind();
        if rng.gen_bool(0.6) {
            let kind = if rng.gen_bool(0.5) {
                EquipmentKind::Camera
            } else {
                EquipmentKind::Microphone
            };
            let result = session.acquire(kind, now);
            if before.is_some() {
                assert_eq!(result, Err(EquipmentError::AlreadyHolding));
                assert_eq!(session.held_kind(), before);
            } else {
                assert_eq!(result, Ok(StorageAccess::Completed));
                assert_eq!(session.held_kind(), Some(kind));
            }
        } else {
            let result = session.store(None, now);
            if before.is_some() {
                assert!(result.is_ok());
            } else {
                assert_eq!(result, Err(EquipmentError::NothingHeld));
            }
            assert_eq!(session.held_kind(), None);
        }
        let live_props = world
            .state()
            .props
            .values()
            .filter(|record| !record.deleted)
            .count();
        assert!(live_props <= 1);
    }
}

#[test]
fn test_accrual_is_monotonic_and_frozen_off_duty() {
    let (world, mut session) = employed_session();
    let mut now = on_air(&world, &mut session, Instant::now());
    world.update(|state| state.snapshot.observers_nearby = true);

    let mut last = session.work_time();
    for _ in 0..400 {
        now += STEP;
        session.tick(now);
        let current = session.work_time();
        assert!((current.minutes, current.seconds) >= (last.minutes, last.seconds));
        last = current;
    }

    session.teardown();
    let frozen = session.work_time();
    run_ticks(&mut session, now, 400, STEP);
    assert_eq!(session.work_time(), frozen);
}

#[test]
fn test_minutes_never_exceed_cap() {
    let world = FakeWorld::new();
    let mut config = (*world.config).clone();
    config.economy.max_recording_minutes = 1;
    config.timing.storage_full_cooldown_ms = 1_000;
    world.update(|state| state.snapshot.position = config.places.headquarters.position);
    let mut session = JobSession::new(
        super::test_support::ACTOR,
        std::sync::Arc::new(config),
        world.clone(),
    );
    let now = Instant::now();
    session.clock_in(now).unwrap();
    let now = on_air(&world, &mut session, now);
    world.update(|state| state.snapshot.observers_nearby = true);

    run_ticks(&mut session, now, 5 * 60 * 4, STEP);

    assert_eq!(session.work_time().minutes, 1);
    assert!(world.has_notification("media storage is full"));
}

#[test]
fn test_rental_return_with_everything_stored_refunds_deposit() {
    let (world, mut session) = employed_session();
    let now = Instant::now();
    world.update(|state| {
        state.snapshot.position = world.config.places.rental_pickup.position;
        state.snapshot.balance = 2_000;
    });
    let vehicle = session.request_rental().unwrap();

    // Walk to the rear of the van, take the camera and put it back.
    world.enter_vehicle(vehicle, true);
    session.tick(now);
    world.leave_vehicle();
    session.tick(now + STEP);
    assert_eq!(session.last_work_vehicle(), Some(vehicle));
    session.acquire(EquipmentKind::Camera, now).unwrap();
    session.store(None, now).unwrap();

    world.update(|state| {
        state.snapshot.position = world.config.places.rental_return.position;
    });
    world.enter_vehicle(vehicle, true);
    let outcome = session.request_return().unwrap();

    assert_eq!(outcome, RefundOutcome::Refunded { amount: 500 });
    assert_eq!(session.rental(), &RentalState::NoVehicle);
    let state = world.state();
    let refunds: Vec<_> = state
        .payments
        .iter()
        .filter(|p| p.source == PaymentSource::DepositReturn)
        .collect();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].amount, 500);
    assert!(state.removed_vehicles.contains(&vehicle));
}

#[test]
fn test_rental_return_with_dropped_equipment_forfeits() {
    let (world, mut session) = employed_session();
    let now = Instant::now();
    world.update(|state| {
        state.snapshot.position = world.config.places.rental_pickup.position;
        state.snapshot.balance = 2_000;
    });
    let vehicle = session.request_rental().unwrap();
    world.enter_vehicle(vehicle, true);
    world.leave_vehicle();
    session.tick(now);
    session.acquire(EquipmentKind::Microphone, now).unwrap();

    // Driving off with the microphone in hand drops it.
    world.update(|state| {
        state.snapshot.position = world.config.places.rental_return.position;
    });
    world.enter_vehicle(vehicle, true);
    assert_eq!(session.tick(now + STEP), Some(InterruptionCause::Driving));

    let outcome = session.request_return().unwrap();

    assert_eq!(outcome, RefundOutcome::Forfeited { outstanding: 1 });
    assert!(world.state().payments.is_empty());
    assert!(world.has_notification("deposit was not returned"));
    assert_eq!(session.rental(), &RentalState::NoVehicle);
}

#[test]
fn test_rental_below_deposit_never_deducts() {
    for balance in [0, 1, 250, 499] {
        let (world, mut session) = employed_session();
        world.update(|state| {
            state.snapshot.position = world.config.places.rental_pickup.position;
            state.snapshot.balance = balance;
        });

        assert!(matches!(
            session.request_rental(),
            Err(RentalError::InsufficientFunds { .. })
        ));
        assert!(world.state().deductions.is_empty());
        assert!(world.state().spawned_vehicles.is_empty());
    }
}

#[test]
fn test_upload_with_nothing_recorded_leaves_state_unchanged() {
    let (world, mut session) = employed_session();
    seated_in_work_vehicle(&world);
    let before = session.status();

    assert_eq!(
        session.upload(Instant::now()),
        Err(UploadError::NothingToUpload)
    );
    assert_eq!(session.status(), before);
}

#[test]
fn test_concurrent_upload_pays_once() {
    let (world, mut session) = employed_session();
    seated_in_work_vehicle(&world);
    session.work_time.minutes = 3;
    let now = Instant::now();

    let first = session.begin_upload(now).unwrap();
    let second = session.begin_upload(now + Duration::from_millis(100));
    assert_eq!(second, Err(UploadError::AlreadyUploading));

    session.complete_upload(first, first.ready_at).unwrap();

    let payouts = world
        .state()
        .payments
        .iter()
        .filter(|p| p.source == PaymentSource::JobSubmission)
        .count();
    assert_eq!(payouts, 1);
    assert!(!session.upload_in_flight());
}
