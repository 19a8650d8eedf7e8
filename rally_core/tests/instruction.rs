use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rally_core::{GeoFix, InstructionDraft, Odometer, OdometerMode, RallyError, Target};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap()
}

fn parked_at_origin() -> Odometer {
    Odometer::new(GeoFix::new(47.0, -122.0, 0.0, t0()))
}

#[test]
fn distance_and_speed_derive_time() {
    let odo = parked_at_origin();
    let i = InstructionDraft::new()
        .with_distance(50.0)
        .with_speed(50.0)
        .activate(&odo)
        .unwrap();
    assert_eq!(i.remaining_time(&odo), TimeDelta::hours(1));
    assert_eq!(i.time(), t0() + TimeDelta::hours(1));
    assert_eq!(i.remaining_distance(&odo), 50_000.0);
}

#[test]
fn time_and_speed_derive_distance() {
    let odo = parked_at_origin();
    let i = InstructionDraft::new()
        .with_speed(50.0)
        .with_time(t0() + TimeDelta::hours(1))
        .activate(&odo)
        .unwrap();
    assert_eq!(i.remaining_distance(&odo), 50_000.0);
    assert!(matches!(i.target(), Target::TimeSpeed { .. }));
}

#[test]
fn time_and_distance_derive_speed() {
    let odo = parked_at_origin();
    let i = InstructionDraft::new()
        .with_time(t0() + TimeDelta::hours(1))
        .with_distance(50.0)
        .activate(&odo)
        .unwrap();
    assert_eq!(i.speed_kmh(), 50.0);
}

#[test]
fn derivation_is_relative_to_bind_point() {
    let mut odo = parked_at_origin();
    odo.set_mode(OdometerMode::Drive);
    // ~11.1 km north, ten minutes later
    odo.add_position(GeoFix::new(47.1, -122.0, 0.0, t0() + TimeDelta::minutes(10)));
    let start_m = odo.accumulated_distance();

    let i = InstructionDraft::new()
        .with_speed(60.0)
        .with_time(t0() + TimeDelta::minutes(40))
        .activate(&odo)
        .unwrap();
    assert!((i.distance_m() - (start_m + 30_000.0)).abs() < 1e-6);
    assert_eq!(i.elapsed_distance(&odo), 0.0);
    assert_eq!(i.elapsed_time(&odo), TimeDelta::zero());
    assert_eq!(i.start().distance_m, start_m);

    odo.add_position(GeoFix::new(47.2, -122.0, 0.0, t0() + TimeDelta::minutes(20)));
    assert!(i.elapsed_distance(&odo) > 11_000.0);
    assert_eq!(i.elapsed_time(&odo), TimeDelta::minutes(10));
    assert_eq!(i.remaining_time(&odo), TimeDelta::minutes(20));
}

#[test]
fn overshoot_is_not_clamped() {
    let mut odo = parked_at_origin();
    let i = InstructionDraft::new()
        .with_distance(1.0)
        .with_speed(60.0)
        .activate(&odo)
        .unwrap();
    odo.set_mode(OdometerMode::Drive);
    odo.add_position(GeoFix::new(47.1, -122.0, 0.0, t0() + TimeDelta::minutes(10)));
    assert!(i.remaining_distance(&odo) < 0.0);
}

#[test]
fn past_time_target_with_distance_is_rejected() {
    let odo = parked_at_origin();
    let err = InstructionDraft::new()
        .with_distance(10.0)
        .with_time(t0() - TimeDelta::minutes(1))
        .activate(&odo)
        .unwrap_err();
    assert!(matches!(err, RallyError::DegenerateInstruction(_)));
}
