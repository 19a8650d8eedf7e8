use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rally_core::mocks::{ScriptedGps, packet};
use rally_core::{
    Applied, Command, ComputerCfg, InstructionDraft, OdometerMode, RallyComputer, RallyError,
};
use rally_traits::{GpsPacket, ManualClock};

fn t(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap() + TimeDelta::seconds(secs)
}

/// Fix `secs` seconds in, `lat_step` degrees north of the start per second.
fn north(secs: i64, lat_step: f64) -> GpsPacket {
    packet(47.0 + lat_step * secs as f64, -122.0, 100.0, t(secs), 40.0)
}

fn start(gps: ScriptedGps, clock: &ManualClock) -> RallyComputer<ScriptedGps> {
    let shutdown = AtomicBool::new(false);
    RallyComputer::start(gps, ComputerCfg::default(), Arc::new(clock.clone()), &shutdown)
        .unwrap()
}

#[test]
fn startup_skips_packets_without_fix() {
    let mut gps = ScriptedGps::new();
    gps.push(GpsPacket::no_fix());
    gps.push(GpsPacket::no_fix());
    gps.push(north(0, 0.0));
    let clock = ManualClock::new();
    let rc = start(gps, &clock);
    assert_eq!(clock.sleep_count(), 2);
    assert_eq!(clock.offset(), Duration::from_secs(2));
    assert_eq!(rc.odometer().mode(), OdometerMode::Park);
    assert_eq!(rc.odometer().last_fix().timestamp, t(0));
    assert!(rc.current().is_none());
}

#[test]
fn startup_errors_are_fatal() {
    let mut gps = ScriptedGps::new();
    gps.push_error("device unplugged");
    let shutdown = AtomicBool::new(false);
    let err = RallyComputer::start(
        gps,
        ComputerCfg::default(),
        Arc::new(ManualClock::new()),
        &shutdown,
    )
    .unwrap_err();
    assert_eq!(err, RallyError::Gps("device unplugged".into()));
}

#[test]
fn startup_honours_shutdown_and_timeout() {
    let shutdown = AtomicBool::new(true);
    let err = RallyComputer::start(
        ScriptedGps::new(),
        ComputerCfg::default(),
        Arc::new(ManualClock::new()),
        &shutdown,
    )
    .unwrap_err();
    assert_eq!(err, RallyError::Cancelled);

    let shutdown = AtomicBool::new(false);
    let cfg = ComputerCfg {
        startup_timeout: Some(Duration::from_secs(5)),
        ..ComputerCfg::default()
    };
    let err = RallyComputer::start(ScriptedGps::new(), cfg, Arc::new(ManualClock::new()), &shutdown)
        .unwrap_err();
    assert_eq!(err, RallyError::NoFix);
}

#[test]
fn try_update_is_a_no_op_without_new_fix() {
    let gps = ScriptedGps::from_packets([north(0, 0.0)]);
    let clock = ManualClock::new();
    let mut rc = start(gps, &clock);
    // source keeps repeating the same packet
    assert!(!rc.try_update().unwrap());
    assert_eq!(rc.odometer().last_fix().timestamp, t(0));
}

#[test]
fn update_waits_through_errors_and_repeats() {
    let mut gps = ScriptedGps::from_packets([north(0, 0.0), north(0, 0.0)]);
    gps.push_error("read timeout");
    gps.push(north(1, 0.001));
    let clock = ManualClock::new();
    let mut rc = start(gps, &clock);
    let shutdown = AtomicBool::new(false);
    rc.update(&shutdown).unwrap();
    assert_eq!(rc.odometer().last_fix().timestamp, t(1));
    assert_eq!(clock.sleep_count(), 2);
}

#[test]
fn update_is_cancellable() {
    let gps = ScriptedGps::from_packets([north(0, 0.0)]);
    let clock = ManualClock::new();
    let mut rc = start(gps, &clock);
    let shutdown = AtomicBool::new(true);
    assert_eq!(rc.update(&shutdown).unwrap_err(), RallyError::Cancelled);
    assert_eq!(rc.odometer().last_fix().timestamp, t(0));
}

#[test]
fn first_instruction_resets_and_drives() {
    let gps = ScriptedGps::from_packets([north(0, 0.0), north(1, 0.001), north(2, 0.001)]);
    let clock = ManualClock::new();
    let mut rc = start(gps, &clock);
    rc.set_mode(OdometerMode::Drive);
    let shutdown = AtomicBool::new(false);
    rc.update(&shutdown).unwrap();
    assert!(rc.odometer().accumulated_distance() > 100.0);
    rc.set_mode(OdometerMode::Park);

    rc.start_instruction(&InstructionDraft::new().with_distance(1.0).with_speed(36.0))
        .unwrap();
    assert_eq!(rc.odometer().accumulated_distance(), 0.0);
    assert_eq!(rc.odometer().origin_fix().timestamp, t(1));
    assert_eq!(rc.odometer().mode(), OdometerMode::Drive);
    let i = rc.current().unwrap();
    assert_eq!(i.time(), t(1) + TimeDelta::seconds(100));
    assert_eq!(rc.cast().unwrap().average(), 36.0);

    rc.update(&shutdown).unwrap();
    let before = rc.odometer().accumulated_distance();
    assert!(before > 0.0);
    // later instructions keep the accumulated distance
    rc.start_instruction(&InstructionDraft::new().with_distance(5.0).with_speed(50.0))
        .unwrap();
    assert_eq!(rc.odometer().accumulated_distance(), before);
    assert_eq!(rc.current().unwrap().start().distance_m, before);
}

#[test]
fn failed_activation_changes_nothing() {
    let gps = ScriptedGps::from_packets([north(0, 0.0)]);
    let clock = ManualClock::new();
    let mut rc = start(gps, &clock);
    let err = rc
        .start_instruction(&InstructionDraft::new().with_distance(1.0).with_time(t(0)))
        .unwrap_err();
    assert!(matches!(err, RallyError::DegenerateInstruction(_)));
    assert!(rc.current().is_none());
    assert_eq!(rc.odometer().mode(), OdometerMode::Park);
}

#[test]
fn commit_requires_valid_next_and_seeds_speed() {
    let gps = ScriptedGps::from_packets([north(0, 0.0)]);
    let clock = ManualClock::new();
    let mut rc = start(gps, &clock);

    rc.apply(Command::SetSpeed(45.0)).unwrap();
    assert_eq!(
        rc.apply(Command::Commit).unwrap_err(),
        RallyError::InvalidInstruction("Instruction is not valid!".into())
    );
    assert!(rc.current().is_none());

    rc.apply(Command::SetDistance(9.0)).unwrap();
    assert_eq!(rc.apply(Command::Commit).unwrap(), Applied::Committed);
    assert_eq!(rc.current().unwrap().speed_kmh(), 45.0);
    assert_eq!(rc.next().speed_kmh(), Some(45.0));
    assert_eq!(rc.next().distance_km(), None);

    rc.apply(Command::Pause).unwrap();
    assert_eq!(rc.next().speed_kmh(), Some(0.0));
    assert_eq!(rc.apply(Command::Quit).unwrap(), Applied::Quit);
}

#[test]
fn calibrate_and_clear_through_commands() {
    let gps = ScriptedGps::from_packets([north(0, 0.0), north(1, 0.01)]);
    let clock = ManualClock::new();
    let mut rc = start(gps, &clock);
    rc.apply(Command::SetMode(OdometerMode::Drive)).unwrap();
    assert!(matches!(
        rc.apply(Command::Calibrate(1.0)),
        Err(RallyError::Calibration(_))
    ));
    rc.update(&AtomicBool::new(false)).unwrap();

    let Applied::Calibrated(factor) = rc.apply(Command::Calibrate(1.0)).unwrap() else {
        panic!("expected calibration");
    };
    assert!((rc.odometer().accumulated_distance() - 1000.0).abs() < 1e-9);
    assert_eq!(rc.odometer().calibration(), factor);

    rc.apply(Command::ClearDistance).unwrap();
    assert_eq!(rc.odometer().accumulated_distance(), 0.0);
    assert_eq!(rc.odometer().origin_fix().timestamp, t(0));
}

#[test]
fn two_d_fix_keeps_altitude() {
    let mut gps = ScriptedGps::from_packets([north(0, 0.0)]);
    gps.push(GpsPacket {
        alt: None,
        mode: rally_traits::FixMode::Fix2d,
        ..north(1, 0.0)
    });
    let clock = ManualClock::new();
    let mut rc = start(gps, &clock);
    rc.set_mode(OdometerMode::Drive);
    assert!(rc.try_update().unwrap());
    assert_eq!(rc.odometer().last_fix().alt, 100.0);
    assert_eq!(rc.odometer().accumulated_distance(), 0.0);
}

#[test]
fn input_context_uses_local_date() {
    let gps = ScriptedGps::from_packets([packet(47.0, -122.0, 0.0, t(-12 * 3600 - 60), 0.0)]);
    let clock = ManualClock::new();
    let shutdown = AtomicBool::new(false);
    let cfg = ComputerCfg {
        timezone: chrono::FixedOffset::west_opt(3600).unwrap(),
        ..ComputerCfg::default()
    };
    let rc = RallyComputer::start(gps, cfg, Arc::new(clock), &shutdown).unwrap();
    // 23:59 UTC on Dec 31 is 22:59 local
    let ctx = rc.input_context(rally_config::Units::Kilometers);
    assert_eq!(ctx.date, chrono::NaiveDate::from_ymd_opt(2019, 12, 31).unwrap());
    assert_eq!(rc.local_time().to_rfc3339(), "2019-12-31T22:59:00-01:00");
}
