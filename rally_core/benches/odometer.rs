use chrono::{TimeDelta, TimeZone, Utc};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use rally_core::{GeoFix, Odometer, OdometerMode};

// One hour of 1 Hz fixes wandering north-east with a little altitude noise.
fn synth_track(n: usize) -> Vec<GeoFix> {
    let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let s = i as f64;
            GeoFix::new(
                47.0 + s * 1e-4,
                -122.0 + s * 5e-5,
                150.0 + (s / 30.0).sin() * 3.0,
                t0 + TimeDelta::seconds(i as i64),
            )
            .with_speed(40.0)
        })
        .collect()
}

fn bench_add_position(c: &mut Criterion) {
    let track = synth_track(3600);
    c.bench_function("odometer_add_position_3600", |b| {
        b.iter_batched(
            || {
                let mut odo = Odometer::new(track[0]);
                odo.set_mode(OdometerMode::Drive);
                odo
            },
            |mut odo| {
                for f in &track[1..] {
                    odo.add_position(black_box(*f));
                }
                black_box(odo.accumulated_distance())
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_add_position);
criterion_main!(benches);
