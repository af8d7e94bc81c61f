use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use kartsync_core::physics::{self, OpenSpace};
use kartsync_core::track::{Bounds, Track};
use kartsync_core::{
    BodyParams, InputSample, KinematicState, MoveRecord, Predictor, ReconciliationController,
    ServerState,
};

/// Weaving, full-throttle input at 60 Hz.
fn weaving_moves(count: usize) -> Vec<MoveRecord> {
    (0..count)
        .map(|i| {
            let steering = (i as f32 * 0.1).sin();
            MoveRecord::new(steering, 1.0, 1.0 / 60.0, (i + 1) as f64 / 60.0)
        })
        .collect()
}

fn arena() -> Track {
    Track::new(Bounds::new(4_000.0, 4_000.0, 400.0)).with_obstacle(Bounds::from_min_max(
        Vec3::new(800.0, -200.0, -100.0),
        Vec3::new(1_000.0, 200.0, 100.0),
    ))
}

fn bench_single_step(c: &mut Criterion) {
    let params = BodyParams::default();
    let state = KinematicState {
        velocity: Vec3::new(12.0, 3.0, 0.0),
        ..KinematicState::default()
    };
    let mv = MoveRecord::new(0.4, 1.0, 1.0 / 60.0, 1.0);
    let track = arena();

    c.bench_function("physics_step", |b| {
        b.iter(|| black_box(physics::step(black_box(&state), &mv, &params, &track)))
    });
}

fn bench_replay(c: &mut Criterion) {
    let params = BodyParams::default();
    let moves = weaving_moves(60);

    c.bench_function("replay_60_moves_open", |b| {
        b.iter(|| black_box(physics::replay(KinematicState::default(), &moves, &params, &OpenSpace)))
    });

    let track = arena();
    c.bench_function("replay_60_moves_track", |b| {
        b.iter(|| black_box(physics::replay(KinematicState::default(), &moves, &params, &track)))
    });
}

fn bench_reconcile(c: &mut Criterion) {
    // Typical round trip: 12 moves in flight, server acknowledges half.
    let params = BodyParams::default();
    let mut predictor = Predictor::new(KinematicState::default(), params, 256);
    let mut outbox: Vec<MoveRecord> = Vec::new();
    for i in 0..12 {
        let input = InputSample::new((i as f32 * 0.3).sin(), 1.0);
        predictor
            .predict(input, 1.0 / 60.0, &OpenSpace, &mut outbox)
            .unwrap();
    }
    let server = physics::replay(KinematicState::default(), &outbox[..6], &params, &OpenSpace);
    let snapshot = ServerState::new(&server, outbox[5]);

    c.bench_function("reconcile_6_of_12", |b| {
        b.iter(|| {
            let mut predictor = predictor.clone();
            let mut reconciler = ReconciliationController::new();
            black_box(reconciler.reconcile(&mut predictor, black_box(&snapshot), &OpenSpace))
        })
    });
}

criterion_group!(benches, bench_single_step, bench_replay, bench_reconcile);
criterion_main!(benches);
