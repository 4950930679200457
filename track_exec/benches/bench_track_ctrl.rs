//! # Tracking Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::eqpt::{BoundingBox, Detection};
use track_lib::{
    target_sel,
    track_ctrl::{InputData, Params, TrackCtrl},
};
use util::module::State;

fn track_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build a crowded frame ----

    // A grid of faces of increasing size, plus some garbage the selector must discard
    let mut detections = Vec::new();
    for i in 0..8 {
        for j in 0..4 {
            let x = 20 + i * 85;
            let y = 20 + j * 110;
            let size = 10 + i + j * 8;
            detections.push(Detection::new(
                BoundingBox::new(x, y, x + size, y + size),
                0.6,
            ));
        }
    }
    detections.push(Detection::new(BoundingBox::new(50, 50, 50, 90), 0.9));
    detections.push(Detection::new(BoundingBox::new(-10, 0, 40, 40), 0.9));

    let input = InputData { detections };

    let mut track_ctrl = TrackCtrl::init(Params::default()).unwrap();

    // ---- Benchmarks ----

    c.bench_function("target_sel::select_in_frame", |b| {
        b.iter(|| target_sel::select_in_frame(black_box(&input.detections), 720, 480, 0.5))
    });

    c.bench_function("TrackCtrl::proc", |b| {
        b.iter(|| track_ctrl.proc(black_box(&input)))
    });
}

criterion_group!(benches, track_ctrl_benchmark);
criterion_main!(benches);
