use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reel_animation_core::{evaluate_curve, AnimationConfig, NoopProcessor, TrackEvaluator};
use reel_blob_core::Blob;
use reel_test_fixtures::{BlobBuilder, KeySpec, ShotSpec};

fn long_curve(keys: usize) -> Vec<KeySpec> {
    (0..keys)
        .map(|i| {
            let t = i as f32;
            KeySpec::new(t, (t * 0.37).sin()).tangents(0.5, -0.25)
        })
        .collect()
}

fn bench_curve(c: &mut Criterion) {
    let bytes = BlobBuilder::new(2.0)
        .program(&["x"])
        .shot(ShotSpec::new(1000.0).uniform("uLong", vec![long_curve(256)]))
        .build();
    let blob = Blob::parse(&bytes).expect("bench blob");
    let shot = blob.shot(0).expect("shot");
    let track = shot.tracks().next().expect("track").expect("track decodes");
    let curve = track.curve(0).expect("curve");

    c.bench_function("evaluate_curve/256 keys, mid", |b| {
        b.iter(|| evaluate_curve(black_box(&curve), black_box(127.5)))
    });
    c.bench_function("evaluate_curve/256 keys, past end", |b| {
        b.iter(|| evaluate_curve(black_box(&curve), black_box(400.0)))
    });
}

fn bench_shot(c: &mut Criterion) {
    let mut shot = ShotSpec::new(64.0);
    for i in 0..32 {
        let curves = (0..3).map(|_| long_curve(16)).collect();
        shot = shot.uniform(&format!("uTrack{i}"), curves);
    }
    let bytes = BlobBuilder::new(2.0).program(&["x"]).shot(shot).build();
    let blob = Blob::parse(&bytes).expect("bench blob");
    let shot = blob.shot(0).expect("shot");
    let mut evaluator = TrackEvaluator::new(&AnimationConfig::default(), &blob);
    let mut noop = NoopProcessor;

    c.bench_function("track_evaluator/32 vec3 uniforms", |b| {
        b.iter(|| {
            evaluator
                .evaluate(&shot, black_box(7.25), 1.0 / 60.0, &mut noop)
                .map(|u| u.len())
        })
    });
}

criterion_group!(benches, bench_curve, bench_shot);
criterion_main!(benches);
