use reel_animation_core::evaluate_curve;
use reel_blob_core::{Blob, CurveView};
use reel_test_fixtures::{BlobBuilder, KeySpec, ShotSpec};

/// Encode one curve as the only uniform of a one-shot blob.
fn blob_with_curve(keys: Vec<KeySpec>) -> Vec<u8> {
    BlobBuilder::new(1.0)
        .program(&["x"])
        .shot(ShotSpec::new(100.0).uniform("uCurve", vec![keys]))
        .build()
}

fn with_curve(keys: Vec<KeySpec>, check: impl FnOnce(&CurveView<'_>)) {
    let bytes = blob_with_curve(keys);
    let blob = Blob::parse(&bytes).expect("valid blob");
    let shot = blob.shot(0).unwrap();
    let track = shot.tracks().next().unwrap().unwrap();
    check(&track.curve(0).unwrap());
}

#[test]
fn single_key_curve_is_constant() {
    with_curve(vec![KeySpec::new(3.0, -2.5).tangents(4.0, 4.0)], |curve| {
        for t in [-1.0, 0.0, 3.0, 3.5, 50.0] {
            assert_eq!(evaluate_curve(curve, t), -2.5);
        }
    });
}

#[test]
fn clamps_before_first_and_after_last_key() {
    with_curve(vec![KeySpec::new(1.0, 5.0), KeySpec::new(3.0, 9.0)], |curve| {
        assert_eq!(evaluate_curve(curve, 0.0), 5.0);
        assert_eq!(evaluate_curve(curve, 10.0), 9.0);
        assert_eq!(evaluate_curve(curve, 3.0), 9.0);
    });
}

#[test]
fn stepped_key_holds_until_next_key() {
    with_curve(
        vec![KeySpec::new(0.0, 1.0).stepped(), KeySpec::new(2.0, 7.0)],
        |curve| {
            assert_eq!(evaluate_curve(curve, 1.0), 1.0);
            assert_eq!(evaluate_curve(curve, 1.99), 1.0);
            assert_eq!(evaluate_curve(curve, 2.0), 7.0);
        },
    );
}

#[test]
fn flt_max_out_tangent_also_holds() {
    with_curve(
        vec![
            KeySpec::new(0.0, 4.0).tangents(0.0, f32::MAX),
            KeySpec::new(1.0, 0.0),
        ],
        |curve| assert_eq!(evaluate_curve(curve, 0.5), 4.0),
    );
}

#[test]
fn linear_tangents_interpolate_linearly() {
    // dy == tangent on both ends makes the cubic terms vanish
    with_curve(
        vec![
            KeySpec::new(0.0, 0.0).tangents(0.0, 2.0),
            KeySpec::new(4.0, 2.0).tangents(2.0, 0.0),
        ],
        |curve| {
            for (t, expected) in [(1.0, 0.5), (2.0, 1.0), (3.0, 1.5)] {
                assert!((evaluate_curve(curve, t) - expected).abs() < 1e-6);
            }
        },
    );
}
