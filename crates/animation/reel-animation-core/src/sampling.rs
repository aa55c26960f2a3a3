//! Curve sampling.
//!
//! Model:
//! - Keys are ordered by time. Before the first key and from the last key on, the curve is flat.
//! - The segment for `t` is found by a right-bound search: the first key whose time is strictly
//!   greater than `t` is the right end, the key before it the left end. A `t` that lands exactly
//!   on a key therefore starts that key's segment.
//! - A left key whose out tangent is the stepped sentinel holds its value for the whole segment.
//! - Otherwise the segment is a cubic Hermite in the normalized segment parameter `u`, with the
//!   tangents used as-is (they are already scaled to the segment by the content compiler).

use reel_blob_core::{CurveView, Keyframe};

/// Where `t` falls on a curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    /// Before (or at) the start: flat pre-extrapolation from key 0.
    Before,
    /// Inside the segment `[left, left + 1)`.
    Inside { left: usize },
    /// At or after the last key.
    After,
}

/// Right-bound segment search over key times.
///
/// `time_of(i)` yields key times in ascending order and `None` past the end.
#[inline]
pub fn find_segment(mut time_of: impl FnMut(usize) -> Option<f32>, t: f32) -> Segment {
    let mut i = 0;
    while let Some(time) = time_of(i) {
        if time > t {
            return if i == 0 {
                Segment::Before
            } else {
                Segment::Inside { left: i - 1 }
            };
        }
        i += 1;
    }
    Segment::After
}

/// Evaluate one segment. `t` must satisfy `lhs.time <= t < rhs.time`, so the segment has
/// positive width.
#[inline]
pub fn hermite(lhs: &Keyframe, rhs: &Keyframe, t: f32) -> f32 {
    if lhs.is_stepped() {
        return lhs.value;
    }
    let u = (t - lhs.time) / (rhs.time - lhs.time);
    let p1 = lhs.out_tangent;
    let p2 = rhs.in_tangent;
    let dy = rhs.value - lhs.value;
    let c0 = p1 + p2 - 2.0 * dy;
    let c1 = 3.0 * dy - 2.0 * p1 - p2;
    let c2 = p1;
    let c3 = lhs.value;
    u * (u * (u * c0 + c1) + c2) + c3
}

/// Sample a curve stored in the blob at time `t` (local beats).
pub fn evaluate_curve(curve: &CurveView<'_>, t: f32) -> f32 {
    match find_segment(|i| curve.time(i), t) {
        Segment::Before => curve.key(0).map_or(0.0, |k| k.value),
        Segment::After => curve.key(curve.len() - 1).map_or(0.0, |k| k.value),
        Segment::Inside { left } => match (curve.key(left), curve.key(left + 1)) {
            (Some(lhs), Some(rhs)) => hermite(&lhs, &rhs, t),
            (Some(lhs), None) => lhs.value,
            _ => 0.0,
        },
    }
}

/// Sample an in-memory key list. An empty list samples as 0.
pub fn evaluate_keys(keys: &[Keyframe], t: f32) -> f32 {
    match find_segment(|i| keys.get(i).map(|k| k.time), t) {
        Segment::Before => keys.first().map_or(0.0, |k| k.value),
        Segment::After => keys.last().map_or(0.0, |k| k.value),
        Segment::Inside { left } => hermite(&keys[left], &keys[left + 1], t),
    }
}
