//! Playback clocks.
//!
//! The frame loop reads the current playback position once per frame. Normally that is the audio
//! cursor, published by the audio thread through a [`SharedCursor`]; frame export uses a
//! [`FixedStepClock`] instead so every frame is exactly `1 / fps` apart.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Source of playback time, in seconds since the start of the soundtrack.
pub trait PlaybackClock {
    /// Called once during preparation.
    fn init(&mut self) {}

    /// Called after the first (precompute) frame has been presented.
    fn play(&mut self) {}

    fn cursor_seconds(&mut self) -> f32;

    /// Fixed frame delta, if this clock steps at a constant rate.
    fn fixed_delta(&self) -> Option<f32> {
        None
    }

    /// Called after every presented frame except the precompute frame.
    fn frame_presented(&mut self) {}
}

/// Clock the host moves by hand. Useful for tests and scrubbing tools.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ManualClock {
    seconds: f32,
    playing: bool,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(seconds: f32) -> Self {
        Self {
            seconds,
            playing: false,
        }
    }

    #[inline]
    pub fn set(&mut self, seconds: f32) {
        self.seconds = seconds;
    }

    #[inline]
    pub fn advance(&mut self, delta: f32) {
        self.seconds += delta;
    }

    #[inline]
    pub fn seconds(&self) -> f32 {
        self.seconds
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

impl PlaybackClock for ManualClock {
    fn play(&mut self) {
        self.playing = true;
    }

    fn cursor_seconds(&mut self) -> f32 {
        self.seconds
    }
}

/// Frame-export clock: `seconds = frame / fps`.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedStepClock {
    fps: u32,
    frame: u64,
}

impl FixedStepClock {
    pub fn new(fps: u32) -> Self {
        Self {
            fps: fps.max(1),
            frame: 0,
        }
    }

    #[inline]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Index of the next frame to be exported.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl PlaybackClock for FixedStepClock {
    fn cursor_seconds(&mut self) -> f32 {
        (self.frame as f64 / f64::from(self.fps)) as f32
    }

    fn fixed_delta(&self) -> Option<f32> {
        Some((1.0 / f64::from(self.fps)) as f32)
    }

    fn frame_presented(&mut self) {
        self.frame += 1;
    }
}

/// Audio cursor shared with another thread.
///
/// The writer publishes seconds as raw `f32` bits; the frame loop does a single atomic load per
/// frame. Clones share the same cursor.
#[derive(Clone, Debug, Default)]
pub struct SharedCursor {
    bits: Arc<AtomicU32>,
    playing: Arc<AtomicBool>,
}

impl SharedCursor {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn store(&self, seconds: f32) {
        self.bits.store(seconds.to_bits(), Ordering::Release);
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Set once the player asked for playback to start.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }
}

impl PlaybackClock for SharedCursor {
    fn init(&mut self) {
        self.store(0.0);
        self.playing.store(false, Ordering::Release);
    }

    fn play(&mut self) {
        self.playing.store(true, Ordering::Release);
    }

    fn cursor_seconds(&mut self) -> f32 {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fixed_step_advances_only_on_presented_frames() {
        let mut clock = FixedStepClock::new(50);
        assert_eq!(clock.cursor_seconds(), 0.0);
        assert_eq!(clock.cursor_seconds(), 0.0);
        clock.frame_presented();
        clock.frame_presented();
        assert_eq!(clock.cursor_seconds(), 0.04);
        assert_eq!(clock.fixed_delta(), Some(0.02));
        assert_eq!(clock.frame(), 2);
    }

    #[test]
    fn shared_cursor_crosses_threads() {
        let mut clock = SharedCursor::new();
        clock.init();
        let writer = clock.clone();
        thread::spawn(move || {
            for i in 1..=100 {
                writer.store(i as f32 * 0.5);
            }
        })
        .join()
        .unwrap();
        assert_eq!(clock.cursor_seconds(), 50.0);
        assert!(!clock.is_playing());
        clock.play();
        assert!(clock.is_playing());
    }

    #[test]
    fn manual_clock_reports_what_it_was_given() {
        let mut clock = ManualClock::at(1.5);
        clock.advance(0.25);
        assert_eq!(clock.cursor_seconds(), 1.75);
        assert_eq!(clock.fixed_delta(), None);
        clock.play();
        assert!(clock.is_playing());
    }
}
