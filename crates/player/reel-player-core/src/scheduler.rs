//! Shot scheduling.

use reel_blob_core::Blob;
use serde::Serialize;

/// Tracks which shot is playing. Shots run back to back; shot `i` covers
/// `[end_times[i - 1], end_times[i])` in beats, with shot 0 starting at beat 0.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShotScheduler {
    end_times: Vec<f32>,
    current: usize,
}

impl ShotScheduler {
    pub fn new(end_times: Vec<f32>) -> Self {
        Self {
            end_times,
            current: 0,
        }
    }

    pub fn from_blob(blob: &Blob<'_>) -> Self {
        Self::new(blob.end_times().collect())
    }

    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn shot_count(&self) -> usize {
        self.end_times.len()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.current >= self.end_times.len()
    }

    /// Beat at which the current shot started.
    #[inline]
    pub fn shot_start(&self) -> f32 {
        match self.current {
            0 => 0.0,
            i => self.end_times[i - 1],
        }
    }

    /// Beats elapsed since the current shot started.
    #[inline]
    pub fn local_beats(&self, beats: f32) -> f32 {
        beats - self.shot_start()
    }

    pub fn last_end_time(&self) -> Option<f32> {
        self.end_times.last().copied()
    }

    /// Move to the next shot if `beats` has reached the end of the current one. Advances at most
    /// one shot per call, so a long frame hitch plays every shot for at least one frame.
    pub fn advance(&mut self, beats: f32) -> bool {
        match self.end_times.get(self.current) {
            Some(&end) if beats >= end => {
                self.current += 1;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_at_most_once_per_frame() {
        let mut scheduler = ShotScheduler::new(vec![1.0, 2.5, 4.0]);
        let beats = [0.0, 0.9, 1.0, 1.1, 3.9, 4.0, 4.1];
        let mut seen = Vec::new();
        for b in beats {
            seen.push(scheduler.current());
            scheduler.advance(b);
        }
        assert_eq!(seen, vec![0, 0, 0, 1, 1, 2, 3]);
        assert!(scheduler.is_finished());
        assert!(!scheduler.advance(100.0));
    }

    #[test]
    fn local_beats_are_relative_to_the_previous_end() {
        let mut scheduler = ShotScheduler::new(vec![8.0, 16.0]);
        assert_eq!(scheduler.local_beats(3.0), 3.0);
        assert!(scheduler.advance(8.5));
        assert_eq!(scheduler.shot_start(), 8.0);
        assert_eq!(scheduler.local_beats(8.5), 0.5);
        scheduler.reset();
        assert_eq!(scheduler.current(), 0);
        assert_eq!(scheduler.last_end_time(), Some(16.0));
    }
}
