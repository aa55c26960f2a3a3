//! Demo player: owns the blob views, the animation state and the frame loop.

use reel_animation_core::{AnimationProcessor, ProcessorChain, TrackEvaluator};
use reel_blob_core::{Blob, PassTarget, ShotView};
use serde::Serialize;
use tracing::{debug, info};

use crate::backend::RenderBackend;
use crate::clock::PlaybackClock;
use crate::config::PlayerConfig;
use crate::error::{PlayerError, PlayerResult};
use crate::passes::{FrameContext, PassPlayer, PassStats};
use crate::resources::{GpuResources, LoaderProgress};
use crate::scheduler::ShotScheduler;

/// What happened in one call to [`DemoPlayer::frame`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    /// Frame number, 0 for the precompute frame.
    pub frame: u64,
    pub seconds: f32,
    pub delta_seconds: f32,
    pub beats: f32,
    /// Shot that was rendered.
    pub shot: usize,
    pub local_beats: f32,
    pub passes: PassStats,
    /// The scheduler moved on after this frame.
    pub shot_changed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum FrameOutcome {
    Rendered(FrameReport),
    /// Every shot has been played.
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Escape,
    EndOfTimeline,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub last_beats: f32,
    pub last_shot: usize,
    pub stop: StopReason,
}

/// Plays a parsed blob through a render backend, driven by a playback clock.
pub struct DemoPlayer<'a, B, C> {
    blob: Blob<'a>,
    config: PlayerConfig,
    backend: B,
    clock: C,
    scheduler: ShotScheduler,
    shot: Option<ShotView<'a>>,
    tracks: TrackEvaluator<'a>,
    processors: ProcessorChain,
    passes: PassPlayer,
    resources: Option<GpuResources>,
    progress: LoaderProgress,
    first: bool,
    prev_cursor: f32,
    frames: u64,
}

impl<'a, B: RenderBackend, C: PlaybackClock> DemoPlayer<'a, B, C> {
    pub fn new(blob: Blob<'a>, config: PlayerConfig, backend: B, clock: C) -> PlayerResult<Self> {
        config.validate()?;
        let tracks = TrackEvaluator::new(&config.animation, &blob);
        let processors =
            ProcessorChain::from_config(&config.animation, config.screen_width, config.screen_height);
        let scheduler = ShotScheduler::from_blob(&blob);
        let shot = Some(blob.shot(0)?);

        // initial tick, textures, programs, framebuffers, processors + audio, static passes
        let total = 1
            + config.textures.len()
            + blob.program_count()
            + blob.framebuffer_count()
            + 1
            + static_pass_count(&blob)?;

        Ok(Self {
            blob,
            config,
            backend,
            clock,
            scheduler,
            shot,
            tracks,
            processors,
            passes: PassPlayer::new(),
            resources: None,
            progress: LoaderProgress::new(total as u32),
            first: true,
            prev_cursor: 0.0,
            frames: 0,
        })
    }

    /// Append a processor after the built-in ones.
    pub fn with_processor(mut self, processor: impl AnimationProcessor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Create backend resources, then initialise processors and the clock. Calling this again
    /// after success does nothing.
    pub fn prepare(&mut self) -> PlayerResult<()> {
        if self.resources.is_some() {
            return Ok(());
        }
        self.progress.tick(&mut self.backend);
        let resources =
            GpuResources::prepare(&self.blob, &self.config, &mut self.backend, &mut self.progress)?;
        self.processors.init();
        self.clock.init();
        self.progress.tick(&mut self.backend);
        info!(
            shots = self.blob.shot_count(),
            processors = self.processors.len(),
            loader_total = self.progress.total,
            "player prepared"
        );
        self.resources = Some(resources);
        Ok(())
    }

    /// Evaluate and render one frame, then let the scheduler move on.
    pub fn frame(&mut self) -> PlayerResult<FrameOutcome> {
        let Some(resources) = self.resources.as_mut() else {
            return Err(PlayerError::NotPrepared);
        };
        let Some(shot) = self.shot else {
            return Ok(FrameOutcome::Finished);
        };

        let cursor = self.clock.cursor_seconds();
        let speed = self.config.speed;
        let seconds = cursor * speed + self.config.start_seconds;
        let delta_seconds = if self.first {
            0.0
        } else {
            self.clock
                .fixed_delta()
                .unwrap_or(cursor - self.prev_cursor)
                * speed
        };
        let beats = seconds * self.blob.beats_per_second();

        let shot_index = self.scheduler.current();
        let local_beats = self.scheduler.local_beats(beats);
        self.tracks
            .evaluate(&shot, local_beats, delta_seconds, &mut self.processors)?;

        let scene = self.blob.scene_for_shot(shot_index)?;
        let context = FrameContext {
            first: self.first,
            seconds,
            beats,
            tracks: &self.tracks,
            screen_width: self.config.screen_width,
            screen_height: self.config.screen_height,
        };
        let passes = self.passes.render(
            &scene,
            &context,
            resources,
            &mut self.processors,
            &mut self.backend,
            &mut self.progress,
        )?;
        self.backend.present();

        let shot_changed = self.scheduler.advance(beats);
        if shot_changed {
            self.shot = if self.scheduler.is_finished() {
                None
            } else {
                Some(self.blob.next_shot(&shot)?)
            };
            debug!(
                from = shot_index,
                to = self.scheduler.current(),
                beats,
                "shot changed"
            );
        }

        if self.first {
            self.clock.play();
            self.first = false;
        } else {
            self.prev_cursor = cursor;
            self.clock.frame_presented();
        }

        let report = FrameReport {
            frame: self.frames,
            seconds,
            delta_seconds,
            beats,
            shot: shot_index,
            local_beats,
            passes,
            shot_changed,
        };
        self.frames += 1;
        Ok(FrameOutcome::Rendered(report))
    }

    /// Prepare if needed, then render frames until `escape` returns true or the beat position
    /// reaches the end of the last shot.
    pub fn run(&mut self, mut escape: impl FnMut(&FrameReport) -> bool) -> PlayerResult<RunSummary> {
        self.prepare()?;
        let end = self.blob.last_end_time()?;
        let mut summary = RunSummary {
            frames: 0,
            last_beats: 0.0,
            last_shot: 0,
            stop: StopReason::EndOfTimeline,
        };
        loop {
            let report = match self.frame()? {
                FrameOutcome::Rendered(report) => report,
                FrameOutcome::Finished => break,
            };
            summary.frames += 1;
            summary.last_beats = report.beats;
            summary.last_shot = report.shot;
            if escape(&report) {
                summary.stop = StopReason::Escape;
                break;
            }
            if report.beats >= end {
                break;
            }
        }
        info!(
            frames = summary.frames,
            beats = summary.last_beats,
            stop = ?summary.stop,
            "playback stopped"
        );
        Ok(summary)
    }

    #[inline]
    pub fn blob(&self) -> &Blob<'a> {
        &self.blob
    }

    #[inline]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[inline]
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    #[inline]
    pub fn scheduler(&self) -> &ShotScheduler {
        &self.scheduler
    }

    #[inline]
    pub fn tracks(&self) -> &TrackEvaluator<'a> {
        &self.tracks
    }

    #[inline]
    pub fn resources(&self) -> Option<&GpuResources> {
        self.resources.as_ref()
    }

    #[inline]
    pub fn progress(&self) -> LoaderProgress {
        self.progress
    }

    #[inline]
    pub fn is_first_frame(&self) -> bool {
        self.first
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

/// Number of passes the precompute frame draws: passes of the opening shot that target a static
/// framebuffer.
fn static_pass_count(blob: &Blob<'_>) -> PlayerResult<usize> {
    let scene = blob.scene_for_shot(0)?;
    let mut count = 0;
    for pass in scene.passes() {
        if let PassTarget::Framebuffer(id) = pass?.target() {
            if !blob.framebuffer(usize::from(id))?.realtime() {
                count += 1;
            }
        }
    }
    Ok(count)
}
