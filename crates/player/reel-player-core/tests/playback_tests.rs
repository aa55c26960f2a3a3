use approx::assert_relative_eq;
use reel_blob_core::Blob;
use reel_player_core::{
    BackendError, DemoPlayer, FixedStepClock, FrameOutcome, FrameReport, ManualClock,
    PlayerConfig, PlayerError, RecordingBackend, RenderCommand, RenderTarget, StopReason,
    TextureHandle, TextureKind,
};
use reel_test_fixtures::{configs, demos};

fn init_tracing() {
    let default_filter = "reel_player_core=debug";
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Compact, order-preserving rendering of a command list.
fn ops(commands: &[RenderCommand]) -> Vec<String> {
    commands
        .iter()
        .map(|c| match c {
            RenderCommand::BindTarget { target, .. } => match target {
                RenderTarget::Screen => "screen".to_string(),
                RenderTarget::Framebuffer { handle, .. } => format!("fb{}", handle.0),
            },
            RenderCommand::UseProgram { program } => format!("program{}", program.0),
            RenderCommand::BindTexture { unit, kind, .. } => match kind {
                TextureKind::Texture2D => format!("bind{unit}:2d"),
                TextureKind::Texture3D => format!("bind{unit}:3d"),
            },
            RenderCommand::SetInt { name, value } => format!("{name}={value}"),
            RenderCommand::SetFloats { name, .. } => name.clone(),
            RenderCommand::SetMatrix4 { name, .. } => name.clone(),
            RenderCommand::BakeVolume { .. } => "bake".to_string(),
            RenderCommand::Draw => "draw".to_string(),
            RenderCommand::Present => "present".to_string(),
            RenderCommand::Progress { done, total } => format!("progress {done}/{total}"),
            other => format!("{other:?}"),
        })
        .collect()
}

fn rendered(outcome: FrameOutcome) -> FrameReport {
    match outcome {
        FrameOutcome::Rendered(report) => report,
        FrameOutcome::Finished => panic!("expected a rendered frame"),
    }
}

#[test]
fn prepare_creates_every_resource_and_reports_progress() {
    init_tracing();
    let bytes = demos::blob("eidolon").unwrap();
    let blob = Blob::parse(&bytes).unwrap();
    let mut player =
        DemoPlayer::new(blob, PlayerConfig::default(), RecordingBackend::new(), ManualClock::new())
            .unwrap();
    player.prepare().unwrap();

    let resources = player.resources().unwrap();
    assert_eq!(resources.color_buffers().len(), 3);
    let half = resources.framebuffer(0).unwrap();
    assert_eq!((half.width, half.height), (640, 360));
    assert_eq!(resources.framebuffer(1).unwrap().first_color_buffer, 2);

    let compiled = player
        .backend()
        .commands()
        .iter()
        .filter(|c| matches!(c, RenderCommand::CompileProgram { stitches: 2, .. }))
        .count();
    assert_eq!(compiled, 3);

    // 1 + 3 programs + 2 framebuffers + 1, with one static pass still to come
    let progress = player.progress();
    assert_eq!((progress.done, progress.total), (7, 8));

    // preparing twice is harmless
    player.prepare().unwrap();
    assert_eq!(player.progress().done, 7);
}

#[test]
fn first_frame_only_draws_static_framebuffers() {
    init_tracing();
    let bytes = demos::blob("eidolon").unwrap();
    let blob = Blob::parse(&bytes).unwrap();
    let mut player =
        DemoPlayer::new(blob, PlayerConfig::default(), RecordingBackend::new(), ManualClock::new())
            .unwrap();
    player.prepare().unwrap();
    player.backend_mut().clear();

    let report = rendered(player.frame().unwrap());
    assert_eq!(report.frame, 0);
    assert_eq!(report.delta_seconds, 0.0);
    assert_eq!(report.passes.drawn, 1);
    assert_eq!(report.passes.skipped, 2);
    assert_eq!(report.passes.baked, 1);
    assert!(player.clock().is_playing());
    assert!(player.progress().is_complete());

    let ops = ops(player.backend().commands());
    assert_eq!(ops[0], "fb1");
    assert_eq!(ops[1], "program1");
    assert!(ops.iter().position(|o| o == "draw") < ops.iter().position(|o| o == "bake"));
    assert_eq!(&ops[ops.len() - 2..], &["progress 8/8", "present"]);

    let volume = player.resources().unwrap().color_buffer(2).unwrap();
    assert_eq!(volume.kind, TextureKind::Texture3D);
    assert_eq!(
        player.backend().texture_kind(volume.texture),
        Some(TextureKind::Texture3D)
    );
}

#[test]
fn later_frames_bind_inputs_then_uniforms_then_processors() {
    let bytes = demos::blob("eidolon").unwrap();
    let blob = Blob::parse(&bytes).unwrap();
    let mut player =
        DemoPlayer::new(blob, PlayerConfig::default(), RecordingBackend::new(), ManualClock::new())
            .unwrap();
    player.prepare().unwrap();
    player.frame().unwrap();
    player.backend_mut().clear();
    player.clock_mut().set(0.4);

    let report = rendered(player.frame().unwrap());
    assert_eq!(report.passes.drawn, 2);
    assert_eq!(report.passes.skipped, 1);
    assert_relative_eq!(report.delta_seconds, 0.4, epsilon = 1e-6);
    assert_relative_eq!(report.beats, 1.0, epsilon = 1e-6);

    let ops = ops(player.backend().commands());
    let screen = ops.iter().position(|o| o == "screen").unwrap();
    let realtime = &ops[..screen];
    assert_eq!(&realtime[..4], &["fb0", "program0", "bind0:3d", "uImages3D[0]=0"]);

    let expected = [
        "screen",
        "program2",
        "bind0:2d",
        "uImages[0]=0",
        "bind1:2d",
        "uImages[1]=1",
        "uOrigin",
        "uAngles",
        "uFovBias",
        "uMainCharacterPos",
        "uResolution",
        "uSeconds",
        "uBeats",
        "uV",
        "uFrustum",
        "draw",
        "present",
    ];
    assert_eq!(&ops[screen..], &expected);

    let resolution = player
        .backend()
        .commands()
        .iter()
        .find_map(|c| match c {
            RenderCommand::SetFloats { name, values } if name == "uResolution" => {
                Some(values.clone())
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(resolution, vec![640.0, 360.0]);
}

#[test]
fn failed_bake_keeps_the_flat_texture() {
    init_tracing();
    let bytes = demos::blob("eidolon").unwrap();
    let blob = Blob::parse(&bytes).unwrap();
    let backend = RecordingBackend::new().with_failing_readback();
    let mut player =
        DemoPlayer::new(blob, PlayerConfig::default(), backend, ManualClock::new()).unwrap();
    player.prepare().unwrap();

    let first = rendered(player.frame().unwrap());
    assert_eq!(first.passes.baked, 0);
    player.backend_mut().clear();
    player.frame().unwrap();

    let ops = ops(player.backend().commands());
    assert_eq!(&ops[..4], &["fb0", "program0", "bind0:2d", "uImages[0]=0"]);
    assert_eq!(
        player.resources().unwrap().color_buffer(2).unwrap().texture,
        TextureHandle(2)
    );
}

#[test]
fn compile_failure_aborts_preparation() {
    let bytes = demos::blob("eidolon").unwrap();
    let blob = Blob::parse(&bytes).unwrap();
    let backend = RecordingBackend::new().with_failing_program(1);
    let mut player =
        DemoPlayer::new(blob, PlayerConfig::default(), backend, ManualClock::new()).unwrap();

    let err = player.prepare().unwrap_err();
    assert!(matches!(
        err,
        PlayerError::Backend(BackendError::Compile { program: 1, .. })
    ));
    assert!(player.resources().is_none());
    assert!(matches!(player.frame(), Err(PlayerError::NotPrepared)));
}

#[test]
fn frames_before_prepare_are_rejected() {
    let bytes = demos::blob("minimal").unwrap();
    let blob = Blob::parse(&bytes).unwrap();
    let mut player =
        DemoPlayer::new(blob, PlayerConfig::default(), RecordingBackend::new(), ManualClock::new())
            .unwrap();
    let err = player.frame().unwrap_err();
    assert_eq!(err.category(), "state");
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let bytes = demos::blob("minimal").unwrap();
    let blob = Blob::parse(&bytes).unwrap();
    let config = PlayerConfig::default().with_speed(-1.0);
    let result = DemoPlayer::new(blob, config, RecordingBackend::new(), ManualClock::new());
    assert!(matches!(result, Err(PlayerError::InvalidConfig { .. })));
}

#[test]
fn hitch_plays_each_shot_for_at_least_one_frame() {
    let bytes = demos::blob("eidolon").unwrap();
    let blob = Blob::parse(&bytes).unwrap();
    let mut player = DemoPlayer::new(
        blob,
        PlayerConfig::default(),
        RecordingBackend::new(),
        ManualClock::at(100.0),
    )
    .unwrap();
    player.prepare().unwrap();

    let mut shots = Vec::new();
    while let FrameOutcome::Rendered(report) = player.frame().unwrap() {
        assert!(report.shot_changed);
        shots.push(report.shot);
    }
    assert_eq!(shots, vec![0, 1, 2]);
    assert!(player.scheduler().is_finished());
    assert_eq!(player.frame().unwrap(), FrameOutcome::Finished);
}

#[test]
fn start_offset_and_speed_scale_the_clock() {
    let bytes = demos::blob("eidolon").unwrap();
    let blob = Blob::parse(&bytes).unwrap();
    let config = PlayerConfig::default().with_start_seconds(4.0);
    let mut player =
        DemoPlayer::new(blob, config, RecordingBackend::new(), ManualClock::new()).unwrap();
    player.prepare().unwrap();

    let first = rendered(player.frame().unwrap());
    assert_eq!(first.beats, 10.0);
    assert_eq!(first.shot, 0);
    assert!(first.shot_changed);
    let second = rendered(player.frame().unwrap());
    assert_eq!(second.shot, 1);
    assert_eq!(second.local_beats, 2.0);

    let bytes = demos::blob("eidolon").unwrap();
    let blob = Blob::parse(&bytes).unwrap();
    let config = PlayerConfig::default().with_speed(2.0);
    let mut player =
        DemoPlayer::new(blob, config, RecordingBackend::new(), ManualClock::at(1.0)).unwrap();
    player.prepare().unwrap();
    let first = rendered(player.frame().unwrap());
    assert_eq!(first.seconds, 2.0);
    assert_eq!(first.beats, 5.0);
    player.clock_mut().advance(0.5);
    let second = rendered(player.frame().unwrap());
    assert_eq!(second.seconds, 3.0);
    // deltas are measured between played frames, scaled by the speed factor
    player.clock_mut().advance(0.5);
    let third = rendered(player.frame().unwrap());
    assert_eq!(third.delta_seconds, 1.0);
}

#[test]
fn start_offset_is_not_scaled_by_speed() {
    let bytes = demos::blob("eidolon").unwrap();
    let blob = Blob::parse(&bytes).unwrap();
    let config = PlayerConfig::default()
        .with_start_seconds(4.0)
        .with_speed(2.0);
    let mut player =
        DemoPlayer::new(blob, config, RecordingBackend::new(), ManualClock::at(1.0)).unwrap();
    player.prepare().unwrap();

    let first = rendered(player.frame().unwrap());
    assert_eq!(first.seconds, 6.0);
    assert_eq!(first.beats, 15.0);
    player.clock_mut().advance(0.5);
    let second = rendered(player.frame().unwrap());
    assert_eq!(second.seconds, 7.0);
}

#[test]
fn export_run_covers_the_whole_timeline() {
    init_tracing();
    let bytes = demos::blob("eidolon").unwrap();
    let blob = Blob::parse(&bytes).unwrap();
    let config: PlayerConfig = configs::load("export-player").unwrap();
    config.validate().unwrap();
    let fps = config.export_fps.unwrap();
    let mut player =
        DemoPlayer::new(blob, config, RecordingBackend::new(), FixedStepClock::new(fps)).unwrap();

    let summary = player.run(|_| false).unwrap();
    assert_eq!(summary.stop, StopReason::EndOfTimeline);
    // one precompute frame, then frames 0..=96 at 0.25 beats each
    assert_eq!(summary.frames, 98);
    assert_eq!(summary.last_shot, 2);
    assert!(player.scheduler().is_finished());

    let backend = player.backend();
    let loaded = backend
        .commands()
        .iter()
        .any(|c| matches!(c, RenderCommand::LoadTexture { uniform, .. } if uniform == "uNoise"));
    assert!(loaded);
    // the noise texture follows the two color buffer inputs of the opening screen pass
    assert!(backend.commands().iter().any(
        |c| matches!(c, RenderCommand::SetInt { name, value: 2 } if name == "uNoise")
    ));
    assert!(backend.commands().iter().any(
        |c| matches!(c, RenderCommand::SetFloats { name, .. } if name == "uMainCharacterRotation")
    ));
    let progress = player.progress();
    assert_eq!((progress.done, progress.total), (9, 9));
}

#[test]
fn escape_stops_the_run() {
    let bytes = demos::blob("minimal").unwrap();
    let blob = Blob::parse(&bytes).unwrap();
    let mut player = DemoPlayer::new(
        blob,
        PlayerConfig::default(),
        RecordingBackend::new(),
        FixedStepClock::new(60),
    )
    .unwrap();
    let summary = player.run(|report| report.frame == 4).unwrap();
    assert_eq!(summary.stop, StopReason::Escape);
    assert_eq!(summary.frames, 5);
    assert_eq!(summary.last_shot, 0);
}
