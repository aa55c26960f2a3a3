use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use reel_blob_core::{Blob, BlobSummary};
use reel_player_core::{DemoPlayer, FixedStepClock, PlayerConfig, RecordingBackend};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reel-inspect", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a JSON summary of a blob.
    Summary(SummaryArgs),
    /// Play a blob headless at a fixed frame rate and report what was rendered.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct SummaryArgs {
    /// Input blob.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Pretty-print the JSON.
    #[arg(long)]
    pretty: bool,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input blob.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Player config JSON. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame rate; overrides the config's export rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Stop after this many frames even if the timeline has not ended.
    #[arg(long)]
    max_frames: Option<u64>,

    /// Write every recorded backend command to this JSON file.
    #[arg(long)]
    commands: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Summary(args) => cmd_summary(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn read_blob(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read blob '{}'", path.display()))
}

fn cmd_summary(args: SummaryArgs) -> anyhow::Result<()> {
    let bytes = read_blob(&args.in_path)?;
    let blob = Blob::parse(&bytes).with_context(|| format!("parse '{}'", args.in_path.display()))?;
    let summary = BlobSummary::from_blob(&blob)?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{json}");
    eprintln!(
        "{} shots, {:.2}s at {} beats/s",
        summary.shots.len(),
        summary.duration_seconds(),
        summary.beats_per_second
    );
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let bytes = read_blob(&args.in_path)?;
    let blob = Blob::parse(&bytes).with_context(|| format!("parse '{}'", args.in_path.display()))?;

    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            PlayerConfig::from_json_str(&text)
                .with_context(|| format!("load config '{}'", path.display()))?
        }
        None => PlayerConfig::default(),
    };
    if args.fps.is_some() {
        config.export_fps = args.fps;
    }
    let fps = config.export_fps.unwrap_or(60);

    let mut player = DemoPlayer::new(blob, config, RecordingBackend::new(), FixedStepClock::new(fps))?;
    let max_frames = args.max_frames.unwrap_or(u64::MAX);
    let summary = player.run(|report| report.frame + 1 >= max_frames)?;

    let backend = player.backend();
    info!(
        commands = backend.commands().len(),
        draws = backend.draw_count(),
        "headless run finished"
    );
    if let Some(path) = &args.commands {
        let json = serde_json::to_string(backend.commands())?;
        fs::write(path, json).with_context(|| format!("write commands '{}'", path.display()))?;
        eprintln!("wrote {}", path.display());
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
