use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storyreel::{
    CapturePipeline, CpuSurface, FfmpegCaptureSink, Fps, ManualClock, OfflineMixGraph,
    PlaybackController, Project, Surface as _, build_timeline, ensure_parent_dir, load_project,
    plan_audio, render_frame,
};

#[derive(Parser, Debug)]
#[command(name = "storyreel", version)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    cmd: Command,
}

/// Settings that take precedence over the project file.
#[derive(Args, Debug)]
struct Overrides {
    /// Capture frame rate (frames per second).
    #[arg(long, global = true)]
    fps: Option<u32>,

    /// Canvas width in pixels.
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Canvas height in pixels.
    #[arg(long, global = true)]
    height: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Print the audio scheduling plan as JSON.
    Plan(PlanArgs),
    /// Record the reel to a video file (requires `ffmpeg` on PATH).
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Project JSON.
    #[arg(long)]
    project: PathBuf,

    /// Timeline time in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Project JSON.
    #[arg(long)]
    project: PathBuf,

    /// Timeline offset playback starts from.
    #[arg(long, default_value_t = 0.0)]
    offset: f64,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Project JSON.
    #[arg(long)]
    project: PathBuf,

    /// Directory the finished video is written into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args, &cli.overrides),
        Command::Plan(args) => cmd_plan(args, &cli.overrides),
        Command::Export(args) => cmd_export(args, &cli.overrides),
    }
}

fn open_project(path: &std::path::Path, overrides: &Overrides) -> anyhow::Result<Project> {
    let mut project = load_project(path)?;
    if let Some(fps) = overrides.fps {
        project.config.fps = Fps::new(fps, 1)?;
    }
    if let Some(width) = overrides.width {
        project.config.canvas.width = width;
    }
    if let Some(height) = overrides.height {
        project.config.canvas.height = height;
    }
    project.config.validate()?;
    Ok(project)
}

fn cmd_frame(args: FrameArgs, overrides: &Overrides) -> anyhow::Result<()> {
    let project = open_project(&args.project, overrides)?;
    let timeline = build_timeline(&project.scenes, &project.assets);

    let canvas = project.config.canvas;
    let mut surface = CpuSurface::new(canvas.width, canvas.height)?;
    render_frame(
        &mut surface,
        &timeline,
        &project.assets,
        args.time,
        &project.config,
    )?;
    let frame = surface.snapshot()?;

    ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_plan(args: PlanArgs, overrides: &Overrides) -> anyhow::Result<()> {
    let project = open_project(&args.project, overrides)?;
    let timeline = build_timeline(&project.scenes, &project.assets);
    let plan = plan_audio(
        &timeline,
        &project.assets,
        project.background.as_ref(),
        project.config.background_gain,
        args.offset,
        0.0,
    );
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn cmd_export(args: ExportArgs, overrides: &Overrides) -> anyhow::Result<()> {
    let project = open_project(&args.project, overrides)?;
    let sink = FfmpegCaptureSink::negotiate()?;

    let clock = ManualClock::new();
    let canvas = project.config.canvas;
    let mut controller = PlaybackController::new(
        CpuSurface::new(canvas.width, canvas.height)?,
        OfflineMixGraph::new(clock.clone()),
        clock.clone(),
        project.config,
    );
    controller.load(project.scenes, project.assets, project.background)?;

    let capture = CapturePipeline::new(&mut controller, clock).record(Box::new(sink))?;
    let path = capture.write_to_dir(&args.out_dir)?;

    eprintln!("wrote {}", path.display());
    Ok(())
}
