use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "svga", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a JSON summary of a movie file.
    Inspect(InspectArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Play a movie through the scheduler and write every displayed frame as a PNG.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input movie.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input movie.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Image key to hide (repeatable).
    #[arg(long = "hide")]
    hide: Vec<String>,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input movie.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for `frame_00000.png`, ...
    #[arg(long)]
    out_dir: PathBuf,

    /// Player options as JSON, e.g. `{"loops":2,"direction":"reverse"}`.
    #[arg(long)]
    options: Option<String>,

    /// Upper bound on written frames (guards infinite loops).
    #[arg(long, default_value_t = 10_000)]
    max_frames: u32,
}

#[derive(serde::Serialize)]
struct Summary<'a> {
    version: svga::FormatVersion,
    version_tag: &'a str,
    canvas: svga::Canvas,
    fps: u32,
    frame_count: u32,
    sprites: usize,
    images: Vec<ImageSummary<'a>>,
    referenced_images: Vec<&'a str>,
}

#[derive(serde::Serialize)]
struct ImageSummary<'a> {
    key: &'a str,
    bytes: usize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn read_movie_bytes(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read movie '{}'", path.display()))
}

fn load_video(path: &Path) -> anyhow::Result<svga::VideoEntity> {
    let bytes = read_movie_bytes(path)?;
    let movie = svga::decode(&bytes).with_context(|| format!("decode '{}'", path.display()))?;
    let video = svga::build(movie, Arc::new(svga::RasterImageDecoder))
        .with_context(|| format!("resolve images of '{}'", path.display()))?;
    Ok(video)
}

fn write_png(path: &Path, frame: svga::FrameRgba) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let frame = frame.into_straight();
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let bytes = read_movie_bytes(&args.in_path)?;
    let movie = svga::decode(&bytes)
        .with_context(|| format!("decode '{}'", args.in_path.display()))?;

    let summary = Summary {
        version: movie.version,
        version_tag: &movie.version_tag,
        canvas: movie.canvas,
        fps: movie.fps,
        frame_count: movie.frame_count,
        sprites: movie.sprites.len(),
        images: movie
            .images
            .iter()
            .map(|(key, b)| ImageSummary { key, bytes: b.len() })
            .collect(),
        referenced_images: movie.referenced_image_keys(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut video = load_video(&args.in_path)?;
    for key in args.hide {
        video.set_hidden(key, true);
    }

    let mut surface = svga::CpuSurface::for_canvas(video.movie().canvas)?;
    svga::Renderer::new()
        .render(&video, args.frame, &mut surface)
        .with_context(|| format!("render frame {}", args.frame))?;
    write_png(&args.out, surface.snapshot())?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let options: svga::PlayerOptions = match args.options.as_deref() {
        Some(json) => serde_json::from_str(json).context("parse --options JSON")?,
        None => svga::PlayerOptions::default(),
    };
    let video = load_video(&args.in_path)?;
    let surface = svga::CpuSurface::for_canvas(video.movie().canvas)?;

    let ticks = svga::ManualTickSource::new();
    let mut player = svga::Player::with_tick_source(surface, ticks.clone());
    player.configure(options)?;
    player.mount(video)?;
    player.start()?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let mut written = 0u32;
    loop {
        let frame = player.surface_mut().snapshot();
        let path = args.out_dir.join(format!("frame_{written:05}.png"));
        write_png(&path, frame)?;
        written += 1;

        if player.playback() != svga::PlaybackState::Playing || written >= args.max_frames {
            break;
        }
        ticks.fire(1);
        player.pump()?;
    }
    player.destroy();

    eprintln!("wrote {written} frames to {}", args.out_dir.display());
    Ok(())
}
