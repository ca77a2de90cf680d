use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use dialkit::{Canvas, CpuSurface, DialOptions, DialPhase, RatingDial, Surface as _};

#[derive(Parser, Debug)]
#[command(name = "dialkit", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the dial animation as a numbered PNG frame sequence.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Score to reveal, in [0, 100].
    #[arg(long)]
    score: f64,

    /// Output directory for frame PNGs.
    #[arg(long)]
    out: PathBuf,

    /// Dial options JSON; defaults apply when omitted.
    #[arg(long)]
    options: Option<PathBuf>,

    /// TTF/OTF font used for the score label.
    #[arg(long)]
    font: PathBuf,

    /// Frames per second of the fixed-step clock.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Container box percentage sizing resolves against, as WIDTHxHEIGHT.
    #[arg(long, default_value = "640x480")]
    parent: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
    }
}

fn parse_parent(s: &str) -> anyhow::Result<Canvas> {
    let (w, h) = s
        .split_once('x')
        .with_context(|| format!("parent '{s}' must be WIDTHxHEIGHT"))?;
    let width: u32 = w.parse().with_context(|| format!("parent width '{w}'"))?;
    let height: u32 = h.parse().with_context(|| format!("parent height '{h}'"))?;
    Ok(Canvas::new(width, height)?)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let options = match &args.options {
        Some(path) => {
            let s = std::fs::read_to_string(path)
                .with_context(|| format!("read options '{}'", path.display()))?;
            DialOptions::from_json_str(&s)?
        }
        None => DialOptions::default(),
    };

    if args.fps == 0 {
        anyhow::bail!("fps must be > 0");
    }
    let parent = parse_parent(&args.parent)?;
    let font_bytes = std::fs::read(&args.font)
        .with_context(|| format!("read font '{}'", args.font.display()))?;

    let surface = CpuSurface::new(parent)?
        .with_parent_bounds(parent)
        .with_font_bytes(font_bytes)?;
    let mut dial = RatingDial::new(surface, options)?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    dial.start(args.score)?;

    // Fixed-step synthetic clock keeps the sequence deterministic.
    let dt = Duration::from_secs_f64(1.0 / f64::from(args.fps));
    let origin = Instant::now();
    let max_frames = args.fps.saturating_mul(60);

    let mut written = 0u32;
    for frame in 0..max_frames {
        let phase = dial.tick(origin + dt * frame)?;

        let bounds = dial.surface().bounds();
        let path = args.out.join(format!("frame_{frame:04}.png"));
        image::save_buffer_with_format(
            &path,
            dial.surface().pixels_rgba8(),
            bounds.width,
            bounds.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        written += 1;

        if phase == DialPhase::Settled {
            break;
        }
    }

    eprintln!("wrote {written} frames to {}", args.out.display());
    Ok(())
}
