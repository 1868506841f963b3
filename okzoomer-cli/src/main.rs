use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use okzoomer::{
    AnimationSequence, Candidate, PixelRect, SubjectDetector, ZoomConfig, ZoomError, ZoomPipeline,
    ZoomResult,
};

#[derive(Parser, Debug)]
#[command(name = "okzoomer", version)]
struct Cli {
    /// Log pipeline stages and timings to stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Zoom into the best subject and back out, writing a looping GIF.
    Zoom(ZoomArgs),
    /// Write the quantized image as a single-frame GIF.
    Still(StillArgs),
}

#[derive(Parser, Debug)]
struct ZoomArgs {
    /// Input image (any format the `image` crate decodes).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,

    /// Subject candidate `x0,y0,x1,y1[@score]`; repeatable, the best `score * area` wins.
    #[arg(long = "subject", value_parser = parse_candidate)]
    subjects: Vec<Candidate>,

    /// Zoom configuration JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Intermediate windows between the full frame and the subject.
    #[arg(long)]
    steps: Option<usize>,

    /// Per-frame delay in milliseconds.
    #[arg(long)]
    delay_ms: Option<u32>,

    /// Repeat count (0 loops forever).
    #[arg(long)]
    loop_count: Option<u16>,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Write a still GIF instead of failing when no subject is given.
    #[arg(long, default_value_t = false)]
    fallback_still: bool,
}

#[derive(Parser, Debug)]
struct StillArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,

    /// Zoom configuration JSON (palette, dither, background).
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Candidates given on the command line, reported in flag order.
struct CommandLineSubjects(Vec<Candidate>);

impl SubjectDetector for CommandLineSubjects {
    fn detect(&self, _image: &image::RgbaImage) -> ZoomResult<Vec<Candidate>> {
        Ok(self.0.clone())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Zoom(args) => cmd_zoom(args),
        Command::Still(args) => cmd_still(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_zoom(args: ZoomArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(steps) = args.steps {
        cfg.zoom_steps = steps;
    }
    if let Some(delay) = args.delay_ms {
        cfg.delay_ms = delay;
    }
    if let Some(loop_count) = args.loop_count {
        cfg.loop_count = loop_count;
    }
    if let Some(threads) = args.threads {
        cfg.threading.threads = Some(threads);
    }

    let pipeline = ZoomPipeline::new(cfg)?;
    let image = load_image(&args.in_path)?;
    let detector = CommandLineSubjects(args.subjects);
    let seq = match pipeline.run_detected(image.clone(), &detector) {
        Ok(seq) => seq,
        Err(ZoomError::DetectionEmpty) if args.fallback_still => {
            eprintln!("no usable subject; writing a still frame");
            pipeline.run_still(image)?
        }
        Err(e) => return Err(e).context("zoom pipeline failed"),
    };

    write_output(&seq, &args.out)
}

fn cmd_still(args: StillArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let pipeline = ZoomPipeline::new(cfg)?;
    let seq = pipeline.run_still(load_image(&args.in_path)?)?;
    write_output(&seq, &args.out)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ZoomConfig> {
    match path {
        Some(p) => Ok(ZoomConfig::from_path(p)?),
        None => Ok(ZoomConfig::default()),
    }
}

fn load_image(path: &Path) -> anyhow::Result<image::RgbaImage> {
    let decoded =
        image::open(path).with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(decoded.to_rgba8())
}

fn write_output(seq: &AnimationSequence, out: &Path) -> anyhow::Result<()> {
    okzoomer::write_gif_file(seq, out)
        .with_context(|| format!("write gif '{}'", out.display()))?;
    eprintln!("wrote {} ({} frames)", out.display(), seq.len());
    Ok(())
}

fn parse_candidate(s: &str) -> Result<Candidate, String> {
    let (coords, score) = match s.split_once('@') {
        Some((c, score)) => {
            let score = score
                .trim()
                .parse::<f32>()
                .map_err(|e| format!("invalid score '{score}': {e}"))?;
            (c, score)
        }
        None => (s, 1.0),
    };
    let parts = coords
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid rectangle '{coords}': {e}"))?;
    let [min_x, min_y, max_x, max_y] = parts[..] else {
        return Err(format!("expected x0,y0,x1,y1, got '{coords}'"));
    };
    let rect = PixelRect::new(min_x, min_y, max_x, max_y).map_err(|e| e.to_string())?;
    Ok(Candidate::new(rect, score))
}
