use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use pictor_core::geometry::Size;
use pictor_core::{
    CheckerboardGenerator, Composition, Generator, HorizontalStitch, Image, ImageFormat, Operation,
    Pipeline, QrCodeGenerator, RandomGenerator, StripesGenerator, VerticalStitch,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pictor", version, about = "Filter, transform, generate and stitch images")]
struct Cli {
    /// Log operation details (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a JSON pipeline of filters and transforms over an image.
    Apply(ApplyArgs),
    /// Lay several images side by side or top to bottom.
    Stitch(StitchArgs),
    /// Create a new image from a generator.
    Generate(GenerateArgs),
    /// Print size and transparency of an image.
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Pipeline JSON file.
    #[arg(long)]
    pipeline: PathBuf,

    /// Output image path; the extension selects the format.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct StitchArgs {
    /// Stack images top to bottom instead of left to right.
    #[arg(long, default_value_t = false)]
    vertical: bool,

    /// Stretch every image to WIDTHxHEIGHT.
    #[arg(long, value_parser = parse_size)]
    force: Option<Size>,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,

    /// Images in layout order.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GeneratorKind {
    Checkerboard,
    Stripes,
    Random,
    Qr,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    kind: GeneratorKind,

    #[arg(long, default_value_t = 256)]
    width: u32,

    #[arg(long, default_value_t = 256)]
    height: u32,

    /// QR code payload.
    #[arg(long)]
    text: Option<String>,

    /// Noise seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    image: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Apply(args) => cmd_apply(args),
        Command::Stitch(args) => cmd_stitch(args),
        Command::Generate(args) => cmd_generate(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: f64 = w.trim().parse().map_err(|e| format!("width '{w}': {e}"))?;
    let h: f64 = h.trim().parse().map_err(|e| format!("height '{h}': {e}"))?;
    if !(w > 0.0 && h > 0.0) {
        return Err(format!("dimensions must be positive, got '{s}'"));
    }
    Ok(Size::new(w, h))
}

fn load(path: &Path) -> anyhow::Result<Image> {
    Image::from_path(path).with_context(|| format!("read image '{}'", path.display()))
}

/// Write `image` in the format named by the extension, TIFF otherwise.
fn write(image: &Image, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    match ImageFormat::from_path(out) {
        Ok(format) => image.save_as(out, format),
        Err(_) => image.save(Some(out)).map(|_| ()),
    }
    .with_context(|| format!("write image '{}'", out.display()))?;

    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_path(&args.pipeline)
        .with_context(|| format!("load pipeline '{}'", args.pipeline.display()))?;
    let mut image = load(&args.in_path)?;
    pipeline
        .apply_to(&mut image)
        .with_context(|| format!("apply pipeline to '{}'", args.in_path.display()))?;
    write(&image, &args.out)
}

fn cmd_stitch(args: StitchArgs) -> anyhow::Result<()> {
    let images = args.images.iter().map(|p| load(p)).collect::<anyhow::Result<Vec<_>>>()?;
    let stitched = if args.vertical {
        VerticalStitch {
            force_dimensions: args.force,
        }
        .compose(&images)
    } else {
        HorizontalStitch {
            force_dimensions: args.force,
        }
        .compose(&images)
    }
    .context("stitch images")?;
    write(&stitched, &args.out)
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let (width, height) = (args.width, args.height);
    let image = match args.kind {
        GeneratorKind::Checkerboard => CheckerboardGenerator::new(width, height).generate(),
        GeneratorKind::Stripes => StripesGenerator::new(width, height).generate(),
        GeneratorKind::Random => RandomGenerator::new(width, height, args.seed).generate(),
        GeneratorKind::Qr => {
            let text = args.text.context("qr needs --text")?;
            let mut generator = QrCodeGenerator::text(text);
            generator.size = width.min(height);
            generator.generate()
        }
    }
    .with_context(|| format!("generate {:?}", args.kind))?;
    write(&image, &args.out)
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let image = load(&args.image)?;
    println!(
        "{}: {}x{} alpha={} opaque={}",
        args.image.display(),
        image.width(),
        image.height(),
        image.has_alpha_channel(),
        image.is_opaque()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("100x50"), Ok(Size::new(100.0, 50.0)));
        assert_eq!(parse_size("8X8"), Ok(Size::new(8.0, 8.0)));
        assert!(parse_size("100").is_err());
        assert!(parse_size("0x5").is_err());
        assert!(parse_size("ax5").is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
