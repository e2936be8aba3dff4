use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use image::ImageFormat;
use tracing::info;

use bubble_translator::detect::{RegionsFile, cluster_detections};
use bubble_translator::fit::FontCache;
use bubble_translator::fonts::FontResolver;
use bubble_translator::pipeline::{PipelineOptions, translate_image};
use bubble_translator::settings;
use bubble_translator::translate::{Passthrough, Translate, TranslationTable};

#[derive(Parser, Debug)]
#[command(
    name = "bubble-translator",
    version,
    about = "Merge detected text into speech bubbles and redraw them translated"
)]
struct Cli {
    /// Read extra settings from a local TOML file
    #[arg(short = 's', long = "settings", global = true)]
    settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the merged bubbles for a regions file as JSON
    Cluster(ClusterArgs),
    /// Redraw an image with translated bubbles
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct ClusterArgs {
    /// Detections JSON: [{"polygon": [[x, y], ...], "text": "..."}]
    #[arg(short = 'R', long = "regions")]
    regions: PathBuf,

    /// Proximity threshold in pixels (default from settings)
    #[arg(short = 't', long = "threshold")]
    threshold: Option<f32>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Source image
    #[arg(short = 'i', long = "image")]
    image: PathBuf,

    /// Detections JSON for the image
    #[arg(short = 'R', long = "regions")]
    regions: PathBuf,

    /// Translations JSON aligned with bubble order (omit to redraw the source text)
    #[arg(short = 'T', long = "translations")]
    translations: Option<PathBuf>,

    /// Target language, used to pick the font
    #[arg(short = 'l', long = "lang", default_value = "EN")]
    lang: String,

    /// Source language
    #[arg(short = 'L', long = "source-lang", default_value = "EN")]
    source_lang: String,

    /// Proximity threshold in pixels (default from settings)
    #[arg(short = 't', long = "threshold")]
    threshold: Option<f32>,

    /// Font file (overrides the per-language font)
    #[arg(short = 'f', long = "font")]
    font: Option<PathBuf>,

    /// Output image; format follows the extension
    #[arg(short = 'o', long = "output")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    bubble_translator::logging::init(cli.verbose)?;
    let settings = settings::load_settings(cli.settings.as_deref())?;

    match cli.command {
        Command::Cluster(args) => run_cluster(args, &settings),
        Command::Render(args) => run_render(args, &settings),
    }
}

fn run_cluster(args: ClusterArgs, settings: &settings::Settings) -> Result<()> {
    let file = RegionsFile::load(&args.regions)?;
    let threshold = args.threshold.unwrap_or(settings.proximity_threshold);
    let clusters = cluster_detections(file.detections().to_vec(), threshold);
    let json = serde_json::to_string_pretty(&clusters)?;
    println!("{}", json);
    Ok(())
}

fn run_render(args: RenderArgs, settings: &settings::Settings) -> Result<()> {
    let image_bytes = std::fs::read(&args.image)
        .with_context(|| format!("failed to read image: {}", args.image.display()))?;
    let detector = RegionsFile::load(&args.regions)?;
    let translator: Box<dyn Translate> = match &args.translations {
        Some(path) => Box::new(TranslationTable::load(path)?),
        None => Box::new(Passthrough),
    };

    let mut options = PipelineOptions::from_settings(settings, &args.source_lang, &args.lang);
    if let Some(threshold) = args.threshold {
        options.proximity_threshold = threshold;
    }
    options.font_path = args.font;
    options.output_format = output_format(&args.output)?;

    let fonts = FontResolver::from_settings(settings);
    let cache = FontCache::new();
    let output = translate_image(
        &image_bytes,
        &detector,
        translator.as_ref(),
        &fonts,
        &cache,
        &options,
    )?;

    std::fs::write(&args.output, &output.image)
        .with_context(|| format!("failed to write output: {}", args.output.display()))?;
    info!("wrote {}", args.output.display());

    if output.is_partial() {
        for failure in &output.failures {
            eprintln!("bubble {}: {}", failure.index, failure.reason);
        }
        eprintln!(
            "{} of {} bubbles had problems",
            output.failures.len(),
            output.clusters.len()
        );
    }
    Ok(())
}

fn output_format(path: &Path) -> Result<ImageFormat> {
    let format = ImageFormat::from_path(path)
        .map_err(|_| anyhow!("unsupported output image type: {}", path.display()))?;
    match format {
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP | ImageFormat::Bmp => Ok(format),
        _ => Err(anyhow!("unsupported output image type: {}", path.display())),
    }
}
