//! # lottie
//!
//! Inspect and rasterize Lottie animations.
//!
//! ## Commands
//! - `info`: print the document summary and any parse warnings
//! - `render`: draw one frame, or every frame, to PNG

mod assets;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kurbo::Affine;
use lottie_core::{Color, Composition, CompositionRenderer, PlayerConfig, Surface};
use lottie_raster::RasterSurface;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::FileImageProvider;

#[derive(Parser)]
#[command(name = "lottie")]
#[command(about = "Inspect and rasterize Lottie animations")]
#[command(version)]
struct Cli {
    /// Player configuration (JSON); missing fields keep their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print size, timing, layers and warnings
    Info {
        /// Animation document (.json)
        input: PathBuf,
    },

    /// Render frames to PNG
    Render {
        /// Animation document (.json)
        input: PathBuf,

        /// Output file, or directory with --sequence
        #[arg(short, long, default_value = "frame.png")]
        output: PathBuf,

        /// Absolute frame number
        #[arg(short, long, conflicts_with = "progress")]
        frame: Option<f32>,

        /// Normalized position in 0..=1
        #[arg(short, long)]
        progress: Option<f32>,

        /// Render every `step`-th frame of the timeline into the output directory
        #[arg(long)]
        sequence: bool,

        #[arg(long, default_value = "1")]
        step: f32,

        /// Output scale relative to the composition size
        #[arg(short, long, default_value = "1.0")]
        scale: f32,

        /// Background as #rrggbb or #rrggbbaa; transparent when absent
        #[arg(short, long)]
        background: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { input } => cmd_info(&input, &config),
        Commands::Render {
            input,
            output,
            frame,
            progress,
            sequence,
            step,
            scale,
            background,
        } => {
            let comp = load(&input, &config)?;
            let background = match background.as_deref() {
                Some(hex) => Some(Color::from_hex(hex).with_context(|| format!("bad color `{hex}`"))?),
                None => None,
            };
            let job = RenderJob::new(comp, &input, &config, scale, background)?;
            if sequence {
                job.render_sequence(&output, step)
            } else {
                let at = match (frame, progress) {
                    (Some(f), _) => job.renderer.composition().timeline.progress(f),
                    (None, Some(p)) => p,
                    (None, None) => 0.0,
                };
                job.render_to(at, &output)
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PlayerConfig> {
    let Some(path) = path else {
        return Ok(PlayerConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    PlayerConfig::from_json_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn load(path: &Path, config: &PlayerConfig) -> Result<Arc<Composition>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let model = serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a Lottie document", path.display()))?;
    let comp = Composition::from_model(model, &config.parse)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Arc::new(comp))
}

fn cmd_info(input: &Path, config: &PlayerConfig) -> Result<()> {
    let comp = load(input, config)?;
    let t = comp.timeline;
    println!("{}", comp.name.as_deref().unwrap_or("(unnamed)"));
    println!("  size:      {} x {}", comp.width, comp.height);
    println!("  frames:    {} .. {} @ {} fps", t.start, t.end, t.frame_rate);
    println!("  duration:  {:.3} s", comp.duration_seconds());
    println!("  layers:    {}", comp.root.layers.len());
    println!("  assets:    {} ({} images)", comp.assets.len(), comp.images().count());
    println!("  fonts:     {}", comp.fonts.len());
    println!("  markers:   {}", comp.markers.len());
    println!("  masks:     {}", comp.has_masks);
    println!("  mattes:    {}", comp.has_mattes);

    let warnings = comp.warnings();
    if warnings.is_empty() {
        println!("no warnings");
    } else {
        println!("{} warning(s):", warnings.len());
        for w in &warnings {
            println!("  - {w}");
        }
    }
    Ok(())
}

struct RenderJob {
    renderer: CompositionRenderer,
    width: u32,
    height: u32,
    scale: f32,
    background: Option<Color>,
}

impl RenderJob {
    fn new(
        comp: Arc<Composition>,
        input: &Path,
        config: &PlayerConfig,
        scale: f32,
        background: Option<Color>,
    ) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            bail!("scale must be positive, got {scale}");
        }
        let width = (comp.width * scale).ceil() as u32;
        let height = (comp.height * scale).ceil() as u32;
        let base_dir = input.parent().unwrap_or_else(|| Path::new("."));
        let renderer = CompositionRenderer::new(comp)
            .with_config(config.render.clone())
            .with_image_provider(Arc::new(FileImageProvider::new(base_dir)));
        Ok(Self {
            renderer,
            width,
            height,
            scale,
            background,
        })
    }

    fn draw(&self, progress: f32) -> Result<RasterSurface> {
        let mut surface = RasterSurface::new(self.width, self.height)
            .with_context(|| format!("cannot allocate a {}x{} canvas", self.width, self.height))?;
        if let Some(bg) = self.background {
            surface.clear(bg);
        }
        surface.concat(Affine::scale(self.scale as f64));
        self.renderer.draw(&mut surface, progress);
        Ok(surface)
    }

    fn render_to(&self, progress: f32, output: &Path) -> Result<()> {
        let surface = self.draw(progress)?;
        let image = image::RgbaImage::from_raw(self.width, self.height, surface.to_rgba8())
            .context("pixel buffer does not match the canvas")?;
        image
            .save(output)
            .with_context(|| format!("writing {}", output.display()))?;
        tracing::info!(output = %output.display(), progress, "rendered");
        Ok(())
    }

    fn render_sequence(&self, dir: &Path, step: f32) -> Result<()> {
        if !step.is_finite() || step <= 0.0 {
            bail!("step must be positive, got {step}");
        }
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let timeline = self.renderer.composition().timeline;
        let mut frame = timeline.start;
        let mut n = 0u32;
        while frame < timeline.end {
            let path = dir.join(format!("frame_{n:04}.png"));
            self.render_to(timeline.progress(frame), &path)?;
            frame += step;
            n += 1;
        }
        tracing::info!(frames = n, dir = %dir.display(), "sequence done");
        Ok(())
    }
}
