/*!
globeview Command Line Interface

Renders globe frames and outline graphics to SVG or JSON.
*/

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use globeview::clock::ManualScheduler;
use globeview::config::DatasetConfig;
use globeview::geo::{Graticule, WorldDataset};
use globeview::globe::GlobeRenderer;
use globeview::loader::{self, DatasetSource, FileSource};
use globeview::outline::{Outline, OutlineLoader};
use globeview::path::PathGenerator;
use globeview::renderer::ProjectionRenderer;
use globeview::writer::{JsonWriter, SvgWriter, Writer};
use globeview::{GlobeConfig, Rotation, VERSION};

#[cfg(feature = "http")]
use globeview::loader::HttpSource;

/// Milliseconds between frames at 60 Hz
const FRAME_MS: f64 = 1000.0 / 60.0;

#[derive(Parser)]
#[command(name = "globeview")]
#[command(about = "Rotating orthographic globe renderer")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Format {
    Svg,
    Json,
}

/// Options shared by the frame-rendering commands
#[derive(clap::Args)]
pub struct GlobeArgs {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset URL or local path (overrides the configuration)
    #[arg(long)]
    dataset: Option<String>,

    /// Initial rotation as "longitude,latitude" in degrees
    #[arg(long, value_parser = parse_rotation, allow_hyphen_values = true)]
    rotation: Option<Rotation>,

    /// Globe radius in pixels
    #[arg(long)]
    scale: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value = "svg")]
    format: Format,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a single frame after a number of animation ticks
    Render {
        #[command(flatten)]
        globe: GlobeArgs,

        /// Animation ticks to run before rendering
        #[arg(long, default_value_t = 0)]
        ticks: u64,

        /// Output file path (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Render a sequence of frames into a directory
    Frames {
        #[command(flatten)]
        globe: GlobeArgs,

        /// Number of frames to write
        #[arg(long, default_value_t = 60)]
        count: u64,

        /// Animation ticks between written frames
        #[arg(long, default_value_t = 1)]
        every: u64,

        /// Output directory
        #[arg(long)]
        dir: PathBuf,
    },

    /// Recolor an outline SVG and crop it to its content
    Outline {
        /// SVG file path or URL
        source: String,

        /// Foreground color
        #[arg(long, default_value = globeview::outline::DEFAULT_COLOR)]
        color: String,

        /// Padding around the content, in SVG units
        #[arg(long, default_value_t = globeview::outline::DEFAULT_PADDING)]
        padding: f64,

        /// Output file path (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the graticule (for debugging)
    Graticule {
        /// Print GeoJSON instead of projected path data
        #[arg(long)]
        geojson: bool,

        /// Projection rotation as "longitude,latitude"
        #[arg(long, value_parser = parse_rotation, allow_hyphen_values = true)]
        rotation: Option<Rotation>,
    },
}

fn parse_rotation(value: &str) -> Result<Rotation, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(format!("Expected \"longitude,latitude\", got '{}'", value));
    }
    let parse = |s: &str| {
        s.parse::<f64>()
            .map_err(|e| format!("Invalid angle '{}': {}", s, e))
    };
    Ok(Rotation::new(parse(parts[0])?, parse(parts[1])?))
}

fn load_config(args: &GlobeArgs) -> anyhow::Result<GlobeConfig> {
    let mut config = match &args.config {
        Some(path) => GlobeConfig::from_json_file(path)?,
        None => GlobeConfig::default(),
    };
    if let Some(dataset) = &args.dataset {
        config.dataset.url = dataset.clone();
    }
    if let Some(rotation) = args.rotation {
        config.rotation = rotation;
    }
    if let Some(scale) = args.scale {
        config.scale = scale;
    }
    config.validate()?;
    Ok(config)
}

fn source_for(location: &str) -> anyhow::Result<Box<dyn DatasetSource>> {
    let remote = DatasetConfig {
        url: location.to_string(),
        ..DatasetConfig::default()
    }
    .is_remote();
    if !remote {
        return Ok(Box::new(FileSource::new(location)));
    }

    #[cfg(feature = "http")]
    {
        Ok(Box::new(HttpSource::new(location)))
    }

    #[cfg(not(feature = "http"))]
    {
        bail!("HTTP support not compiled in. Rebuild with --features http")
    }
}

fn load_dataset(config: &GlobeConfig) -> anyhow::Result<WorldDataset> {
    let source = source_for(&config.dataset.url)?;
    info!(source = %source.describe(), "Loading dataset");
    Ok(loader::load_blocking(source.as_ref(), &config.dataset.object))
}

fn write_scene(globe: &GlobeRenderer, format: Format) -> anyhow::Result<String> {
    let output = match format {
        Format::Svg => SvgWriter::new().write(globe.scene())?,
        Format::Json => JsonWriter::new().pretty().write(globe.scene())?,
    };
    Ok(output)
}

fn extension(format: Format) -> &'static str {
    match format {
        Format::Svg => SvgWriter::new().extension(),
        Format::Json => JsonWriter::new().extension(),
    }
}

fn emit(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output file {}", path.display()))?;
            info!(path = %path.display(), "Output written");
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Mount a globe on a preloaded dataset and fire `ticks` frames
fn run_globe(
    config: GlobeConfig,
    dataset: WorldDataset,
    ticks: u64,
) -> anyhow::Result<(GlobeRenderer, ManualScheduler)> {
    let mut scheduler = ManualScheduler::new();
    let mut globe = GlobeRenderer::new(config);
    globe.mount_with(dataset, &mut scheduler);
    tick(&mut globe, &mut scheduler, ticks)?;
    Ok((globe, scheduler))
}

fn tick(
    globe: &mut GlobeRenderer,
    scheduler: &mut ManualScheduler,
    ticks: u64,
) -> anyhow::Result<()> {
    for _ in 0..ticks {
        let Some(frame) = scheduler.next_frame() else {
            bail!("Animation stopped unexpectedly");
        };
        globe.on_frame(frame, FRAME_MS, scheduler);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "globeview=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            globe,
            ticks,
            output,
        } => {
            let config = load_config(&globe)?;
            let dataset = load_dataset(&config)?;
            let (mut renderer, mut scheduler) = run_globe(config, dataset, ticks)?;
            info!(
                rotation = ?renderer.rotation(),
                nodes = renderer.scene().len(),
                "Frame rendered"
            );

            let content = write_scene(&renderer, globe.format)?;
            renderer.unmount(&mut scheduler);
            emit(output.as_deref(), &content)?;
        }

        Commands::Frames {
            globe,
            count,
            every,
            dir,
        } => {
            if every == 0 {
                bail!("--every must be at least 1");
            }
            let config = load_config(&globe)?;
            let dataset = load_dataset(&config)?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;

            let (mut renderer, mut scheduler) = run_globe(config, dataset, 0)?;
            for index in 0..count {
                if index > 0 {
                    tick(&mut renderer, &mut scheduler, every)?;
                }
                let path = dir.join(format!("frame-{:05}.{}", index, extension(globe.format)));
                std::fs::write(&path, write_scene(&renderer, globe.format)?)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            renderer.unmount(&mut scheduler);
            info!(count, dir = %dir.display(), "Frames written");
        }

        Commands::Outline {
            source,
            color,
            padding,
            output,
        } => {
            let outline_loader = OutlineLoader::new()?
                .with_color(color)?
                .with_padding(padding);
            let outline = outline_loader.load(source_for(&source)?.as_ref());
            let failed = matches!(outline, Outline::Error(_));
            emit(output.as_deref(), &outline.to_string())?;
            if failed {
                std::process::exit(1);
            }
        }

        Commands::Graticule { geojson, rotation } => {
            let graticule = Graticule::new();
            if geojson {
                println!("{}", serde_json::to_string_pretty(&graticule.geometry())?);
            } else {
                let mut config = GlobeConfig::default();
                if let Some(rotation) = rotation {
                    config.rotation = rotation;
                }
                let projection = ProjectionRenderer::new(&config).projection(config.rotation);
                println!("{}", PathGenerator::new(projection).path(&graticule.geometry()));
            }
        }
    }

    Ok(())
}
