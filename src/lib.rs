/*!
# globeview - rotating globe renderer

globeview draws a slowly rotating orthographic globe: country boundaries from a
world-atlas dataset, a latitude/longitude graticule, the sphere outline and a
handful of pulsing city markers. Every animation frame rebuilds the whole
vector scene from the current rotation and hands it to a [`writer::Writer`].

## Example

```rust,ignore
use globeview::clock::ManualScheduler;
use globeview::globe::GlobeRenderer;
use globeview::loader::StaticSource;
use globeview::writer::{SvgWriter, Writer};
use globeview::GlobeConfig;

let mut scheduler = ManualScheduler::new();
let mut globe = GlobeRenderer::new(GlobeConfig::default());
globe.mount(StaticSource::new(topology_json), &mut scheduler);

while let Some(frame) = scheduler.next_frame() {
    globe.on_frame(frame, 16.0, &mut scheduler);
    let svg = SvgWriter::new().write(globe.scene())?;
}
```

## Core Components

- [`loader`] - one-shot dataset fetch with fallback
- [`clock`] - frame scheduling and the rotation clock
- [`renderer`] - full-scene projection renderer
- [`globe`] - the component tying loader, clock and renderer together
- [`outline`] - SVG recolor-and-fit loader for static outline artwork
*/

pub mod animation;
pub mod clock;
pub mod config;
pub mod geo;
pub mod globe;
pub mod loader;
pub mod outline;
pub mod path;
pub mod projection;
pub mod renderer;
pub mod scene;
pub mod writer;

pub use config::GlobeConfig;
pub use geo::{GeoFeature, Geometry, LonLat, MarkerPoint, WorldDataset};
pub use projection::{Orthographic, Rotation};
pub use scene::Scene;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum GlobeError {
    #[error("Fetch error: {0}")]
    FetchError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Projection error: {0}")]
    ProjectionError(String),

    #[error("Asset error: {0}")]
    AssetError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Output generation error: {0}")]
    WriterError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GlobeError>;
