//! Scene writers
//!
//! A writer serializes a rendered [`Scene`] into an output format:
//!
//! - [`SvgWriter`]: a standalone SVG document
//! - [`JsonWriter`]: the scene graph as JSON, for hosts that draw it themselves
//!
//! # Example
//!
//! ```rust,ignore
//! use globeview::writer::{SvgWriter, Writer};
//!
//! let svg = SvgWriter::new().write(globe.scene())?;
//! std::fs::write("globe.svg", svg)?;
//! ```

mod json;
mod svg;

pub use json::JsonWriter;
pub use svg::SvgWriter;

use crate::scene::Scene;
use crate::Result;

/// Serializes a scene
pub trait Writer {
    type Output;

    fn write(&self, scene: &Scene) -> Result<Self::Output>;

    /// File extension of the output, without the dot
    fn extension(&self) -> &'static str;
}

/// Shortest decimal form of `value` with at most three fractional digits
pub(crate) fn format_number(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}
