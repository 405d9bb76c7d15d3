//! Full-scene projection renderer
//!
//! One call to [`ProjectionRenderer::render`] clears the scene and rebuilds
//! it from the dataset and rotation, in drawing order:
//!
//! 1. graticule
//! 2. one path per country
//! 3. sphere outline
//! 4. a circle per marker facing the viewer
//!
//! Every element is generated independently. An element whose path data is
//! empty or carries non-finite numbers is skipped (graticule, sphere, markers)
//! or kept hidden with empty data (countries); the rest of the pass goes on.

use std::f64::consts::FRAC_PI_2;

use tracing::trace;

use crate::animation::PulseBank;
use crate::config::{GlobeConfig, Palette};
use crate::geo::{geo_distance, Graticule, LonLat, MarkerPoint, WorldDataset};
use crate::path::{is_drawable, PathGenerator};
use crate::projection::{Orthographic, Rotation};
use crate::scene::{PathClass, Scene, SceneNode, Style};

/// Builds the globe scene for a given rotation
#[derive(Debug, Clone)]
pub struct ProjectionRenderer {
    scale: f64,
    center: (f64, f64),
    precision: f64,
    palette: Palette,
    graticule: Graticule,
}

impl ProjectionRenderer {
    pub fn new(config: &GlobeConfig) -> Self {
        Self {
            scale: config.scale,
            center: config.center(),
            precision: config.precision,
            palette: config.palette.clone(),
            graticule: Graticule::new(),
        }
    }

    /// Orthographic projection centered on the canvas at `rotation`
    pub fn projection(&self, rotation: Rotation) -> Orthographic {
        Orthographic::new()
            .with_scale(self.scale)
            .with_translate(self.center.0, self.center.1)
            .with_rotation(rotation)
            .with_precision(self.precision)
    }

    /// Redraw the whole scene
    ///
    /// `pulses` gains a pulse for each marker that entered the scene and loses
    /// those of markers that left it; drawn circles take the current pulse
    /// opacity.
    pub fn render(
        &self,
        scene: &mut Scene,
        dataset: &WorldDataset,
        rotation: Rotation,
        markers: &[MarkerPoint],
        pulses: &mut PulseBank,
    ) {
        scene.clear();

        let projection = self.projection(rotation);
        let path = PathGenerator::new(projection.clone());

        self.render_graticule(scene, &path);
        self.render_countries(scene, dataset, &path);
        self.render_sphere(scene, &path);
        self.render_markers(scene, &projection, markers, pulses);
    }

    fn render_graticule(&self, scene: &mut Scene, path: &PathGenerator) {
        let d = path.path(&self.graticule.geometry());
        if !is_drawable(&d) {
            trace!("Skipping graticule: no drawable path");
            return;
        }
        scene.push(SceneNode::Path {
            class: PathClass::Graticule,
            d,
            style: stroke_only(&self.palette.graticule.to_style()),
            visible: true,
        });
    }

    fn render_countries(&self, scene: &mut Scene, dataset: &WorldDataset, path: &PathGenerator) {
        let style = self.palette.country.to_style();
        for (index, feature) in dataset.iter().enumerate() {
            let d = feature
                .geometry
                .as_ref()
                .map(|g| path.path(g))
                .unwrap_or_default();
            let visible = is_drawable(&d);
            if !visible {
                trace!(index, "Hiding feature with no drawable path");
            }
            scene.push(SceneNode::Path {
                class: PathClass::Country,
                d: if visible { d } else { String::new() },
                style: style.clone(),
                visible,
            });
        }
    }

    fn render_sphere(&self, scene: &mut Scene, path: &PathGenerator) {
        let d = path.path(&crate::geo::Geometry::Sphere);
        if !is_drawable(&d) {
            trace!("Skipping sphere outline: degenerate path");
            return;
        }
        scene.push(SceneNode::Path {
            class: PathClass::Sphere,
            d,
            style: stroke_only(&self.palette.sphere.to_style()),
            visible: true,
        });
    }

    fn render_markers(
        &self,
        scene: &mut Scene,
        projection: &Orthographic,
        markers: &[MarkerPoint],
        pulses: &mut PulseBank,
    ) {
        let facing = projection.facing().unwrap_or(LonLat::new(0.0, 0.0));
        let mut drawn: Vec<&str> = Vec::new();

        for marker in markers {
            let (cx, cy) = projection.project(marker.position);
            if !(cx.is_finite() && cy.is_finite()) {
                trace!(marker = marker.name.as_str(), "Skipping marker: non-finite position");
                continue;
            }
            if !(geo_distance(marker.position, facing) < FRAC_PI_2) {
                continue;
            }

            let mut style = self.palette.marker.to_style();
            style.opacity = pulses.ensure(&marker.name).opacity();
            scene.push(SceneNode::Circle {
                marker: marker.name.clone(),
                cx,
                cy,
                r: self.palette.marker_radius,
                style,
            });
            drawn.push(&marker.name);
        }

        pulses.retain_visible(&drawn);
    }
}

fn stroke_only(style: &Style) -> Style {
    Style::stroke(style.stroke.clone(), style.stroke_width, style.opacity)
}
