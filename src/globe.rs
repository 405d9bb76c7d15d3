//! The rotating globe component
//!
//! [`GlobeRenderer`] ties the pieces together over one mount lifetime:
//!
//! - `mount` starts the dataset fetch and the rotation clock
//! - every fired frame advances the clock, picks up a finished fetch, steps
//!   the marker pulses and redraws the scene when the dataset or the rotation
//!   changed
//! - `unmount` cancels the pending frame, stops every pulse and abandons a
//!   fetch still in flight
//!
//! Until the dataset arrives nothing is drawn.

use tracing::debug;

use crate::animation::PulseBank;
use crate::clock::{FrameHandle, FrameScheduler, RotationClock};
use crate::config::GlobeConfig;
use crate::geo::WorldDataset;
use crate::loader::{DataLoader, DatasetSource};
use crate::projection::Rotation;
use crate::renderer::ProjectionRenderer;
use crate::scene::Scene;

pub struct GlobeRenderer {
    config: GlobeConfig,
    renderer: ProjectionRenderer,
    clock: RotationClock,
    loader: DataLoader,
    dataset: Option<WorldDataset>,
    pulses: PulseBank,
    scene: Scene,
    mounted: bool,
    /// Set when dataset or rotation changed since the last redraw
    dirty: bool,
}

impl GlobeRenderer {
    pub fn new(config: GlobeConfig) -> Self {
        Self {
            renderer: ProjectionRenderer::new(&config),
            clock: RotationClock::new(config.rotation, config.step),
            loader: DataLoader::new(config.dataset.object.clone()),
            dataset: None,
            pulses: PulseBank::new().with_leg_duration(config.pulse_ms),
            scene: Scene::new(config.width, config.height),
            mounted: false,
            dirty: false,
            config,
        }
    }

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn rotation(&self) -> Rotation {
        self.clock.rotation()
    }

    /// `None` until the fetch has settled
    pub fn dataset(&self) -> Option<&WorldDataset> {
        self.dataset.as_ref()
    }

    pub fn pulses(&self) -> &PulseBank {
        &self.pulses
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Start loading the dataset and request the first frame
    pub fn mount<S: DatasetSource>(&mut self, source: S, scheduler: &mut dyn FrameScheduler) {
        if self.mounted {
            return;
        }
        debug!(rotation = ?self.clock.rotation(), "Mounting globe");
        self.mounted = true;
        self.loader = DataLoader::new(self.config.dataset.object.clone());
        self.loader.start(source);
        self.clock.start(scheduler);
    }

    /// Mount with a dataset that is already available
    pub fn mount_with(&mut self, dataset: WorldDataset, scheduler: &mut dyn FrameScheduler) {
        if self.mounted {
            return;
        }
        debug!(features = dataset.len(), "Mounting globe with preloaded dataset");
        self.mounted = true;
        self.set_dataset(dataset);
        self.clock.start(scheduler);
        self.redraw();
    }

    /// Handle a fired frame callback
    ///
    /// `dt` is the time since the previous frame in milliseconds. Returns
    /// true when the scene was redrawn. Frames that do not belong to this
    /// globe's clock are ignored.
    pub fn on_frame(
        &mut self,
        handle: FrameHandle,
        dt: f64,
        scheduler: &mut dyn FrameScheduler,
    ) -> bool {
        if !self.mounted || self.clock.on_frame(handle, scheduler).is_none() {
            return false;
        }
        self.dirty = true;

        if let Some(dataset) = self.loader.poll() {
            self.set_dataset(dataset);
        }

        for (name, opacity) in self.pulses.advance(dt) {
            self.scene.set_marker_opacity(&name, opacity);
        }

        self.redraw()
    }

    /// Tear down: no further ticks, pulse transitions or dataset delivery
    pub fn unmount(&mut self, scheduler: &mut dyn FrameScheduler) {
        if !self.mounted {
            return;
        }
        debug!(rotation = ?self.clock.rotation(), "Unmounting globe");
        self.clock.cancel(scheduler);
        self.pulses.cancel_all();
        self.loader.cancel();
        self.mounted = false;
    }

    fn set_dataset(&mut self, dataset: WorldDataset) {
        self.dataset = Some(dataset);
        self.dirty = true;
    }

    fn redraw(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        let Some(dataset) = &self.dataset else {
            return false;
        };
        self.renderer.render(
            &mut self.scene,
            dataset,
            self.clock.rotation(),
            &self.config.markers,
            &mut self.pulses,
        );
        self.dirty = false;
        true
    }
}
