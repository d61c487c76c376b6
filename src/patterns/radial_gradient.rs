use glam::Vec3;
use log::debug;
use once_cell::sync::Lazy;

use super::{blend_brightness, common_params, LayerCore, LayerFrame, Origin, PatternLayer};
use crate::compositor::ColorBuffer;
use crate::fixtures::PointRegistry;
use crate::models::color::clamp01;
use crate::models::SpatialPoint;
use crate::params::{ParamSchema, ParamTable};

/// Brightness ramps from `min_brightness` at the origin to `max_brightness` at the
/// farthest point of the layout.
pub struct RadialGradientLayer {
    pub core: LayerCore,
    pub origin: Origin,
    pub position: Vec3,
    pub min_brightness: f32,
    pub max_brightness: f32,
    /// Force the farthest-point distance to be measured again on the next frame.
    pub recompute_bounds: bool,
    /// Cleared by layout changes. Kept apart from `recompute_bounds` so restoring a
    /// snapshot can never cancel a pending layout invalidation.
    have_bounds: bool,
    bounds_registry: u64,
    max_dist: f32,
    bounds_recomputes: u64,
}

impl Default for RadialGradientLayer {
    fn default() -> Self {
        Self {
            core: LayerCore::default(),
            origin: Origin::Center,
            position: Vec3::ZERO,
            min_brightness: 0.0,
            max_brightness: 1.0,
            recompute_bounds: false,
            have_bounds: false,
            bounds_registry: 0,
            max_dist: 100.0,
            bounds_recomputes: 0,
        }
    }
}

impl RadialGradientLayer {
    pub fn max_dist(&self) -> f32 {
        self.max_dist
    }

    /// How many times the bounds have been measured.
    pub fn bounds_recomputes(&self) -> u64 {
        self.bounds_recomputes
    }

    fn dist(&self, p: &SpatialPoint) -> f32 {
        match self.origin {
            Origin::Center => p.global_dist,
            Origin::Local => p.ground_dist_to(self.position),
        }
    }

    /// Bounds cover every point in the layout, not just the filtered ones.
    fn update_bounds(&mut self, registry: &PointRegistry) {
        if self.have_bounds && !self.recompute_bounds && self.bounds_registry == registry.id() {
            return;
        }
        self.max_dist = registry
            .points()
            .iter()
            .map(|p| self.dist(p))
            .fold(0.0, f32::max);
        self.have_bounds = true;
        self.bounds_registry = registry.id();
        self.recompute_bounds = false;
        self.bounds_recomputes += 1;
        debug!("[pattern] radial gradient bounds now {:.2}", self.max_dist);
    }
}

static RADIAL_GRADIENT_PARAMS: Lazy<ParamTable<RadialGradientLayer>> = Lazy::new(|| {
    common_params::<RadialGradientLayer>()
        .choice(
            "origin",
            Origin::NAMES,
            true,
            |l| l.origin.name(),
            |l, v| {
                let origin = Origin::from_name(v);
                if origin != l.origin {
                    l.origin = origin;
                    l.recompute_bounds = true;
                }
            },
        )
        .float(
            "min_brightness",
            true,
            |l| l.min_brightness,
            |l, v| l.min_brightness = clamp01(v),
        )
        .float(
            "max_brightness",
            true,
            |l| l.max_brightness,
            |l, v| l.max_brightness = clamp01(v),
        )
        .boolean(
            "recompute_bounds",
            true,
            |l| l.recompute_bounds,
            |l, v| l.recompute_bounds = v,
        )
        .float("position_x", true, |l| l.position.x, |l, v| l.position.x = v)
        .float("position_z", true, |l| l.position.z, |l, v| l.position.z = v)
});

impl ParamSchema for RadialGradientLayer {
    fn param_table() -> &'static ParamTable<Self> {
        &RADIAL_GRADIENT_PARAMS
    }
}

impl PatternLayer for RadialGradientLayer {
    fn kind(&self) -> &'static str {
        "radial_gradient"
    }

    fn core(&self) -> &LayerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut LayerCore {
        &mut self.core
    }

    fn run(
        &mut self,
        _dt: f32,
        frame: &LayerFrame,
        registry: &PointRegistry,
        colors: &mut ColorBuffer,
    ) {
        self.update_bounds(registry);

        let (min, max) = (self.min_brightness, self.max_brightness);
        let max_dist = self.max_dist;
        let (origin, position) = (self.origin, self.position);

        blend_brightness(&mut self.core, frame, registry, colors, |p| {
            let d = match origin {
                Origin::Center => p.global_dist,
                Origin::Local => p.ground_dist_to(position),
            };
            let t = if max_dist <= f32::EPSILON {
                0.0
            } else {
                clamp01(d / max_dist)
            };
            min + (max - min) * t
        });
    }

    fn notify_layout_changed(&mut self) {
        self.core.invalidate_filter();
        self.have_bounds = false;
    }
}
