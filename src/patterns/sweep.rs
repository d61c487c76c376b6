use glam::Vec3;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{
    blend_brightness, common_params, wrap_distance, LayerCore, LayerFrame, Origin, PatternLayer,
    MIN_FALLOFF,
};
use crate::compositor::ColorBuffer;
use crate::fixtures::PointRegistry;
use crate::params::{ParamSchema, ParamTable};

/// Which polar angle the wedge rotates through.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SweepAxis {
    /// Around the vertical axis: azimuth in the ground plane.
    #[default]
    Y,
    /// Around the Z axis: angle in the XY plane.
    Z,
}

/// A rotating wedge of light, like a lighthouse beam.
pub struct SweepLayer {
    pub core: LayerCore,
    pub axis: SweepAxis,
    pub origin: Origin,
    pub position: Vec3,
    /// Revolutions per second.
    pub speed: f32,
    /// Half-width of the wedge as a fraction of a revolution.
    pub width: f32,
    pub angle_offset: f32,
    angle: f32,
}

impl Default for SweepLayer {
    fn default() -> Self {
        Self {
            core: LayerCore::default(),
            axis: SweepAxis::Y,
            origin: Origin::Center,
            position: Vec3::ZERO,
            speed: 0.25,
            width: 0.1,
            angle_offset: 0.0,
            angle: 0.0,
        }
    }
}

impl SweepLayer {
    pub fn angle(&self) -> f32 {
        self.angle
    }
}

/// Wrap into [0, 1). `rem_euclid` alone can round tiny negatives up to exactly 1.0.
fn wrap_turn(turns: f32) -> f32 {
    let t = turns.rem_euclid(1.0);
    if t >= 1.0 {
        0.0
    } else {
        t
    }
}

static SWEEP_PARAMS: Lazy<ParamTable<SweepLayer>> = Lazy::new(|| {
    common_params::<SweepLayer>()
        .choice(
            "axis",
            &["y", "z"],
            true,
            |l| match l.axis {
                SweepAxis::Y => "y",
                SweepAxis::Z => "z",
            },
            |l, v| l.axis = if v == "z" { SweepAxis::Z } else { SweepAxis::Y },
        )
        .choice(
            "origin",
            Origin::NAMES,
            true,
            |l| l.origin.name(),
            |l, v| l.origin = Origin::from_name(v),
        )
        .float("speed", true, |l| l.speed, |l, v| l.speed = v)
        .float("width", true, |l| l.width, |l, v| l.width = v.max(MIN_FALLOFF))
        .float(
            "angle_offset",
            true,
            |l| l.angle_offset,
            |l, v| l.angle_offset = wrap_turn(v),
        )
        .float("position_x", false, |l| l.position.x, |l, v| l.position.x = v)
        .float("position_y", false, |l| l.position.y, |l, v| l.position.y = v)
        .float("position_z", false, |l| l.position.z, |l, v| l.position.z = v)
});

impl ParamSchema for SweepLayer {
    fn param_table() -> &'static ParamTable<Self> {
        &SWEEP_PARAMS
    }
}

impl PatternLayer for SweepLayer {
    fn kind(&self) -> &'static str {
        "sweep"
    }

    fn core(&self) -> &LayerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut LayerCore {
        &mut self.core
    }

    fn run(
        &mut self,
        dt: f32,
        frame: &LayerFrame,
        registry: &PointRegistry,
        colors: &mut ColorBuffer,
    ) {
        self.angle = wrap_turn(self.angle + self.speed * dt);
        let target = wrap_turn(self.angle + self.angle_offset);
        let width = self.width.max(MIN_FALLOFF);
        let (axis, origin, position) = (self.axis, self.origin, self.position);

        blend_brightness(&mut self.core, frame, registry, colors, |p| {
            let p_angle = match (axis, origin) {
                (SweepAxis::Y, Origin::Center) => p.global_azimuth,
                (SweepAxis::Y, Origin::Local) => p.azimuth_relative_to(position),
                (SweepAxis::Z, Origin::Center) => p.global_theta,
                (SweepAxis::Z, Origin::Local) => p.theta_relative_to(position),
            };
            let dist = wrap_distance(p_angle, target, 1.0);
            (1.0 - dist / width).max(0.0)
        });
    }
}
