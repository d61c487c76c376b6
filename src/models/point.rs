use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// One addressable light point.
///
/// Address and geometry are fixed once the registry that owns the point is built. The
/// point's current color lives in the compositor's `ColorBuffer`, at the same slot the
/// point occupies in the registry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpatialPoint {
    pub global_index: u32,
    pub universe: u32,
    /// First of the three consecutive R,G,B channels, 0-based within `universe`.
    pub channel: u32,
    pub fixture_id: u32,
    pub local_index: u32,
    pub position: Vec3,
    /// Angle around the Y axis (XZ plane) from the layout origin, normalized to [0, 1).
    pub global_azimuth: f32,
    /// Angle around the Z axis (XY plane) from the layout origin, normalized to [0, 1).
    pub global_theta: f32,
    /// Ground-plane (XZ) distance from the layout origin.
    pub global_dist: f32,
}

impl SpatialPoint {
    pub fn new(
        global_index: u32,
        (universe, channel): (u32, u32),
        fixture_id: u32,
        local_index: u32,
        position: Vec3,
        origin: Vec3,
    ) -> Self {
        let mut point = Self {
            global_index,
            universe,
            channel,
            fixture_id,
            local_index,
            position,
            global_azimuth: 0.0,
            global_theta: 0.0,
            global_dist: 0.0,
        };
        point.recompute_derived(origin);
        point
    }

    pub fn recompute_derived(&mut self, origin: Vec3) {
        self.global_azimuth = self.azimuth_relative_to(origin);
        self.global_theta = self.theta_relative_to(origin);
        self.global_dist = self.ground_dist_to(origin);
    }

    pub fn xz(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }

    pub fn azimuth_relative_to(&self, origin: Vec3) -> f32 {
        let d = self.position - origin;
        normalize_angle(d.z.atan2(d.x))
    }

    pub fn theta_relative_to(&self, origin: Vec3) -> f32 {
        let d = self.position - origin;
        normalize_angle(d.y.atan2(d.x))
    }

    pub fn ground_dist_to(&self, origin: Vec3) -> f32 {
        self.xz().distance(Vec2::new(origin.x, origin.z))
    }
}

/// Radians to [0, 1).
fn normalize_angle(radians: f32) -> f32 {
    let n = (radians / TAU).rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if n >= 1.0 {
        0.0
    } else {
        n
    }
}
