use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Show-wide configuration, passed into the `Show` at construction.
///
/// Persistence is owned by an external key-value store; `from_map`/`to_map` translate
/// to and from its string entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowSettings {
    pub universe_start: u32,
    pub points_per_fixture: u32,
    pub channels_per_point: u32,
    pub channels_per_universe: u32,
    /// Distance between neighbouring points when a fixture gets default point offsets.
    pub point_spacing: f32,
    /// Runtime-created fixtures closer than this to an existing fixture are rejected.
    pub min_fixture_spacing: f32,
    pub origin: Vec3,
    /// Output ceiling in percent (0-100).
    pub max_dimmer: u8,
    /// Reset every point to black before the groups run each frame.
    pub clear_each_frame: bool,
}

impl Default for ShowSettings {
    fn default() -> Self {
        Self {
            universe_start: 0,
            points_per_fixture: 7,
            channels_per_point: 3,
            channels_per_universe: 512,
            point_spacing: 0.3,
            min_fixture_spacing: 1.5,
            origin: Vec3::ZERO,
            max_dimmer: 100,
            clear_each_frame: true,
        }
    }
}

impl ShowSettings {
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let d = Self::default();
        let parsed = |key: &str| map.get(key).and_then(|v| v.trim().parse::<f32>().ok());

        Self {
            universe_start: map
                .get("universe_start")
                .and_then(|v| v.parse().ok())
                .unwrap_or(d.universe_start),
            points_per_fixture: map
                .get("points_per_fixture")
                .and_then(|v| v.parse().ok())
                .filter(|&v: &u32| v > 0)
                .unwrap_or(d.points_per_fixture),
            channels_per_point: map
                .get("channels_per_point")
                .and_then(|v| v.parse().ok())
                .filter(|&v: &u32| v > 0)
                .unwrap_or(d.channels_per_point),
            channels_per_universe: map
                .get("channels_per_universe")
                .and_then(|v| v.parse().ok())
                .filter(|&v: &u32| v > 0)
                .unwrap_or(d.channels_per_universe),
            point_spacing: parsed("point_spacing").unwrap_or(d.point_spacing),
            min_fixture_spacing: parsed("min_fixture_spacing")
                .map(|v| v.max(0.0))
                .unwrap_or(d.min_fixture_spacing),
            origin: Vec3::new(
                parsed("origin_x").unwrap_or(d.origin.x),
                parsed("origin_y").unwrap_or(d.origin.y),
                parsed("origin_z").unwrap_or(d.origin.z),
            ),
            max_dimmer: map
                .get("max_dimmer")
                .and_then(|v| v.parse::<u8>().ok())
                .map(|v| v.min(100))
                .unwrap_or(d.max_dimmer),
            clear_each_frame: map
                .get("clear_each_frame")
                .map(|v| v == "true")
                .unwrap_or(d.clear_each_frame),
        }
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("universe_start".into(), self.universe_start.to_string());
        map.insert("points_per_fixture".into(), self.points_per_fixture.to_string());
        map.insert("channels_per_point".into(), self.channels_per_point.to_string());
        map.insert(
            "channels_per_universe".into(),
            self.channels_per_universe.to_string(),
        );
        map.insert("point_spacing".into(), self.point_spacing.to_string());
        map.insert(
            "min_fixture_spacing".into(),
            self.min_fixture_spacing.to_string(),
        );
        map.insert("origin_x".into(), self.origin.x.to_string());
        map.insert("origin_y".into(), self.origin.y.to_string());
        map.insert("origin_z".into(), self.origin.z.to_string());
        map.insert("max_dimmer".into(), self.max_dimmer.to_string());
        map.insert("clear_each_frame".into(), self.clear_each_frame.to_string());
        map
    }

    pub fn channels_per_fixture(&self) -> u32 {
        self.points_per_fixture * self.channels_per_point
    }
}
