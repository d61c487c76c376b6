use glam::Vec3;
use serde::{Deserialize, Serialize};

pub type FixtureId = u32;

/// A placed fixture and the address block its points occupy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub id: FixtureId,
    pub position: Vec3,
    pub universe: u32,
    /// Base channel of the fixture block; point `i` starts at `channel + i * channels_per_point`.
    pub channel: u32,
    /// Inclusive global-index span of this fixture's points.
    pub point_range_min: u32,
    pub point_range_max: u32,
    /// Local offsets of each point from `position`. Length is the point count.
    pub point_offsets: Vec<Vec3>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub from_import: bool,
}

impl Fixture {
    pub fn point_count(&self) -> u32 {
        self.point_offsets.len() as u32
    }

    pub fn contains_point(&self, global_index: u32) -> bool {
        global_index >= self.point_range_min && global_index <= self.point_range_max
    }
}

/// What the placement collaborator hands over when it creates a fixture.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FixturePlacement {
    pub position: Vec3,
    /// `None` lays points out with the default offsets from the configured spacing.
    pub point_offsets: Option<Vec<Vec3>>,
    pub tags: Vec<String>,
}

impl FixturePlacement {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Explicit (universe, channel) base address of a fixture block.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockAddress {
    pub universe: u32,
    pub channel: u32,
}

/// One fixture entry of the persisted layout format.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FixtureRecord {
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    pub z: f32,
    /// Imported addresses are authoritative. Records without one are allocated on import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<BlockAddress>,
    pub point_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_offsets: Option<Vec<[f32; 3]>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl FixtureRecord {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

pub const LAYOUT_FILE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutFile {
    pub version: u32,
    #[serde(default)]
    pub label: String,
    pub fixtures: Vec<FixtureRecord>,
}

impl LayoutFile {
    pub fn new(label: impl Into<String>, fixtures: Vec<FixtureRecord>) -> Self {
        Self {
            version: LAYOUT_FILE_VERSION,
            label: label.into(),
            fixtures,
        }
    }
}
