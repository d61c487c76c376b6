pub mod color;
pub mod fixtures;
pub mod point;
pub mod universe;

pub use color::Rgba;
pub use fixtures::{
    BlockAddress, Fixture, FixtureId, FixturePlacement, FixtureRecord, LayoutFile,
    LAYOUT_FILE_VERSION,
};
pub use point::SpatialPoint;
pub use universe::{DmxFrame, PointOutput, CHANNELS_PER_UNIVERSE};
