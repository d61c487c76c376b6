use serde::{Deserialize, Serialize};

pub const CHANNELS_PER_UNIVERSE: usize = 512;

/// Channel values for one universe, channel 0 first.
pub type DmxFrame = [u8; CHANNELS_PER_UNIVERSE];

/// Final color of one point, addressed for the output transport.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PointOutput {
    pub universe: u32,
    pub channel: u32,
    pub rgb: [u8; 3],
}
