//! Output stage: turns the composited color buffer into addressed channel data for the
//! transport collaborator.

use std::collections::BTreeMap;

use crate::compositor::ColorBuffer;
use crate::fixtures::PointRegistry;
use crate::models::{DmxFrame, PointOutput, CHANNELS_PER_UNIVERSE};

fn dimmer_scale(max_dimmer: u8) -> f32 {
    f32::from(max_dimmer.min(100)) / 100.0
}

/// One `(universe, channel, rgb)` triple per point, in global index order.
pub fn output_triples(
    registry: &PointRegistry,
    colors: &ColorBuffer,
    max_dimmer: u8,
) -> Vec<PointOutput> {
    let scale = dimmer_scale(max_dimmer);
    registry
        .points()
        .iter()
        .zip(colors.as_slice())
        .map(|(point, color)| PointOutput {
            universe: point.universe,
            channel: point.channel,
            rgb: color.to_rgb8(scale),
        })
        .collect()
}

/// Full channel frames keyed by universe. Channels no point maps to stay at zero, and a
/// point whose RGB would run past the end of its universe is dropped.
pub fn generate_dmx(
    registry: &PointRegistry,
    colors: &ColorBuffer,
    max_dimmer: u8,
) -> BTreeMap<u32, DmxFrame> {
    let mut buffers: BTreeMap<u32, DmxFrame> = BTreeMap::new();

    for out in output_triples(registry, colors, max_dimmer) {
        let base = out.channel as usize;
        if base + 3 > CHANNELS_PER_UNIVERSE {
            continue;
        }
        let buffer = buffers
            .entry(out.universe)
            .or_insert([0; CHANNELS_PER_UNIVERSE]);
        buffer[base..base + 3].copy_from_slice(&out.rgb);
    }

    buffers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fixture, Rgba};
    use glam::Vec3;

    fn registry_with(universe: u32, channel: u32, points: u32) -> PointRegistry {
        let fixture = Fixture {
            id: 0,
            position: Vec3::ZERO,
            universe,
            channel,
            point_range_min: 0,
            point_range_max: points - 1,
            point_offsets: vec![Vec3::ZERO; points as usize],
            tags: Vec::new(),
            from_import: false,
        };
        PointRegistry::build(&[fixture], Vec3::ZERO, 3, 1)
    }

    #[test]
    fn test_dimmer_scales_bytes() {
        let registry = registry_with(0, 0, 2);
        let mut colors = ColorBuffer::new(2);
        colors.fill(Rgba::rgb(1.0, 0.5, 0.0));

        let full = output_triples(&registry, &colors, 100);
        assert_eq!(full[0].rgb, [255, 128, 0]);

        let half = output_triples(&registry, &colors, 50);
        assert_eq!(half[1].rgb, [128, 64, 0]);
        assert_eq!(half[1].channel, 3);
    }

    #[test]
    fn test_dmx_frames_place_rgb_at_point_channel() {
        let registry = registry_with(2, 30, 7);
        let mut colors = ColorBuffer::new(7);
        colors.fill(Rgba::rgb(0.0, 0.0, 1.0));

        let frames = generate_dmx(&registry, &colors, 100);
        let frame = frames.get(&2).unwrap();
        assert_eq!(&frame[30..33], &[0, 0, 255]);
        assert_eq!(&frame[48..51], &[0, 0, 255]);
        assert_eq!(frame[51], 0);
        assert!(!frames.contains_key(&0));
    }
}
