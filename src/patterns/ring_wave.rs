use glam::Vec3;
use once_cell::sync::Lazy;

use super::{common_params, Curve, LayerCore, LayerFrame, Origin, PatternLayer, MIN_FALLOFF};
use crate::compositor::ColorBuffer;
use crate::fixtures::PointRegistry;
use crate::models::color::clamp01;
use crate::params::{ParamSchema, ParamTable};

/// An expanding ring. `normalized_t` is driven externally (usually by a remote fader)
/// and mapped through `ring_movement` to a radius; brightness falls off with distance
/// from that radius through `falloff`.
pub struct RingWaveLayer {
    pub core: LayerCore,
    pub origin: Origin,
    pub position: Vec3,
    pub falloff_range: f32,
    /// Normalized time to ring radius.
    pub ring_movement: Curve,
    /// Normalized distance from the ring to brightness.
    pub falloff: Curve,
    pub pattern_alpha: f32,
    pub normalized_t: f32,
    pub falloff_mod: f32,
}

impl Default for RingWaveLayer {
    fn default() -> Self {
        Self {
            core: LayerCore::default(),
            origin: Origin::Center,
            position: Vec3::ZERO,
            falloff_range: 10.0,
            ring_movement: Curve::linear(0.0, 0.0, 1.0, 300.0),
            falloff: Curve::linear(0.0, 1.0, 1.0, 0.0),
            pattern_alpha: 0.0,
            normalized_t: 0.0,
            falloff_mod: 0.0,
        }
    }
}

static RING_WAVE_PARAMS: Lazy<ParamTable<RingWaveLayer>> = Lazy::new(|| {
    common_params::<RingWaveLayer>()
        .choice(
            "origin",
            Origin::NAMES,
            true,
            |l| l.origin.name(),
            |l, v| l.origin = Origin::from_name(v),
        )
        .float(
            "falloff_range",
            true,
            |l| l.falloff_range,
            |l, v| l.falloff_range = v.max(0.0),
        )
        .float(
            "pattern_alpha",
            false,
            |l| l.pattern_alpha,
            |l, v| l.pattern_alpha = clamp01(v),
        )
        .float(
            "normalized_t",
            false,
            |l| l.normalized_t,
            |l, v| l.normalized_t = clamp01(v),
        )
        .float(
            "falloff_mod",
            false,
            |l| l.falloff_mod,
            |l, v| l.falloff_mod = v.max(0.0),
        )
        .float("position_x", false, |l| l.position.x, |l, v| l.position.x = v)
        .float("position_z", false, |l| l.position.z, |l, v| l.position.z = v)
});

impl ParamSchema for RingWaveLayer {
    fn param_table() -> &'static ParamTable<Self> {
        &RING_WAVE_PARAMS
    }
}

impl RingWaveLayer {
    pub fn ring_radius(&self) -> f32 {
        self.ring_movement.evaluate(self.normalized_t)
    }
}

impl PatternLayer for RingWaveLayer {
    fn kind(&self) -> &'static str {
        "ring_wave"
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
        if self.pattern_alpha <= 0.0 {
            return;
        }

        let radius = self.ring_radius();
        let range = (self.falloff_range + self.falloff_mod).max(MIN_FALLOFF);
        let alpha = self.core.effective_alpha(frame);
        let colorizer = self.core.colorizer;
        let mode = self.core.blend.blend_mode;
        let local = (self.origin == Origin::Local).then_some(self.position);

        let Some(slots) = self.core.allowed_slots(registry) else {
            return;
        };
        let points = registry.points();
        for slot in slots {
            let Some(p) = points.get(slot) else {
                continue;
            };
            let dist = match local {
                None => p.global_dist,
                Some(origin) => p.ground_dist_to(origin),
            };
            let b = self.falloff.evaluate(clamp01((dist - radius).abs() / range));
            if b <= 0.0 {
                continue;
            }
            let mut color = colorizer.resolve(b, frame.palette, alpha);
            color.a *= self.pattern_alpha;
            colors.blend_at(slot, mode, color);
        }
    }

    /// 0: pattern alpha, 1: normalized time, 2: falloff modifier.
    fn set_indexed_float(&mut self, index: usize, value: f32) -> bool {
        match index {
            0 => self.pattern_alpha = clamp01(value),
            1 => self.normalized_t = clamp01(value),
            2 => self.falloff_mod = value.max(0.0),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fixture, Rgba};
    use crate::palette::{Colorizer, Palette};

    fn points_along_x(xs: &[f32]) -> PointRegistry {
        let fixtures: Vec<Fixture> = xs
            .iter()
            .enumerate()
            .map(|(i, x)| Fixture {
                id: i as u32,
                position: Vec3::new(*x, 0.0, 0.0),
                universe: 0,
                channel: i as u32 * 3,
                point_range_min: i as u32,
                point_range_max: i as u32,
                point_offsets: vec![Vec3::ZERO],
                tags: Vec::new(),
                from_import: false,
            })
            .collect();
        PointRegistry::build(&fixtures, Vec3::ZERO, 3, 1)
    }

    fn ring() -> RingWaveLayer {
        let mut layer = RingWaveLayer::default();
        layer.core.colorizer = Colorizer::fixed(Rgba::WHITE);
        layer.ring_movement = Curve::linear(0.0, 0.0, 1.0, 100.0);
        layer
    }

    #[test]
    fn test_zero_alpha_leaves_every_point_untouched() {
        let registry = points_along_x(&[0.0, 25.0, 50.0]);
        let palette = Palette::default();
        let frame = LayerFrame {
            palette: &palette,
            group_alpha: 1.0,
        };
        let mut colors = ColorBuffer::new(registry.len());
        colors.fill(Rgba::rgb(0.2, 0.4, 0.6));
        let before = colors.clone();

        let mut layer = ring();
        layer.normalized_t = 0.5;
        layer.core.blend.blend_mode = crate::blend::BlendMode::Add;
        layer.run(0.016, &frame, &registry, &mut colors);

        assert_eq!(colors, before);
    }

    #[test]
    fn test_ring_brightness_peaks_at_radius() {
        let registry = points_along_x(&[0.0, 45.0, 50.0, 70.0]);
        let palette = Palette::default();
        let frame = LayerFrame {
            palette: &palette,
            group_alpha: 1.0,
        };
        let mut colors = ColorBuffer::new(registry.len());

        let mut layer = ring();
        assert!(layer.set_indexed_float(0, 3.0));
        assert!(layer.set_indexed_float(1, 0.5));
        assert!(!layer.set_indexed_float(7, 1.0));
        assert_eq!(layer.pattern_alpha, 1.0);
        assert_eq!(layer.ring_radius(), 50.0);

        layer.run(0.016, &frame, &registry, &mut colors);
        let r: Vec<f32> = colors.as_slice().iter().map(|c| c.r).collect();
        assert_eq!(r[0], 0.0);
        assert!((r[1] - 0.5).abs() < 1e-5);
        assert_eq!(r[2], 1.0);
        assert_eq!(r[3], 0.0);
    }

    #[test]
    fn test_falloff_mod_widens_the_band() {
        let registry = points_along_x(&[65.0]);
        let palette = Palette::default();
        let frame = LayerFrame {
            palette: &palette,
            group_alpha: 1.0,
        };
        let mut layer = ring();
        layer.set_indexed_float(0, 1.0);
        layer.set_indexed_float(1, 0.5);

        let mut colors = ColorBuffer::new(1);
        layer.run(0.0, &frame, &registry, &mut colors);
        assert_eq!(colors.get(0).map(|c| c.r), Some(0.0));

        layer.set_indexed_float(2, 20.0);
        layer.run(0.0, &frame, &registry, &mut colors);
        assert!((colors.get(0).map(|c| c.r).unwrap_or(0.0) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_local_origin_centers_the_ring_on_position() {
        let registry = points_along_x(&[0.0, 45.0, 50.0, 70.0]);
        let palette = Palette::default();
        let frame = LayerFrame {
            palette: &palette,
            group_alpha: 1.0,
        };
        let mut layer = ring();
        layer.set_indexed_float(0, 1.0);
        layer.set_indexed_float(1, 0.5);
        layer.origin = Origin::Local;
        layer.position = Vec3::new(20.0, 0.0, 0.0);

        let mut colors = ColorBuffer::new(registry.len());
        layer.run(0.0, &frame, &registry, &mut colors);
        let r: Vec<f32> = colors.as_slice().iter().map(|c| c.r).collect();
        assert_eq!(r, vec![0.0, 0.0, 0.0, 1.0]);

        let mut colors = ColorBuffer::new(registry.len());
        layer.origin = Origin::Center;
        layer.run(0.0, &frame, &registry, &mut colors);
        assert_eq!(colors.get(2).map(|c| c.r), Some(1.0));
        assert_eq!(colors.get(3).map(|c| c.r), Some(0.0));
    }
}
