use once_cell::sync::Lazy;

use super::{common_params, LayerCore, LayerFrame, PatternLayer};
use crate::compositor::ColorBuffer;
use crate::fixtures::PointRegistry;
use crate::models::color::clamp01;
use crate::models::Rgba;
use crate::params::{ParamSchema, ParamTable};

/// Hue step between neighbouring points of one fixture.
const LOCAL_HUE_STEP: f32 = 0.02;

/// Diagnostic rainbow that swirls through every fixture. Hue is offset by each point's X
/// position so neighbouring fixtures are easy to tell apart while checking addressing.
pub struct RainbowLayer {
    pub core: LayerCore,
    /// Seconds per full trip around the hue circle.
    pub cycle_time: f32,
    pub brightness: f32,
    swirl: f32,
}

impl Default for RainbowLayer {
    fn default() -> Self {
        Self {
            core: LayerCore::default(),
            cycle_time: 10.0,
            brightness: 1.0,
            swirl: 0.0,
        }
    }
}

static RAINBOW_PARAMS: Lazy<ParamTable<RainbowLayer>> = Lazy::new(|| {
    common_params::<RainbowLayer>()
        .float(
            "cycle_time",
            true,
            |l| l.cycle_time,
            |l, v| l.cycle_time = v.max(0.01),
        )
        .float(
            "brightness",
            true,
            |l| l.brightness,
            |l, v| l.brightness = clamp01(v),
        )
});

impl ParamSchema for RainbowLayer {
    fn param_table() -> &'static ParamTable<Self> {
        &RAINBOW_PARAMS
    }
}

impl PatternLayer for RainbowLayer {
    fn kind(&self) -> &'static str {
        "rainbow"
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
        self.swirl = (self.swirl + dt / self.cycle_time.max(0.01)).rem_euclid(1.0);

        let alpha = self.core.effective_alpha(frame);
        let mode = self.core.blend.blend_mode;
        let (swirl, brightness) = (self.swirl, self.brightness);
        let Some(slots) = self.core.allowed_slots(registry) else {
            return;
        };

        let points = registry.points();
        for slot in slots {
            let Some(p) = points.get(slot) else {
                continue;
            };
            let hue = p.local_index as f32 * LOCAL_HUE_STEP + p.position.x + swirl;
            let color = Rgba::from_hsv(hue, 1.0, brightness).with_alpha(alpha);
            colors.blend_at(slot, mode, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Fixture;
    use crate::palette::Palette;
    use glam::Vec3;

    #[test]
    fn test_swirl_advances_hue() {
        let fixture = Fixture {
            id: 0,
            position: Vec3::ZERO,
            universe: 0,
            channel: 0,
            point_range_min: 0,
            point_range_max: 0,
            point_offsets: vec![Vec3::ZERO],
            tags: Vec::new(),
            from_import: false,
        };
        let registry = PointRegistry::build(&[fixture], Vec3::ZERO, 3, 1);
        let palette = Palette::default();
        let frame = LayerFrame {
            palette: &palette,
            group_alpha: 1.0,
        };
        let mut layer = RainbowLayer::default();
        layer.cycle_time = 3.0;
        let mut colors = ColorBuffer::new(1);

        layer.run(0.0, &frame, &registry, &mut colors);
        assert_eq!(colors.get(0).map(|c| c.to_rgb8(1.0)), Some([255, 0, 0]));

        // a third of the way round is green
        layer.run(1.0, &frame, &registry, &mut colors);
        assert_eq!(colors.get(0).map(|c| c.to_rgb8(1.0)), Some([0, 255, 0]));
    }
}
