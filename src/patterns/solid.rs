use once_cell::sync::Lazy;

use super::{common_params, LayerCore, LayerFrame, PatternLayer};
use crate::compositor::ColorBuffer;
use crate::fixtures::PointRegistry;
use crate::params::{ParamSchema, ParamTable};

/// One uniform color over every allowed point.
#[derive(Default)]
pub struct SolidLayer {
    pub core: LayerCore,
}

static SOLID_PARAMS: Lazy<ParamTable<SolidLayer>> = Lazy::new(common_params::<SolidLayer>);

impl ParamSchema for SolidLayer {
    fn param_table() -> &'static ParamTable<Self> {
        &SOLID_PARAMS
    }
}

impl PatternLayer for SolidLayer {
    fn kind(&self) -> &'static str {
        "solid"
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
        let alpha = self.core.effective_alpha(frame);
        let color = self.core.colorizer.resolve(1.0, frame.palette, alpha);
        if color.a <= 0.0 {
            return;
        }

        let mode = self.core.blend.blend_mode;
        if let Some(slots) = self.core.allowed_slots(registry) {
            for slot in slots {
                colors.blend_at(slot, mode, color);
            }
        }
    }
}
