//! Layer Group Compositor
//!
//! A group owns an explicitly ordered list of named pattern layers and composites them,
//! first to last, onto the shared color buffer. The group palette is refreshed once at
//! the start of the frame and every layer renders against that same palette.
//! Sibling order is the compositing order: `Normal` blending does not commute, so
//! reordering layers changes the visible result.

use log::{debug, error};
use once_cell::sync::Lazy;

use crate::blend::{blend, BlendMode};
use crate::error::{PrairieError, PrairieResult};
use crate::fixtures::PointRegistry;
use crate::models::color::clamp01;
use crate::models::Rgba;
use crate::palette::{Palette, PaletteMixer, PaletteSource};
use crate::params::{ParamSchema, ParamTable};
use crate::patterns::{LayerFrame, PatternLayer};

/// Running color of every point, indexed by registry slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorBuffer {
    colors: Vec<Rgba>,
}

impl ColorBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            colors: vec![Rgba::BLACK; len],
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Resize to match a new registry. Every point starts black again, since slots no
    /// longer line up with the previous layout.
    pub fn reset(&mut self, len: usize) {
        self.colors.clear();
        self.colors.resize(len, Rgba::BLACK);
    }

    pub fn fill(&mut self, color: Rgba) {
        self.colors.fill(color);
    }

    pub fn clear(&mut self) {
        self.fill(Rgba::BLACK);
    }

    pub fn get(&self, slot: usize) -> Option<Rgba> {
        self.colors.get(slot).copied()
    }

    pub fn set(&mut self, slot: usize, color: Rgba) {
        if let Some(c) = self.colors.get_mut(slot) {
            *c = color.clamped();
        }
    }

    /// Blend `color` onto the point at `slot`.
    pub fn blend_at(&mut self, slot: usize, mode: BlendMode, color: Rgba) {
        if let Some(c) = self.colors.get_mut(slot) {
            *c = blend(mode, color, *c);
        }
    }

    pub fn as_slice(&self) -> &[Rgba] {
        &self.colors
    }
}

struct LayerSlot {
    name: String,
    layer: Box<dyn PatternLayer>,
}

pub struct LayerGroup {
    name: String,
    pub group_alpha: f32,
    pub enabled: bool,
    layers: Vec<LayerSlot>,
    palette_source: Option<Box<dyn PaletteSource>>,
    palette: Palette,
}

static GROUP_PARAMS: Lazy<ParamTable<LayerGroup>> = Lazy::new(|| {
    ParamTable::<LayerGroup>::new()
        .boolean("enabled", true, |g| g.enabled, |g, v| g.enabled = v)
        .float(
            "alpha",
            true,
            |g| g.group_alpha,
            |g, v| g.group_alpha = clamp01(v),
        )
});

impl ParamSchema for LayerGroup {
    fn param_table() -> &'static ParamTable<Self> {
        &GROUP_PARAMS
    }
}

impl LayerGroup {
    /// An enabled group at full alpha with the default palette mixer.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_palette_source(name, Some(Box::new(PaletteMixer::default())))
    }

    pub fn with_palette_source(
        name: impl Into<String>,
        palette_source: Option<Box<dyn PaletteSource>>,
    ) -> Self {
        Self {
            name: name.into(),
            group_alpha: 1.0,
            enabled: true,
            layers: Vec::new(),
            palette_source,
            palette: Palette::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_palette_source(&mut self, source: Box<dyn PaletteSource>) {
        self.palette_source = Some(source);
    }

    pub fn has_palette_source(&self) -> bool {
        self.palette_source.is_some()
    }

    /// The palette the current (or last) frame rendered against.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|s| s.name == name)
    }

    fn unknown_layer(&self, layer: &str) -> PrairieError {
        PrairieError::UnknownLayer {
            group: self.name.clone(),
            layer: layer.to_string(),
        }
    }

    /// Append a layer. It composites after every layer already in the group.
    pub fn add_layer(
        &mut self,
        name: impl Into<String>,
        layer: Box<dyn PatternLayer>,
    ) -> PrairieResult<()> {
        let index = self.layers.len();
        self.insert_layer(index, name, layer)
    }

    pub fn insert_layer(
        &mut self,
        index: usize,
        name: impl Into<String>,
        layer: Box<dyn PatternLayer>,
    ) -> PrairieResult<()> {
        let name = name.into();
        if name.contains('/') || self.position(&name).is_some() {
            return Err(PrairieError::DuplicateName(name));
        }
        let index = index.min(self.layers.len());
        debug!(
            "[compositor] group '{}' add {} layer '{}' at {}",
            self.name,
            layer.kind(),
            name,
            index
        );
        self.layers.insert(index, LayerSlot { name, layer });
        Ok(())
    }

    pub fn move_layer(&mut self, name: &str, new_index: usize) -> PrairieResult<()> {
        let from = self.position(name).ok_or_else(|| self.unknown_layer(name))?;
        let slot = self.layers.remove(from);
        let to = new_index.min(self.layers.len());
        self.layers.insert(to, slot);
        Ok(())
    }

    pub fn remove_layer(&mut self, name: &str) -> PrairieResult<Box<dyn PatternLayer>> {
        let index = self.position(name).ok_or_else(|| self.unknown_layer(name))?;
        Ok(self.layers.remove(index).layer)
    }

    pub fn set_layer_active(&mut self, name: &str, active: bool) -> PrairieResult<()> {
        match self.layer_mut(name) {
            Some(layer) => {
                layer.core_mut().active = active;
                Ok(())
            }
            None => Err(self.unknown_layer(name)),
        }
    }

    pub fn layer(&self, name: &str) -> Option<&dyn PatternLayer> {
        self.layers
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.layer.as_ref())
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut dyn PatternLayer> {
        match self.layers.iter_mut().find(|s| s.name == name) {
            Some(slot) => Some(slot.layer.as_mut()),
            None => None,
        }
    }

    /// Layer names in compositing order.
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn layers(&self) -> impl Iterator<Item = (&str, &(dyn PatternLayer + 'static))> {
        self.layers
            .iter()
            .map(|s| (s.name.as_str(), s.layer.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn notify_layout_changed(&mut self) {
        for slot in &mut self.layers {
            slot.layer.notify_layout_changed();
        }
    }

    fn refresh_palette(&mut self, dt: f32) {
        let source = self.palette_source.get_or_insert_with(|| {
            error!(
                "[compositor] group '{}' has no palette source, attaching the default mixer",
                self.name
            );
            Box::new(PaletteMixer::default())
        });
        self.palette = source.refresh(dt);
    }

    /// Composite one frame. A disabled group leaves the buffer untouched and does not
    /// advance its layers.
    pub fn run_frame(&mut self, dt: f32, registry: &PointRegistry, colors: &mut ColorBuffer) {
        if !self.enabled {
            return;
        }

        self.refresh_palette(dt);

        let frame = LayerFrame {
            palette: &self.palette,
            group_alpha: self.group_alpha,
        };
        for slot in self.layers.iter_mut() {
            let core = slot.layer.core();
            if !core.active {
                continue;
            }
            let layer_dt = dt * core.time_mult;
            slot.layer.run(layer_dt, &frame, registry, colors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Fixture;
    use crate::palette::Colorizer;
    use crate::patterns::{RadialGradientLayer, SolidLayer, SweepLayer};
    use glam::Vec3;

    fn one_point() -> PointRegistry {
        let fixture = Fixture {
            id: 0,
            position: Vec3::new(1.0, 0.0, 0.0),
            universe: 0,
            channel: 0,
            point_range_min: 0,
            point_range_max: 0,
            point_offsets: vec![Vec3::ZERO],
            tags: Vec::new(),
            from_import: false,
        };
        PointRegistry::build(&[fixture], Vec3::ZERO, 3, 1)
    }

    fn solid(color: Rgba, mode: BlendMode) -> Box<dyn PatternLayer> {
        let mut layer = SolidLayer::default();
        layer.core.colorizer = Colorizer::fixed(color);
        layer.core.blend.blend_mode = mode;
        Box::new(layer)
    }

    #[test]
    fn test_sibling_order_is_compositing_order() {
        let registry = one_point();
        let red = Rgba::rgb(1.0, 0.0, 0.0);
        let blue = Rgba::rgb(0.0, 0.0, 1.0);

        let mut group = LayerGroup::new("main");
        group.add_layer("red", solid(red, BlendMode::Normal)).unwrap();
        group.add_layer("blue", solid(blue, BlendMode::Normal)).unwrap();
        assert_eq!(group.layer_names(), vec!["red", "blue"]);

        let mut colors = ColorBuffer::new(1);
        group.run_frame(0.016, &registry, &mut colors);
        assert_eq!(colors.get(0), Some(blue));

        group.move_layer("blue", 0).unwrap();
        assert_eq!(group.layer_names(), vec!["blue", "red"]);
        colors.clear();
        group.run_frame(0.016, &registry, &mut colors);
        assert_eq!(colors.get(0), Some(red));
    }

    #[test]
    fn test_disabled_group_and_inactive_layers_are_skipped() {
        let registry = one_point();
        let mut group = LayerGroup::new("main");
        group.add_layer("white", solid(Rgba::WHITE, BlendMode::Normal)).unwrap();

        let mut colors = ColorBuffer::new(1);
        group.enabled = false;
        group.run_frame(0.016, &registry, &mut colors);
        assert_eq!(colors.get(0), Some(Rgba::BLACK));

        group.enabled = true;
        group.set_layer_active("white", false).unwrap();
        group.run_frame(0.016, &registry, &mut colors);
        assert_eq!(colors.get(0), Some(Rgba::BLACK));
    }

    #[test]
    fn test_time_mult_scales_layer_delta() {
        // point sits at azimuth 0; a quarter turn per second
        let registry = one_point();
        let mut group = LayerGroup::new("main");
        let mut sweep = SweepLayer::default();
        sweep.core.colorizer = Colorizer::fixed(Rgba::WHITE);
        sweep.speed = 0.25;
        group.add_layer("sweep", Box::new(sweep)).unwrap();

        let mut colors = ColorBuffer::new(1);
        group.run_frame(2.0, &registry, &mut colors);
        assert_eq!(colors.get(0).map(|c| c.r), Some(0.0));

        // doubled time moves the beam half a turn, back onto the point
        if let Some(layer) = group.layer_mut("sweep") {
            layer.core_mut().time_mult = 2.0;
        }
        group.run_frame(1.0, &registry, &mut colors);
        assert_eq!(colors.get(0).map(|c| c.r), Some(1.0));
    }

    #[test]
    fn test_missing_palette_source_is_repaired() {
        let registry = one_point();
        let mut group = LayerGroup::with_palette_source("bare", None);
        let mut layer = SolidLayer::default();
        layer.core.colorizer = Colorizer::default();
        group.add_layer("fill", Box::new(layer)).unwrap();

        let mut colors = ColorBuffer::new(1);
        group.run_frame(0.016, &registry, &mut colors);
        assert!(group.has_palette_source());
        assert_eq!(colors.get(0), Some(Palette::default().color(0)));

        group.run_frame(0.016, &registry, &mut colors);
        assert!(group.has_palette_source());
    }

    #[test]
    fn test_names_are_unique_and_slash_free() {
        let mut group = LayerGroup::new("main");
        group.add_layer("a", solid(Rgba::WHITE, BlendMode::Add)).unwrap();
        assert!(matches!(
            group.add_layer("a", solid(Rgba::WHITE, BlendMode::Add)),
            Err(PrairieError::DuplicateName(_))
        ));
        assert!(group.add_layer("a/b", solid(Rgba::WHITE, BlendMode::Add)).is_err());
        assert!(matches!(
            group.remove_layer("zzz"),
            Err(PrairieError::UnknownLayer { .. })
        ));
        assert!(group.remove_layer("a").is_ok());
        assert!(group.is_empty());
    }

    #[derive(Default)]
    struct Counting {
        core: crate::patterns::LayerCore,
        notified: i64,
    }

    static COUNTING_PARAMS: Lazy<ParamTable<Counting>> = Lazy::new(|| {
        ParamTable::<Counting>::new().int(
            "notified",
            false,
            |l| l.notified,
            |l, v| l.notified = v,
        )
    });

    impl ParamSchema for Counting {
        fn param_table() -> &'static ParamTable<Self> {
            &COUNTING_PARAMS
        }
    }

    impl PatternLayer for Counting {
        fn kind(&self) -> &'static str {
            "counting"
        }

        fn core(&self) -> &crate::patterns::LayerCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut crate::patterns::LayerCore {
            &mut self.core
        }

        fn run(&mut self, _: f32, _: &LayerFrame, _: &PointRegistry, _: &mut ColorBuffer) {}

        fn notify_layout_changed(&mut self) {
            self.notified += 1;
        }
    }

    #[test]
    fn test_layout_change_reaches_layers() {
        let mut group = LayerGroup::new("main");
        group.add_layer("a", Box::<Counting>::default()).unwrap();
        group.add_layer("b", Box::<Counting>::default()).unwrap();

        group.notify_layout_changed();
        for name in ["a", "b"] {
            let count = group.layer(name).and_then(|l| l.get_param("notified").ok());
            assert_eq!(count, Some(crate::params::ParamValue::Int(1)));
        }
    }

    #[test]
    fn test_filtered_layer_survives_a_smaller_registry() {
        let fixtures: Vec<Fixture> = (0..3)
            .map(|i| Fixture {
                id: i,
                position: Vec3::new(i as f32 * 5.0, 0.0, 0.0),
                universe: 0,
                channel: i * 21,
                point_range_min: i * 7,
                point_range_max: i * 7 + 6,
                point_offsets: vec![Vec3::ZERO; 7],
                tags: Vec::new(),
                from_import: false,
            })
            .collect();
        let big = PointRegistry::build(&fixtures, Vec3::ZERO, 3, 1);
        let small = PointRegistry::build(&fixtures[..1], Vec3::ZERO, 3, 1);

        let mut gradient = RadialGradientLayer::default();
        gradient.core.colorizer = Colorizer::fixed(Rgba::WHITE);
        gradient
            .core
            .set_filter(crate::patterns::PointFilter::Fixtures { ids: vec![2] });
        let mut group = LayerGroup::new("main");
        group.add_layer("grad", Box::new(gradient)).unwrap();

        let mut colors = ColorBuffer::new(big.len());
        group.run_frame(0.016, &big, &mut colors);
        assert_eq!(colors.get(14).map(|c| c.r), Some(1.0));

        // same generation, different layout, and no notification
        let mut colors = ColorBuffer::new(small.len());
        group.run_frame(0.016, &small, &mut colors);
        assert!(colors.as_slice().iter().all(|c| *c == Rgba::BLACK));
    }
}
